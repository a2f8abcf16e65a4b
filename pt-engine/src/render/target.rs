use std::sync::Arc;

use vulkano::{
    descriptor_set::{allocator::DescriptorSetAllocator, DescriptorSet, WriteDescriptorSet},
    device::Device,
    format::{Format, FormatFeatures},
    image::{
        sampler::{Filter, Sampler, SamplerAddressMode, SamplerCreateInfo},
        view::ImageView,
        Image, ImageCreateInfo, ImageType, ImageUsage,
    },
    memory::allocator::{AllocationCreateInfo, MemoryAllocator},
};

use crate::{shader::ShaderProgram, Error};

/// Image the tracing kernel writes into and the screen quad samples from.
pub struct RenderTarget {
    image: Arc<Image>,
    view: Arc<ImageView>,
    sampler: Arc<Sampler>,
}

impl RenderTarget {
    pub const FORMAT: Format = Format::R32G32B32A32_SFLOAT;

    /// Allocates the target. Its content is undefined until the first dispatch.
    pub fn new(
        device: &Arc<Device>,
        memory_allocator: &Arc<dyn MemoryAllocator>,
        [width, height]: [u32; 2],
    ) -> crate::Result<Self> {
        let image = Image::new(
            memory_allocator.clone(),
            ImageCreateInfo {
                image_type: ImageType::Dim2d,
                format: Self::FORMAT,
                extent: [width, height, 1],
                usage: ImageUsage::STORAGE | ImageUsage::SAMPLED | ImageUsage::TRANSFER_SRC,
                ..Default::default()
            },
            AllocationCreateInfo::default(),
        )?;
        let view = ImageView::new_default(image.clone())?;

        let features = device
            .physical_device()
            .format_properties(Self::FORMAT)?
            .optimal_tiling_features;
        let filter = filter_for(features);
        if filter == Filter::Nearest {
            tracing::warn!("Device cannot linearly filter {:?}, using nearest", Self::FORMAT);
        }

        let sampler = Sampler::new(
            device.clone(),
            SamplerCreateInfo {
                mag_filter: filter,
                min_filter: filter,
                address_mode: [SamplerAddressMode::ClampToEdge; 3],
                ..Default::default()
            },
        )?;

        tracing::trace!("Render target created ({width}x{height})");

        Ok(Self {
            image,
            view,
            sampler,
        })
    }

    /// Descriptor set exposing the target as the storage image at binding 0
    /// of the program's first set.
    pub fn bind_for_write(
        &self,
        allocator: &Arc<dyn DescriptorSetAllocator>,
        program: &ShaderProgram,
    ) -> crate::Result<Arc<DescriptorSet>> {
        let layout = program
            .layout()
            .set_layouts()
            .first()
            .ok_or(Error::MissingDescriptorSet(0))?;

        Ok(DescriptorSet::new(
            allocator.clone(),
            layout.clone(),
            [WriteDescriptorSet::image_view(0, self.view.clone())],
            [],
        )?)
    }

    /// Descriptor set exposing the target as a sampled texture at binding
    /// `unit` of the program's first set.
    pub fn bind_for_read(
        &self,
        allocator: &Arc<dyn DescriptorSetAllocator>,
        program: &ShaderProgram,
        unit: u32,
    ) -> crate::Result<Arc<DescriptorSet>> {
        let layout = program
            .layout()
            .set_layouts()
            .first()
            .ok_or(Error::MissingDescriptorSet(0))?;

        Ok(DescriptorSet::new(
            allocator.clone(),
            layout.clone(),
            [WriteDescriptorSet::image_view_sampler(
                unit,
                self.view.clone(),
                self.sampler.clone(),
            )],
            [],
        )?)
    }

    #[must_use]
    pub const fn image(&self) -> &Arc<Image> {
        &self.image
    }

    #[must_use]
    pub fn extent(&self) -> [u32; 2] {
        let [width, height, _] = self.image.extent();
        [width, height]
    }
}

fn filter_for(features: FormatFeatures) -> Filter {
    if features.intersects(FormatFeatures::SAMPLED_IMAGE_FILTER_LINEAR) {
        Filter::Linear
    } else {
        Filter::Nearest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_filtering_when_supported() {
        let features = FormatFeatures::SAMPLED_IMAGE | FormatFeatures::SAMPLED_IMAGE_FILTER_LINEAR;
        assert_eq!(filter_for(features), Filter::Linear);
    }

    #[test]
    fn nearest_filtering_otherwise() {
        assert_eq!(filter_for(FormatFeatures::SAMPLED_IMAGE), Filter::Nearest);
        assert_eq!(filter_for(FormatFeatures::empty()), Filter::Nearest);
    }
}
