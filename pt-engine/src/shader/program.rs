use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use vulkano::{
    command_buffer::{AutoCommandBufferBuilder, PrimaryAutoCommandBuffer},
    device::Device,
    pipeline::{
        compute::ComputePipelineCreateInfo,
        graphics::{
            color_blend::{ColorBlendAttachmentState, ColorBlendState},
            input_assembly::{InputAssemblyState, PrimitiveTopology},
            multisample::MultisampleState,
            rasterization::RasterizationState,
            vertex_input::{VertexBufferDescription, VertexDefinition},
            viewport::ViewportState,
            GraphicsPipelineCreateInfo,
        },
        layout::PipelineDescriptorSetLayoutCreateInfo,
        ComputePipeline, DynamicState, GraphicsPipeline, Pipeline, PipelineLayout,
        PipelineShaderStageCreateInfo,
    },
    render_pass::Subpass,
    shader::{ShaderModule, ShaderModuleCreateInfo},
    ValidationError,
};

use super::{ShaderCompiler, ShaderError, ShaderSource, ShaderStage};
use crate::frame::WorkGroupSize;

#[derive(Clone)]
enum Kernel {
    Compute {
        pipeline: Arc<ComputePipeline>,
        work_group_size: WorkGroupSize,
    },
    Graphics(Arc<GraphicsPipeline>),
}

/// A linked GPU program, either a compute kernel or a vertex + fragment pair.
#[derive(Clone)]
pub struct ShaderProgram {
    kernel: Kernel,
    paths: Vec<PathBuf>,
}

impl ShaderProgram {
    /// Builds a compute program from a GLSL file.
    pub fn compute(
        device: &Arc<Device>,
        compiler: &ShaderCompiler,
        path: impl AsRef<Path>,
    ) -> Result<Self, ShaderError> {
        let source = ShaderSource::load(path, ShaderStage::Compute)?;
        let words = source.compile(compiler)?;
        let module = create_module(device, &words)?;

        let program = Self::from_compute_module(
            device,
            &module,
            compiler.work_group_size(),
            vec![source.path().to_path_buf()],
        )?;
        tracing::debug!("Compute program {} linked", source.path().display());

        Ok(program)
    }

    /// Builds a compute program from an already loaded module.
    pub(crate) fn from_compute_module(
        device: &Arc<Device>,
        module: &Arc<ShaderModule>,
        work_group_size: WorkGroupSize,
        paths: Vec<PathBuf>,
    ) -> Result<Self, ShaderError> {
        let stage = PipelineShaderStageCreateInfo::new(entry_point(module)?);
        let layout = create_layout(device, &[stage.clone()])?;

        let pipeline = ComputePipeline::new(
            device.clone(),
            None,
            ComputePipelineCreateInfo::stage_layout(stage, layout),
        )
        .map_err(link_error)?;

        Ok(Self {
            kernel: Kernel::Compute {
                pipeline,
                work_group_size,
            },
            paths,
        })
    }

    /// Builds a graphics program drawing into `subpass`.
    ///
    /// The viewport is dynamic and must be set before drawing.
    pub fn graphics(
        device: &Arc<Device>,
        compiler: &ShaderCompiler,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
        vertex_description: &VertexBufferDescription,
        topology: PrimitiveTopology,
        subpass: Subpass,
    ) -> Result<Self, ShaderError> {
        let vertex = ShaderSource::load(vertex_path, ShaderStage::Vertex)?;
        let fragment = ShaderSource::load(fragment_path, ShaderStage::Fragment)?;

        let vertex_module = create_module(device, &vertex.compile(compiler)?)?;
        let fragment_module = create_module(device, &fragment.compile(compiler)?)?;

        let vertex_entry = entry_point(&vertex_module)?;
        let vertex_input_state = vertex_description
            .definition(&vertex_entry)
            .map_err(link_error)?;

        let stages = [
            PipelineShaderStageCreateInfo::new(vertex_entry),
            PipelineShaderStageCreateInfo::new(entry_point(&fragment_module)?),
        ];
        let layout = create_layout(device, &stages)?;

        let pipeline = GraphicsPipeline::new(
            device.clone(),
            None,
            GraphicsPipelineCreateInfo {
                stages: stages.into_iter().collect(),
                vertex_input_state: Some(vertex_input_state),
                input_assembly_state: Some(InputAssemblyState {
                    topology,
                    ..Default::default()
                }),
                viewport_state: Some(ViewportState::default()),
                rasterization_state: Some(RasterizationState::default()),
                multisample_state: Some(MultisampleState::default()),
                color_blend_state: Some(ColorBlendState::with_attachment_states(
                    subpass.num_color_attachments(),
                    ColorBlendAttachmentState::default(),
                )),
                dynamic_state: [DynamicState::Viewport].into_iter().collect(),
                subpass: Some(subpass.into()),
                ..GraphicsPipelineCreateInfo::layout(layout)
            },
        )
        .map_err(link_error)?;

        tracing::debug!(
            "Graphics program {} + {} linked",
            vertex.path().display(),
            fragment.path().display()
        );

        Ok(Self {
            kernel: Kernel::Graphics(pipeline),
            paths: vec![vertex.path().to_path_buf(), fragment.path().to_path_buf()],
        })
    }

    /// Binds the program for the following commands.
    pub fn use_program(
        &self,
        builder: &mut AutoCommandBufferBuilder<PrimaryAutoCommandBuffer>,
    ) -> Result<(), Box<ValidationError>> {
        match &self.kernel {
            Kernel::Compute { pipeline, .. } => builder.bind_pipeline_compute(pipeline.clone())?,
            Kernel::Graphics(pipeline) => builder.bind_pipeline_graphics(pipeline.clone())?,
        };
        Ok(())
    }

    /// Layout used to bind resources and push constants.
    #[must_use]
    pub fn layout(&self) -> &Arc<PipelineLayout> {
        match &self.kernel {
            Kernel::Compute { pipeline, .. } => pipeline.layout(),
            Kernel::Graphics(pipeline) => pipeline.layout(),
        }
    }

    /// Local size of a compute program, `None` for a graphics program.
    #[must_use]
    pub const fn work_group_size(&self) -> Option<WorkGroupSize> {
        match &self.kernel {
            Kernel::Compute {
                work_group_size, ..
            } => Some(*work_group_size),
            Kernel::Graphics(_) => None,
        }
    }

    /// Source files the program was built from, empty for a built-in kernel.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

fn create_module(device: &Arc<Device>, words: &[u32]) -> Result<Arc<ShaderModule>, ShaderError> {
    // SAFETY: the words come straight out of shaderc.
    unsafe { ShaderModule::new(device.clone(), ShaderModuleCreateInfo::new(words)) }
        .map_err(link_error)
}

fn entry_point(module: &Arc<ShaderModule>) -> Result<vulkano::shader::EntryPoint, ShaderError> {
    module.entry_point("main").ok_or_else(|| {
        let message = "missing entry point `main`".to_string();
        tracing::error!("Program link failed: {message}");
        ShaderError::Link { message }
    })
}

fn create_layout(
    device: &Arc<Device>,
    stages: &[PipelineShaderStageCreateInfo],
) -> Result<Arc<PipelineLayout>, ShaderError> {
    let create_info = PipelineDescriptorSetLayoutCreateInfo::from_stages(stages)
        .into_pipeline_layout_create_info(device.clone())
        .map_err(|err| link_error(format!("{err:?}")))?;

    PipelineLayout::new(device.clone(), create_info).map_err(link_error)
}

fn link_error(err: impl std::fmt::Display) -> ShaderError {
    let message = err.to_string();
    tracing::error!("Program link failed: {message}");
    ShaderError::Link { message }
}
