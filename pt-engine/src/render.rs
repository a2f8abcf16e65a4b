use std::sync::Arc;

use vulkano::{
    command_buffer::{
        allocator::CommandBufferAllocator, AutoCommandBufferBuilder, CommandBufferUsage,
        PrimaryAutoCommandBuffer, RenderPassBeginInfo, SubpassBeginInfo, SubpassContents,
        SubpassEndInfo,
    },
    descriptor_set::DescriptorSet,
    device::Queue,
    image::view::ImageView,
    pipeline::{graphics::viewport::Viewport, PipelineBindPoint},
    render_pass::{Framebuffer, FramebufferCreateInfo, RenderPass},
    sync::GpuFuture,
};

use crate::{
    frame::{TraceConstants, WorkGroupSize},
    shader::{builtin, ShaderCompiler, ShaderPaths, ShaderProgram},
    Context,
};
use quad::ScreenQuad;
use target::RenderTarget;
use window::Window;

pub mod quad;
#[cfg(feature = "image")]
pub mod screenshot;
pub mod target;
pub mod window;

/// Texture unit the screen quad samples the traced image from.
const QUAD_TEXTURE_UNIT: u32 = 0;

/// Traces the scene into the render target and draws it on the window.
pub struct Renderer {
    queue: Arc<Queue>,
    command_buffer_allocator: Arc<dyn CommandBufferAllocator>,
    window: Window,
    render_pass: Arc<RenderPass>,
    framebuffers: Vec<Arc<Framebuffer>>,
    trace_program: ShaderProgram,
    quad_program: ShaderProgram,
    target: RenderTarget,
    trace_set: Arc<DescriptorSet>,
    quad_set: Arc<DescriptorSet>,
    quad: ScreenQuad,
    work_group_count: [u32; 3],
    #[cfg(feature = "image")]
    capture: Capture,
}

impl Renderer {
    /// Builds the programs and every GPU resource of a frame.
    ///
    /// A tracing shader that fails to build is replaced by the built-in
    /// kernel. The screen quad program has no replacement.
    pub(crate) fn new(
        context: &Context,
        window: Window,
        shaders: &ShaderPaths,
        work_group_size: WorkGroupSize,
    ) -> crate::Result<Self> {
        let device = &context.device;
        let compiler = ShaderCompiler::new(work_group_size)?;

        let render_pass = vulkano::single_pass_renderpass!(
            device.clone(),
            attachments: {
                color: {
                    format: window.image_format(),
                    samples: 1,
                    load_op: Clear,
                    store_op: Store,
                },
            },
            pass: {
                color: [color],
                depth_stencil: {},
            },
        )?;
        let framebuffers = create_framebuffers(&render_pass, window.views())?;
        tracing::trace!("Render pass created");

        let trace_program = match ShaderProgram::compute(device, &compiler, &shaders.trace) {
            Ok(program) => program,
            Err(err) => {
                tracing::warn!("Using the built-in kernel, tracing shader unavailable: {err}");
                let module = builtin::load(device.clone())?;
                ShaderProgram::from_compute_module(
                    device,
                    &module,
                    builtin::WORK_GROUP_SIZE,
                    Vec::new(),
                )?
            }
        };

        let quad_program = ShaderProgram::graphics(
            device,
            &compiler,
            &shaders.quad_vertex,
            &shaders.quad_fragment,
            &ScreenQuad::description(),
            ScreenQuad::TOPOLOGY,
            render_pass.clone().first_subpass(),
        )?;
        match trace_program.paths() {
            [] => tracing::info!("Tracing with the built-in kernel"),
            [path, ..] => tracing::info!("Tracing with {}", path.display()),
        }
        tracing::debug!("Screen quad drawn with {:?}", quad_program.paths());

        let target = RenderTarget::new(device, &context.memory_allocator, window.extent())?;
        let trace_set = target.bind_for_write(&context.descriptor_set_allocator, &trace_program)?;
        let quad_set = target.bind_for_read(
            &context.descriptor_set_allocator,
            &quad_program,
            QUAD_TEXTURE_UNIT,
        )?;

        let quad = ScreenQuad::new(
            &context.memory_allocator,
            &context.command_buffer_allocator,
            &context.queue,
        )?;

        let work_group_count = trace_program
            .work_group_size()
            .unwrap_or(work_group_size)
            .count(target.extent());
        tracing::debug!("Dispatching {work_group_count:?} work groups per frame");

        #[cfg(feature = "image")]
        let capture = Capture::new(&context.memory_allocator, target.extent())?;

        Ok(Self {
            queue: context.queue.clone(),
            command_buffer_allocator: context.command_buffer_allocator.clone(),
            window,
            render_pass,
            framebuffers,
            trace_program,
            quad_program,
            target,
            trace_set,
            quad_set,
            quad,
            work_group_count,
            #[cfg(feature = "image")]
            capture,
        })
    }

    /// Renders and presents one frame, then waits for it to complete.
    ///
    /// The frame is skipped while the swapchain is out of date.
    pub fn render(&mut self, constants: &TraceConstants) -> crate::Result<()> {
        let Self {
            window,
            render_pass,
            framebuffers,
            ..
        } = self;
        let Some((image_index, acquire_future)) = window.acquire(|views| {
            *framebuffers = create_framebuffers(render_pass, views)?;
            Ok(())
        })?
        else {
            return Ok(());
        };

        let mut builder = AutoCommandBufferBuilder::primary(
            self.command_buffer_allocator.clone(),
            self.queue.queue_family_index(),
            CommandBufferUsage::OneTimeSubmit,
        )?;

        self.record_trace(&mut builder, constants)?;
        // The builder orders the sampled read after the storage write
        self.record_quad(&mut builder, image_index as usize)?;
        #[cfg(feature = "image")]
        self.capture.record(&mut builder, &self.target)?;

        let command_buffer = builder.build()?;
        let render_future = acquire_future.then_execute(self.queue.clone(), command_buffer)?;
        self.window.present(render_future.boxed(), &self.queue)?;

        #[cfg(feature = "image")]
        self.capture.save(self.target.extent());

        Ok(())
    }

    fn record_trace(
        &self,
        builder: &mut AutoCommandBufferBuilder<PrimaryAutoCommandBuffer>,
        constants: &TraceConstants,
    ) -> crate::Result<()> {
        let layout = self.trace_program.layout();

        self.trace_program.use_program(builder)?;
        builder.bind_descriptor_sets(
            PipelineBindPoint::Compute,
            layout.clone(),
            0,
            self.trace_set.clone(),
        )?;
        if !layout.push_constant_ranges().is_empty() {
            builder.push_constants(layout.clone(), 0, *constants)?;
        }
        // SAFETY: the kernel bounds-checks its invocations against the image size.
        unsafe { builder.dispatch(self.work_group_count) }?;

        Ok(())
    }

    fn record_quad(
        &self,
        builder: &mut AutoCommandBufferBuilder<PrimaryAutoCommandBuffer>,
        image_index: usize,
    ) -> crate::Result<()> {
        #[allow(clippy::cast_precision_loss)]
        let extent = self.window.extent().map(|value| value as f32);

        builder.begin_render_pass(
            RenderPassBeginInfo {
                clear_values: vec![Some([0.0, 0.0, 0.0, 1.0].into())],
                ..RenderPassBeginInfo::framebuffer(self.framebuffers[image_index].clone())
            },
            SubpassBeginInfo {
                contents: SubpassContents::Inline,
                ..Default::default()
            },
        )?;

        self.quad_program.use_program(builder)?;
        builder
            .set_viewport(
                0,
                [Viewport {
                    offset: [0.0, 0.0],
                    extent,
                    depth_range: 0.0..=1.0,
                }]
                .into_iter()
                .collect(),
            )?
            .bind_descriptor_sets(
                PipelineBindPoint::Graphics,
                self.quad_program.layout().clone(),
                0,
                self.quad_set.clone(),
            )?;
        self.quad.draw(builder)?;

        builder.end_render_pass(SubpassEndInfo::default())?;

        Ok(())
    }

    /// Saves the next rendered frame as a PNG in the working directory.
    #[cfg(feature = "image")]
    pub fn request_screenshot(&mut self) {
        self.capture.request(screenshot::file_name(std::time::SystemTime::now()));
    }

    /// Extent of the traced image.
    #[must_use]
    pub fn extent(&self) -> [u32; 2] {
        self.target.extent()
    }

    #[must_use]
    pub const fn window(&self) -> &Window {
        &self.window
    }
}

fn create_framebuffers(
    render_pass: &Arc<RenderPass>,
    views: &[Arc<ImageView>],
) -> crate::Result<Vec<Arc<Framebuffer>>> {
    views
        .iter()
        .map(|view| {
            Framebuffer::new(
                render_pass.clone(),
                FramebufferCreateInfo {
                    attachments: vec![view.clone()],
                    ..Default::default()
                },
            )
            .map_err(Into::into)
        })
        .collect()
}

/// Pending screenshot and the host buffer the render target is copied to.
#[cfg(feature = "image")]
struct Capture {
    readback: vulkano::buffer::Subbuffer<[[f32; 4]]>,
    path: Option<std::path::PathBuf>,
}

#[cfg(feature = "image")]
impl Capture {
    fn new(
        memory_allocator: &Arc<dyn vulkano::memory::allocator::MemoryAllocator>,
        [width, height]: [u32; 2],
    ) -> crate::Result<Self> {
        Ok(Self {
            readback: crate::buffer::new_readback(
                memory_allocator,
                u64::from(width) * u64::from(height),
            )?,
            path: None,
        })
    }

    fn request(&mut self, path: std::path::PathBuf) {
        self.path = Some(path);
    }

    fn record(
        &self,
        builder: &mut AutoCommandBufferBuilder<PrimaryAutoCommandBuffer>,
        target: &RenderTarget,
    ) -> crate::Result<()> {
        if self.path.is_some() {
            builder.copy_image_to_buffer(
                vulkano::command_buffer::CopyImageToBufferInfo::image_buffer(
                    target.image().clone(),
                    self.readback.clone(),
                ),
            )?;
        }
        Ok(())
    }

    /// Writes the captured frame, if any. Failures are only logged.
    fn save(&mut self, extent: [u32; 2]) {
        let Some(path) = self.path.take() else {
            return;
        };

        let result = self
            .readback
            .read()
            .map_err(crate::Error::from)
            .and_then(|pixels| screenshot::save(&path, &pixels, extent));
        if let Err(err) = result {
            tracing::error!("Failed to save screenshot {}: {err}", path.display());
        }
    }
}

