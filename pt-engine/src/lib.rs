#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

use std::sync::Arc;

use control::{
    camera::{first_person::FirstPerson, Camera},
    InputState,
};
use frame::{ClipPlanes, FrameClock, WorkGroupSize};
use render::{
    window::{Window, WindowDescriptor},
    Renderer,
};
use shader::ShaderPaths;
use vulkano::{
    command_buffer::allocator::{
        CommandBufferAllocator, StandardCommandBufferAllocator,
        StandardCommandBufferAllocatorCreateInfo,
    },
    descriptor_set::allocator::{
        DescriptorSetAllocator, StandardDescriptorSetAllocator,
        StandardDescriptorSetAllocatorCreateInfo,
    },
    device::{
        physical::{PhysicalDevice, PhysicalDeviceType},
        Device, DeviceCreateInfo, DeviceExtensions, Queue, QueueCreateInfo, QueueFlags,
    },
    instance::{Instance, InstanceCreateInfo},
    memory::allocator::{MemoryAllocator, StandardMemoryAllocator},
    swapchain::Surface,
    VulkanLibrary,
};
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowId,
};

pub mod control;
pub mod frame;
pub mod render;
pub mod shader;

mod buffer;
mod error;

pub use error::{Error, Result};

pub(crate) struct Context {
    device: Arc<Device>,
    queue: Arc<Queue>,
    memory_allocator: Arc<dyn MemoryAllocator>,
    descriptor_set_allocator: Arc<dyn DescriptorSetAllocator>,
    command_buffer_allocator: Arc<dyn CommandBufferAllocator>,
}

impl Context {
    fn create_instance(event_loop: &ActiveEventLoop) -> Result<Arc<Instance>> {
        let library = VulkanLibrary::new()?;

        tracing::debug!("Vulkan library loaded");

        let instance_extensions = Surface::required_extensions(event_loop)?;

        let instance = Instance::new(
            library,
            InstanceCreateInfo {
                #[cfg(target_os = "macos")]
                flags: vulkano::instance::InstanceCreateFlags::ENUMERATE_PORTABILITY,
                application_version: vulkano::Version::major_minor(1, 0),
                #[cfg(target_os = "macos")]
                enabled_extensions: vulkano::instance::InstanceExtensions {
                    khr_portability_enumeration: true,
                    ..vulkano::instance::InstanceExtensions::empty()
                }
                .union(&instance_extensions),
                #[cfg(not(target_os = "macos"))]
                enabled_extensions: instance_extensions,
                ..Default::default()
            },
        )?;

        tracing::debug!("Vulkan instance created");

        Ok(instance)
    }

    /// Picks a device able to trace and present to `surface`.
    fn new(instance: &Arc<Instance>, surface: &Surface) -> Result<Self> {
        let device_extensions = DeviceExtensions {
            khr_swapchain: true,
            ..DeviceExtensions::empty()
        };

        let (physical_device, queue_family_index) = instance
            .enumerate_physical_devices()?
            .filter(|p| p.supported_extensions().contains(&device_extensions))
            .filter_map(|p| {
                Self::find_queue_family(&p, surface).map(|queue_family| (p, queue_family))
            })
            .min_by_key(|(p, _)| match p.properties().device_type {
                PhysicalDeviceType::DiscreteGpu => 1,
                PhysicalDeviceType::IntegratedGpu => 2,
                PhysicalDeviceType::VirtualGpu => 3,
                PhysicalDeviceType::Cpu => 4,
                PhysicalDeviceType::Other => 5,
                _ => 6,
            })
            .ok_or(Error::NoSuitableDevice)?;

        tracing::info!("Using device {}", physical_device.properties().device_name);

        let (device, mut queues) = Device::new(
            physical_device,
            DeviceCreateInfo {
                queue_create_infos: vec![QueueCreateInfo {
                    queue_family_index,
                    ..Default::default()
                }],
                enabled_extensions: device_extensions,
                ..Default::default()
            },
        )?;
        let queue = queues.next().ok_or(Error::NoSuitableDevice)?;

        tracing::debug!("Vulkan device created");

        Ok(Self {
            device: device.clone(),
            queue,
            memory_allocator: Arc::new(StandardMemoryAllocator::new_default(device.clone())),
            descriptor_set_allocator: Arc::new(StandardDescriptorSetAllocator::new(
                device.clone(),
                StandardDescriptorSetAllocatorCreateInfo::default(),
            )),
            command_buffer_allocator: Arc::new(StandardCommandBufferAllocator::new(
                device,
                StandardCommandBufferAllocatorCreateInfo::default(),
            )),
        })
    }

    /// A single queue family runs the dispatch, the draw and the present.
    fn find_queue_family(
        physical_device: &Arc<PhysicalDevice>,
        surface: &Surface,
    ) -> Option<u32> {
        physical_device
            .queue_family_properties()
            .iter()
            .zip(0u32..)
            .find(|(q, i)| {
                q.queue_flags
                    .contains(QueueFlags::GRAPHICS | QueueFlags::COMPUTE)
                    && physical_device
                        .presentation_support(*i, surface)
                        .unwrap_or(false)
            })
            .map(|(_, i)| i)
    }
}

pub struct PathTracerConfig {
    pub window: WindowDescriptor,
    pub camera: Box<dyn Camera>,
    pub clip_planes: ClipPlanes,
    pub shaders: ShaderPaths,
    /// Local size of the tracing kernel.
    pub work_group_size: WorkGroupSize,
}

impl Default for PathTracerConfig {
    fn default() -> Self {
        Self {
            window: WindowDescriptor::default(),
            camera: Box::new(FirstPerson::with_position([50.0, 52.0, 295.6])),
            clip_planes: ClipPlanes::default(),
            shaders: ShaderPaths::default(),
            work_group_size: WorkGroupSize::default(),
        }
    }
}

pub struct PathTracerApp {
    event_loop: EventLoop<()>,
    handler: Handler,
}

impl PathTracerApp {
    pub fn new(config: PathTracerConfig) -> Result<Self> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        Ok(Self {
            event_loop,
            handler: Handler {
                config,
                renderer: None,
                input: InputState::default(),
                clock: FrameClock::new(),
                error: None,
            },
        })
    }

    /// Runs the frame loop until the window is closed.
    ///
    /// Returns the error that prevented the renderer from starting, if any.
    pub fn run(self) -> Result<()> {
        let Self {
            event_loop,
            mut handler,
        } = self;

        event_loop.run_app(&mut handler)?;

        handler.error.map_or(Ok(()), Err)
    }
}

struct Handler {
    config: PathTracerConfig,
    renderer: Option<Renderer>,
    input: InputState,
    clock: FrameClock,
    /// Setup failure, returned once the loop exits.
    error: Option<Error>,
}

impl Handler {
    fn setup(&self, event_loop: &ActiveEventLoop) -> Result<Renderer> {
        let instance = Context::create_instance(event_loop)?;
        let (window, surface) = Window::open(event_loop, &instance, &self.config.window)?;
        let context = Context::new(&instance, &surface)?;
        let window = Window::new(window, surface, &context.device, &self.config.window)?;

        Renderer::new(
            &context,
            window,
            &self.config.shaders,
            self.config.work_group_size,
        )
    }

    fn frame(&mut self) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };

        let time = self.clock.tick();
        renderer
            .window()
            .set_title(&format!("{} FPS: {:.0}", self.config.window.title, time.fps()));

        let [width, height] = renderer.extent();
        #[allow(clippy::cast_precision_loss)]
        let aspect = width as f32 / height as f32;

        let constants = frame::prepare(
            &mut self.input,
            self.config.camera.as_mut(),
            self.config.clip_planes,
            aspect,
            &time,
        );

        if let Err(err) = renderer.render(&constants) {
            tracing::error!("Frame {} skipped: {err}", time.frame_index);
        }
    }
}

impl ApplicationHandler for Handler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        match self.setup(event_loop) {
            Ok(renderer) => {
                tracing::debug!("Successfully initialized");
                self.renderer = Some(renderer);
                self.clock = FrameClock::new();
            }
            Err(err) => {
                tracing::error!("Initialization failed: {err}");
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self
            .renderer
            .as_ref()
            .is_some_and(|renderer| renderer.window().id() != window_id)
        {
            return;
        }

        self.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }
            #[cfg(feature = "image")]
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::F12),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.request_screenshot();
                }
            }
            WindowEvent::RedrawRequested => self.frame(),
            _ => {}
        }
    }

    fn device_event(&mut self, _: &ActiveEventLoop, _: DeviceId, event: DeviceEvent) {
        // Raw motion keeps flowing while the grabbed cursor rests on the border
        self.input.handle_device_event(&event);
    }

    fn about_to_wait(&mut self, _: &ActiveEventLoop) {
        if let Some(renderer) = &self.renderer {
            renderer.window().request_redraw();
        }
    }
}
