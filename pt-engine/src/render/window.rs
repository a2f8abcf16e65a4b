use std::sync::Arc;

use vulkano::{
    device::{Device, Queue},
    format::Format,
    image::{view::ImageView, ImageUsage},
    instance::Instance,
    swapchain::{
        self, ColorSpace, Surface, SurfaceInfo, Swapchain, SwapchainCreateInfo,
        SwapchainPresentInfo,
    },
    sync::GpuFuture,
    Validated, VulkanError,
};
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event_loop::ActiveEventLoop,
    window::CursorGrabMode,
};

/// Formats the swapchain is created with, in order of preference.
///
/// The traced image holds display values, so the swapchain must not
/// apply an sRGB encoding on top.
const PREFERRED_FORMATS: [Format; 2] = [Format::B8G8R8A8_UNORM, Format::R8G8B8A8_UNORM];

/// Represents a window and its swapchain.
pub struct Window {
    /// Inner `winit` window.
    window: Arc<winit::window::Window>,
    /// The swapchain of the window.
    swapchain: Arc<Swapchain>,
    /// The final views of the swapchain.
    image_views: Vec<Arc<ImageView>>,
    /// Whether the swapchain needs to be recreated.
    recreate_swapchain: bool,
    /// The index of the image to be rendered.
    image_index: u32,
}

impl Window {
    /// Opens the `winit` window and the Vulkan surface over it.
    pub fn open(
        event_loop: &ActiveEventLoop,
        instance: &Arc<Instance>,
        window_descriptor: &WindowDescriptor,
    ) -> crate::Result<(Arc<winit::window::Window>, Arc<Surface>)> {
        let WindowDescriptor {
            width,
            height,
            position,
            ..
        } = window_descriptor;

        let mut attributes = winit::window::Window::default_attributes()
            .with_title(&window_descriptor.title)
            .with_inner_size(PhysicalSize::new(*width, *height))
            .with_resizable(window_descriptor.resizable);
        if let Some([x, y]) = position {
            attributes = attributes.with_position(PhysicalPosition::new(*x, *y));
        }

        let window = Arc::new(event_loop.create_window(attributes)?);

        if let Some(name) = window.current_monitor().and_then(|monitor| monitor.name()) {
            tracing::info!("Window created on monitor {}", name);
        }

        if window_descriptor.cursor_locked {
            let grab = window
                .set_cursor_grab(CursorGrabMode::Confined)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked));
            match grab {
                Ok(()) => (),
                Err(winit::error::ExternalError::NotSupported(_)) => {
                    tracing::warn!("Cursor grabbing is not supported on this platform");
                }
                Err(err) => tracing::error!("Error grabbing cursor: {err:?}"),
            }
        }
        window.set_cursor_visible(window_descriptor.cursor_visible);

        let surface = Surface::from_window(instance.clone(), window.clone())?;

        Ok((window, surface))
    }

    /// Creates the swapchain of an opened window.
    pub fn new(
        window: Arc<winit::window::Window>,
        surface: Arc<Surface>,
        device: &Arc<Device>,
        window_descriptor: &WindowDescriptor,
    ) -> crate::Result<Self> {
        let physical_device = device.physical_device();
        let surface_capabilities =
            physical_device.surface_capabilities(&surface, SurfaceInfo::default())?;
        let surface_formats = physical_device.surface_formats(&surface, SurfaceInfo::default())?;
        let (image_format, image_color_space) =
            choose_format(&surface_formats).ok_or(crate::Error::NoSuitableDevice)?;

        let available_present_modes = physical_device
            .surface_present_modes(&surface, SurfaceInfo::default())?
            .into_iter()
            .filter_map(|mode| PresentMode::try_from(mode).ok())
            .collect::<Vec<_>>();
        let present_mode =
            choose_present_mode(window_descriptor.present_mode, &available_present_modes);

        let composite_alpha = surface_capabilities
            .supported_composite_alpha
            .into_iter()
            .next()
            .ok_or(crate::Error::NoSuitableDevice)?;

        let min_image_count = surface_capabilities.max_image_count.map_or(
            surface_capabilities.min_image_count + 1,
            |max| (surface_capabilities.min_image_count + 1).min(max),
        );

        let (swapchain, images) = Swapchain::new(
            device.clone(),
            surface,
            SwapchainCreateInfo {
                min_image_count,
                image_format,
                image_color_space,
                image_extent: window.inner_size().into(),
                image_usage: ImageUsage::COLOR_ATTACHMENT,
                composite_alpha,
                present_mode: present_mode.into(),
                ..Default::default()
            },
        )?;

        let image_views = images
            .into_iter()
            .map(ImageView::new_default)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            "Swapchain created: {} images, {:?}, {:?}",
            image_views.len(),
            image_format,
            present_mode
        );

        Ok(Self {
            window,
            swapchain,
            image_views,
            recreate_swapchain: false,
            image_index: 0,
        })
    }

    /// Recreates the swapchain and its views.
    ///
    /// Returns `false` when the window is minimized and nothing was recreated.
    fn recreate_swapchain_and_views(&mut self) -> crate::Result<bool> {
        let [desired_width, desired_height]: [u32; 2] = self.window.inner_size().into();

        if desired_width == 0 || desired_height == 0 {
            return Ok(false);
        }

        let (new_swapchain, new_images) = self.swapchain.recreate(SwapchainCreateInfo {
            image_extent: [desired_width, desired_height],
            ..self.swapchain.create_info()
        })?;

        self.swapchain = new_swapchain;
        self.image_views = new_images
            .into_iter()
            .map(ImageView::new_default)
            .collect::<Result<Vec<_>, _>>()?;
        self.recreate_swapchain = false;

        tracing::trace!("Swapchain recreated ({desired_width}x{desired_height})");

        Ok(true)
    }

    /// Acquires the next image to be rendered.
    ///
    /// Returns `None` when the swapchain is out of date, in which case the
    /// frame is skipped and the swapchain recreated on the next call.
    /// `on_recreate_swapchain` receives the new views after a recreation.
    pub fn acquire(
        &mut self,
        on_recreate_swapchain: impl FnOnce(&[Arc<ImageView>]) -> crate::Result<()>,
    ) -> crate::Result<Option<(u32, Box<dyn GpuFuture>)>> {
        if self.recreate_swapchain {
            if !self.recreate_swapchain_and_views()? {
                return Ok(None);
            }
            on_recreate_swapchain(&self.image_views)?;
        }

        let (image_index, suboptimal, acquire_future) =
            match swapchain::acquire_next_image(self.swapchain.clone(), None)
                .map_err(Validated::unwrap)
            {
                Ok(r) => r,
                Err(VulkanError::OutOfDate) => {
                    self.recreate_swapchain = true;
                    return Ok(None);
                }
                Err(e) => return Err(Validated::Error(e).into()),
            };

        self.recreate_swapchain |= suboptimal;
        self.image_index = image_index;

        Ok(Some((image_index, acquire_future.boxed())))
    }

    /// Presents the rendered image and waits for the frame to complete.
    pub fn present(
        &mut self,
        render_future: Box<dyn GpuFuture>,
        queue: &Arc<Queue>,
    ) -> crate::Result<()> {
        let future = render_future
            .then_swapchain_present(
                queue.clone(),
                SwapchainPresentInfo::swapchain_image_index(
                    self.swapchain.clone(),
                    self.image_index,
                ),
            )
            .then_signal_fence_and_flush();

        match future.map_err(Validated::unwrap) {
            Ok(future) => {
                future.wait(None)?;
                Ok(())
            }
            Err(VulkanError::OutOfDate) => {
                self.recreate_swapchain = true;
                Ok(())
            }
            Err(e) => Err(Validated::Error(e).into()),
        }
    }

    #[must_use]
    #[inline]
    pub fn views(&self) -> &[Arc<ImageView>] {
        &self.image_views
    }

    #[must_use]
    #[inline]
    pub fn image_format(&self) -> Format {
        self.swapchain.image_format()
    }

    /// Extent of the swapchain images.
    #[must_use]
    #[inline]
    pub fn extent(&self) -> [u32; 2] {
        self.swapchain.image_extent()
    }

    #[must_use]
    #[inline]
    pub fn id(&self) -> winit::window::WindowId {
        self.window.id()
    }

    pub fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

fn choose_format(formats: &[(Format, ColorSpace)]) -> Option<(Format, ColorSpace)> {
    PREFERRED_FORMATS
        .iter()
        .find_map(|preferred| formats.iter().find(|(format, _)| format == preferred))
        .or_else(|| {
            let fallback = formats.first();
            if let Some((format, _)) = fallback {
                tracing::warn!("No UNORM surface format available, falling back to {format:?}");
            }
            fallback
        })
        .copied()
}

fn choose_present_mode(requested: PresentMode, available: &[PresentMode]) -> PresentMode {
    if available.contains(&requested) {
        requested
    } else {
        /// This present mode is guaranteed to be supported,
        /// so we can safely fall back to it.
        const FALLBACK_PRESENT_MODE: PresentMode = PresentMode::Fifo;
        tracing::warn!(
            "request present mode {:?} not supported, falling back to {:?}",
            requested,
            FALLBACK_PRESENT_MODE
        );
        FALLBACK_PRESENT_MODE
    }
}

#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Clone)]
/// Represents a window descriptor.
pub struct WindowDescriptor {
    pub width: u32,
    pub height: u32,
    pub position: Option<[i32; 2]>,
    pub title: String,
    pub resizable: bool,
    pub cursor_visible: bool,
    pub cursor_locked: bool,
    pub present_mode: PresentMode,
}

impl Default for WindowDescriptor {
    fn default() -> Self {
        Self {
            title: "PathTracer".to_string(),
            width: 512,
            height: 512,
            position: None,
            resizable: false,
            cursor_locked: true,
            cursor_visible: false,
            present_mode: PresentMode::Fifo,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Represents the present mode of the window.
pub enum PresentMode {
    /// The image is presented immediately.
    Immediate,
    /// Images get queued and the last one is presented.
    Mailbox,
    /// Images get queued and presented in order, at the refresh rate.
    ///
    /// This present mode is the only one to be guaranteed to be supported.
    Fifo,
}

impl From<PresentMode> for vulkano::swapchain::PresentMode {
    fn from(mode: PresentMode) -> Self {
        match mode {
            PresentMode::Immediate => Self::Immediate,
            PresentMode::Mailbox => Self::Mailbox,
            PresentMode::Fifo => Self::Fifo,
        }
    }
}

impl TryFrom<vulkano::swapchain::PresentMode> for PresentMode {
    type Error = vulkano::swapchain::PresentMode;

    fn try_from(mode: vulkano::swapchain::PresentMode) -> Result<Self, Self::Error> {
        match mode {
            vulkano::swapchain::PresentMode::Immediate => Ok(Self::Immediate),
            vulkano::swapchain::PresentMode::Mailbox => Ok(Self::Mailbox),
            vulkano::swapchain::PresentMode::Fifo => Ok(Self::Fifo),
            other => Err(other),
        }
    }
}
