use vulkano::{
    buffer::AllocateBufferError, command_buffer::CommandBufferExecError,
    image::AllocateImageError, swapchain::FromWindowError, sync::HostAccessError, LoadingError,
    Validated, ValidationError, VulkanError,
};

/// Errors raised while setting up or rendering a frame.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load the Vulkan library: {0}")]
    Library(#[from] LoadingError),
    #[error(transparent)]
    Vulkan(#[from] Validated<VulkanError>),
    #[error(transparent)]
    Validation(#[from] Box<ValidationError>),
    #[error("failed to allocate buffer: {0}")]
    AllocateBuffer(#[from] Validated<AllocateBufferError>),
    #[error("failed to allocate image: {0}")]
    AllocateImage(#[from] Validated<AllocateImageError>),
    #[error("failed to access buffer from the host: {0}")]
    HostAccess(#[from] HostAccessError),
    #[error("failed to execute command buffer: {0}")]
    Execute(#[from] CommandBufferExecError),
    #[error("no Vulkan device can render to the window")]
    NoSuitableDevice,
    #[error("pipeline layout has no descriptor set {0}")]
    MissingDescriptorSet(usize),
    #[error(transparent)]
    Shader(#[from] crate::shader::ShaderError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("failed to create surface: {0}")]
    Surface(#[from] FromWindowError),
    #[error(transparent)]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to get display handle: {0}")]
    Handle(#[from] winit::raw_window_handle::HandleError),
    #[cfg(feature = "image")]
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[cfg(feature = "image")]
    #[error("failed to encode png: {0}")]
    Png(#[from] png::EncodingError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
