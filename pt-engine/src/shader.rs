//! Runtime-compiled GPU programs.

mod compiler;
mod program;

use std::path::PathBuf;

pub use compiler::{ShaderCompiler, ShaderSource, ShaderStage};
pub use program::ShaderProgram;

/// Kernel compiled into the binary, used when the tracing shader on disk
/// cannot be built. Shades the sky seen through each pixel.
pub(crate) mod builtin {
    vulkano_shaders::shader! {
        ty: "compute",
        path: r"src/shader/fallback.comp",
        define: [("LOCAL_SIZE_X", "16"), ("LOCAL_SIZE_Y", "16")],
    }

    /// Local size the kernel above is compiled with.
    pub const WORK_GROUP_SIZE: crate::frame::WorkGroupSize = crate::frame::WorkGroupSize::DEFAULT;
}

/// Locations of the GLSL sources loaded at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderPaths {
    pub trace: PathBuf,
    pub quad_vertex: PathBuf,
    pub quad_fragment: PathBuf,
}

impl Default for ShaderPaths {
    fn default() -> Self {
        Self {
            trace: PathBuf::from("shaders/pathtrace.comp"),
            quad_vertex: PathBuf::from("shaders/quad.vert"),
            quad_fragment: PathBuf::from("shaders/quad.frag"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("failed to read shader {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to compile shader {}:\n{message}", path.display())]
    Compile { path: PathBuf, message: String },
    #[error("failed to link program: {message}")]
    Link { message: String },
    #[error("shader compiler unavailable: {0}")]
    Compiler(String),
}
