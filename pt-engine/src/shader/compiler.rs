use std::path::{Path, PathBuf};

use shaderc::{CompileOptions, Compiler, EnvVersion, ShaderKind, TargetEnv};

use super::ShaderError;
use crate::frame::WorkGroupSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

impl From<ShaderStage> for ShaderKind {
    fn from(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => Self::Vertex,
            ShaderStage::Fragment => Self::Fragment,
            ShaderStage::Compute => Self::Compute,
        }
    }
}

/// GLSL to SPIR-V compiler.
///
/// Every source goes through the same preprocessor definitions, which
/// carry the local size of the tracing kernel.
pub struct ShaderCompiler {
    compiler: Compiler,
    options: CompileOptions<'static>,
    work_group_size: WorkGroupSize,
}

impl ShaderCompiler {
    pub fn new(work_group_size: WorkGroupSize) -> Result<Self, ShaderError> {
        let compiler = Compiler::new()
            .ok_or_else(|| ShaderError::Compiler("failed to initialize shaderc".to_string()))?;
        let mut options = CompileOptions::new().ok_or_else(|| {
            ShaderError::Compiler("failed to initialize compile options".to_string())
        })?;

        options.set_target_env(TargetEnv::Vulkan, EnvVersion::Vulkan1_0 as u32);
        options.add_macro_definition("LOCAL_SIZE_X", Some(&work_group_size.x().to_string()));
        options.add_macro_definition("LOCAL_SIZE_Y", Some(&work_group_size.y().to_string()));

        Ok(Self {
            compiler,
            options,
            work_group_size,
        })
    }

    /// Local size injected into compute sources.
    #[must_use]
    pub const fn work_group_size(&self) -> WorkGroupSize {
        self.work_group_size
    }
}

/// GLSL text of one shader stage.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    path: PathBuf,
    stage: ShaderStage,
    text: String,
}

impl ShaderSource {
    pub fn load(path: impl AsRef<Path>, stage: ShaderStage) -> Result<Self, ShaderError> {
        let path = path.as_ref().to_path_buf();
        let text = std::fs::read_to_string(&path).map_err(|source| {
            tracing::error!("Could not read shader file {}: {source}", path.display());
            ShaderError::Read {
                path: path.clone(),
                source,
            }
        })?;

        tracing::trace!("Loaded {:?} shader {}", stage, path.display());

        Ok(Self { path, stage, text })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Compiles the source into SPIR-V words, entry point `main`.
    pub fn compile(&self, compiler: &ShaderCompiler) -> Result<Vec<u32>, ShaderError> {
        let artifact = compiler
            .compiler
            .compile_into_spirv(
                &self.text,
                self.stage.into(),
                &self.path.to_string_lossy(),
                "main",
                Some(&compiler.options),
            )
            .map_err(|err| {
                let message = err.to_string();
                tracing::error!(
                    "Shader compilation failed for {}:\n{message}",
                    self.path.display()
                );
                ShaderError::Compile {
                    path: self.path.clone(),
                    message,
                }
            })?;

        if artifact.get_num_warnings() > 0 {
            tracing::warn!(
                "Shader {} compiled with warnings:\n{}",
                self.path.display(),
                artifact.get_warning_messages()
            );
        }

        Ok(artifact.as_binary().to_vec())
    }
}
