use std::fmt;

use crate::gfx::{ShaderError, ShaderStage};

/// Why a [`super::TriangleContext`] could not become ready.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum InitError {
    Shader(ShaderError),
    UniformNotFound { name: String },
}

impl InitError {
    /// Short one-line description, suitable for a title bar or status line.
    pub fn summary(&self) -> &'static str {
        match self {
            InitError::Shader(ShaderError::Compile { stage: ShaderStage::Vertex, .. }) => {
                "vertex shader failed to compile"
            }
            InitError::Shader(ShaderError::Compile { stage: ShaderStage::Fragment, .. }) => {
                "fragment shader failed to compile"
            }
            InitError::Shader(ShaderError::Link { .. }) => "shader program failed to link",
            InitError::UniformNotFound { .. } => "color uniform not found",
        }
    }
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::Shader(e) => write!(f, "{e}"),
            InitError::UniformNotFound { name } => write!(f, "failed to get uniform `{name}`: not found"),
        }
    }
}

impl std::error::Error for InitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InitError::Shader(e) => Some(e),
            InitError::UniformNotFound { .. } => None,
        }
    }
}

impl From<ShaderError> for InitError {
    fn from(e: ShaderError) -> Self {
        InitError::Shader(e)
    }
}
