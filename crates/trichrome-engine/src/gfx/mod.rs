//! Graphics API seam.
//!
//! The triangle core talks to the GPU only through [`GraphicsBackend`], a
//! small GL-style immediate interface. [`WgpuBackend`] implements it on top
//! of a window's [`crate::device::Gpu`]; shader sources are WGSL and are
//! checked on the CPU by [`shader`] before any GPU object is created.

mod backend;
pub mod shader;
mod wgpu_backend;

#[cfg(test)]
pub(crate) mod recording;

pub use backend::{BufferId, GraphicsBackend, Primitive, ProgramId, ShaderId, Vertex2, Viewport};
pub use shader::{ShaderError, ShaderStage, UniformLocation};
pub use wgpu_backend::{WgpuBackend, WgpuStore};

/// Built-in vertex stage: passes a 2D position through as clip-space position.
pub const TRIANGLE_VS: &str = include_str!("shaders/triangle_vs.wgsl");

/// Built-in fragment stage: outputs the `uColor` uniform.
pub const TRIANGLE_FS: &str = include_str!("shaders/triangle_fs.wgsl");
