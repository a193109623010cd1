//! The triangle core.
//!
//! [`TriangleContext`] owns everything the demo draws with: the linked
//! program, the vertex buffer, the resolved fill-color uniform, and the clear
//! color. `initialize` runs once per graphics context; `render` runs on every
//! invalidation.

mod context;
mod error;

pub use context::{
    ContextState, ReadyState, ShaderSources, TriangleContext, COLOR_UNIFORM, DEFAULT_CLEAR,
    DEFAULT_FILL, POSITION_SLOT, TRIANGLE_VERTICES,
};
pub use error::InitError;
