//! Trichrome engine crate.
//!
//! Owns the platform + GPU runtime pieces and the triangle rendering core.
//! The core ([`triangle`]) only sees the [`gfx::GraphicsBackend`] seam; the
//! window runtime and wgpu backend sit behind it.

pub mod color;
pub mod core;
pub mod device;
pub mod gfx;
pub mod logging;
pub mod triangle;
pub mod window;
