use bytemuck::{Pod, Zeroable};

use crate::color::ClearColor;

use super::shader::{ShaderError, ShaderStage, UniformLocation};

/// Handle to a compiled shader stage owned by a backend.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ShaderId(pub(crate) u32);

/// Handle to a linked program owned by a backend.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ProgramId(pub(crate) u32);

/// Handle to a vertex buffer owned by a backend.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BufferId(pub(crate) u32);

impl ShaderId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl ProgramId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl BufferId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Primitive assembly mode for `draw_arrays`.
///
/// Programs are linked with a triangle-list topology, so this is the only mode.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Primitive {
    Triangles,
}

/// Viewport rectangle in physical pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// 2D vertex in normalized device coordinates.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex2 {
    pub position: [f32; 2],
}

impl Vertex2 {
    pub const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { position: [x, y] }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex2>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Immediate-mode graphics API consumed by the triangle core.
///
/// The shape mirrors a classic GL context: state is set on the backend and
/// draw calls use whatever program and vertex buffers are currently bound.
/// Frame commands (`set_viewport`, `clear`, `draw_arrays`) take effect on
/// `present`.
pub trait GraphicsBackend {
    /// Compiles one shader stage. The error carries the compiler log.
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, ShaderError>;

    /// Links a vertex and a fragment stage into a program.
    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId)
    -> Result<ProgramId, ShaderError>;

    /// Makes `program` the target of uniform writes and draw calls.
    fn use_program(&mut self, program: ProgramId);

    /// Resolves a named uniform of `program`. `None` when the name is unknown.
    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    /// Writes a 3-component uniform of the active program.
    fn set_uniform3(&mut self, location: UniformLocation, value: [f32; 3]);

    /// Uploads vertex data and binds the buffer to attribute `slot`.
    fn upload_vertices(&mut self, slot: u32, vertices: &[Vertex2]) -> BufferId;

    fn set_clear_color(&mut self, color: ClearColor);

    fn set_viewport(&mut self, viewport: Viewport);

    /// Clears the color buffer with the current clear color.
    fn clear(&mut self);

    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32);

    /// Submits the frame and swaps buffers.
    fn present(&mut self);
}
