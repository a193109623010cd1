use std::borrow::Cow;

use crate::color::{ClearColor, Rgb};
use crate::gfx::{
    BufferId, GraphicsBackend, Primitive, ProgramId, ShaderStage, UniformLocation, Vertex2,
    Viewport, TRIANGLE_FS, TRIANGLE_VS,
};

use super::InitError;

/// Name of the fill-color uniform in the fragment stage.
pub const COLOR_UNIFORM: &str = "uColor";

/// Attribute slot the triangle's positions are bound to.
pub const POSITION_SLOT: u32 = 0;

/// The triangle, in normalized device coordinates.
pub const TRIANGLE_VERTICES: [Vertex2; 3] = [
    Vertex2::new(0.0, 0.5),
    Vertex2::new(-0.5, -0.5),
    Vertex2::new(0.5, -0.5),
];

pub const DEFAULT_FILL: Rgb = match Rgb::new(0.945, 0.745, 0.356) {
    Ok(c) => c,
    Err(_) => panic!("default fill color out of range"),
};

pub const DEFAULT_CLEAR: ClearColor = match ClearColor::new(0.286, 0.576, 0.243, 1.0) {
    Ok(c) => c,
    Err(_) => panic!("default clear color out of range"),
};

/// WGSL sources for the two stages.
#[derive(Debug, Clone)]
pub struct ShaderSources {
    pub vertex: Cow<'static, str>,
    pub fragment: Cow<'static, str>,
}

impl Default for ShaderSources {
    fn default() -> Self {
        Self {
            vertex: Cow::Borrowed(TRIANGLE_VS),
            fragment: Cow::Borrowed(TRIANGLE_FS),
        }
    }
}

/// GPU handles held once initialization succeeded.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ReadyState {
    pub program: ProgramId,
    pub vertex_buffer: BufferId,
    pub color_location: UniformLocation,
    pub vertex_count: u32,
}

/// Lifecycle of a [`TriangleContext`].
///
/// `Failed` is terminal: initialization is never retried on the same context,
/// and [`TriangleContext::initialize`] keeps returning the original error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ContextState {
    Uninitialized,
    Ready(ReadyState),
    Failed,
}

/// Explicit graphics context for the demo triangle.
///
/// One instance per window / GPU context. All GPU work goes through the
/// backend passed to each call; the context only keeps handles and colors.
#[derive(Debug, Clone)]
pub struct TriangleContext {
    sources: ShaderSources,
    state: ContextState,
    failure: Option<InitError>,
    clear_color: ClearColor,
    fill_color: Rgb,
}

impl Default for TriangleContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TriangleContext {
    pub fn new() -> Self {
        Self::with_sources(ShaderSources::default())
    }

    pub fn with_sources(sources: ShaderSources) -> Self {
        Self {
            sources,
            state: ContextState::Uninitialized,
            failure: None,
            clear_color: DEFAULT_CLEAR,
            fill_color: DEFAULT_FILL,
        }
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ContextState::Ready(_))
    }

    /// Vertices drawn per frame; zero unless ready.
    pub fn vertex_count(&self) -> u32 {
        match self.state {
            ContextState::Ready(ready) => ready.vertex_count,
            _ => 0,
        }
    }

    pub fn clear_color(&self) -> ClearColor {
        self.clear_color
    }

    pub fn fill_color(&self) -> Rgb {
        self.fill_color
    }

    /// Compiles and links the program, resolves the color uniform, uploads
    /// the triangle, and sets the clear color.
    ///
    /// On error the context becomes [`ContextState::Failed`] and later frames
    /// render a cleared, empty surface. Only the first call does any work:
    /// later calls return `Ok` on a ready context and the first error on a
    /// failed one.
    pub fn initialize<B>(&mut self, backend: &mut B) -> Result<(), InitError>
    where
        B: GraphicsBackend + ?Sized,
    {
        match (&self.state, &self.failure) {
            (ContextState::Uninitialized, _) => {}
            (ContextState::Failed, Some(e)) => {
                log::debug!("triangle context already failed: {}", e.summary());
                return Err(e.clone());
            }
            (state, _) => {
                log::debug!("triangle context already initialized ({state:?})");
                return Ok(());
            }
        }

        match self.build(backend) {
            Ok(ready) => {
                log::info!(
                    "triangle ready: {} vertices in {:?}, {COLOR_UNIFORM} at {:?}",
                    ready.vertex_count,
                    ready.vertex_buffer,
                    ready.color_location
                );
                self.state = ContextState::Ready(ready);
                Ok(())
            }
            Err(e) => {
                self.state = ContextState::Failed;
                self.failure = Some(e.clone());
                Err(e)
            }
        }
    }

    fn build<B>(&self, backend: &mut B) -> Result<ReadyState, InitError>
    where
        B: GraphicsBackend + ?Sized,
    {
        let vertex = backend.compile_shader(ShaderStage::Vertex, &self.sources.vertex)?;
        let fragment = backend.compile_shader(ShaderStage::Fragment, &self.sources.fragment)?;

        let program = backend.link_program(vertex, fragment)?;
        backend.use_program(program);

        let color_location = backend
            .uniform_location(program, COLOR_UNIFORM)
            .ok_or_else(|| InitError::UniformNotFound { name: COLOR_UNIFORM.to_string() })?;
        backend.set_uniform3(color_location, self.fill_color.to_array());

        let vertex_buffer = backend.upload_vertices(POSITION_SLOT, &TRIANGLE_VERTICES);
        backend.set_clear_color(self.clear_color);

        Ok(ReadyState {
            program,
            vertex_buffer,
            color_location,
            vertex_count: TRIANGLE_VERTICES.len() as u32,
        })
    }

    /// Draws one frame into a `width` x `height` surface.
    ///
    /// Always clears; draws the triangle only when ready. Zero-sized surfaces
    /// (minimized windows) are skipped.
    pub fn render<B>(&self, backend: &mut B, width: u32, height: u32)
    where
        B: GraphicsBackend + ?Sized,
    {
        if width == 0 || height == 0 {
            log::trace!("skipping frame for {width}x{height} surface");
            return;
        }

        backend.set_viewport(Viewport::new(0, 0, width, height));
        backend.set_clear_color(self.clear_color);
        backend.clear();

        if let ContextState::Ready(ready) = self.state {
            if ready.vertex_count != 0 {
                backend.use_program(ready.program);
                backend.draw_arrays(Primitive::Triangles, 0, ready.vertex_count);
            }
        }

        backend.present();
    }

    /// Sets the color used by the next `render` to clear the surface.
    pub fn set_clear_color(&mut self, color: ClearColor) {
        self.clear_color = color;
    }

    /// Sets the triangle fill color.
    ///
    /// Written through the resolved uniform when ready; before that the value
    /// is kept and uploaded by `initialize`.
    pub fn set_fill_color<B>(&mut self, backend: &mut B, color: Rgb)
    where
        B: GraphicsBackend + ?Sized,
    {
        self.fill_color = color;

        if let ContextState::Ready(ready) = self.state {
            backend.use_program(ready.program);
            backend.set_uniform3(ready.color_location, color.to_array());
        }
    }
}
