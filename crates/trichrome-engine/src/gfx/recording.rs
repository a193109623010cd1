//! Headless [`GraphicsBackend`] that records every call.
//!
//! Shader handling goes through the real `naga` front end, so compile, link
//! and uniform lookup behave exactly as on the GPU path.

use std::collections::HashMap;

use crate::color::ClearColor;

use super::backend::{BufferId, GraphicsBackend, Primitive, ProgramId, ShaderId, Vertex2, Viewport};
use super::shader::{self, CompiledShader, ProgramLayout, ShaderError, ShaderStage, UniformLocation};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    CompileShader(ShaderStage),
    LinkProgram,
    UseProgram(ProgramId),
    UniformLocation(String),
    SetUniform3(UniformLocation, [f32; 3]),
    UploadVertices { slot: u32, count: usize },
    SetClearColor(ClearColor),
    SetViewport(Viewport),
    Clear(ClearColor),
    DrawArrays(Primitive, u32, u32),
    Present,
}

#[derive(Default)]
pub(crate) struct RecordingBackend {
    shaders: Vec<CompiledShader>,
    programs: Vec<ProgramLayout>,
    buffers: Vec<Vec<Vertex2>>,
    active: Option<ProgramId>,
    clear_color: ClearColor,
    uniforms: HashMap<(ProgramId, UniformLocation), [f32; 3]>,
    limits: wgpu::Limits,
    pub(crate) calls: Vec<Call>,
}

impl RecordingBackend {
    /// Checks programs against the same limits the window runtime requests.
    pub(crate) fn new() -> Self {
        Self {
            limits: wgpu::Limits::downlevel_defaults(),
            ..Self::default()
        }
    }

    pub(crate) fn draws(&self) -> Vec<(Primitive, u32, u32)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::DrawArrays(p, first, count) => Some((*p, *first, *count)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn clears(&self) -> Vec<ClearColor> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Clear(color) => Some(*color),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    /// Current value of a uniform in `program`.
    pub(crate) fn uniform(&self, program: ProgramId, location: UniformLocation) -> Option<[f32; 3]> {
        self.uniforms.get(&(program, location)).copied()
    }

    pub(crate) fn vertices(&self, buffer: BufferId) -> &[Vertex2] {
        &self.buffers[buffer.index()]
    }
}

impl GraphicsBackend for RecordingBackend {
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, ShaderError> {
        self.calls.push(Call::CompileShader(stage));
        let compiled = shader::compile(stage, source)?;
        self.shaders.push(compiled);
        Ok(ShaderId(self.shaders.len() as u32 - 1))
    }

    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId, ShaderError> {
        self.calls.push(Call::LinkProgram);
        let layout = shader::link(&self.shaders[vertex.index()], &self.shaders[fragment.index()])?;
        layout.check_limits(&self.limits)?;
        self.programs.push(layout);
        Ok(ProgramId(self.programs.len() as u32 - 1))
    }

    fn use_program(&mut self, program: ProgramId) {
        self.calls.push(Call::UseProgram(program));
        self.active = Some(program);
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.calls.push(Call::UniformLocation(name.to_string()));
        self.programs.get(program.index())?.find(name)
    }

    fn set_uniform3(&mut self, location: UniformLocation, value: [f32; 3]) {
        self.calls.push(Call::SetUniform3(location, value));
        if let Some(program) = self.active {
            self.uniforms.insert((program, location), value);
        }
    }

    fn upload_vertices(&mut self, slot: u32, vertices: &[Vertex2]) -> BufferId {
        self.calls.push(Call::UploadVertices { slot, count: vertices.len() });
        self.buffers.push(vertices.to_vec());
        BufferId(self.buffers.len() as u32 - 1)
    }

    fn set_clear_color(&mut self, color: ClearColor) {
        self.calls.push(Call::SetClearColor(color));
        self.clear_color = color;
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.calls.push(Call::SetViewport(viewport));
    }

    fn clear(&mut self) {
        self.calls.push(Call::Clear(self.clear_color));
    }

    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32) {
        self.calls.push(Call::DrawArrays(primitive, first, count));
    }

    fn present(&mut self) {
        self.calls.push(Call::Present);
    }
}
