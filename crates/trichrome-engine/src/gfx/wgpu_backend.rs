use wgpu::util::DeviceExt;

use crate::color::ClearColor;
use crate::device::{Gpu, SurfaceErrorAction};

use super::backend::{BufferId, GraphicsBackend, Primitive, ProgramId, ShaderId, Vertex2, Viewport};
use super::shader::{self, CompiledShader, ProgramLayout, ShaderError, ShaderStage, UniformLocation, UniformSlot};

/// Size of one `vec3<f32>` uniform buffer, padded to 16 bytes.
const UNIFORM3_SIZE: u64 = 16;

/// GPU objects that persist across frames.
///
/// Handles returned by [`WgpuBackend`] index into this store; everything is
/// released when the store is dropped. One store per window.
#[derive(Default)]
pub struct WgpuStore {
    shaders: Vec<StoredShader>,
    programs: Vec<StoredProgram>,
    buffers: Vec<StoredBuffer>,

    active_program: Option<ProgramId>,
    /// Vertex buffer bound to each attribute slot.
    vertex_slots: Vec<(u32, BufferId)>,
    clear_color: ClearColor,
}

impl WgpuStore {
    pub fn new() -> Self {
        Self::default()
    }
}

struct StoredShader {
    compiled: CompiledShader,
    module: wgpu::ShaderModule,
}

struct StoredProgram {
    layout: ProgramLayout,
    pipeline: wgpu::RenderPipeline,
    /// Indexed by group number.
    bind_groups: Vec<wgpu::BindGroup>,
    uniform_buffers: Vec<(UniformLocation, wgpu::Buffer)>,
}

struct StoredBuffer {
    buffer: wgpu::Buffer,
    len: u32,
}

/// Commands collected between frame start and `present`.
#[derive(Default)]
struct FramePlan {
    viewport: Option<Viewport>,
    clear: Option<ClearColor>,
    draws: Vec<DrawCall>,
}

struct DrawCall {
    program: ProgramId,
    vertex_buffer: BufferId,
    first: u32,
    count: u32,
}

/// [`GraphicsBackend`] over a window's [`Gpu`].
///
/// Constructed per callback: resource calls go straight to the device and
/// frame calls are recorded, then encoded into a single render pass on
/// `present`.
pub struct WgpuBackend<'a, 'w> {
    gpu: &'a mut Gpu<'w>,
    store: &'a mut WgpuStore,
    frame: FramePlan,
    last_present: Option<SurfaceErrorAction>,
}

impl<'a, 'w> WgpuBackend<'a, 'w> {
    pub fn new(gpu: &'a mut Gpu<'w>, store: &'a mut WgpuStore) -> Self {
        Self {
            gpu,
            store,
            frame: FramePlan::default(),
            last_present: None,
        }
    }

    /// Outcome of the last `present` if the surface could not be acquired.
    pub fn surface_error(&self) -> Option<SurfaceErrorAction> {
        self.last_present
    }

    fn create_program(
        &self,
        vs: &StoredShader,
        fs: &StoredShader,
        layout: ProgramLayout,
    ) -> StoredProgram {
        let device = self.gpu.device();

        let uniform_buffers: Vec<(UniformLocation, wgpu::Buffer)> = layout
            .uniforms
            .iter()
            .map(|u| {
                let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(u.name.as_str()),
                    size: UNIFORM3_SIZE,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                (u.location, buffer)
            })
            .collect();

        let group_layouts: Vec<wgpu::BindGroupLayout> = (0..layout.group_count())
            .map(|group| {
                let entries: Vec<wgpu::BindGroupLayoutEntry> = layout
                    .uniforms
                    .iter()
                    .filter(|u| u.location.group == group)
                    .map(|u| wgpu::BindGroupLayoutEntry {
                        binding: u.location.binding,
                        visibility: visibility(u),
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    })
                    .collect();

                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("trichrome uniform bgl"),
                    entries: &entries,
                })
            })
            .collect();

        let bind_groups = group_layouts
            .iter()
            .enumerate()
            .map(|(group, bgl)| {
                let entries: Vec<wgpu::BindGroupEntry<'_>> = uniform_buffers
                    .iter()
                    .filter(|(loc, _)| loc.group == group as u32)
                    .map(|(loc, buffer)| wgpu::BindGroupEntry {
                        binding: loc.binding,
                        resource: buffer.as_entire_binding(),
                    })
                    .collect();

                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("trichrome uniform bind group"),
                    layout: bgl,
                    entries: &entries,
                })
            })
            .collect();

        let bgl_refs: Vec<&wgpu::BindGroupLayout> = group_layouts.iter().collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("trichrome pipeline layout"),
            bind_group_layouts: &bgl_refs,
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("trichrome program"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &vs.module,
                entry_point: Some(vs.compiled.entry_point()),
                compilation_options: Default::default(),
                buffers: &[Vertex2::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &fs.module,
                entry_point: Some(fs.compiled.entry_point()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.gpu.surface_format(),
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        StoredProgram {
            layout,
            pipeline,
            bind_groups,
            uniform_buffers,
        }
    }
}

fn visibility(slot: &UniformSlot) -> wgpu::ShaderStages {
    let mut stages = wgpu::ShaderStages::NONE;
    if slot.vertex {
        stages |= wgpu::ShaderStages::VERTEX;
    }
    if slot.fragment {
        stages |= wgpu::ShaderStages::FRAGMENT;
    }
    stages
}

/// Clamps `vp` to the render target; `None` when nothing visible remains.
fn clamp_viewport(vp: Viewport, target_width: u32, target_height: u32) -> Option<Viewport> {
    let x = vp.x.min(target_width);
    let y = vp.y.min(target_height);
    let clamped = Viewport::new(
        x,
        y,
        vp.width.min(target_width - x),
        vp.height.min(target_height - y),
    );
    (!clamped.is_empty()).then_some(clamped)
}

impl GraphicsBackend for WgpuBackend<'_, '_> {
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, ShaderError> {
        let compiled = shader::compile(stage, source)?;

        let module = self
            .gpu
            .device()
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(match stage {
                    ShaderStage::Vertex => "trichrome vertex shader",
                    ShaderStage::Fragment => "trichrome fragment shader",
                }),
                source: wgpu::ShaderSource::Wgsl(compiled.source().into()),
            });

        let id = ShaderId(self.store.shaders.len() as u32);
        self.store.shaders.push(StoredShader { compiled, module });
        log::debug!("compiled {stage} shader {id:?}");
        Ok(id)
    }

    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId, ShaderError> {
        let (Some(vs), Some(fs)) = (
            self.store.shaders.get(vertex.index()),
            self.store.shaders.get(fragment.index()),
        ) else {
            return Err(ShaderError::Link { log: "unknown shader handle".to_string() });
        };

        let layout = shader::link(&vs.compiled, &fs.compiled)?;
        layout.check_limits(&self.gpu.device().limits())?;
        let program = self.create_program(vs, fs, layout);

        let id = ProgramId(self.store.programs.len() as u32);
        self.store.programs.push(program);
        log::debug!("linked program {id:?}");
        Ok(id)
    }

    fn use_program(&mut self, program: ProgramId) {
        if program.index() < self.store.programs.len() {
            self.store.active_program = Some(program);
        } else {
            log::warn!("use_program: unknown program {program:?}");
        }
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.store.programs.get(program.index())?.layout.find(name)
    }

    fn set_uniform3(&mut self, location: UniformLocation, value: [f32; 3]) {
        let Some(program) = self
            .store
            .active_program
            .and_then(|id| self.store.programs.get(id.index()))
        else {
            log::warn!("set_uniform3: no active program");
            return;
        };

        let Some((_, buffer)) = program.uniform_buffers.iter().find(|(loc, _)| *loc == location) else {
            log::warn!("set_uniform3: {location:?} is not a uniform of the active program");
            return;
        };

        let padded = [value[0], value[1], value[2], 0.0];
        self.gpu.queue().write_buffer(buffer, 0, bytemuck::cast_slice(&padded));
    }

    fn upload_vertices(&mut self, slot: u32, vertices: &[Vertex2]) -> BufferId {
        let buffer = self
            .gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("trichrome vertex buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let id = BufferId(self.store.buffers.len() as u32);
        self.store.buffers.push(StoredBuffer {
            buffer,
            len: vertices.len() as u32,
        });

        self.store.vertex_slots.retain(|(s, _)| *s != slot);
        self.store.vertex_slots.push((slot, id));
        id
    }

    fn set_clear_color(&mut self, color: ClearColor) {
        self.store.clear_color = color;
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.frame.viewport = Some(viewport);
    }

    fn clear(&mut self) {
        self.frame.clear = Some(self.store.clear_color);
    }

    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32) {
        match primitive {
            Primitive::Triangles => {}
        }

        let Some(program) = self.store.active_program else {
            log::warn!("draw_arrays: no active program");
            return;
        };

        let Some(&(_, vertex_buffer)) = self
            .store
            .vertex_slots
            .iter()
            .find(|(slot, _)| *slot == shader::POSITION_LOCATION)
        else {
            log::warn!("draw_arrays: no vertex buffer bound to slot {}", shader::POSITION_LOCATION);
            return;
        };

        let len = self.store.buffers[vertex_buffer.index()].len;
        if first.checked_add(count).is_none_or(|end| end > len) {
            log::warn!("draw_arrays: range {first}+{count} exceeds {len} uploaded vertices");
            return;
        }

        self.frame.draws.push(DrawCall {
            program,
            vertex_buffer,
            first,
            count,
        });
    }

    fn present(&mut self) {
        let plan = std::mem::take(&mut self.frame);

        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                log::debug!("surface acquisition failed: {err}");
                self.last_present = Some(self.gpu.handle_surface_error(err));
                return;
            }
        };
        self.last_present = None;

        let target_width = frame.surface_texture.texture.width();
        let target_height = frame.surface_texture.texture.height();

        {
            let load = match plan.clear {
                Some(color) => wgpu::LoadOp::Clear(color.into()),
                None => wgpu::LoadOp::Load,
            };

            let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("trichrome frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let viewport = match plan.viewport {
                Some(vp) => clamp_viewport(vp, target_width, target_height),
                None => Some(Viewport::new(0, 0, target_width, target_height)),
            };

            if let Some(vp) = viewport {
                rpass.set_viewport(
                    vp.x as f32,
                    vp.y as f32,
                    vp.width as f32,
                    vp.height as f32,
                    0.0,
                    1.0,
                );

                for draw in &plan.draws {
                    let program = &self.store.programs[draw.program.index()];
                    let buffer = &self.store.buffers[draw.vertex_buffer.index()];

                    rpass.set_pipeline(&program.pipeline);
                    for (group, bind_group) in program.bind_groups.iter().enumerate() {
                        rpass.set_bind_group(group as u32, bind_group, &[]);
                    }
                    rpass.set_vertex_buffer(0, buffer.buffer.slice(..));
                    rpass.draw(draw.first..draw.first + draw.count, 0..1);
                }
            }
        }

        self.gpu.submit(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_inside_target_is_kept() {
        let vp = Viewport::new(0, 0, 800, 600);
        assert_eq!(clamp_viewport(vp, 800, 600), Some(vp));
    }

    #[test]
    fn viewport_is_clamped_to_target() {
        let vp = Viewport::new(0, 0, 1024, 768);
        assert_eq!(clamp_viewport(vp, 800, 600), Some(Viewport::new(0, 0, 800, 600)));
    }

    #[test]
    fn viewport_outside_target_is_dropped() {
        let vp = Viewport::new(900, 0, 100, 100);
        assert_eq!(clamp_viewport(vp, 800, 600), None);
    }
}
