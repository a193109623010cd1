//! CPU-side WGSL front end.
//!
//! Shaders are parsed and validated with `naga` before any GPU object is
//! created, so compile and link diagnostics are available as plain text and
//! can be checked without a device. Reflection data from the parsed modules
//! drives uniform lookup and pipeline layout creation.

use std::fmt;

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{
    AddressSpace, Binding, EntryPoint, Handle, Interpolation, Module, Sampling, Scalar, Type, TypeInner,
    VectorSize,
};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn to_naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Shader compile or link failure, carrying the diagnostic log.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ShaderError {
    Compile { stage: ShaderStage, log: String },
    Link { log: String },
}

impl ShaderError {
    pub fn log(&self) -> &str {
        match self {
            ShaderError::Compile { log, .. } | ShaderError::Link { log } => log,
        }
    }
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::Compile { stage, log } => write!(f, "error in the {stage} shader:\n{log}"),
            ShaderError::Link { log } => write!(f, "failed to link shader program:\n{log}"),
        }
    }
}

impl std::error::Error for ShaderError {}

/// Resolved uniform slot (`@group(g) @binding(b)`).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformLocation {
    pub group: u32,
    pub binding: u32,
}

/// A parsed and validated shader stage.
#[derive(Debug)]
pub struct CompiledShader {
    stage: ShaderStage,
    entry_index: usize,
    source: String,
    module: Module,
}

impl CompiledShader {
    pub fn entry_point(&self) -> &str {
        &self.entry().name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn entry(&self) -> &EntryPoint {
        &self.module.entry_points[self.entry_index]
    }
}

/// Parses and validates `source` as a single stage.
///
/// The first entry point matching `stage` is used.
pub fn compile(stage: ShaderStage, source: &str) -> Result<CompiledShader, ShaderError> {
    let compile_error = |log: String| ShaderError::Compile { stage, log };

    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| compile_error(e.emit_to_string(source)))?;

    let mut validator = Validator::new(ValidationFlags::all(), Capabilities::empty());
    validator
        .validate(&module)
        .map_err(|e| compile_error(e.emit_to_string(source)))?;

    let entry_index = module
        .entry_points
        .iter()
        .position(|ep| ep.stage == stage.to_naga())
        .ok_or_else(|| compile_error(format!("no @{stage} entry point found")))?;

    Ok(CompiledShader {
        stage,
        entry_index,
        source: source.to_owned(),
        module,
    })
}

/// A `vec3<f32>` uniform declared by a linked program.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UniformSlot {
    pub name: String,
    pub location: UniformLocation,
    pub vertex: bool,
    pub fragment: bool,
}

/// Interface of a linked program.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ProgramLayout {
    pub uniforms: Vec<UniformSlot>,
}

impl ProgramLayout {
    pub fn find(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms.iter().find(|u| u.name == name).map(|u| u.location)
    }

    /// Number of bind groups the pipeline layout needs (highest group + 1).
    pub fn group_count(&self) -> u32 {
        self.uniforms
            .iter()
            .map(|u| u.location.group + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Attribute location fed by the vertex buffer (`vec2<f32>`).
pub const POSITION_LOCATION: u32 = 0;

const VEC2_F32: TypeInner = TypeInner::Vector { size: VectorSize::Bi, scalar: Scalar::F32 };
const VEC3_F32: TypeInner = TypeInner::Vector { size: VectorSize::Tri, scalar: Scalar::F32 };
const VEC4_F32: TypeInner = TypeInner::Vector { size: VectorSize::Quad, scalar: Scalar::F32 };

/// A user-defined stage input or output.
#[derive(Debug, Clone, PartialEq)]
struct Varying {
    location: u32,
    ty: TypeInner,
    interpolation: Option<Interpolation>,
    sampling: Option<Sampling>,
}

/// Checks that the two stages fit together and collects the program's uniforms.
///
/// Only `vec3<f32>` uniforms are supported as resources; the vertex stage may
/// read at most a `vec2<f32>` position at location 0, and the fragment stage
/// writes a single `vec4<f32>` color at location 0.
pub fn link(vertex: &CompiledShader, fragment: &CompiledShader) -> Result<ProgramLayout, ShaderError> {
    let link_error = |log: String| ShaderError::Link { log };

    if vertex.stage != ShaderStage::Vertex {
        return Err(link_error(format!("{} shader attached as vertex stage", vertex.stage)));
    }
    if fragment.stage != ShaderStage::Fragment {
        return Err(link_error(format!("{} shader attached as fragment stage", fragment.stage)));
    }

    for input in entry_inputs(&vertex.module, vertex.entry()) {
        if input.location != POSITION_LOCATION {
            return Err(link_error(format!(
                "vertex input at location {} has no vertex buffer attribute",
                input.location
            )));
        }
        if input.ty != VEC2_F32 {
            return Err(link_error(format!(
                "vertex input at location {} must be vec2<f32>",
                input.location
            )));
        }
    }

    let varyings = entry_outputs(&vertex.module, vertex.entry());
    for input in entry_inputs(&fragment.module, fragment.entry()) {
        let location = input.location;
        let Some(output) = varyings.iter().find(|v| v.location == location) else {
            return Err(link_error(format!(
                "fragment input at location {location} is not written by the vertex stage"
            )));
        };
        if output.ty != input.ty {
            return Err(link_error(format!(
                "type mismatch between stages at location {location}"
            )));
        }
        if output.interpolation != input.interpolation || output.sampling != input.sampling {
            return Err(link_error(format!(
                "interpolation mismatch between stages at location {location}"
            )));
        }
    }

    let outputs = entry_outputs(&fragment.module, fragment.entry());
    match outputs.as_slice() {
        [color] if color.location == 0 && color.ty == VEC4_F32 => {}
        [color] if color.location == 0 => {
            return Err(link_error(
                "fragment output at location 0 must be vec4<f32> to match the color target".to_string(),
            ));
        }
        [] => return Err(link_error("fragment stage does not write @location(0)".to_string())),
        _ => {
            return Err(link_error(
                "fragment stage may only write @location(0); the program has one color target".to_string(),
            ));
        }
    }

    let mut layout = ProgramLayout::default();
    collect_uniforms(vertex, &mut layout)?;
    collect_uniforms(fragment, &mut layout)?;
    Ok(layout)
}

impl ProgramLayout {
    /// Checks the layout against device limits, so pipeline creation cannot
    /// fail validation on them.
    pub fn check_limits(&self, limits: &wgpu::Limits) -> Result<(), ShaderError> {
        let link_error = |log: String| Err(ShaderError::Link { log });

        if self.group_count() > limits.max_bind_groups {
            return link_error(format!(
                "program uses {} bind groups, the device supports {}",
                self.group_count(),
                limits.max_bind_groups
            ));
        }

        if let Some(slot) = self
            .uniforms
            .iter()
            .find(|u| u.location.binding >= limits.max_bindings_per_bind_group)
        {
            return link_error(format!(
                "uniform `{}` uses @binding({}), the device supports bindings below {}",
                slot.name, slot.location.binding, limits.max_bindings_per_bind_group
            ));
        }

        let per_stage = [
            (ShaderStage::Vertex, self.uniforms.iter().filter(|u| u.vertex).count()),
            (ShaderStage::Fragment, self.uniforms.iter().filter(|u| u.fragment).count()),
        ];
        for (stage, count) in per_stage {
            if count as u32 > limits.max_uniform_buffers_per_shader_stage {
                return link_error(format!(
                    "{stage} stage uses {count} uniform buffers, the device supports {}",
                    limits.max_uniform_buffers_per_shader_stage
                ));
            }
        }

        Ok(())
    }
}

fn collect_uniforms(shader: &CompiledShader, layout: &mut ProgramLayout) -> Result<(), ShaderError> {
    for (_, var) in shader.module.global_variables.iter() {
        let Some(binding) = &var.binding else { continue };
        let name = var.name.clone().unwrap_or_default();
        let location = UniformLocation { group: binding.group, binding: binding.binding };

        let supported = var.space == AddressSpace::Uniform && shader.module.types[var.ty].inner == VEC3_F32;
        if !supported {
            return Err(ShaderError::Link {
                log: format!(
                    "unsupported resource `{name}` at @group({}) @binding({}) in the {} shader; only vec3<f32> uniforms are bound",
                    location.group, location.binding, shader.stage
                ),
            });
        }

        match layout.uniforms.iter_mut().find(|u| u.location == location) {
            Some(slot) if slot.name == name => match shader.stage {
                ShaderStage::Vertex => slot.vertex = true,
                ShaderStage::Fragment => slot.fragment = true,
            },
            Some(slot) => {
                return Err(ShaderError::Link {
                    log: format!(
                        "uniforms `{}` and `{name}` share @group({}) @binding({})",
                        slot.name, location.group, location.binding
                    ),
                });
            }
            None => layout.uniforms.push(UniformSlot {
                name,
                location,
                vertex: shader.stage == ShaderStage::Vertex,
                fragment: shader.stage == ShaderStage::Fragment,
            }),
        }
    }
    Ok(())
}

fn entry_inputs(module: &Module, ep: &EntryPoint) -> Vec<Varying> {
    let mut out = Vec::new();
    for arg in &ep.function.arguments {
        collect_locations(module, arg.ty, arg.binding.as_ref(), &mut out);
    }
    out
}

fn entry_outputs(module: &Module, ep: &EntryPoint) -> Vec<Varying> {
    let mut out = Vec::new();
    if let Some(result) = &ep.function.result {
        collect_locations(module, result.ty, result.binding.as_ref(), &mut out);
    }
    out
}

fn collect_locations(
    module: &Module,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    out: &mut Vec<Varying>,
) {
    match binding {
        Some(Binding::Location { location, interpolation, sampling, .. }) => out.push(Varying {
            location: *location,
            ty: module.types[ty].inner.clone(),
            interpolation: *interpolation,
            sampling: *sampling,
        }),
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = include_str!("shaders/triangle_vs.wgsl");
    const FS: &str = include_str!("shaders/triangle_fs.wgsl");

    #[test]
    fn compiles_builtin_stages() {
        let vs = compile(ShaderStage::Vertex, VS).unwrap();
        let fs = compile(ShaderStage::Fragment, FS).unwrap();
        assert_eq!(vs.entry_point(), "vs_main");
        assert_eq!(fs.entry_point(), "fs_main");
    }

    #[test]
    fn syntax_error_is_reported_with_log() {
        let err = compile(ShaderStage::Vertex, "@vertex fn vs_main( -> {").unwrap_err();
        match &err {
            ShaderError::Compile { stage, log } => {
                assert_eq!(*stage, ShaderStage::Vertex);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().starts_with("error in the vertex shader"));
    }

    #[test]
    fn validation_error_is_a_compile_error() {
        // Returns a float where vec4 is required.
        let src = "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return 1.0; }";
        assert!(matches!(
            compile(ShaderStage::Vertex, src),
            Err(ShaderError::Compile { stage: ShaderStage::Vertex, .. })
        ));
    }

    #[test]
    fn missing_entry_point_for_stage() {
        let err = compile(ShaderStage::Vertex, FS).unwrap_err();
        assert!(err.log().contains("no @vertex entry point"));
    }

    #[test]
    fn link_resolves_color_uniform() {
        let vs = compile(ShaderStage::Vertex, VS).unwrap();
        let fs = compile(ShaderStage::Fragment, FS).unwrap();
        let layout = link(&vs, &fs).unwrap();
        assert_eq!(layout.find("uColor"), Some(UniformLocation { group: 0, binding: 0 }));
        assert_eq!(layout.find("u_missing"), None);
        assert_eq!(layout.group_count(), 1);
        assert!(layout.uniforms[0].fragment);
        assert!(!layout.uniforms[0].vertex);
    }

    #[test]
    fn link_rejects_swapped_stages() {
        let vs = compile(ShaderStage::Vertex, VS).unwrap();
        let fs = compile(ShaderStage::Fragment, FS).unwrap();
        assert!(matches!(link(&fs, &vs), Err(ShaderError::Link { .. })));
    }

    #[test]
    fn link_rejects_unfed_vertex_attribute() {
        let vs_src = "
            @vertex
            fn vs_main(@location(0) p: vec2<f32>, @location(1) extra: f32) -> @builtin(position) vec4<f32> {
                return vec4<f32>(p, extra, 1.0);
            }
        ";
        let vs = compile(ShaderStage::Vertex, vs_src).unwrap();
        let fs = compile(ShaderStage::Fragment, FS).unwrap();
        let err = link(&vs, &fs).unwrap_err();
        assert!(err.log().contains("location 1"));
    }

    #[test]
    fn link_rejects_unwritten_varying() {
        let fs_src = "
            @fragment
            fn fs_main(@location(2) tint: vec3<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(tint, 1.0);
            }
        ";
        let vs = compile(ShaderStage::Vertex, VS).unwrap();
        let fs = compile(ShaderStage::Fragment, fs_src).unwrap();
        assert!(link(&vs, &fs).unwrap_err().log().contains("location 2"));
    }

    #[test]
    fn link_accepts_struct_varyings() {
        let vs_src = "
            struct VsOut {
                @builtin(position) pos: vec4<f32>,
                @location(0) uv: vec2<f32>,
            };
            @vertex
            fn vs_main(@location(0) p: vec2<f32>) -> VsOut {
                var out: VsOut;
                out.pos = vec4<f32>(p, 0.0, 1.0);
                out.uv = p;
                return out;
            }
        ";
        let fs_src = "
            @group(0) @binding(0) var<uniform> uColor: vec3<f32>;
            @fragment
            fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(uColor * uv.x, 1.0);
            }
        ";
        let vs = compile(ShaderStage::Vertex, vs_src).unwrap();
        let fs = compile(ShaderStage::Fragment, fs_src).unwrap();
        assert!(link(&vs, &fs).is_ok());
    }

    #[test]
    fn non_vec3_uniform_is_a_link_error() {
        let fs_src = "
            @group(0) @binding(0) var<uniform> uColor: vec4<f32>;
            @fragment
            fn fs_main() -> @location(0) vec4<f32> { return uColor; }
        ";
        let vs = compile(ShaderStage::Vertex, VS).unwrap();
        let fs = compile(ShaderStage::Fragment, fs_src).unwrap();
        assert!(link(&vs, &fs).unwrap_err().log().contains("uColor"));
    }

    fn link_fs(fs_src: &str) -> Result<ProgramLayout, ShaderError> {
        let vs = compile(ShaderStage::Vertex, VS).unwrap();
        let fs = compile(ShaderStage::Fragment, fs_src).unwrap();
        link(&vs, &fs)
    }

    #[test]
    fn integer_color_output_is_a_link_error() {
        let fs_src = "
            @group(0) @binding(0) var<uniform> uColor: vec3<f32>;
            @fragment
            fn fs_main() -> @location(0) vec4<i32> {
                return vec4<i32>(vec3<i32>(uColor), 1);
            }
        ";
        let err = link_fs(fs_src).unwrap_err();
        assert!(err.log().contains("must be vec4<f32>"));
    }

    #[test]
    fn narrow_color_output_is_a_link_error() {
        let fs_src = "
            @fragment
            fn fs_main() -> @location(0) vec3<f32> { return vec3<f32>(1.0); }
        ";
        assert!(matches!(link_fs(fs_src), Err(ShaderError::Link { .. })));
    }

    #[test]
    fn second_color_target_is_a_link_error() {
        let fs_src = "
            struct FsOut {
                @location(0) color: vec4<f32>,
                @location(1) extra: vec4<f32>,
            };
            @fragment
            fn fs_main() -> FsOut {
                var out: FsOut;
                out.color = vec4<f32>(1.0);
                out.extra = vec4<f32>(0.0);
                return out;
            }
        ";
        assert!(link_fs(fs_src).unwrap_err().log().contains("one color target"));
    }

    #[test]
    fn interpolation_mismatch_is_a_link_error() {
        let vs_src = "
            struct VsOut {
                @builtin(position) pos: vec4<f32>,
                @location(0) @interpolate(linear) uv: vec2<f32>,
            };
            @vertex
            fn vs_main(@location(0) p: vec2<f32>) -> VsOut {
                var out: VsOut;
                out.pos = vec4<f32>(p, 0.0, 1.0);
                out.uv = p;
                return out;
            }
        ";
        let fs_src = "
            @fragment
            fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(uv, 0.0, 1.0);
            }
        ";
        let vs = compile(ShaderStage::Vertex, vs_src).unwrap();
        let fs = compile(ShaderStage::Fragment, fs_src).unwrap();
        assert!(link(&vs, &fs).unwrap_err().log().contains("interpolation mismatch"));
    }

    #[test]
    fn builtin_layout_fits_downlevel_limits() {
        let layout = link_fs(FS).unwrap();
        assert!(layout.check_limits(&wgpu::Limits::downlevel_defaults()).is_ok());
    }

    #[test]
    fn limits_reject_high_group_and_binding() {
        let fs_src = "
            @group(5) @binding(0) var<uniform> uColor: vec3<f32>;
            @fragment
            fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(uColor, 1.0); }
        ";
        let layout = link_fs(fs_src).unwrap();
        let err = layout.check_limits(&wgpu::Limits::downlevel_defaults()).unwrap_err();
        assert!(err.log().contains("bind groups"));

        let limits = wgpu::Limits { max_bindings_per_bind_group: 4, ..wgpu::Limits::downlevel_defaults() };
        let fs_src = "
            @group(0) @binding(7) var<uniform> uColor: vec3<f32>;
            @fragment
            fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(uColor, 1.0); }
        ";
        let err = link_fs(fs_src).unwrap().check_limits(&limits).unwrap_err();
        assert!(err.log().contains("@binding(7)"));
    }

    #[test]
    fn limits_count_uniform_buffers_per_stage() {
        let fs_src = "
            @group(0) @binding(0) var<uniform> uColor: vec3<f32>;
            @group(0) @binding(1) var<uniform> uTint: vec3<f32>;
            @fragment
            fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(uColor * uTint, 1.0); }
        ";
        let limits = wgpu::Limits {
            max_uniform_buffers_per_shader_stage: 1,
            ..wgpu::Limits::downlevel_defaults()
        };
        let err = link_fs(fs_src).unwrap().check_limits(&limits).unwrap_err();
        assert!(err.log().contains("fragment stage uses 2 uniform buffers"));
    }
}
