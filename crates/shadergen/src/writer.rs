//! WGSL emission for a [`ProgramSet`].
//!
//! Layout conventions:
//! - Buffer uniforms live in group [`UNIFORM_GROUP`], bound in declaration
//!   order (vertex program first).
//! - Each sampler unit `n` becomes `texture_n` / `sampler_n` in group
//!   [`TEXTURE_GROUP`] at bindings `2n` / `2n + 1`.
//! - Vertex inputs: position at location 0, texcoord `i` at `1 + i`,
//!   colour `i` after the texcoords.
//! - Varyings: texcoord `i` at location `i`, colour `i` after the texcoords.

use std::fmt::Write as _;

use crate::error::ShaderGenError;
use crate::ffp::FFP_FUNC_ASSIGN;
use crate::function::Function;
use crate::library::LibraryRegistry;
use crate::operand::{FunctionInvocation, OperandSemantic};
use crate::parameter::{GpuConstantType, ParamRef, Parameter, Semantic, UniformParameter};
use crate::program::{Program, ProgramSet, ProgramStage};

pub const UNIFORM_GROUP: u32 = 0;
pub const TEXTURE_GROUP: u32 = 1;
pub const MAX_TEXTURE_COORDINATES: u32 = 16;

/// A vertex attribute the generated vertex shader consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexInputSlot {
    pub location: u32,
    pub name: String,
    pub semantic: Semantic,
    pub index: u16,
    pub ty: GpuConstantType,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformBinding {
    /// A single `ty`, or `array_size` elements of it with a 16-byte stride.
    Buffer {
        ty: GpuConstantType,
        array_size: Option<usize>,
    },
    Texture2d { unit: u16 },
    Sampler { unit: u16 },
}

/// A resource binding the generated module declares.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformSlot {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    pub stage: ProgramStage,
    pub kind: UniformBinding,
}

impl UniformSlot {
    /// Byte size of a buffer binding, `None` for textures and samplers.
    pub fn buffer_size(&self) -> Option<u64> {
        match self.kind {
            UniformBinding::Buffer { ty, array_size } => {
                let element = match (ty, array_size) {
                    (GpuConstantType::Matrix4, _) => 64,
                    (GpuConstantType::Float1, None) => 4,
                    (GpuConstantType::Float2, None) => 8,
                    _ => 16,
                };
                Some(element * array_size.unwrap_or(1) as u64)
            }
            _ => None,
        }
    }
}

/// A complete WGSL module plus the interface a renderer must match.
#[derive(Debug, Clone)]
pub struct GeneratedShader {
    pub source: String,
    pub vertex_entry: &'static str,
    pub fragment_entry: &'static str,
    pub vertex_inputs: Vec<VertexInputSlot>,
    pub uniforms: Vec<UniformSlot>,
}

impl GeneratedShader {
    pub fn uniform(&self, name: &str) -> Option<&UniformSlot> {
        self.uniforms.iter().find(|u| u.name == name)
    }
}

/// Writes programs out as a single WGSL module.
pub struct WgslWriter<'a> {
    libraries: &'a LibraryRegistry,
}

impl<'a> WgslWriter<'a> {
    pub fn new(libraries: &'a LibraryRegistry) -> Self {
        Self { libraries }
    }

    pub fn write(&self, programs: &ProgramSet) -> Result<GeneratedShader, ShaderGenError> {
        let mut out = String::from("// Generated by gamekit-shadergen.\n");

        let mut seen: Vec<&str> = Vec::new();
        for dep in programs
            .vertex
            .dependencies()
            .iter()
            .chain(programs.fragment.dependencies())
        {
            if seen.contains(&dep.as_str()) {
                continue;
            }
            let source = self
                .libraries
                .get(dep)
                .ok_or_else(|| ShaderGenError::MissingLibrary(dep.clone()))?;
            let _ = writeln!(out, "// library: {dep}{source}");
            seen.push(dep);
        }

        let uniforms = declare_uniforms(&mut out, programs);
        let vertex_inputs = vertex_input_slots(programs.vertex.entry_point())?;

        write_structs(&mut out, programs, &vertex_inputs)?;
        write_entry(&mut out, &programs.vertex)?;
        write_entry(&mut out, &programs.fragment)?;

        tracing::debug!(
            bytes = out.len(),
            inputs = vertex_inputs.len(),
            bindings = uniforms.len(),
            "wgsl written"
        );

        Ok(GeneratedShader {
            source: out,
            vertex_entry: ProgramStage::Vertex.entry_point_name(),
            fragment_entry: ProgramStage::Fragment.entry_point_name(),
            vertex_inputs,
            uniforms,
        })
    }
}

fn declare_uniforms(out: &mut String, programs: &ProgramSet) -> Vec<UniformSlot> {
    let mut slots = Vec::new();
    let mut next_binding = 0u32;
    out.push('\n');
    for program in [&programs.vertex, &programs.fragment] {
        for u in program.uniforms() {
            if let (true, Some(unit)) = (u.ty.is_sampler(), u.index) {
                let texture = UniformParameter::texture_name(unit);
                let sampler = UniformParameter::sampler_name(unit);
                let binding = 2 * unit as u32;
                let _ = writeln!(
                    out,
                    "@group({TEXTURE_GROUP}) @binding({binding}) var {texture}: texture_2d<f32>;"
                );
                let _ = writeln!(
                    out,
                    "@group({TEXTURE_GROUP}) @binding({}) var {sampler}: sampler;",
                    binding + 1
                );
                slots.push(UniformSlot {
                    name: texture,
                    group: TEXTURE_GROUP,
                    binding,
                    stage: program.stage(),
                    kind: UniformBinding::Texture2d { unit },
                });
                slots.push(UniformSlot {
                    name: sampler,
                    group: TEXTURE_GROUP,
                    binding: binding + 1,
                    stage: program.stage(),
                    kind: UniformBinding::Sampler { unit },
                });
                continue;
            }

            let ty = match u.array_size {
                Some(n) => format!("array<{}, {n}>", u.ty.wgsl_type()),
                None => u.ty.wgsl_type().to_string(),
            };
            let _ = writeln!(
                out,
                "@group({UNIFORM_GROUP}) @binding({next_binding}) var<uniform> {}: {ty};",
                u.name
            );
            slots.push(UniformSlot {
                name: u.name.clone(),
                group: UNIFORM_GROUP,
                binding: next_binding,
                stage: program.stage(),
                kind: UniformBinding::Buffer {
                    ty: u.ty,
                    array_size: u.array_size,
                },
            });
            next_binding += 1;
        }
    }
    slots
}

fn vertex_input_slots(main: &Function) -> Result<Vec<VertexInputSlot>, ShaderGenError> {
    let mut slots = main
        .inputs()
        .iter()
        .map(|p| {
            let location = match p.semantic {
                Semantic::Position => 0,
                Semantic::TextureCoordinates => 1 + p.index as u32,
                Semantic::Colour => 1 + MAX_TEXTURE_COORDINATES + p.index as u32,
                Semantic::Unknown => {
                    return Err(ShaderGenError::UnsupportedSemantic {
                        semantic: p.semantic.as_str(),
                        usage: "vertex input",
                    });
                }
            };
            Ok(VertexInputSlot {
                location,
                name: p.name.clone(),
                semantic: p.semantic,
                index: p.index,
                ty: p.ty,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    slots.sort_by_key(|s| s.location);
    Ok(slots)
}

fn varying_location(p: &Parameter) -> Result<u32, ShaderGenError> {
    match p.semantic {
        Semantic::TextureCoordinates => Ok(p.index as u32),
        Semantic::Colour => Ok(MAX_TEXTURE_COORDINATES + p.index as u32),
        other => Err(ShaderGenError::UnsupportedSemantic {
            semantic: other.as_str(),
            usage: "varying",
        }),
    }
}

fn write_structs(
    out: &mut String,
    programs: &ProgramSet,
    vertex_inputs: &[VertexInputSlot],
) -> Result<(), ShaderGenError> {
    if !vertex_inputs.is_empty() {
        out.push_str("\nstruct VertexInput {\n");
        for slot in vertex_inputs {
            let _ = writeln!(
                out,
                "    @location({}) {}: {},",
                slot.location,
                slot.name,
                slot.ty.wgsl_type()
            );
        }
        out.push_str("};\n");
    }

    let vs_outputs = programs.vertex.entry_point().outputs();
    out.push_str("\nstruct VertexOutput {\n");
    match vs_outputs.iter().find(|p| p.semantic == Semantic::Position) {
        Some(p) => {
            let _ = writeln!(out, "    @builtin(position) {}: vec4<f32>,", p.name);
        }
        None => out.push_str("    @builtin(position) clip_position: vec4<f32>,\n"),
    }
    for p in vs_outputs.iter().filter(|p| p.semantic != Semantic::Position) {
        let _ = writeln!(
            out,
            "    @location({}) {}: {},",
            varying_location(p)?,
            p.name,
            p.ty.wgsl_type()
        );
    }
    out.push_str("};\n");

    let fs = programs.fragment.entry_point();
    if !fs.inputs().is_empty() {
        out.push_str("\nstruct FragmentInput {\n");
        for p in fs.inputs() {
            let _ = writeln!(
                out,
                "    @location({}) {}: {},",
                varying_location(p)?,
                p.name,
                p.ty.wgsl_type()
            );
        }
        out.push_str("};\n");
    }

    if !fs.outputs().is_empty() {
        out.push_str("\nstruct FragmentOutput {\n");
        for p in fs.outputs() {
            if p.semantic != Semantic::Colour {
                return Err(ShaderGenError::UnsupportedSemantic {
                    semantic: p.semantic.as_str(),
                    usage: "fragment output",
                });
            }
            let _ = writeln!(
                out,
                "    @location({}) {}: {},",
                p.index,
                p.name,
                p.ty.wgsl_type()
            );
        }
        out.push_str("};\n");
    }
    Ok(())
}

fn write_entry(out: &mut String, program: &Program) -> Result<(), ShaderGenError> {
    let main = program.entry_point();
    let (attr, input_ty, output_ty) = match program.stage() {
        ProgramStage::Vertex => ("@vertex", "VertexInput", Some("VertexOutput")),
        ProgramStage::Fragment => (
            "@fragment",
            "FragmentInput",
            (!main.outputs().is_empty()).then_some("FragmentOutput"),
        ),
    };

    let _ = writeln!(out, "\n{attr}");
    let params = if main.inputs().is_empty() {
        String::new()
    } else {
        format!("input: {input_ty}")
    };
    match output_ty {
        Some(ty) => {
            let _ = writeln!(out, "fn {}({params}) -> {ty} {{", main.name());
            let _ = writeln!(out, "    var out: {ty};");
        }
        None => {
            let _ = writeln!(out, "fn {}({params}) {{", main.name());
        }
    }
    for local in main.locals() {
        let _ = writeln!(out, "    var {}: {};", local.name, local.ty.wgsl_type());
    }
    for atom in main.sorted_atoms() {
        let _ = writeln!(out, "    {}", statement(program, atom)?);
    }
    if output_ty.is_some() {
        out.push_str("    return out;\n");
    }
    out.push_str("}\n");
    Ok(())
}

fn statement(program: &Program, atom: &FunctionInvocation) -> Result<String, ShaderGenError> {
    let mut args: Vec<String> = Vec::new();
    let mut targets: Vec<String> = Vec::new();

    for operand in &atom.operands {
        let expr = operand_expr(program, operand.param, operand.mask)?;
        if operand.indirection_level > 0 {
            let base = args
                .pop()
                .ok_or_else(|| ShaderGenError::DanglingIndex(atom.function_name.clone()))?;
            args.push(format!("{base}[u32({expr})]"));
            continue;
        }
        match operand.semantic {
            OperandSemantic::In => args.push(expr),
            OperandSemantic::Out => targets.push(expr),
            OperandSemantic::InOut => {
                args.push(expr.clone());
                targets.push(expr);
            }
        }
    }

    if targets.len() != 1 {
        return Err(ShaderGenError::BadOutputCount {
            function: atom.function_name.clone(),
            found: targets.len(),
        });
    }
    let target = &targets[0];
    if atom.function_name == FFP_FUNC_ASSIGN {
        let value = args.first().cloned().unwrap_or_default();
        return Ok(format!("{target} = {value};"));
    }
    Ok(format!(
        "{target} = {}({});",
        atom.function_name,
        args.join(", ")
    ))
}

fn operand_expr(
    program: &Program,
    param: ParamRef,
    mask: crate::operand::OpMask,
) -> Result<String, ShaderGenError> {
    if let ParamRef::Uniform(_) = param {
        let u = program
            .uniform(param)
            .ok_or_else(|| ShaderGenError::UnknownParameter(format!("{param:?}")))?;
        if let (true, Some(unit)) = (u.ty.is_sampler(), u.index) {
            return Ok(format!(
                "{}, {}",
                UniformParameter::texture_name(unit),
                UniformParameter::sampler_name(unit)
            ));
        }
        let mask = if u.array_size.is_some() {
            crate::operand::OpMask::ALL
        } else {
            mask
        };
        return Ok(format!("{}{}", u.name, swizzle(u.ty, mask)));
    }

    let main = program.entry_point();
    let p = main
        .parameter(param)
        .ok_or_else(|| ShaderGenError::UnknownParameter(format!("{param:?}")))?;
    let base = match param {
        ParamRef::Input(_) => format!("input.{}", p.name),
        ParamRef::Output(_) => format!("out.{}", p.name),
        _ => p.name.clone(),
    };
    Ok(format!("{base}{}", swizzle(p.ty, mask)))
}

/// Scalars and matrices take no swizzle.
fn swizzle(ty: GpuConstantType, mask: crate::operand::OpMask) -> String {
    if !(2..=4).contains(&ty.component_count()) {
        return String::new();
    }
    mask.swizzle()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{Pass, TextureUnitState};
    use crate::operand::OpMask;
    use crate::render_state::RenderState;

    fn textured_shader() -> GeneratedShader {
        let pass = Pass::new("p").with_texture_unit(TextureUnitState::new("a.png"));
        let mut state = RenderState::for_pass(&pass, &[]);
        let programs = state.build_programs().unwrap();
        WgslWriter::new(&LibraryRegistry::new())
            .write(&programs)
            .unwrap()
    }

    #[test]
    fn writes_entry_points_and_bindings() {
        let shader = textured_shader();
        let src = &shader.source;
        assert!(src.contains("@vertex\nfn vs_main(input: VertexInput) -> VertexOutput {"));
        assert!(src.contains("@fragment\nfn fs_main(input: FragmentInput) -> FragmentOutput {"));
        assert!(src.contains("var<uniform> world_view_proj: mat4x4<f32>;"));
        assert!(src.contains("@group(1) @binding(0) var texture_0: texture_2d<f32>;"));
        assert!(src.contains("@group(1) @binding(1) var sampler_0: sampler;"));
        assert!(src.contains("out.position = gk_transform(world_view_proj, input.position);"));
        assert!(src.contains("texel_0 = gk_sample_texture(texture_0, sampler_0, input.texcoord_0.xy);"));
        assert!(src.contains("out.colour_0 = gk_modulate(out.colour_0, texel_0);"));
    }

    #[test]
    fn colour_seed_precedes_modulate() {
        let src = textured_shader().source;
        let seed = src.find("out.colour_0 = diffuse_colour;").unwrap();
        let sample = src.find("texel_0 = gk_sample_texture").unwrap();
        let modulate = src.find("out.colour_0 = gk_modulate").unwrap();
        assert!(seed < sample && sample < modulate);
    }

    #[test]
    fn vertex_input_locations() {
        let shader = textured_shader();
        let locs: Vec<(u32, &str)> = shader
            .vertex_inputs
            .iter()
            .map(|s| (s.location, s.name.as_str()))
            .collect();
        assert_eq!(locs, [(0, "position"), (1, "texcoord_0")]);
    }

    #[test]
    fn buffer_sizes() {
        let shader = textured_shader();
        assert_eq!(shader.uniform("world_view_proj").unwrap().buffer_size(), Some(64));
        assert_eq!(shader.uniform("diffuse_colour").unwrap().buffer_size(), Some(16));
        assert_eq!(shader.uniform("sampler_0").unwrap().buffer_size(), None);
    }

    #[test]
    fn missing_library_is_reported() {
        let mut programs = ProgramSet::new();
        programs.fragment.add_dependency("nope");
        let err = WgslWriter::new(&LibraryRegistry::new())
            .write(&programs)
            .unwrap_err();
        assert!(matches!(err, ShaderGenError::MissingLibrary(name) if name == "nope"));
    }

    #[test]
    fn indexed_operand_and_scalar_mask() {
        let mut programs = ProgramSet::new();
        let vs = &mut programs.vertex;
        let table = vs
            .resolve_parameter(
                GpuConstantType::Float4,
                None,
                crate::parameter::Variability::Global,
                "table",
                Some(3),
            )
            .unwrap();
        let main = vs.entry_point_mut();
        let idx = main
            .resolve_input_parameter(
                Semantic::TextureCoordinates,
                Some(2),
                crate::parameter::Content::Unknown,
                GpuConstantType::Float1,
            )
            .unwrap();
        let dst = main
            .resolve_output_parameter(
                Semantic::TextureCoordinates,
                None,
                crate::parameter::Content::Unknown,
                GpuConstantType::Float4,
            )
            .unwrap();
        let atom = FunctionInvocation::new(FFP_FUNC_ASSIGN, 0, 0)
            .input(table)
            .indexed_operand(idx, OperandSemantic::In, OpMask::X, 1)
            .output(dst);
        assert_eq!(
            statement(vs, &atom).unwrap(),
            "out.texcoord_0 = table[u32(input.texcoord_2)];"
        );
    }

    #[test]
    fn unknown_local_is_reported() {
        let programs = ProgramSet::new();
        let atom = FunctionInvocation::new("f", 0, 0)
            .output(ParamRef::Local(0));
        assert!(matches!(
            statement(&programs.fragment, &atom),
            Err(ShaderGenError::UnknownParameter(_))
        ));
    }

    #[test]
    fn two_outputs_is_an_error() {
        let mut programs = ProgramSet::new();
        let main = programs.fragment.entry_point_mut();
        let a = main
            .resolve_local_parameter("a", GpuConstantType::Float4)
            .unwrap();
        let b = main
            .resolve_local_parameter("b", GpuConstantType::Float4)
            .unwrap();
        let atom = FunctionInvocation::new("f", 0, 0).output(a).output(b);
        assert!(matches!(
            statement(&programs.fragment, &atom),
            Err(ShaderGenError::BadOutputCount { found: 2, .. })
        ));
    }
}
