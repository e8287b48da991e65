//! Built-in fixed-function stages: transform, diffuse colour, texturing.

use std::any::Any;

use crate::error::ShaderGenError;
use crate::material::{Pass, TextureType};
use crate::operand::{FunctionInvocation, OpMask, OperandSemantic};
use crate::parameter::{Content, GpuConstantType, ParamRef, Semantic, Variability};
use crate::program::ProgramSet;
use crate::render_state::SubRenderState;

// Stage execution order.
pub const FFP_TRANSFORM: i32 = 100;
pub const FFP_COLOUR: i32 = 200;
pub const FFP_LIGHTING: i32 = 300;
pub const FFP_TEXTURING: i32 = 400;

// Vertex group order.
pub const FFP_VS_TRANSFORM: i32 = 100;
pub const FFP_VS_COLOUR: i32 = 200;
pub const FFP_VS_LIGHTING: i32 = 300;
pub const FFP_VS_TEXTURING: i32 = 400;

// Fragment group order.
pub const FFP_PS_COLOUR_BEGIN: i32 = 100;
pub const FFP_PS_SAMPLING: i32 = 150;
pub const FFP_PS_TEXTURING: i32 = 200;

/// Pseudo-function written as a plain assignment.
pub const FFP_FUNC_ASSIGN: &str = "gk_assign";
pub const FFP_FUNC_TRANSFORM: &str = "gk_transform";
pub const FFP_FUNC_SAMPLE_TEXTURE: &str = "gk_sample_texture";
pub const FFP_FUNC_MODULATE: &str = "gk_modulate";

pub const FFP_LIB_COMMON: &str = "gk_common";

pub const WORLD_VIEW_PROJ: &str = "world_view_proj";
pub const DIFFUSE_COLOUR: &str = "diffuse_colour";

/// Prefix of the fragment local holding a unit's sampled colour.
pub const TEXEL_PREFIX: &str = "texel_";

pub const COMMON_LIBRARY_WGSL: &str = r#"
fn gk_transform(m: mat4x4<f32>, p: vec3<f32>) -> vec4<f32> {
    return m * vec4<f32>(p, 1.0);
}

fn gk_sample_texture(t: texture_2d<f32>, s: sampler, uv: vec2<f32>) -> vec4<f32> {
    return textureSample(t, s, uv);
}

fn gk_modulate(a: vec4<f32>, b: vec4<f32>) -> vec4<f32> {
    return a * b;
}
"#;

pub fn texel_name(unit: u16) -> String {
    format!("{TEXEL_PREFIX}{unit}")
}

/// Object-space position to clip space.
#[derive(Debug, Clone, Default)]
pub struct FfpTransform {
    wvp: Option<ParamRef>,
    position_in: Option<ParamRef>,
    position_out: Option<ParamRef>,
}

impl FfpTransform {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SubRenderState for FfpTransform {
    fn type_name(&self) -> &'static str {
        "FFP_Transform"
    }

    fn execution_order(&self) -> i32 {
        FFP_TRANSFORM
    }

    fn resolve_parameters(&mut self, programs: &mut ProgramSet) -> Result<(), ShaderGenError> {
        let vs = &mut programs.vertex;
        self.wvp = Some(vs.resolve_parameter(
            GpuConstantType::Matrix4,
            None,
            Variability::Auto,
            WORLD_VIEW_PROJ,
            None,
        )?);
        let main = vs.entry_point_mut();
        self.position_in = Some(main.resolve_input_parameter(
            Semantic::Position,
            Some(0),
            Content::PositionObjectSpace,
            GpuConstantType::Float3,
        )?);
        self.position_out = Some(main.resolve_output_parameter(
            Semantic::Position,
            Some(0),
            Content::PositionProjectiveSpace,
            GpuConstantType::Float4,
        )?);
        Ok(())
    }

    fn resolve_dependencies(&mut self, programs: &mut ProgramSet) -> Result<(), ShaderGenError> {
        programs.vertex.add_dependency(FFP_LIB_COMMON);
        Ok(())
    }

    fn add_function_invocations(
        &mut self,
        programs: &mut ProgramSet,
    ) -> Result<(), ShaderGenError> {
        let (Some(wvp), Some(pos_in), Some(pos_out)) =
            (self.wvp, self.position_in, self.position_out)
        else {
            return Err(not_resolved(self.type_name()));
        };
        programs.vertex.entry_point_mut().add_atom_instance(
            FunctionInvocation::new(FFP_FUNC_TRANSFORM, FFP_VS_TRANSFORM, 0)
                .input(wvp)
                .input(pos_in)
                .output(pos_out),
        );
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Seeds the fragment colour with the pass's diffuse colour.
#[derive(Debug, Clone, Default)]
pub struct FfpColour {
    diffuse: Option<ParamRef>,
    colour_out: Option<ParamRef>,
    uploaded: Option<[f32; 4]>,
}

impl FfpColour {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SubRenderState for FfpColour {
    fn type_name(&self) -> &'static str {
        "FFP_Colour"
    }

    fn execution_order(&self) -> i32 {
        FFP_COLOUR
    }

    fn resolve_parameters(&mut self, programs: &mut ProgramSet) -> Result<(), ShaderGenError> {
        let fs = &mut programs.fragment;
        self.diffuse = Some(fs.resolve_parameter(
            GpuConstantType::Float4,
            None,
            Variability::PerObject,
            DIFFUSE_COLOUR,
            None,
        )?);
        self.colour_out = Some(fs.entry_point_mut().resolve_output_parameter(
            Semantic::Colour,
            Some(0),
            Content::ColourDiffuse,
            GpuConstantType::Float4,
        )?);
        Ok(())
    }

    fn resolve_dependencies(&mut self, _programs: &mut ProgramSet) -> Result<(), ShaderGenError> {
        Ok(())
    }

    fn add_function_invocations(
        &mut self,
        programs: &mut ProgramSet,
    ) -> Result<(), ShaderGenError> {
        let (Some(diffuse), Some(out)) = (self.diffuse, self.colour_out) else {
            return Err(not_resolved(self.type_name()));
        };
        programs.fragment.entry_point_mut().add_atom_instance(
            FunctionInvocation::new(FFP_FUNC_ASSIGN, FFP_PS_COLOUR_BEGIN, 0)
                .input(diffuse)
                .output(out),
        );
        Ok(())
    }

    fn update_gpu_program_params(&mut self, pass: &mut Pass) {
        if self.uploaded != Some(pass.diffuse) {
            pass.fragment_params
                .set_named_constant(DIFFUSE_COLOUR, &pass.diffuse);
            self.uploaded = Some(pass.diffuse);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Samples every 2D texture unit into `texel_<n>` and modulates it into
/// the output colour.
#[derive(Debug, Clone, Default)]
pub struct FfpTexturing {
    units: Vec<usize>,
}

impl FfpTexturing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indices of the units this stage samples.
    pub fn units(&self) -> &[usize] {
        &self.units
    }
}

impl SubRenderState for FfpTexturing {
    fn type_name(&self) -> &'static str {
        "FFP_Texturing"
    }

    fn execution_order(&self) -> i32 {
        FFP_TEXTURING
    }

    fn pre_add_to_render_state(&mut self, src_pass: &Pass) -> bool {
        self.units = src_pass
            .texture_units
            .iter()
            .enumerate()
            .filter_map(|(i, unit)| {
                if unit.texture_type == TextureType::D2 {
                    Some(i)
                } else {
                    tracing::warn!(
                        pass = %src_pass.name,
                        unit = i,
                        texture = %unit.texture_name,
                        "only 2D texture units are sampled"
                    );
                    None
                }
            })
            .collect();
        !self.units.is_empty()
    }

    fn resolve_parameters(&mut self, programs: &mut ProgramSet) -> Result<(), ShaderGenError> {
        for &unit in &self.units {
            let index = unit as u16;
            let vs = programs.vertex.entry_point_mut();
            vs.resolve_input_parameter(
                Semantic::TextureCoordinates,
                Some(index),
                Content::TextureCoordinate(index),
                GpuConstantType::Float2,
            )?;
            vs.resolve_output_parameter(
                Semantic::TextureCoordinates,
                Some(index),
                Content::TextureCoordinate(index),
                GpuConstantType::Float2,
            )?;

            let fs = &mut programs.fragment;
            fs.resolve_parameter(
                GpuConstantType::Sampler2d,
                Some(index),
                Variability::Global,
                "",
                None,
            )?;
            let main = fs.entry_point_mut();
            main.resolve_input_parameter(
                Semantic::TextureCoordinates,
                Some(index),
                Content::TextureCoordinate(index),
                GpuConstantType::Float2,
            )?;
            main.resolve_local_parameter(&texel_name(index), GpuConstantType::Float4)?;
            main.resolve_output_parameter(
                Semantic::Colour,
                Some(0),
                Content::ColourDiffuse,
                GpuConstantType::Float4,
            )?;
        }
        Ok(())
    }

    fn resolve_dependencies(&mut self, programs: &mut ProgramSet) -> Result<(), ShaderGenError> {
        programs.fragment.add_dependency(FFP_LIB_COMMON);
        Ok(())
    }

    fn add_function_invocations(
        &mut self,
        programs: &mut ProgramSet,
    ) -> Result<(), ShaderGenError> {
        use crate::parameter::ParamList;

        for (order, &unit) in self.units.iter().enumerate() {
            let index = unit as u16;
            let order = order as i32;

            let vs = programs.vertex.entry_point_mut();
            let (Some(tc_in), Some(tc_out)) = (
                vs.parameter_by_semantic(ParamList::Input, Semantic::TextureCoordinates, index),
                vs.parameter_by_semantic(ParamList::Output, Semantic::TextureCoordinates, index),
            ) else {
                return Err(not_resolved(self.type_name()));
            };
            vs.add_atom_instance(
                FunctionInvocation::new(FFP_FUNC_ASSIGN, FFP_VS_TEXTURING, order)
                    .input(tc_in)
                    .output(tc_out),
            );

            let fs = &mut programs.fragment;
            let sampler = fs.parameter_by_type(GpuConstantType::Sampler2d, index);
            let main = fs.entry_point_mut();
            let (Some(sampler), Some(texcoord), Some(texel), Some(colour)) = (
                sampler,
                main.parameter_by_semantic(ParamList::Input, Semantic::TextureCoordinates, index),
                main.parameter_by_name(ParamList::Local, &texel_name(index)),
                main.parameter_by_semantic(ParamList::Output, Semantic::Colour, 0),
            ) else {
                return Err(not_resolved(self.type_name()));
            };
            main.add_atom_instance(
                FunctionInvocation::new(FFP_FUNC_SAMPLE_TEXTURE, FFP_PS_SAMPLING, order)
                    .input(sampler)
                    .operand(texcoord, OperandSemantic::In, OpMask::XY)
                    .output(texel),
            );
            main.add_atom_instance(
                FunctionInvocation::new(FFP_FUNC_MODULATE, FFP_PS_TEXTURING, order)
                    .input(colour)
                    .input(texel)
                    .output(colour),
            );
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn not_resolved(name: &'static str) -> ShaderGenError {
    ShaderGenError::NotPrepared {
        name,
        reason: "parameters were not resolved".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::TextureUnitState;
    use crate::render_state::RenderState;

    #[test]
    fn texturing_declares_texel_and_sampler_per_unit() {
        let pass = Pass::new("p")
            .with_texture_unit(TextureUnitState::new("a.png"))
            .with_texture_unit(TextureUnitState::new("b.png"));
        let mut state = RenderState::for_pass(&pass, &[]);
        let programs = state.build_programs().unwrap();

        let fs = &programs.fragment;
        assert!(fs.parameter_by_type(GpuConstantType::Sampler2d, 0).is_some());
        assert!(fs.parameter_by_type(GpuConstantType::Sampler2d, 1).is_some());
        let main = fs.entry_point();
        assert_eq!(main.locals().len(), 2);
        assert_eq!(main.locals()[1].name, "texel_1");
        // one sample + one modulate per unit, plus the colour seed
        assert_eq!(main.atom_count(), 5);
        assert_eq!(programs.vertex.entry_point().outputs().len(), 3);
    }

    #[test]
    fn diffuse_uploads_only_on_change() {
        let mut pass = Pass::new("p");
        let mut colour = FfpColour::new();
        colour.update_gpu_program_params(&mut pass);
        colour.update_gpu_program_params(&mut pass);
        assert_eq!(pass.fragment_params.upload_count(DIFFUSE_COLOUR), 1);

        pass.diffuse = [0.5, 0.5, 0.5, 1.0];
        colour.update_gpu_program_params(&mut pass);
        assert_eq!(pass.fragment_params.upload_count(DIFFUSE_COLOUR), 2);
    }

    #[test]
    fn invocations_before_resolve_fail() {
        let mut programs = ProgramSet::new();
        let err = FfpTransform::new()
            .add_function_invocations(&mut programs)
            .unwrap_err();
        assert!(matches!(err, ShaderGenError::NotPrepared { .. }));
    }
}
