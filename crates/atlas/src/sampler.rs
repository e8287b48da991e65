//! The atlas sampler shader stage.

use std::any::Any;
use std::sync::Arc;

use gamekit_shadergen::ffp::{
    FFP_FUNC_ASSIGN, FFP_LIB_COMMON, FFP_PS_SAMPLING, FFP_PS_TEXTURING, FFP_TEXTURING,
    FFP_VS_LIGHTING, FFP_VS_TEXTURING, texel_name,
};
use gamekit_shadergen::{
    Content, FunctionInvocation, GpuConstantType, OpMask, OperandSemantic, ParamList, ParamRef,
    Pass, ProgramSet, Semantic, ShaderGenError, SubRenderState, SubRenderStateFactory,
    TextureType, UvwAddressingMode, Variability,
};

use gamekit_shadergen::writer::MAX_TEXTURE_COORDINATES;

use crate::library::{ATLAS_FUNC_SAMPLE, ATLAS_LIBRARY, addressing_function_name};
use crate::record::{TextureAtlasTable, flatten_table};
use crate::registry::{AtlasRegistry, IndexPositionMode};

/// Most atlas-mapped units one pass can carry.
pub const MAX_ATLAS_TEXTURES: usize = 4;

/// Vertex uniform holding `[u, v, width, height]` per table record.
pub const ATLAS_DATA: &str = "atlas_data";

/// Fragment local receiving the addressed coordinate.
pub const ATLAS_COORD: &str = "atlas_coord";

/// Redirects texture lookups of atlas-mapped units into their sub-rectangle.
///
/// The vertex shader reads one table index per atlas unit from an extra
/// texcoord slot and forwards the matching record to the fragment shader,
/// which addresses the unit's own coordinate and samples the atlas region in
/// place of the plain texture sample.
#[derive(Debug, Clone, Default)]
pub struct TextureAtlasSampler {
    atlas_texcoord_pos: u16,
    atlas_texture_start: usize,
    atlas_texture_count: usize,
    addressing: [UvwAddressingMode; MAX_ATLAS_TEXTURES],
    atlas_texture_name: String,
    table: Option<Arc<TextureAtlasTable>>,
    table_data_uploaded: bool,

    vs_texture_table: Option<ParamRef>,
    vs_table_index: Option<ParamRef>,
    vs_out_texture_data: Vec<ParamRef>,
    ps_in_texture_data: Vec<ParamRef>,
}

impl TextureAtlasSampler {
    pub const TYPE_NAME: &'static str = "GK_TextureAtlasSampler";

    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `src_pass` for a run of atlas-mapped units.
    ///
    /// The run starts at the first unit with a table and ends at the first
    /// unit without one, at a unit using a different table, or after
    /// [`MAX_ATLAS_TEXTURES`] units. A non-2D atlas unit cancels the run.
    /// Returns whether any unit will be redirected.
    pub fn prepare(&mut self, registry: &AtlasRegistry, src_pass: &Pass) -> bool {
        *self = Self::default();

        for (unit_index, unit) in src_pass.texture_units.iter().enumerate() {
            let Some(table) = registry.texture_atlas_table(&unit.texture_name) else {
                if self.table.is_some() {
                    break;
                }
                continue;
            };

            if unit.texture_type != TextureType::D2 {
                tracing::warn!(
                    pass = %src_pass.name,
                    unit = unit_index,
                    texture = %unit.texture_name,
                    "atlas textures must be 2D; atlas sampling disabled for pass"
                );
                self.atlas_texture_count = 0;
                self.table = None;
                break;
            }

            match self.table.as_ref().map(|current| Arc::ptr_eq(current, table)) {
                None => {
                    self.table = Some(Arc::clone(table));
                    self.atlas_texture_start = unit_index;
                    self.atlas_texture_name = unit.texture_name.clone();
                }
                Some(false) => {
                    tracing::debug!(
                        pass = %src_pass.name,
                        unit = unit_index,
                        "different atlas table ends the run"
                    );
                    break;
                }
                Some(true) => {}
            }

            self.addressing[self.atlas_texture_count] = unit.addressing;
            self.atlas_texture_count += 1;
            if self.atlas_texture_count == MAX_ATLAS_TEXTURES {
                break;
            }
        }

        let offset = registry.table_index_position_offset();
        let position = match registry.table_index_position_mode() {
            IndexPositionMode::Relative => {
                let last_unit = src_pass.texture_units.len().saturating_sub(1);
                u16::try_from(last_unit)
                    .ok()
                    .and_then(|last_unit| offset.checked_add(last_unit))
            }
            IndexPositionMode::Absolute => Some(offset),
        };
        let Some(position) = position.filter(|&pos| u32::from(pos) < MAX_TEXTURE_COORDINATES)
        else {
            if self.atlas_texture_count != 0 {
                tracing::warn!(
                    pass = %src_pass.name,
                    offset,
                    units = src_pass.texture_units.len(),
                    "atlas index texcoord slot out of range; atlas sampling disabled for pass"
                );
            }
            *self = Self::default();
            return false;
        };
        self.atlas_texcoord_pos = position;

        tracing::debug!(
            pass = %src_pass.name,
            start = self.atlas_texture_start,
            count = self.atlas_texture_count,
            texcoord = self.atlas_texcoord_pos,
            "atlas units classified"
        );
        self.atlas_texture_count != 0
    }

    /// Texcoord slot carrying the per-vertex table indices.
    pub fn atlas_texcoord_pos(&self) -> u16 {
        self.atlas_texcoord_pos
    }

    /// Index of the first redirected texture unit.
    pub fn atlas_texture_start(&self) -> usize {
        self.atlas_texture_start
    }

    pub fn atlas_texture_count(&self) -> usize {
        self.atlas_texture_count
    }

    /// Addressing modes of the redirected units, in unit order.
    pub fn addressing_modes(&self) -> &[UvwAddressingMode] {
        &self.addressing[..self.atlas_texture_count]
    }

    pub fn table(&self) -> Option<&Arc<TextureAtlasTable>> {
        self.table.as_ref()
    }

    /// Force the next parameter update to upload the table again.
    pub fn mark_table_stale(&mut self) {
        self.table_data_uploaded = false;
    }

    /// Pick up a replaced table for the bound atlas texture.
    ///
    /// Only a table with the same record count is taken, since the uniform
    /// array size is fixed in the generated shader. Returns whether the
    /// table changed.
    pub fn refresh_table(&mut self, registry: &AtlasRegistry) -> bool {
        let (Some(current), Some(latest)) = (
            self.table.as_ref(),
            registry.texture_atlas_table(&self.atlas_texture_name),
        ) else {
            return false;
        };
        if Arc::ptr_eq(current, latest) {
            return false;
        }
        if current.len() != latest.len() {
            tracing::warn!(
                atlas = %self.atlas_texture_name,
                bound = current.len(),
                latest = latest.len(),
                "atlas table size changed; shader must be rebuilt"
            );
            return false;
        }
        self.table = Some(Arc::clone(latest));
        self.table_data_uploaded = false;
        true
    }

    fn not_prepared(reason: &str) -> ShaderGenError {
        ShaderGenError::NotPrepared {
            name: Self::TYPE_NAME,
            reason: reason.into(),
        }
    }
}

impl SubRenderState for TextureAtlasSampler {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn execution_order(&self) -> i32 {
        FFP_TEXTURING + 25
    }

    fn resolve_parameters(&mut self, programs: &mut ProgramSet) -> Result<(), ShaderGenError> {
        let table_len = self
            .table
            .as_ref()
            .map(|t| t.len())
            .ok_or_else(|| Self::not_prepared("no atlas table bound"))?;
        let index_ty = GpuConstantType::float_vector(self.atlas_texture_count.min(4))
            .ok_or_else(|| Self::not_prepared("no atlas units"))?;

        let vs = &mut programs.vertex;
        self.vs_texture_table = Some(vs.resolve_parameter(
            GpuConstantType::Float4,
            None,
            Variability::Global,
            ATLAS_DATA,
            Some(table_len),
        )?);
        self.vs_table_index = Some(vs.entry_point_mut().resolve_input_parameter(
            Semantic::TextureCoordinates,
            Some(self.atlas_texcoord_pos),
            Content::TextureCoordinate(self.atlas_texcoord_pos),
            index_ty,
        )?);

        self.vs_out_texture_data.clear();
        self.ps_in_texture_data.clear();
        for _ in 0..self.atlas_texture_count {
            let vs_main = programs.vertex.entry_point_mut();
            let out = vs_main.resolve_output_parameter(
                Semantic::TextureCoordinates,
                None,
                Content::Unknown,
                GpuConstantType::Float4,
            )?;
            let index = vs_main
                .parameter(out)
                .map(|p| p.index)
                .ok_or_else(|| ShaderGenError::UnknownParameter(format!("{out:?}")))?;
            let input = programs.fragment.entry_point_mut().resolve_input_parameter(
                Semantic::TextureCoordinates,
                Some(index),
                Content::Unknown,
                GpuConstantType::Float4,
            )?;
            self.vs_out_texture_data.push(out);
            self.ps_in_texture_data.push(input);
        }
        Ok(())
    }

    fn resolve_dependencies(&mut self, programs: &mut ProgramSet) -> Result<(), ShaderGenError> {
        programs.vertex.add_dependency(FFP_LIB_COMMON);
        programs.fragment.add_dependency(ATLAS_LIBRARY);
        Ok(())
    }

    fn add_function_invocations(
        &mut self,
        programs: &mut ProgramSet,
    ) -> Result<(), ShaderGenError> {
        let (Some(table), Some(index)) = (self.vs_texture_table, self.vs_table_index) else {
            return Err(Self::not_prepared("parameters not resolved"));
        };

        let group_order = (FFP_VS_TEXTURING - FFP_VS_LIGHTING) / 2;
        let vs_main = programs.vertex.entry_point_mut();
        for (i, &out) in self.vs_out_texture_data.iter().enumerate() {
            vs_main.add_atom_instance(
                FunctionInvocation::new(FFP_FUNC_ASSIGN, group_order, i as i32)
                    .input(table)
                    .indexed_operand(index, OperandSemantic::In, OpMask::component(i), 1)
                    .output(out),
            );
        }

        let group_order = (FFP_PS_SAMPLING + FFP_PS_TEXTURING) / 2;
        let fs = &mut programs.fragment;
        let atlas_coord = fs
            .entry_point_mut()
            .resolve_local_parameter(ATLAS_COORD, GpuConstantType::Float2)?;

        let mut internal_order = 0;
        for (j, &data) in self.ps_in_texture_data.iter().enumerate() {
            let unit = (self.atlas_texture_start + j) as u16;
            let addressing = self.addressing[j];
            let main = fs.entry_point();
            let (Some(texcoord), Some(texel), Some(sampler), Some(address_u), Some(address_v)) = (
                main.parameter_by_semantic(ParamList::Input, Semantic::TextureCoordinates, unit),
                main.parameter_by_name(ParamList::Local, &texel_name(unit)),
                fs.parameter_by_type(GpuConstantType::Sampler2d, unit),
                addressing_function_name(addressing.u),
                addressing_function_name(addressing.v),
            ) else {
                tracing::debug!(unit, "atlas unit has no sampling inputs; left unchanged");
                continue;
            };

            let main = fs.entry_point_mut();
            main.add_atom_instance(
                FunctionInvocation::new(address_u, group_order, internal_order)
                    .operand(texcoord, OperandSemantic::In, OpMask::X)
                    .operand(atlas_coord, OperandSemantic::Out, OpMask::X),
            );
            internal_order += 1;
            main.add_atom_instance(
                FunctionInvocation::new(address_v, group_order, internal_order)
                    .operand(texcoord, OperandSemantic::In, OpMask::Y)
                    .operand(atlas_coord, OperandSemantic::Out, OpMask::Y),
            );
            internal_order += 1;
            main.add_atom_instance(
                FunctionInvocation::new(ATLAS_FUNC_SAMPLE, group_order, internal_order)
                    .input(sampler)
                    .operand(texcoord, OperandSemantic::In, OpMask::XY)
                    .input(atlas_coord)
                    .input(data)
                    .output(texel),
            );
            internal_order += 1;
        }
        Ok(())
    }

    /// Upload the table once; later calls are no-ops until it goes stale.
    fn update_gpu_program_params(&mut self, pass: &mut Pass) {
        if self.table_data_uploaded {
            return;
        }
        let Some(table) = &self.table else {
            return;
        };
        pass.vertex_params
            .set_named_constant(ATLAS_DATA, &flatten_table(table));
        self.table_data_uploaded = true;
        tracing::debug!(pass = %pass.name, records = table.len(), "atlas table uploaded");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Adds a [`TextureAtlasSampler`] to passes that bind atlas textures.
pub struct AtlasSamplerFactory<'r> {
    registry: &'r AtlasRegistry,
}

impl<'r> AtlasSamplerFactory<'r> {
    pub fn new(registry: &'r AtlasRegistry) -> Self {
        Self { registry }
    }
}

impl SubRenderStateFactory for AtlasSamplerFactory<'_> {
    fn type_name(&self) -> &'static str {
        TextureAtlasSampler::TYPE_NAME
    }

    fn create_for_pass(&self, pass: &Pass) -> Option<Box<dyn SubRenderState>> {
        let mut sampler = TextureAtlasSampler::new();
        if !sampler.prepare(self.registry, pass) {
            return None;
        }
        Some(Box::new(sampler))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamekit_shadergen::ffp::FfpTransform;
    use gamekit_shadergen::{
        RenderState, TextureAddressingMode, TextureUnitState, WgslWriter,
    };
    use std::io::Cursor;

    const DEFINITION: &str = "\
a.png, atlas.png, 0, 2D, 0.0, 0.0, 0.0, 0.5, 0.5
b.png, atlas.png, 1, 2D, 0.5, 0.0, 0.0, 0.5, 0.5
c.png, other.png, 0, 2D, 0.0, 0.0, 0.0, 1.0, 1.0
";

    fn registry() -> AtlasRegistry {
        let mut registry = AtlasRegistry::new();
        registry
            .add_texture_atlas_definition(Cursor::new(DEFINITION))
            .unwrap();
        registry
    }

    fn pass(textures: &[&str]) -> Pass {
        textures.iter().fold(Pass::new("test"), |pass, name| {
            pass.with_texture_unit(TextureUnitState::new(*name))
        })
    }

    fn prepared(registry: &AtlasRegistry, pass: &Pass) -> (bool, TextureAtlasSampler) {
        let mut sampler = TextureAtlasSampler::new();
        let accepted = sampler.prepare(registry, pass);
        (accepted, sampler)
    }

    fn wgsl(registry: &AtlasRegistry, pass: &Pass) -> String {
        let factory = AtlasSamplerFactory::new(registry);
        let factories: [&dyn SubRenderStateFactory; 1] = [&factory];
        let mut state = RenderState::for_pass(pass, &factories);
        let programs = state.build_programs().unwrap();
        WgslWriter::new(&crate::library::shader_libraries())
            .write(&programs)
            .unwrap()
            .source
    }

    #[test]
    fn run_stops_at_first_plain_unit() {
        let registry = registry();
        let (accepted, sampler) = prepared(
            &registry,
            &pass(&["atlas.png", "atlas.png", "plain.png", "atlas.png"]),
        );
        assert!(accepted);
        assert_eq!(sampler.atlas_texture_start(), 0);
        assert_eq!(sampler.atlas_texture_count(), 2);
    }

    #[test]
    fn run_may_start_after_plain_units() {
        let registry = registry();
        let (accepted, sampler) = prepared(&registry, &pass(&["plain.png", "atlas.png"]));
        assert!(accepted);
        assert_eq!(sampler.atlas_texture_start(), 1);
        assert_eq!(sampler.atlas_texture_count(), 1);
    }

    #[test]
    fn pass_without_atlas_is_rejected() {
        let registry = registry();
        let (accepted, sampler) = prepared(&registry, &pass(&["plain.png"]));
        assert!(!accepted);
        assert!(sampler.table().is_none());
        assert!(
            AtlasSamplerFactory::new(&registry)
                .create_for_pass(&pass(&["plain.png"]))
                .is_none()
        );
    }

    #[test]
    fn non_2d_atlas_unit_aborts() {
        let registry = registry();
        let pass = pass(&["atlas.png"])
            .with_texture_unit(TextureUnitState::new("atlas.png").with_type(TextureType::D3));
        let (accepted, sampler) = prepared(&registry, &pass);
        assert!(!accepted);
        assert_eq!(sampler.atlas_texture_count(), 0);
    }

    #[test]
    fn more_than_four_units_truncate() {
        let registry = registry();
        let (accepted, sampler) = prepared(&registry, &pass(&["atlas.png"; 5]));
        assert!(accepted);
        assert_eq!(sampler.atlas_texture_count(), MAX_ATLAS_TEXTURES);
    }

    #[test]
    fn different_table_ends_run() {
        let registry = registry();
        let (_, sampler) = prepared(&registry, &pass(&["atlas.png", "other.png", "atlas.png"]));
        assert_eq!(sampler.atlas_texture_count(), 1);
        let table = registry.texture_atlas_table("atlas.png").unwrap();
        assert!(Arc::ptr_eq(sampler.table().unwrap(), table));
    }

    #[test]
    fn shared_table_under_two_names_is_one_run() {
        let mut registry = registry();
        let table = Arc::clone(registry.texture_atlas_table("atlas.png").unwrap());
        registry.set_texture_atlas_table("alias.png", Some(table));
        let (_, sampler) = prepared(&registry, &pass(&["atlas.png", "alias.png"]));
        assert_eq!(sampler.atlas_texture_count(), 2);
    }

    #[test]
    fn addressing_modes_are_recorded_per_unit() {
        let registry = registry();
        let pass = Pass::new("modes")
            .with_texture_unit(TextureUnitState::new("atlas.png"))
            .with_texture_unit(TextureUnitState::new("atlas.png").with_addressing(
                UvwAddressingMode::uniform(TextureAddressingMode::Mirror),
            ));
        let (_, sampler) = prepared(&registry, &pass);
        let modes: Vec<TextureAddressingMode> =
            sampler.addressing_modes().iter().map(|m| m.u).collect();
        assert_eq!(
            modes,
            [TextureAddressingMode::Wrap, TextureAddressingMode::Mirror]
        );
    }

    #[test]
    fn index_position_follows_registry_mode() {
        let mut registry = registry();
        let three = pass(&["atlas.png", "plain.png", "plain.png"]);

        let (_, sampler) = prepared(&registry, &three);
        assert_eq!(sampler.atlas_texcoord_pos(), 3);

        registry
            .set_table_index_position(IndexPositionMode::Absolute, 2)
            .unwrap();
        let (_, sampler) = prepared(&registry, &three);
        assert_eq!(sampler.atlas_texcoord_pos(), 2);
    }

    #[test]
    fn index_position_out_of_range_disables_atlas() {
        let mut registry = registry();
        let two = pass(&["atlas.png", "x.png"]);

        registry
            .set_table_index_position(IndexPositionMode::Relative, u16::MAX)
            .unwrap();
        let (accepted, sampler) = prepared(&registry, &two);
        assert!(!accepted);
        assert_eq!(sampler.atlas_texture_count(), 0);
        assert!(sampler.table().is_none());

        registry
            .set_table_index_position(IndexPositionMode::Absolute, 16)
            .unwrap();
        assert!(!prepared(&registry, &two).0);

        registry
            .set_table_index_position(IndexPositionMode::Relative, 15)
            .unwrap();
        assert!(!prepared(&registry, &two).0);

        registry
            .set_table_index_position(IndexPositionMode::Absolute, 15)
            .unwrap();
        let (accepted, sampler) = prepared(&registry, &two);
        assert!(accepted);
        assert_eq!(sampler.atlas_texcoord_pos(), 15);
    }

    #[test]
    fn single_unit_shader() {
        let registry = registry();
        let src = wgsl(&registry, &pass(&["atlas.png"]));

        assert!(src.contains("var<uniform> atlas_data: array<vec4<f32>, 2>;"));
        assert!(src.contains("out.texcoord_1 = atlas_data[u32(input.texcoord_1)];"));
        assert!(src.contains("var atlas_coord: vec2<f32>;"));
        assert!(src.contains("atlas_coord.x = gk_atlas_wrap(input.texcoord_0.x);"));
        assert!(src.contains("atlas_coord.y = gk_atlas_wrap(input.texcoord_0.y);"));
        assert!(src.contains(
            "texel_0 = gk_atlas_sample(texture_0, sampler_0, input.texcoord_0.xy, atlas_coord, input.texcoord_1);"
        ));

        let plain = src.find("texel_0 = gk_sample_texture").unwrap();
        let atlas = src.find("texel_0 = gk_atlas_sample").unwrap();
        let modulate = src.find("out.colour_0 = gk_modulate").unwrap();
        assert!(plain < atlas && atlas < modulate);
    }

    #[test]
    fn two_unit_shader_uses_index_lanes() {
        let registry = registry();
        let pass = Pass::new("two")
            .with_texture_unit(TextureUnitState::new("atlas.png"))
            .with_texture_unit(TextureUnitState::new("atlas.png").with_addressing(
                UvwAddressingMode::uniform(TextureAddressingMode::Clamp),
            ));
        let src = wgsl(&registry, &pass);

        assert!(src.contains("out.texcoord_2 = atlas_data[u32(input.texcoord_2.x)];"));
        assert!(src.contains("out.texcoord_3 = atlas_data[u32(input.texcoord_2.y)];"));
        assert!(src.contains("atlas_coord.x = gk_atlas_clamp(input.texcoord_1.x);"));
        assert!(src.contains(
            "texel_1 = gk_atlas_sample(texture_1, sampler_1, input.texcoord_1.xy, atlas_coord, input.texcoord_3);"
        ));
    }

    #[test]
    fn unknown_addressing_skips_unit() {
        let registry = registry();
        let pass = Pass::new("unknown").with_texture_unit(
            TextureUnitState::new("atlas.png")
                .with_addressing(UvwAddressingMode::uniform(TextureAddressingMode::Unknown)),
        );
        let src = wgsl(&registry, &pass);
        assert!(src.contains("texel_0 = gk_sample_texture"));
        assert!(!src.contains("texel_0 = gk_atlas_sample"));
    }

    #[test]
    fn missing_sampler_skips_emission() {
        let registry = registry();
        let pass = pass(&["atlas.png"]);
        let (_, sampler) = prepared(&registry, &pass);

        let mut state = RenderState::new();
        state.add_sub_render_state(Box::new(FfpTransform::new()), &pass);
        state.add_sub_render_state(Box::new(sampler), &pass);
        let programs = state.build_programs().unwrap();

        assert_eq!(programs.vertex.entry_point().atom_count(), 2);
        assert_eq!(programs.fragment.entry_point().atom_count(), 0);
    }

    #[test]
    fn table_uploads_once_until_changed() {
        let mut registry = registry();
        let mut pass = pass(&["atlas.png"]);
        let (_, mut sampler) = prepared(&registry, &pass);

        sampler.update_gpu_program_params(&mut pass);
        sampler.update_gpu_program_params(&mut pass);
        assert_eq!(pass.vertex_params.upload_count(ATLAS_DATA), 1);
        assert!(!sampler.refresh_table(&registry));

        registry
            .add_texture_atlas_definition(Cursor::new(
                "a.png, atlas.png, 0, 2D, 0.0, 0.5, 0.0, 0.5, 0.5\n\
                 b.png, atlas.png, 1, 2D, 0.5, 0.5, 0.0, 0.5, 0.5\n",
            ))
            .unwrap();
        assert!(sampler.refresh_table(&registry));
        sampler.update_gpu_program_params(&mut pass);
        sampler.update_gpu_program_params(&mut pass);
        assert_eq!(pass.vertex_params.upload_count(ATLAS_DATA), 2);
        assert_eq!(
            pass.vertex_params.named_constant(ATLAS_DATA).unwrap()[..4],
            [0.0, 0.5, 0.5, 0.5]
        );

        sampler.mark_table_stale();
        sampler.update_gpu_program_params(&mut pass);
        assert_eq!(pass.vertex_params.upload_count(ATLAS_DATA), 3);
    }

    #[test]
    fn resized_table_is_not_picked_up() {
        let mut registry = registry();
        let pass = pass(&["atlas.png"]);
        let (_, mut sampler) = prepared(&registry, &pass);
        registry
            .add_texture_atlas_definition(Cursor::new(
                "a.png, atlas.png, 0, 2D, 0.0, 0.0, 0.0, 1.0, 1.0\n",
            ))
            .unwrap();
        assert!(!sampler.refresh_table(&registry));
        assert_eq!(sampler.table().unwrap().len(), 2);
    }
}
