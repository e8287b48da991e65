//! Scene content: atlas registry, the textured pass and its generated shader.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use gamekit_atlas::{AtlasRegistry, PassShader, TextureAtlasSampler, build_pass_shader};
use gamekit_render_wgpu::{AtlasImage, AtlasQuad, VertexLayoutPlan};
use gamekit_scene::DemoConfig;
use gamekit_shadergen::{
    GeneratedShader, Pass, RenderState, TextureAddressingMode, TextureUnitState,
    UvwAddressingMode,
};
use glam::Vec3;

/// Used when the config names no definition files.
pub const BUILTIN_DEFINITION: &str = "\
# source, atlas, index, type, u, v, depth, width, height
grass.png, gamekit_atlas.png, 0, 2D, 0.0, 0.0, 0.0, 0.5, 0.5
dirt.png, gamekit_atlas.png, 1, 2D, 0.5, 0.0, 0.0, 0.5, 0.5
stone.png, gamekit_atlas.png, 2, 2D, 0.0, 0.5, 0.0, 0.5, 0.5
water.png, gamekit_atlas.png, 3, 2D, 0.5, 0.5, 0.0, 0.5, 0.5
";

const QUAD_SIZE: f32 = 2.0;
const QUAD_SPACING: f32 = 2.5;
const UV_SCALE: f32 = 2.0;
const ATLAS_IMAGE_SIZE: u32 = 256;
const ATLAS_CHECKS: u32 = 4;
pub const FLOOR_HEIGHT: f32 = -1.5;

pub struct DemoContent {
    pub registry: AtlasRegistry,
    pub pass: Pass,
    pub render_state: RenderState,
    pub shader: GeneratedShader,
    pub layout: VertexLayoutPlan,
    pub quads: Vec<AtlasQuad>,
    pub atlas_image: AtlasImage,
}

impl DemoContent {
    /// One quad per record of the first atlas table, all drawn by a pass
    /// binding that atlas with `addressing`.
    pub fn build(
        config: &DemoConfig,
        base_dir: &Path,
        addressing: TextureAddressingMode,
    ) -> anyhow::Result<Self> {
        let mut registry = AtlasRegistry::new();
        config.configure_registry(&mut registry, base_dir)?;
        if config.atlas_definitions.is_empty() {
            registry.add_texture_atlas_definition(Cursor::new(BUILTIN_DEFINITION))?;
        }

        let (atlas_name, table) = registry
            .tables()
            .next()
            .map(|(name, table)| (name.to_string(), Arc::clone(table)))
            .context("no atlas tables loaded")?;

        let mut pass = Pass::new("atlas_quads").with_texture_unit(
            TextureUnitState::new(&atlas_name)
                .with_addressing(UvwAddressingMode::uniform(addressing)),
        );
        let PassShader {
            mut render_state,
            shader,
        } = build_pass_shader(&pass, &registry)?;
        let index_slot = render_state
            .find_stage::<TextureAtlasSampler>()
            .map(TextureAtlasSampler::atlas_texcoord_pos)
            .context("pass has no atlas sampler")?;
        let layout = VertexLayoutPlan::from_inputs(&shader.vertex_inputs, Some(index_slot))?;

        let first = -(table.len().saturating_sub(1) as f32) * QUAD_SPACING / 2.0;
        let quads = (0..table.len())
            .map(|i| AtlasQuad {
                center: Vec3::new(first + i as f32 * QUAD_SPACING, 0.0, 0.0),
                size: QUAD_SIZE,
                uv_scale: UV_SCALE,
                records: [i as f32, 0.0, 0.0, 0.0],
            })
            .collect();
        let atlas_image = AtlasImage::from_records(&table, ATLAS_IMAGE_SIZE, ATLAS_CHECKS);

        render_state.update_gpu_program_params(&mut pass);
        tracing::info!(
            atlas = %atlas_name,
            records = table.len(),
            ?addressing,
            "demo content built"
        );

        Ok(Self {
            registry,
            pass,
            render_state,
            shader,
            layout,
            quads,
            atlas_image,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamekit_atlas::ATLAS_DATA;
    use gamekit_render_wgpu::AttributeRole;

    #[test]
    fn builtin_content() {
        let content =
            DemoContent::build(&DemoConfig::default(), Path::new("."), TextureAddressingMode::Wrap)
                .unwrap();
        assert_eq!(content.quads.len(), 4);
        assert_eq!(content.quads[3].records[0], 3.0);
        assert!(content.shader.source.contains("gk_atlas_wrap"));
        assert!(
            content
                .layout
                .attributes()
                .iter()
                .any(|a| a.role == AttributeRole::AtlasIndex)
        );
        assert!(content.pass.vertex_params.is_dirty(ATLAS_DATA));
    }

    #[test]
    fn definitions_from_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("rocks.tai"),
            "a.png, rocks.png, 0, 2D, 0, 0, 0, 1, 0.5\n\
             b.png, rocks.png, 1, 2D, 0, 0.5, 0, 1, 0.5\n",
        )
        .unwrap();
        let config = DemoConfig {
            atlas_definitions: vec!["rocks.tai".into()],
            ..DemoConfig::default()
        };
        let content =
            DemoContent::build(&config, dir.path(), TextureAddressingMode::Mirror).unwrap();
        assert_eq!(content.quads.len(), 2);
        assert_eq!(content.pass.texture_units[0].texture_name, "rocks.png");
        assert!(content.shader.source.contains("gk_atlas_mirror"));
        assert!(content.registry.texture_atlas_table("gamekit_atlas.png").is_none());
    }
}
