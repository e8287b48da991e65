//! Texture atlas support: definition parsing, table registry and the shader
//! stage that samples atlas sub-rectangles.
//!
//! An [`AtlasRegistry`] is an owned value. Pass processing borrows it through
//! [`AtlasSamplerFactory`], which adds a [`TextureAtlasSampler`] to every pass
//! that binds a registered atlas texture.
//!
//! # Definition format
//! One record per line, fields split on commas or tabs:
//!
//! ```text
//! # source, atlas, index, type, u, v, depth, width, height
//! grass.png, terrain.png, 0, 2D, 0.0, 0.0, 0.0, 0.5, 0.5
//! ```

mod error;
mod library;
mod record;
mod registry;
mod sampler;

use gamekit_shadergen::{GeneratedShader, Pass, RenderState, SubRenderStateFactory, WgslWriter};

pub use error::AtlasError;
pub use library::{
    ATLAS_FUNC_BORDER, ATLAS_FUNC_CLAMP, ATLAS_FUNC_MIRROR, ATLAS_FUNC_SAMPLE, ATLAS_FUNC_WRAP,
    ATLAS_LIBRARY, ATLAS_LIBRARY_WGSL, addressing_function_name, register_atlas_library,
    shader_libraries,
};
pub use record::{TextureAtlasRecord, TextureAtlasTable, flatten_table};
pub use registry::{AtlasRegistry, IndexPositionMode};
pub use sampler::{
    ATLAS_COORD, ATLAS_DATA, AtlasSamplerFactory, MAX_ATLAS_TEXTURES, TextureAtlasSampler,
};

/// A pass's stages together with the shader they generated.
pub struct PassShader {
    pub render_state: RenderState,
    pub shader: GeneratedShader,
}

/// Build the fixed-function stages plus atlas sampling for `pass` and write
/// the result as WGSL.
pub fn build_pass_shader(pass: &Pass, registry: &AtlasRegistry) -> Result<PassShader, AtlasError> {
    let factory = AtlasSamplerFactory::new(registry);
    let factories: [&dyn SubRenderStateFactory; 1] = [&factory];
    let mut render_state = RenderState::for_pass(pass, &factories);
    let programs = render_state.build_programs()?;
    let shader = WgslWriter::new(&shader_libraries()).write(&programs)?;
    tracing::info!(
        pass = %pass.name,
        stages = render_state.len(),
        bytes = shader.source.len(),
        "pass shader built"
    );
    Ok(PassShader {
        render_state,
        shader,
    })
}

pub fn crate_info() -> &'static str {
    "gamekit-atlas v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamekit_shadergen::TextureUnitState;
    use std::io::Cursor;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("atlas"));
    }

    #[test]
    fn pass_shader_uploads_atlas_data() {
        let mut registry = AtlasRegistry::new();
        registry
            .add_texture_atlas_definition(Cursor::new(
                "a.png, atlas.png, 0, 2D, 0, 0, 0, 0.5, 1\n\
                 b.png, atlas.png, 1, 2D, 0.5, 0, 0, 0.5, 1\n",
            ))
            .unwrap();
        let mut pass = Pass::new("quad").with_texture_unit(TextureUnitState::new("atlas.png"));

        let mut built = build_pass_shader(&pass, &registry).unwrap();
        assert!(built.render_state.find_stage::<TextureAtlasSampler>().is_some());
        assert_eq!(built.shader.uniform(ATLAS_DATA).unwrap().buffer_size(), Some(32));

        built.render_state.update_gpu_program_params(&mut pass);
        assert_eq!(
            pass.vertex_params.named_constant(ATLAS_DATA).unwrap(),
            [0.0, 0.0, 0.5, 1.0, 0.5, 0.0, 0.5, 1.0]
        );
    }
}
