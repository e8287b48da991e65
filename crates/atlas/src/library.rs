//! WGSL helpers for atlas sampling.

use gamekit_shadergen::{LibraryRegistry, TextureAddressingMode};

pub const ATLAS_LIBRARY: &str = "gk_texture_atlas";

pub const ATLAS_FUNC_WRAP: &str = "gk_atlas_wrap";
pub const ATLAS_FUNC_MIRROR: &str = "gk_atlas_mirror";
pub const ATLAS_FUNC_CLAMP: &str = "gk_atlas_clamp";
pub const ATLAS_FUNC_BORDER: &str = "gk_atlas_border";
pub const ATLAS_FUNC_SAMPLE: &str = "gk_atlas_sample";

/// Addressing functions map one coordinate into `[0, 1]`; border yields a
/// negative value outside the range, which `gk_atlas_sample` turns into a
/// transparent texel. Derivatives come from the unmapped coordinate so mip
/// selection stays continuous across wrap seams.
pub const ATLAS_LIBRARY_WGSL: &str = r#"
fn gk_atlas_wrap(c: f32) -> f32 {
    return fract(c);
}

fn gk_atlas_mirror(c: f32) -> f32 {
    let t = fract(abs(c) * 0.5) * 2.0;
    return select(t, 2.0 - t, t > 1.0);
}

fn gk_atlas_clamp(c: f32) -> f32 {
    return clamp(c, 0.0, 1.0);
}

fn gk_atlas_border(c: f32) -> f32 {
    return select(c, -1.0, c < 0.0 || c > 1.0);
}

fn gk_atlas_sample(
    t: texture_2d<f32>,
    s: sampler,
    orig_uv: vec2<f32>,
    atlas_uv: vec2<f32>,
    data: vec4<f32>,
) -> vec4<f32> {
    let uv = data.xy + clamp(atlas_uv, vec2<f32>(0.0), vec2<f32>(1.0)) * data.zw;
    let colour = textureSampleGrad(t, s, uv, dpdx(orig_uv) * data.zw, dpdy(orig_uv) * data.zw);
    return select(colour, vec4<f32>(0.0), any(atlas_uv < vec2<f32>(0.0)));
}
"#;

/// Register the atlas library next to whatever `libraries` already holds.
pub fn register_atlas_library(libraries: &mut LibraryRegistry) {
    libraries.register(ATLAS_LIBRARY, ATLAS_LIBRARY_WGSL);
}

/// Common plus atlas libraries.
pub fn shader_libraries() -> LibraryRegistry {
    let mut libraries = LibraryRegistry::new();
    register_atlas_library(&mut libraries);
    libraries
}

/// Library function applying `mode` to one coordinate.
pub fn addressing_function_name(mode: TextureAddressingMode) -> Option<&'static str> {
    match mode {
        TextureAddressingMode::Wrap => Some(ATLAS_FUNC_WRAP),
        TextureAddressingMode::Mirror => Some(ATLAS_FUNC_MIRROR),
        TextureAddressingMode::Clamp => Some(ATLAS_FUNC_CLAMP),
        TextureAddressingMode::Border => Some(ATLAS_FUNC_BORDER),
        TextureAddressingMode::Unknown => None,
    }
}
