/// Floor grid on the Z-up ground plane. Line brightness comes from a
/// per-vertex weight and fades out with distance from the origin.
pub const GRID_SHADER: &str = r#"
struct FloorUniforms {
    view_proj: mat4x4<f32>,
    fade: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> floor_uniforms: FloorUniforms;

struct FloorVertex {
    @location(0) position: vec3<f32>,
    @location(1) weight: f32,
};

struct FloorVarying {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) weight: f32,
    @location(1) planar: vec2<f32>,
};

@vertex
fn vs_grid(vertex: FloorVertex) -> FloorVarying {
    var v: FloorVarying;
    v.clip_position = floor_uniforms.view_proj * vec4<f32>(vertex.position, 1.0);
    v.weight = vertex.weight;
    v.planar = vertex.position.xy;
    return v;
}

@fragment
fn fs_grid(v: FloorVarying) -> @location(0) vec4<f32> {
    let fade = 1.0 - smoothstep(floor_uniforms.fade.x, floor_uniforms.fade.y, length(v.planar));
    let shade = mix(0.25, 0.8, v.weight) * fade;
    return vec4<f32>(shade, shade, shade, 1.0);
}
"#;
