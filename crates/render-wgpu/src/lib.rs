//! wgpu render backend for generated atlas shaders.
//!
//! Builds a pipeline straight from a [`GeneratedShader`]'s binding and
//! vertex-input layout, draws atlas-indexed quads with it, and renders a
//! grid floor underneath.
//!
//! # Invariants
//! - Renderer never mutates scene state; it only drains dirty pass constants.
//! - Every texture unit of the generated shader samples the same atlas image.
//!
//! [`GeneratedShader`]: gamekit_shadergen::GeneratedShader

mod camera;
mod constants;
mod error;
mod gpu;
mod mesh;
mod shaders;
mod texture;

pub use camera::Projection;
pub use constants::pack_constant;
pub use error::RenderError;
pub use gpu::{AtlasQuadRenderer, AtlasScene};
pub use mesh::{AtlasQuad, AttributeRole, PlannedAttribute, VertexLayoutPlan, build_quads};
pub use texture::{AtlasImage, upload_atlas_image};
