//! CPU-side vertex assembly matching a generated shader's vertex inputs.

use gamekit_shadergen::{Semantic, VertexInputSlot};
use glam::Vec3;

use crate::error::RenderError;

/// What a vertex attribute carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeRole {
    Position,
    TexCoord(u16),
    /// Per-unit atlas record indices.
    AtlasIndex,
    Colour(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedAttribute {
    pub location: u32,
    /// Offset in floats from the start of the vertex.
    pub offset: usize,
    pub components: usize,
    pub role: AttributeRole,
}

impl PlannedAttribute {
    pub fn format(&self) -> wgpu::VertexFormat {
        match self.components {
            1 => wgpu::VertexFormat::Float32,
            2 => wgpu::VertexFormat::Float32x2,
            3 => wgpu::VertexFormat::Float32x3,
            _ => wgpu::VertexFormat::Float32x4,
        }
    }
}

/// Interleaved `f32` vertex layout for one generated shader.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexLayoutPlan {
    attributes: Vec<PlannedAttribute>,
    stride: usize,
}

impl VertexLayoutPlan {
    /// Lay out `inputs` in order. `atlas_index_slot` names the texcoord slot
    /// holding atlas indices, if any.
    pub fn from_inputs(
        inputs: &[VertexInputSlot],
        atlas_index_slot: Option<u16>,
    ) -> Result<Self, RenderError> {
        let mut attributes = Vec::with_capacity(inputs.len());
        let mut offset = 0;
        for input in inputs {
            let components = input.ty.component_count();
            if !(1..=4).contains(&components) {
                return Err(RenderError::UnsupportedVertexInput(input.name.clone()));
            }
            let role = match input.semantic {
                Semantic::Position => AttributeRole::Position,
                Semantic::TextureCoordinates if Some(input.index) == atlas_index_slot => {
                    AttributeRole::AtlasIndex
                }
                Semantic::TextureCoordinates => AttributeRole::TexCoord(input.index),
                Semantic::Colour => AttributeRole::Colour(input.index),
                Semantic::Unknown => {
                    return Err(RenderError::UnsupportedVertexInput(input.name.clone()));
                }
            };
            attributes.push(PlannedAttribute {
                location: input.location,
                offset,
                components,
                role,
            });
            offset += components;
        }
        Ok(Self {
            attributes,
            stride: offset,
        })
    }

    pub fn attributes(&self) -> &[PlannedAttribute] {
        &self.attributes
    }

    /// Floats per vertex.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn stride_bytes(&self) -> u64 {
        (self.stride * std::mem::size_of::<f32>()) as u64
    }

    pub fn wgpu_attributes(&self) -> Vec<wgpu::VertexAttribute> {
        self.attributes
            .iter()
            .map(|a| wgpu::VertexAttribute {
                format: a.format(),
                offset: (a.offset * std::mem::size_of::<f32>()) as u64,
                shader_location: a.location,
            })
            .collect()
    }
}

/// An upright square facing `-Y`, textured from atlas records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasQuad {
    pub center: Vec3,
    pub size: f32,
    /// Texcoord range across the quad; above 1 exercises addressing.
    pub uv_scale: f32,
    /// Record index per atlas unit.
    pub records: [f32; 4],
}

/// Interleaved vertices and `u16` indices for `quads`.
pub fn build_quads(plan: &VertexLayoutPlan, quads: &[AtlasQuad]) -> (Vec<f32>, Vec<u16>) {
    const CORNERS: [(f32, f32); 4] = [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)];

    let mut vertices = Vec::with_capacity(quads.len() * 4 * plan.stride());
    let mut indices = Vec::with_capacity(quads.len() * 6);
    for (q, quad) in quads.iter().enumerate() {
        for (x, z) in CORNERS {
            let position = quad.center + Vec3::new(x, 0.0, z) * quad.size;
            let uv = [(x + 0.5) * quad.uv_scale, (0.5 - z) * quad.uv_scale];
            for attribute in plan.attributes() {
                let lanes: [f32; 4] = match attribute.role {
                    AttributeRole::Position => position.extend(1.0).to_array(),
                    AttributeRole::TexCoord(_) => [uv[0], uv[1], 0.0, 0.0],
                    AttributeRole::AtlasIndex => quad.records,
                    AttributeRole::Colour(_) => [1.0; 4],
                };
                vertices.extend_from_slice(&lanes[..attribute.components]);
            }
        }
        let base = (q * 4) as u16;
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamekit_shadergen::GpuConstantType;

    fn slot(location: u32, semantic: Semantic, index: u16, ty: GpuConstantType) -> VertexInputSlot {
        VertexInputSlot {
            location,
            name: format!("in{location}"),
            semantic,
            index,
            ty,
        }
    }

    fn inputs() -> Vec<VertexInputSlot> {
        vec![
            slot(0, Semantic::Position, 0, GpuConstantType::Float3),
            slot(1, Semantic::TextureCoordinates, 0, GpuConstantType::Float2),
            slot(2, Semantic::TextureCoordinates, 1, GpuConstantType::Float1),
        ]
    }

    #[test]
    fn plan_offsets_and_roles() {
        let plan = VertexLayoutPlan::from_inputs(&inputs(), Some(1)).unwrap();
        assert_eq!(plan.stride(), 6);
        assert_eq!(plan.stride_bytes(), 24);
        let roles: Vec<(usize, AttributeRole)> =
            plan.attributes().iter().map(|a| (a.offset, a.role)).collect();
        assert_eq!(
            roles,
            [
                (0, AttributeRole::Position),
                (3, AttributeRole::TexCoord(0)),
                (5, AttributeRole::AtlasIndex)
            ]
        );
        assert_eq!(plan.wgpu_attributes()[2].format, wgpu::VertexFormat::Float32);
        assert_eq!(plan.wgpu_attributes()[1].offset, 12);
    }

    #[test]
    fn matrix_input_is_rejected() {
        let inputs = [slot(0, Semantic::Position, 0, GpuConstantType::Matrix4)];
        assert!(matches!(
            VertexLayoutPlan::from_inputs(&inputs, None),
            Err(RenderError::UnsupportedVertexInput(_))
        ));
    }

    #[test]
    fn quads_carry_record_indices() {
        let plan = VertexLayoutPlan::from_inputs(&inputs(), Some(1)).unwrap();
        let quads = [
            AtlasQuad {
                center: Vec3::ZERO,
                size: 2.0,
                uv_scale: 1.0,
                records: [0.0; 4],
            },
            AtlasQuad {
                center: Vec3::X * 3.0,
                size: 2.0,
                uv_scale: 2.0,
                records: [3.0, 0.0, 0.0, 0.0],
            },
        ];
        let (vertices, indices) = build_quads(&plan, &quads);
        assert_eq!(vertices.len(), 8 * plan.stride());
        assert_eq!(indices, [0, 1, 2, 2, 3, 0, 4, 5, 6, 6, 7, 4]);

        // First corner of the second quad.
        let v = &vertices[4 * plan.stride()..5 * plan.stride()];
        assert_eq!(v, [2.0, 0.0, -1.0, 0.0, 2.0, 3.0]);
    }
}
