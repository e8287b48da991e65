use gamekit_shadergen::{UniformBinding, UniformSlot};

use crate::error::RenderError;

/// Lay `values` out the way WGSL reads the uniform in `slot`.
///
/// Array elements sit on a 16-byte stride, so elements narrower than a
/// `vec4` are padded.
pub fn pack_constant(slot: &UniformSlot, values: &[f32]) -> Result<Vec<f32>, RenderError> {
    let (UniformBinding::Buffer { ty, array_size }, Some(size)) = (slot.kind, slot.buffer_size())
    else {
        return Err(RenderError::UnknownUniform(slot.name.clone()));
    };
    let capacity = size as usize / std::mem::size_of::<f32>();

    let packed = match array_size {
        Some(_) => {
            let lanes = ty.component_count().clamp(1, 4);
            let mut packed = Vec::with_capacity(values.len().div_ceil(lanes) * 4);
            for element in values.chunks(lanes) {
                packed.extend_from_slice(element);
                packed.resize(packed.len() + 4 - element.len(), 0.0);
            }
            packed
        }
        None => values.to_vec(),
    };

    if packed.len() > capacity {
        return Err(RenderError::ConstantTooLarge {
            name: slot.name.clone(),
            found: packed.len(),
            capacity,
        });
    }
    Ok(packed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamekit_shadergen::{GpuConstantType, ProgramStage};

    fn buffer(ty: GpuConstantType, array_size: Option<usize>) -> UniformSlot {
        UniformSlot {
            name: "c".into(),
            group: 0,
            binding: 0,
            stage: ProgramStage::Vertex,
            kind: UniformBinding::Buffer { ty, array_size },
        }
    }

    #[test]
    fn vec4_array_is_unchanged() {
        let slot = buffer(GpuConstantType::Float4, Some(2));
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        assert_eq!(pack_constant(&slot, &values).unwrap(), values);
    }

    #[test]
    fn narrow_array_elements_are_padded() {
        let slot = buffer(GpuConstantType::Float2, Some(2));
        assert_eq!(
            pack_constant(&slot, &[1.0, 2.0, 3.0, 4.0]).unwrap(),
            [1.0, 2.0, 0.0, 0.0, 3.0, 4.0, 0.0, 0.0]
        );
    }

    #[test]
    fn oversized_constant_is_rejected() {
        let slot = buffer(GpuConstantType::Float4, None);
        assert!(matches!(
            pack_constant(&slot, &[0.0; 8]),
            Err(RenderError::ConstantTooLarge { found: 8, capacity: 4, .. })
        ));
    }

    #[test]
    fn textures_have_no_constants() {
        let slot = UniformSlot {
            kind: UniformBinding::Texture2d { unit: 0 },
            ..buffer(GpuConstantType::Float4, None)
        };
        assert!(pack_constant(&slot, &[0.0]).is_err());
    }
}
