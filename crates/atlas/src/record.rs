/// Placement of one source texture inside a combined atlas texture.
///
/// Offsets and size are in normalized atlas coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureAtlasRecord {
    pub source_texture_name: String,
    pub atlas_texture_name: String,
    pub offset_u: f32,
    pub offset_v: f32,
    pub width: f32,
    pub height: f32,
    /// Position of this record within its atlas group in the definition file.
    pub index_in_atlas: usize,
}

impl TextureAtlasRecord {
    /// `[offset_u, offset_v, width, height]`, the layout the shader reads.
    pub fn packed(&self) -> [f32; 4] {
        [self.offset_u, self.offset_v, self.width, self.height]
    }
}

/// Records of one atlas texture, in definition order.
pub type TextureAtlasTable = Vec<TextureAtlasRecord>;

/// Flatten a table into four floats per record.
pub fn flatten_table(table: &[TextureAtlasRecord]) -> Vec<f32> {
    table.iter().flat_map(TextureAtlasRecord::packed).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(u: f32, index: usize) -> TextureAtlasRecord {
        TextureAtlasRecord {
            source_texture_name: format!("src{index}.png"),
            atlas_texture_name: "atlas.png".into(),
            offset_u: u,
            offset_v: 0.5,
            width: 0.25,
            height: 0.5,
            index_in_atlas: index,
        }
    }

    #[test]
    fn flatten_packs_four_floats_per_record() {
        let table = vec![record(0.0, 0), record(0.25, 1)];
        assert_eq!(
            flatten_table(&table),
            [0.0, 0.5, 0.25, 0.5, 0.25, 0.5, 0.25, 0.5]
        );
    }
}
