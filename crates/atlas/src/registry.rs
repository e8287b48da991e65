//! Atlas tables keyed by atlas texture name, and the definition-file parser.

use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::AtlasError;
use crate::record::{TextureAtlasRecord, TextureAtlasTable};

/// Minimum number of columns in a definition line.
const DEFINITION_COLUMNS: usize = 9;

/// How the texcoord slot carrying per-vertex atlas indices is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexPositionMode {
    /// Offset counted from the last texture unit of the pass.
    #[default]
    Relative,
    /// Offset is the texcoord slot itself.
    Absolute,
}

/// Owned registry of atlas tables.
///
/// Keys are atlas texture names: the name a material's texture unit binds.
#[derive(Debug, Clone)]
pub struct AtlasRegistry {
    tables: BTreeMap<String, Arc<TextureAtlasTable>>,
    index_position_mode: IndexPositionMode,
    index_position_offset: u16,
}

impl Default for AtlasRegistry {
    fn default() -> Self {
        Self {
            tables: BTreeMap::new(),
            index_position_mode: IndexPositionMode::Relative,
            index_position_offset: 1,
        }
    }
}

impl AtlasRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an atlas definition and register its tables.
    ///
    /// Each line reads `source, atlas, index, type, u, v, depth, width,
    /// height`, split on commas or tabs. Blank lines and lines starting with
    /// `#` are ignored; malformed lines are skipped. Every atlas named in the
    /// input replaces its previous table. Returns all parsed records in file
    /// order.
    pub fn add_texture_atlas_definition<R: BufRead>(
        &mut self,
        reader: R,
    ) -> Result<Vec<TextureAtlasRecord>, AtlasError> {
        let mut groups: BTreeMap<String, TextureAtlasTable> = BTreeMap::new();
        let mut parsed = Vec::new();

        for (line_no, raw) in reader.split(b'\n').enumerate() {
            let raw = raw?;
            let Ok(line) = std::str::from_utf8(&raw) else {
                tracing::warn!(line = line_no + 1, "atlas definition line is not valid UTF-8");
                continue;
            };
            let content = line.trim();
            if content.is_empty() || content.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = content
                .split([',', '\t'])
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .collect();
            if fields.len() < DEFINITION_COLUMNS {
                tracing::warn!(
                    line = line_no + 1,
                    columns = fields.len(),
                    "atlas definition line has too few columns"
                );
                continue;
            }

            let Some([offset_u, offset_v, width, height]) = parse_geometry(&fields) else {
                tracing::warn!(line = line_no + 1, "atlas definition line has bad numbers");
                continue;
            };

            let group = groups.entry(fields[1].to_string()).or_default();
            let record = TextureAtlasRecord {
                source_texture_name: fields[0].to_string(),
                atlas_texture_name: fields[1].to_string(),
                offset_u,
                offset_v,
                width,
                height,
                index_in_atlas: group.len(),
            };
            group.push(record.clone());
            parsed.push(record);
        }

        if parsed.is_empty() {
            return Err(AtlasError::NoValidRecords);
        }

        for (name, table) in groups {
            tracing::debug!(atlas = %name, records = table.len(), "atlas table registered");
            self.tables.insert(name, Arc::new(table));
        }
        Ok(parsed)
    }

    /// Read an atlas definition file from disk.
    pub fn load_definition_file(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<Vec<TextureAtlasRecord>, AtlasError> {
        let file = std::fs::File::open(path.as_ref())?;
        let records = self.add_texture_atlas_definition(std::io::BufReader::new(file))?;
        tracing::info!(
            path = %path.as_ref().display(),
            records = records.len(),
            "atlas definition loaded"
        );
        Ok(records)
    }

    /// Insert or replace a table. `None` or an empty table removes the entry.
    pub fn set_texture_atlas_table(&mut self, name: &str, table: Option<Arc<TextureAtlasTable>>) {
        match table {
            Some(table) if !table.is_empty() => {
                self.tables.insert(name.to_string(), table);
            }
            _ => self.remove_texture_atlas_table(name),
        }
    }

    pub fn remove_texture_atlas_table(&mut self, name: &str) {
        self.tables.remove(name);
    }

    pub fn remove_all_texture_atlas_tables(&mut self) {
        self.tables.clear();
    }

    pub fn texture_atlas_table(&self, name: &str) -> Option<&Arc<TextureAtlasTable>> {
        self.tables.get(name)
    }

    /// Set where samplers put the per-vertex atlas index. `offset` must be
    /// non-zero.
    pub fn set_table_index_position(
        &mut self,
        mode: IndexPositionMode,
        offset: u16,
    ) -> Result<(), AtlasError> {
        if offset == 0 {
            return Err(AtlasError::InvalidIndexOffset);
        }
        self.index_position_mode = mode;
        self.index_position_offset = offset;
        Ok(())
    }

    pub fn table_index_position_mode(&self) -> IndexPositionMode {
        self.index_position_mode
    }

    pub fn table_index_position_offset(&self) -> u16 {
        self.index_position_offset
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Tables in name order.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &Arc<TextureAtlasTable>)> {
        self.tables.iter().map(|(name, table)| (name.as_str(), table))
    }
}

/// Columns 4/5 (offsets) and 7/8 (size).
fn parse_geometry(fields: &[&str]) -> Option<[f32; 4]> {
    let mut out = [0.0; 4];
    for (slot, column) in out.iter_mut().zip([4, 5, 7, 8]) {
        *slot = fields.get(column)?.parse().ok()?;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const DEFINITION: &str = "\
# source, atlas, index, type, u, v, depth, width, height
grass.png, terrain.png, 0, 2D, 0.0, 0.0, 0.0, 0.5, 0.5
stone.png, terrain.png, 1, 2D, 0.5, 0.0, 0.0, 0.5, 0.5
sand.png\tterrain.png\t2\t2D\t0.0\t0.5\t0.0\t0.5\t0.5
leaf.png, foliage.png, 0, 2D, 0.0, 0.0, 0.0, 1.0, 1.0
";

    fn parse(text: &str) -> (AtlasRegistry, Result<Vec<TextureAtlasRecord>, AtlasError>) {
        let mut registry = AtlasRegistry::new();
        let result = registry.add_texture_atlas_definition(Cursor::new(text));
        (registry, result)
    }

    #[test]
    fn one_valid_line_and_comment() {
        let (registry, result) =
            parse("# comment\nrock.png, rocks.png, 0, 2D, 0.25, 0.5, 0, 0.25, 0.125\n");
        let records = result.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(registry.len(), 1);

        let table = registry.texture_atlas_table("rocks.png").unwrap();
        assert_eq!(table.len(), 1);
        let rock = &table[0];
        assert_eq!(rock.source_texture_name, "rock.png");
        assert_eq!(rock.packed(), [0.25, 0.5, 0.25, 0.125]);
        assert_eq!(rock.index_in_atlas, 0);
        assert!(registry.texture_atlas_table("rock.png").is_none());
    }

    #[test]
    fn groups_by_atlas_and_numbers_records() {
        let (registry, result) = parse(DEFINITION);
        assert_eq!(result.unwrap().len(), 4);
        let terrain = registry.texture_atlas_table("terrain.png").unwrap();
        let indices: Vec<usize> = terrain.iter().map(|r| r.index_in_atlas).collect();
        assert_eq!(indices, [0, 1, 2]);
        assert_eq!(terrain[2].source_texture_name, "sand.png");
        assert_eq!(registry.texture_atlas_table("foliage.png").unwrap().len(), 1);
        let names: Vec<&str> = registry.tables().map(|(name, _)| name).collect();
        assert_eq!(names, ["foliage.png", "terrain.png"]);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let text = "a.png, atlas.png, 0, 2D, 0, 0, 0, 1\n\
                    b.png, atlas.png, 0, 2D, zero, 0, 0, 1, 1\n\
                    \n\
                    c.png,, atlas.png, 0, 2D, 0, 0, 0, 1, 1\n";
        let (registry, result) = parse(text);
        let records = result.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_texture_name, "c.png");
        assert_eq!(registry.texture_atlas_table("atlas.png").unwrap().len(), 1);
    }

    #[test]
    fn non_utf8_line_is_skipped() {
        let mut text = b"caf\xe9.png, atlas.png, 0, 2D, 0, 0, 0, 1, 1\n".to_vec();
        text.extend_from_slice(b"a.png, atlas.png, 0, 2D, 0, 0, 0, 1, 1\r\n");
        let mut registry = AtlasRegistry::new();
        let records = registry
            .add_texture_atlas_definition(Cursor::new(text))
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_texture_name, "a.png");
        assert_eq!(records[0].height, 1.0);
        assert_eq!(registry.texture_atlas_table("atlas.png").unwrap().len(), 1);
    }

    #[test]
    fn no_valid_records_is_an_error() {
        let (registry, result) = parse("# only a comment\n\nshort, line\n");
        assert!(matches!(result, Err(AtlasError::NoValidRecords)));
        assert!(registry.is_empty());
    }

    #[test]
    fn redefinition_replaces_table() {
        let (mut registry, result) = parse(DEFINITION);
        result.unwrap();
        let before = Arc::clone(registry.texture_atlas_table("terrain.png").unwrap());
        registry
            .add_texture_atlas_definition(Cursor::new(
                "dirt.png, terrain.png, 0, 2D, 0, 0, 0, 1, 1\n",
            ))
            .unwrap();
        let after = registry.texture_atlas_table("terrain.png").unwrap();
        assert!(!Arc::ptr_eq(&before, after));
        assert_eq!(after.len(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn set_and_remove_tables() {
        let (mut registry, result) = parse(DEFINITION);
        result.unwrap();
        let terrain = Arc::clone(registry.texture_atlas_table("terrain.png").unwrap());

        registry.set_texture_atlas_table("alias.png", Some(Arc::clone(&terrain)));
        assert!(Arc::ptr_eq(
            registry.texture_atlas_table("alias.png").unwrap(),
            &terrain
        ));

        registry.set_texture_atlas_table("alias.png", Some(Arc::new(Vec::new())));
        assert!(registry.texture_atlas_table("alias.png").is_none());

        registry.set_texture_atlas_table("terrain.png", None);
        assert!(registry.texture_atlas_table("terrain.png").is_none());

        registry.remove_texture_atlas_table("foliage.png");
        assert!(registry.is_empty());

        registry.set_texture_atlas_table("terrain.png", Some(terrain));
        registry.remove_all_texture_atlas_tables();
        assert!(registry.is_empty());
    }

    #[test]
    fn index_position_defaults_and_validation() {
        let mut registry = AtlasRegistry::new();
        assert_eq!(registry.table_index_position_mode(), IndexPositionMode::Relative);
        assert_eq!(registry.table_index_position_offset(), 1);

        assert!(matches!(
            registry.set_table_index_position(IndexPositionMode::Absolute, 0),
            Err(AtlasError::InvalidIndexOffset)
        ));
        assert_eq!(registry.table_index_position_mode(), IndexPositionMode::Relative);

        registry
            .set_table_index_position(IndexPositionMode::Absolute, 3)
            .unwrap();
        assert_eq!(registry.table_index_position_mode(), IndexPositionMode::Absolute);
        assert_eq!(registry.table_index_position_offset(), 3);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atlas.tai");
        std::fs::write(&path, DEFINITION).unwrap();

        let mut registry = AtlasRegistry::new();
        let records = registry.load_definition_file(&path).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(registry.len(), 2);

        let missing = registry.load_definition_file(dir.path().join("missing.tai"));
        assert!(matches!(missing, Err(AtlasError::Io(_))));
    }
}
