use std::path::{Path, PathBuf};

use gamekit_atlas::{AtlasRegistry, IndexPositionMode};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::SceneError;

/// Where the camera starts. Rotation is XYZ Euler degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraStart {
    pub position: Vec3,
    pub rotation_degrees: Vec3,
}

/// Texcoord slot used for per-vertex atlas indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPosition {
    pub mode: IndexPositionMode,
    pub offset: u16,
}

impl Default for IndexPosition {
    fn default() -> Self {
        Self {
            mode: IndexPositionMode::Relative,
            offset: 1,
        }
    }
}

/// Settings for the demo application. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Viewport clear colour, RGBA.
    pub background: [f32; 4],
    pub camera: Option<CameraStart>,
    /// Atlas definition files, loaded in order.
    pub atlas_definitions: Vec<PathBuf>,
    pub index_position: IndexPosition,
    /// Units per second.
    pub move_speed: f32,
    /// Mouse delta is scaled by `tick / look_divisor` radians.
    pub look_divisor: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            background: [0.0, 0.0, 0.0, 1.0],
            camera: None,
            atlas_definitions: Vec::new(),
            index_position: IndexPosition::default(),
            move_speed: 20.0,
            look_divisor: 3.0,
        }
    }
}

impl DemoConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let file = std::fs::File::open(path.as_ref())?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        tracing::info!(path = %path.as_ref().display(), "demo config loaded");
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        let file = std::fs::File::create(path.as_ref())?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Apply the index position and load every listed definition file.
    /// Relative paths resolve against `base_dir`.
    pub fn configure_registry(
        &self,
        registry: &mut AtlasRegistry,
        base_dir: &Path,
    ) -> Result<usize, SceneError> {
        registry.set_table_index_position(self.index_position.mode, self.index_position.offset)?;
        let mut records = 0;
        for definition in &self.atlas_definitions {
            let path = base_dir.join(definition);
            records += registry.load_definition_file(&path)?.len();
        }
        Ok(records)
    }
}
