//! Material-side description of a pass: texture units and uploaded constants.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use crate::error::ShaderGenError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureType {
    D1,
    D2,
    D3,
    Cube,
}

/// Policy for texture coordinates outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureAddressingMode {
    #[default]
    Wrap,
    Mirror,
    Clamp,
    Border,
    /// Not set or not recognized.
    Unknown,
}

impl FromStr for TextureAddressingMode {
    type Err = ShaderGenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wrap" => Ok(Self::Wrap),
            "mirror" => Ok(Self::Mirror),
            "clamp" => Ok(Self::Clamp),
            "border" => Ok(Self::Border),
            other => Err(ShaderGenError::UnknownAddressingMode(other.into())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UvwAddressingMode {
    pub u: TextureAddressingMode,
    pub v: TextureAddressingMode,
    pub w: TextureAddressingMode,
}

impl UvwAddressingMode {
    pub fn uniform(mode: TextureAddressingMode) -> Self {
        Self {
            u: mode,
            v: mode,
            w: mode,
        }
    }
}

/// One texture-sampling slot of a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureUnitState {
    pub texture_name: String,
    pub texture_type: TextureType,
    pub addressing: UvwAddressingMode,
}

impl TextureUnitState {
    pub fn new(texture_name: impl Into<String>) -> Self {
        Self {
            texture_name: texture_name.into(),
            texture_type: TextureType::D2,
            addressing: UvwAddressingMode::default(),
        }
    }

    pub fn with_type(mut self, texture_type: TextureType) -> Self {
        self.texture_type = texture_type;
        self
    }

    pub fn with_addressing(mut self, addressing: UvwAddressingMode) -> Self {
        self.addressing = addressing;
        self
    }
}

/// Named float constants bound to a program, with upload bookkeeping.
///
/// Every `set_named_constant` counts as one upload and marks the constant
/// dirty until a renderer drains it.
#[derive(Debug, Clone, Default)]
pub struct GpuProgramParameters {
    constants: BTreeMap<String, Vec<f32>>,
    uploads: BTreeMap<String, usize>,
    dirty: BTreeSet<String>,
}

impl GpuProgramParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_named_constant(&mut self, name: &str, values: &[f32]) {
        self.constants.insert(name.into(), values.to_vec());
        *self.uploads.entry(name.into()).or_insert(0) += 1;
        self.dirty.insert(name.into());
    }

    pub fn named_constant(&self, name: &str) -> Option<&[f32]> {
        self.constants.get(name).map(Vec::as_slice)
    }

    /// How many times `name` has been uploaded.
    pub fn upload_count(&self, name: &str) -> usize {
        self.uploads.get(name).copied().unwrap_or(0)
    }

    pub fn is_dirty(&self, name: &str) -> bool {
        self.dirty.contains(name)
    }

    /// Constants changed since the last drain.
    pub fn take_dirty(&mut self) -> Vec<(String, Vec<f32>)> {
        let dirty = std::mem::take(&mut self.dirty);
        dirty
            .into_iter()
            .filter_map(|name| {
                let values = self.constants.get(&name)?.clone();
                Some((name, values))
            })
            .collect()
    }
}

/// A single rendering pass: its texture units and program constants.
#[derive(Debug, Clone)]
pub struct Pass {
    pub name: String,
    pub diffuse: [f32; 4],
    pub texture_units: Vec<TextureUnitState>,
    pub vertex_params: GpuProgramParameters,
    pub fragment_params: GpuProgramParameters,
}

impl Pass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            diffuse: [1.0, 1.0, 1.0, 1.0],
            texture_units: Vec::new(),
            vertex_params: GpuProgramParameters::new(),
            fragment_params: GpuProgramParameters::new(),
        }
    }

    pub fn with_texture_unit(mut self, unit: TextureUnitState) -> Self {
        self.texture_units.push(unit);
        self
    }

    pub fn texture_unit_count(&self) -> usize {
        self.texture_units.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addressing_mode_parse() {
        assert_eq!(
            "Mirror".parse::<TextureAddressingMode>().unwrap(),
            TextureAddressingMode::Mirror
        );
        assert!("repeat".parse::<TextureAddressingMode>().is_err());
    }

    #[test]
    fn upload_counts_and_dirty_drain() {
        let mut params = GpuProgramParameters::new();
        assert_eq!(params.upload_count("a"), 0);
        params.set_named_constant("a", &[1.0, 2.0]);
        params.set_named_constant("a", &[3.0, 4.0]);
        assert_eq!(params.upload_count("a"), 2);
        assert_eq!(params.named_constant("a"), Some(&[3.0, 4.0][..]));

        let dirty = params.take_dirty();
        assert_eq!(dirty, vec![("a".to_string(), vec![3.0, 4.0])]);
        assert!(params.take_dirty().is_empty());
        assert!(!params.is_dirty("a"));
    }

    #[test]
    fn pass_builder() {
        let pass = Pass::new("p")
            .with_texture_unit(TextureUnitState::new("a.png"))
            .with_texture_unit(TextureUnitState::new("b.png").with_type(TextureType::Cube));
        assert_eq!(pass.texture_unit_count(), 2);
        assert_eq!(pass.texture_units[1].texture_type, TextureType::Cube);
    }
}
