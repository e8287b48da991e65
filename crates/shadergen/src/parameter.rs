use std::fmt;

/// Data type of a shader parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuConstantType {
    Float1,
    Float2,
    Float3,
    Float4,
    Matrix4,
    Sampler2d,
}

impl GpuConstantType {
    /// Float vector type with `components` lanes (1..=4).
    pub fn float_vector(components: usize) -> Option<Self> {
        match components {
            1 => Some(Self::Float1),
            2 => Some(Self::Float2),
            3 => Some(Self::Float3),
            4 => Some(Self::Float4),
            _ => None,
        }
    }

    pub fn component_count(self) -> usize {
        match self {
            Self::Float1 => 1,
            Self::Float2 => 2,
            Self::Float3 => 3,
            Self::Float4 => 4,
            Self::Matrix4 => 16,
            Self::Sampler2d => 0,
        }
    }

    pub fn is_sampler(self) -> bool {
        matches!(self, Self::Sampler2d)
    }

    pub fn wgsl_type(self) -> &'static str {
        match self {
            Self::Float1 => "f32",
            Self::Float2 => "vec2<f32>",
            Self::Float3 => "vec3<f32>",
            Self::Float4 => "vec4<f32>",
            Self::Matrix4 => "mat4x4<f32>",
            Self::Sampler2d => "texture_2d<f32>",
        }
    }
}

/// What a varying parameter carries between pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Semantic {
    Unknown,
    Position,
    TextureCoordinates,
    Colour,
}

impl Semantic {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Position => "position",
            Self::TextureCoordinates => "texture_coordinates",
            Self::Colour => "colour",
        }
    }
}

impl fmt::Display for Semantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finer-grained description of a parameter's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Content {
    Unknown,
    PositionObjectSpace,
    PositionProjectiveSpace,
    TextureCoordinate(u16),
    ColourDiffuse,
}

/// A function input, output or local.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: GpuConstantType,
    pub semantic: Semantic,
    pub index: u16,
    pub content: Content,
}

impl Parameter {
    /// Name used for semantic-bound parameters.
    pub fn semantic_name(semantic: Semantic, index: u16) -> String {
        match semantic {
            Semantic::Position => "position".into(),
            Semantic::TextureCoordinates => format!("texcoord_{index}"),
            Semantic::Colour => format!("colour_{index}"),
            Semantic::Unknown => format!("param_{index}"),
        }
    }
}

/// How often a uniform changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variability {
    Global,
    PerObject,
    /// Supplied by the renderer each frame (matrices and the like).
    Auto,
}

/// A program-level uniform: a buffer constant or a texture sampler.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformParameter {
    pub name: String,
    pub ty: GpuConstantType,
    /// Texture unit for samplers.
    pub index: Option<u16>,
    pub variability: Variability,
    /// Element count for array uniforms.
    pub array_size: Option<usize>,
}

impl UniformParameter {
    pub fn sampler_name(unit: u16) -> String {
        format!("sampler_{unit}")
    }

    pub fn texture_name(unit: u16) -> String {
        format!("texture_{unit}")
    }
}

/// Handle to a parameter within a program.
///
/// Input/output/local handles index into the entry function; uniform
/// handles index into the owning program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamRef {
    Input(usize),
    Output(usize),
    Local(usize),
    Uniform(usize),
}

/// Which parameter list of a function to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamList {
    Input,
    Output,
    Local,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_vector_bounds() {
        assert_eq!(GpuConstantType::float_vector(1), Some(GpuConstantType::Float1));
        assert_eq!(GpuConstantType::float_vector(4), Some(GpuConstantType::Float4));
        assert_eq!(GpuConstantType::float_vector(0), None);
        assert_eq!(GpuConstantType::float_vector(5), None);
    }

    #[test]
    fn semantic_names() {
        assert_eq!(Parameter::semantic_name(Semantic::Position, 0), "position");
        assert_eq!(
            Parameter::semantic_name(Semantic::TextureCoordinates, 3),
            "texcoord_3"
        );
    }
}
