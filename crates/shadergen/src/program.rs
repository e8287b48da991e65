use crate::error::ShaderGenError;
use crate::function::Function;
use crate::parameter::{GpuConstantType, ParamRef, UniformParameter, Variability};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramStage {
    Vertex,
    Fragment,
}

impl ProgramStage {
    pub fn entry_point_name(self) -> &'static str {
        match self {
            Self::Vertex => "vs_main",
            Self::Fragment => "fs_main",
        }
    }
}

/// One CPU-side shader program: entry function, uniforms and library
/// dependencies.
#[derive(Debug, Clone)]
pub struct Program {
    stage: ProgramStage,
    entry: Function,
    uniforms: Vec<UniformParameter>,
    dependencies: Vec<String>,
}

impl Program {
    pub fn new(stage: ProgramStage) -> Self {
        Self {
            stage,
            entry: Function::new(stage.entry_point_name()),
            uniforms: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn stage(&self) -> ProgramStage {
        self.stage
    }

    pub fn entry_point(&self) -> &Function {
        &self.entry
    }

    pub fn entry_point_mut(&mut self) -> &mut Function {
        &mut self.entry
    }

    pub fn uniforms(&self) -> &[UniformParameter] {
        &self.uniforms
    }

    pub fn uniform(&self, param: ParamRef) -> Option<&UniformParameter> {
        match param {
            ParamRef::Uniform(i) => self.uniforms.get(i),
            _ => None,
        }
    }

    /// Find or create a uniform.
    ///
    /// Samplers are keyed by texture unit (`index`); everything else by
    /// `name`.
    pub fn resolve_parameter(
        &mut self,
        ty: GpuConstantType,
        index: Option<u16>,
        variability: Variability,
        name: &str,
        array_size: Option<usize>,
    ) -> Result<ParamRef, ShaderGenError> {
        if ty.is_sampler() {
            let unit = index.unwrap_or(0);
            if let Some(found) = self.parameter_by_type(ty, unit) {
                return Ok(found);
            }
            self.uniforms.push(UniformParameter {
                name: UniformParameter::texture_name(unit),
                ty,
                index: Some(unit),
                variability,
                array_size: None,
            });
            return Ok(ParamRef::Uniform(self.uniforms.len() - 1));
        }

        if let Some(pos) = self.uniforms.iter().position(|u| u.name == name) {
            let existing = self.uniforms[pos].ty;
            if existing != ty {
                return Err(ShaderGenError::ParameterTypeConflict {
                    name: name.into(),
                    existing,
                    requested: ty,
                });
            }
            return Ok(ParamRef::Uniform(pos));
        }

        self.uniforms.push(UniformParameter {
            name: name.into(),
            ty,
            index,
            variability,
            array_size: array_size.map(|n| n.max(1)),
        });
        Ok(ParamRef::Uniform(self.uniforms.len() - 1))
    }

    pub fn parameter_by_type(&self, ty: GpuConstantType, index: u16) -> Option<ParamRef> {
        self.uniforms
            .iter()
            .position(|u| u.ty == ty && u.index == Some(index))
            .map(ParamRef::Uniform)
    }

    pub fn parameter_by_name(&self, name: &str) -> Option<ParamRef> {
        self.uniforms
            .iter()
            .position(|u| u.name == name)
            .map(ParamRef::Uniform)
    }

    /// Add a shader library this program calls into. Duplicates are ignored.
    pub fn add_dependency(&mut self, library: &str) {
        if !self.dependencies.iter().any(|d| d == library) {
            self.dependencies.push(library.into());
        }
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}

/// The vertex/fragment program pair generated for one pass.
#[derive(Debug, Clone)]
pub struct ProgramSet {
    pub vertex: Program,
    pub fragment: Program,
}

impl Default for ProgramSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramSet {
    pub fn new() -> Self {
        Self {
            vertex: Program::new(ProgramStage::Vertex),
            fragment: Program::new(ProgramStage::Fragment),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samplers_are_keyed_by_unit() {
        let mut p = Program::new(ProgramStage::Fragment);
        let a = p
            .resolve_parameter(GpuConstantType::Sampler2d, Some(1), Variability::Global, "", None)
            .unwrap();
        let b = p
            .resolve_parameter(GpuConstantType::Sampler2d, Some(1), Variability::Global, "x", None)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(p.parameter_by_type(GpuConstantType::Sampler2d, 1), Some(a));
        assert_eq!(p.parameter_by_type(GpuConstantType::Sampler2d, 0), None);
        assert_eq!(p.uniform(a).unwrap().name, "texture_1");
    }

    #[test]
    fn named_uniform_keeps_array_size() {
        let mut p = Program::new(ProgramStage::Vertex);
        let r = p
            .resolve_parameter(GpuConstantType::Float4, None, Variability::Global, "atlas_data", Some(6))
            .unwrap();
        assert_eq!(p.uniform(r).unwrap().array_size, Some(6));
        assert_eq!(p.parameter_by_name("atlas_data"), Some(r));
    }

    #[test]
    fn dependencies_are_deduplicated() {
        let mut p = Program::new(ProgramStage::Vertex);
        p.add_dependency("gk_common");
        p.add_dependency("gk_common");
        assert_eq!(p.dependencies(), ["gk_common".to_string()]);
    }
}
