use crate::error::ShaderGenError;
use crate::operand::FunctionInvocation;
use crate::parameter::{Content, GpuConstantType, ParamList, ParamRef, Parameter, Semantic};

/// A shader entry function: its varyings, locals and body.
#[derive(Debug, Clone, Default)]
pub struct Function {
    name: String,
    inputs: Vec<Parameter>,
    outputs: Vec<Parameter>,
    locals: Vec<Parameter>,
    atoms: Vec<FunctionInvocation>,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[Parameter] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Parameter] {
        &self.outputs
    }

    pub fn locals(&self) -> &[Parameter] {
        &self.locals
    }

    /// Find or create an input. `index: None` takes the next free slot.
    pub fn resolve_input_parameter(
        &mut self,
        semantic: Semantic,
        index: Option<u16>,
        content: Content,
        ty: GpuConstantType,
    ) -> Result<ParamRef, ShaderGenError> {
        resolve_varying(&mut self.inputs, semantic, index, content, ty).map(ParamRef::Input)
    }

    /// Find or create an output. `index: None` takes the next free slot.
    pub fn resolve_output_parameter(
        &mut self,
        semantic: Semantic,
        index: Option<u16>,
        content: Content,
        ty: GpuConstantType,
    ) -> Result<ParamRef, ShaderGenError> {
        resolve_varying(&mut self.outputs, semantic, index, content, ty).map(ParamRef::Output)
    }

    /// Find or create a named local variable.
    pub fn resolve_local_parameter(
        &mut self,
        name: &str,
        ty: GpuConstantType,
    ) -> Result<ParamRef, ShaderGenError> {
        if let Some(pos) = self.locals.iter().position(|p| p.name == name) {
            let existing = self.locals[pos].ty;
            if existing != ty {
                return Err(ShaderGenError::ParameterTypeConflict {
                    name: name.into(),
                    existing,
                    requested: ty,
                });
            }
            return Ok(ParamRef::Local(pos));
        }
        self.locals.push(Parameter {
            name: name.into(),
            ty,
            semantic: Semantic::Unknown,
            index: 0,
            content: Content::Unknown,
        });
        Ok(ParamRef::Local(self.locals.len() - 1))
    }

    pub fn parameter_by_semantic(
        &self,
        list: ParamList,
        semantic: Semantic,
        index: u16,
    ) -> Option<ParamRef> {
        let params = self.list(list);
        params
            .iter()
            .position(|p| p.semantic == semantic && p.index == index)
            .map(|pos| wrap(list, pos))
    }

    pub fn parameter_by_name(&self, list: ParamList, name: &str) -> Option<ParamRef> {
        self.list(list)
            .iter()
            .position(|p| p.name == name)
            .map(|pos| wrap(list, pos))
    }

    /// Look up a parameter handle. Uniform handles belong to the program.
    pub fn parameter(&self, param: ParamRef) -> Option<&Parameter> {
        match param {
            ParamRef::Input(i) => self.inputs.get(i),
            ParamRef::Output(i) => self.outputs.get(i),
            ParamRef::Local(i) => self.locals.get(i),
            ParamRef::Uniform(_) => None,
        }
    }

    pub fn add_atom_instance(&mut self, invocation: FunctionInvocation) {
        self.atoms.push(invocation);
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Body statements in execution order (stable within equal orders).
    pub fn sorted_atoms(&self) -> Vec<&FunctionInvocation> {
        let mut atoms: Vec<&FunctionInvocation> = self.atoms.iter().collect();
        atoms.sort_by_key(|a| (a.group_order, a.internal_order));
        atoms
    }

    fn list(&self, list: ParamList) -> &[Parameter] {
        match list {
            ParamList::Input => &self.inputs,
            ParamList::Output => &self.outputs,
            ParamList::Local => &self.locals,
        }
    }
}

fn wrap(list: ParamList, pos: usize) -> ParamRef {
    match list {
        ParamList::Input => ParamRef::Input(pos),
        ParamList::Output => ParamRef::Output(pos),
        ParamList::Local => ParamRef::Local(pos),
    }
}

fn resolve_varying(
    params: &mut Vec<Parameter>,
    semantic: Semantic,
    index: Option<u16>,
    content: Content,
    ty: GpuConstantType,
) -> Result<usize, ShaderGenError> {
    let index = match index {
        Some(index) => {
            if let Some(pos) = params
                .iter()
                .position(|p| p.semantic == semantic && p.index == index)
            {
                let existing = &params[pos];
                if existing.ty != ty {
                    return Err(ShaderGenError::ParameterTypeConflict {
                        name: existing.name.clone(),
                        existing: existing.ty,
                        requested: ty,
                    });
                }
                return Ok(pos);
            }
            index
        }
        None => (0..=u16::MAX)
            .find(|i| !params.iter().any(|p| p.semantic == semantic && p.index == *i))
            .ok_or(ShaderGenError::NoFreeSlot(semantic.as_str()))?,
    };

    params.push(Parameter {
        name: Parameter::semantic_name(semantic, index),
        ty,
        semantic,
        index,
        content,
    });
    Ok(params.len() - 1)
}
