use crate::parameter::GpuConstantType;

/// Errors raised while assembling or writing shader programs.
#[derive(Debug, thiserror::Error)]
pub enum ShaderGenError {
    #[error("parameter `{name}` already resolved as {existing:?}, requested {requested:?}")]
    ParameterTypeConflict {
        name: String,
        existing: GpuConstantType,
        requested: GpuConstantType,
    },
    #[error("no free slot left for semantic {0}")]
    NoFreeSlot(&'static str),
    #[error("unknown parameter handle {0}")]
    UnknownParameter(String),
    #[error("invocation of `{function}` must have exactly one output operand, found {found}")]
    BadOutputCount { function: String, found: usize },
    #[error("invocation of `{0}` has an indexing operand with nothing to index")]
    DanglingIndex(String),
    #[error("shader library `{0}` is not registered")]
    MissingLibrary(String),
    #[error("semantic {semantic} is not supported as {usage}")]
    UnsupportedSemantic {
        semantic: &'static str,
        usage: &'static str,
    },
    #[error("sub-render state `{name}` was not prepared for a pass: {reason}")]
    NotPrepared { name: &'static str, reason: String },
    #[error("unknown texture addressing mode `{0}`")]
    UnknownAddressingMode(String),
}
