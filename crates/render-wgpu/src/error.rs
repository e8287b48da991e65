/// Errors from building GPU resources for a generated shader.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("vertex input {0} has no vertex format")]
    UnsupportedVertexInput(String),
    #[error("shader has no uniform named {0}")]
    UnknownUniform(String),
    #[error("constant {name} has {found} floats, binding holds {capacity}")]
    ConstantTooLarge {
        name: String,
        found: usize,
        capacity: usize,
    },
}
