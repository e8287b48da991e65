use gamekit_shadergen::ShaderGenError;

/// Errors from atlas registry and shader operations.
#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("atlas definition contained no valid records")]
    NoValidRecords,
    #[error("table index position offset must be at least 1")]
    InvalidIndexOffset,
    #[error("shader generation failed: {0}")]
    ShaderGen(#[from] ShaderGenError),
}
