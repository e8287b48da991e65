use gamekit_atlas::AtlasError;

/// Errors from demo configuration and scene setup.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("atlas error: {0}")]
    Atlas(#[from] AtlasError),
}
