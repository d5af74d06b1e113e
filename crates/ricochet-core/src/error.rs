use thiserror::Error;

#[derive(Error, Debug)]
pub enum RicochetError {
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("Index {index} out of range for {len} vertices")]
    IndexOutOfRange { index: u32, len: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Missing collaborator: {0}")]
    MissingCollaborator(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RicochetError>;
