use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("piece {0} has not been downloaded")]
    MissingPiece(usize),

    #[error("pieces hold {actual} bytes, files need {expected}")]
    LengthMismatch { expected: u64, actual: u64 },

    #[error("path traversal detected in file path: {0}")]
    PathTraversal(String),
}
