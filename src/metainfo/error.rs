use thiserror::Error;

use crate::bencode::BencodeError;

/// Errors that can occur when loading a torrent descriptor.
#[derive(Debug, Error)]
pub enum MetainfoError {
    /// The descriptor is not valid bencode.
    #[error("bencode error: {0}")]
    Bencode(#[from] BencodeError),

    /// A required field is missing from the descriptor.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A field has the wrong type or an out-of-range value.
    #[error("invalid field: {0}")]
    InvalidField(&'static str),

    /// The piece layout is inconsistent.
    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    #[error("invalid info hash: {0}")]
    InvalidInfoHash(String),

    /// An I/O error occurred while reading the torrent file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
