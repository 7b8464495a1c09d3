//! Output of a finished download.
//!
//! Pieces are written strictly in index order once every piece is verified;
//! nothing is written incrementally.

mod error;
mod writer;

pub use error::StorageError;
pub use writer::{write_files, write_pieces, write_table};
