//! Piece scheduling and verification.
//!
//! A [`Downloader`] runs one worker per peer. Each worker handshakes, waits
//! briefly for the peer's bitfield, then loops:
//!
//! 1. claim the lowest missing, unclaimed piece the peer advertises;
//! 2. send `interested` and wait, bounded, for an unchoke;
//! 3. request every block of the piece and collect them by offset;
//! 4. join the blocks, check the SHA-1, and either complete or release the
//!    claim.
//!
//! Failures of one peer never fail the download. The only terminal error is
//! [`DownloadError::Incomplete`], returned once every worker has exited while
//! pieces are still missing.

mod config;
mod download;
mod error;
mod state;
mod worker;

pub use config::DownloadConfig;
pub use download::{CancelHandle, Downloader};
pub use error::DownloadError;
pub use state::{PieceTable, Progress, WorkerId};
