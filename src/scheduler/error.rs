use crate::peer::PeerError;
use thiserror::Error;

/// The only terminal failure of a download.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    /// Every worker has exited and some pieces are still missing. The
    /// verified pieces remain readable through
    /// [`Downloader::state`](super::Downloader::state).
    #[error("download incomplete: {completed}/{total} pieces")]
    Incomplete { completed: usize, total: usize },
}

/// Why one piece attempt, or one worker, stopped.
#[derive(Debug, Error)]
pub(crate) enum PieceError {
    #[error("piece {index} failed verification")]
    Verification { index: usize },

    #[error("peer did not unchoke")]
    StillChoked,

    #[error("received {received} of {expected} blocks")]
    Stalled { received: usize, expected: usize },

    #[error("cancelled")]
    Cancelled,

    #[error(transparent)]
    Peer(#[from] PeerError),
}

impl PieceError {
    /// Failures that end the attempt but leave the peer usable.
    pub(crate) fn is_retryable(&self) -> bool {
        matches!(
            self,
            PieceError::Verification { .. } | PieceError::StillChoked | PieceError::Stalled { .. }
        )
    }
}
