use crate::constants::{
    BITFIELD_POLLS, BLOCK_SIZE, CONNECTION_TIMEOUT, FAILURE_BACKOFF, HANDSHAKE_TIMEOUT,
    IDLE_BACKOFF, MAX_EMPTY_POLLS, MAX_PEERS, READ_TIMEOUT, UNCHOKE_TIMEOUT,
};
use std::time::Duration;

/// Tunables for a [`Downloader`](super::Downloader).
///
/// Every wait a worker performs is bounded by one of these values.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Upper bound on concurrently running peer workers.
    pub max_peers: usize,
    pub connect_timeout: Duration,
    pub handshake_timeout: Duration,
    /// Wait for a single message before a poll reports "no message".
    pub read_timeout: Duration,
    /// How long a claimed piece waits for the peer to unchoke us.
    pub unchoke_timeout: Duration,
    /// Polls spent waiting for the peer's bitfield after the handshake.
    pub bitfield_polls: u32,
    /// Consecutive empty polls tolerated while collecting blocks.
    pub max_empty_polls: u32,
    /// Pause when this peer offers no claimable piece.
    pub idle_backoff: Duration,
    /// Pause after a failed piece attempt.
    pub failure_backoff: Duration,
    pub block_size: u32,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_peers: MAX_PEERS,
            connect_timeout: CONNECTION_TIMEOUT,
            handshake_timeout: HANDSHAKE_TIMEOUT,
            read_timeout: READ_TIMEOUT,
            unchoke_timeout: UNCHOKE_TIMEOUT,
            bitfield_polls: BITFIELD_POLLS,
            max_empty_polls: MAX_EMPTY_POLLS,
            idle_backoff: IDLE_BACKOFF,
            failure_backoff: FAILURE_BACKOFF,
            block_size: BLOCK_SIZE,
        }
    }
}

impl DownloadConfig {
    pub fn with_max_peers(mut self, max_peers: usize) -> Self {
        self.max_peers = max_peers.max(1);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_unchoke_timeout(mut self, timeout: Duration) -> Self {
        self.unchoke_timeout = timeout;
        self
    }

    pub fn with_bitfield_polls(mut self, polls: u32) -> Self {
        self.bitfield_polls = polls;
        self
    }

    pub fn with_max_empty_polls(mut self, polls: u32) -> Self {
        self.max_empty_polls = polls;
        self
    }

    pub fn with_idle_backoff(mut self, backoff: Duration) -> Self {
        self.idle_backoff = backoff;
        self
    }

    pub fn with_failure_backoff(mut self, backoff: Duration) -> Self {
        self.failure_backoff = backoff;
        self
    }

    /// Block size for requests. Zero is treated as one byte.
    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.block_size = block_size.max(1);
        self
    }
}
