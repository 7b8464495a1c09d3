//! Protocol constants and tuning parameters.
//!
//! Defaults for [`DownloadConfig`](crate::scheduler::DownloadConfig) and the
//! tracker client live here.

use std::time::Duration;

// ============================================================================
// Client identification
// ============================================================================

/// Client ID prefix for peer ID generation (Azureus-style)
pub const CLIENT_PREFIX: &str = "-LE0001-";

/// User agent string for HTTP requests
pub const USER_AGENT: &str = "leech/0.1.0";

// ============================================================================
// Ports and limits
// ============================================================================

/// Port reported to trackers. Nothing listens on it; leech never seeds.
pub const DEFAULT_PORT: u16 = 6881;

/// Peers requested from a tracker per announce
pub const DEFAULT_NUMWANT: u32 = 50;

/// Maximum concurrently running peer workers
pub const MAX_PEERS: usize = 50;

// ============================================================================
// Block and piece sizes
// ============================================================================

/// Standard block size (16KB)
pub const BLOCK_SIZE: u32 = 16384;

// ============================================================================
// Timeouts
// ============================================================================

/// TCP connection timeout
pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Handshake timeout after TCP connect
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Wait for a single message before reporting "no message yet"
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// How long a claimed piece waits for the peer to unchoke us
pub const UNCHOKE_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP tracker request timeout
pub const HTTP_TRACKER_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Polling and backoff
// ============================================================================

/// Reads attempted after the handshake while waiting for a bitfield
pub const BITFIELD_POLLS: u32 = 10;

/// Consecutive empty reads tolerated while collecting a piece's blocks
pub const MAX_EMPTY_POLLS: u32 = 100;

/// Pause when no eligible piece is available
pub const IDLE_BACKOFF: Duration = Duration::from_secs(1);

/// Pause after a piece attempt fails
pub const FAILURE_BACKOFF: Duration = Duration::from_millis(500);
