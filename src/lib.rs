//! leech - a download-only BitTorrent client core
//!
//! Parses a torrent, asks an HTTP tracker for peers, and downloads every
//! piece from those peers concurrently, verifying each against its SHA-1
//! before it is accepted.
//!
//! # Modules
//!
//! - [`bencode`] - BEP-3 Bencode encoding/decoding
//! - [`metainfo`] - BEP-3 torrent metainfo, info hash and piece layout
//! - [`peer`] - BEP-3 peer wire protocol sessions
//! - [`scheduler`] - Concurrent piece assignment, download and verification
//! - [`tracker`] - BEP-3/23 HTTP tracker announce
//! - [`storage`] - Sequential output of the verified pieces
//!
//! # Example
//!
//! ```no_run
//! use leech::metainfo::Metainfo;
//! use leech::peer::PeerId;
//! use leech::scheduler::{DownloadConfig, Downloader};
//! use leech::tracker::{AnnounceRequest, HttpTracker};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let metainfo = Metainfo::from_file("example.torrent")?;
//! let peer_id = PeerId::generate();
//!
//! let tracker = HttpTracker::new(&metainfo.announce)?;
//! let request = AnnounceRequest::new(metainfo.info_hash, peer_id, metainfo.info.total_length);
//! let response = tracker.announce(&request).await?;
//! let peers: Vec<_> = response.all_peers().copied().collect();
//!
//! let downloader = Downloader::new(metainfo, peer_id, DownloadConfig::default());
//! let pieces = downloader.run(peers).await?;
//! leech::storage::write_pieces("example.bin", &pieces).await?;
//! # Ok(())
//! # }
//! ```

pub mod bencode;
pub mod constants;
pub mod metainfo;
pub mod peer;
pub mod scheduler;
pub mod storage;
pub mod tracker;

pub use bencode::{decode, encode, BencodeError, Value};
pub use metainfo::{File, Info, InfoHash, Metainfo, MetainfoError};
pub use peer::{
    Bitfield, BlockRequest, ChokingState, Handshake, Message, PeerError, PeerId,
    PeerSession, SessionState,
};
pub use scheduler::{CancelHandle, DownloadConfig, DownloadError, Downloader, PieceTable, Progress};
pub use storage::{write_pieces, StorageError};
pub use tracker::{AnnounceRequest, AnnounceResponse, HttpTracker, TrackerError, TrackerEvent};
