//! HTTP tracker announce (BEP-3, BEP-23).
//!
//! The tracker is only a source of peer addresses for the scheduler: one
//! `event=started` announce per download.

mod error;
mod http;
mod response;

pub use error::TrackerError;
pub use http::HttpTracker;
pub use response::{
    parse_announce, parse_compact_peers, AnnounceRequest, AnnounceResponse, CompactPeer,
    TrackerEvent,
};
