//! Peer wire protocol (BEP-3).
//!
//! A [`PeerSession`] owns one connection: it exchanges the 68-byte handshake,
//! frames length-prefixed [`Message`]s through a [`PeerTransport`], and tracks
//! the choke/interest flags and the remote [`Bitfield`]. Reads are always
//! bounded by a timeout and report "no message yet" as `Ok(None)` rather than
//! as an error.

mod bitfield;
mod choking;
mod error;
mod message;
mod peer_id;
mod piece;
mod session;
mod transport;

pub use bitfield::Bitfield;
pub use choking::ChokingState;
pub use error::PeerError;
pub use message::{Handshake, Message, MessageId, HANDSHAKE_LEN, PROTOCOL};
pub use peer_id::PeerId;
pub use piece::{plan_blocks, BlockRequest};
pub use session::{PeerSession, SessionState};
pub use transport::{PeerTransport, MAX_MESSAGE_SIZE};

#[cfg(test)]
mod tests;
