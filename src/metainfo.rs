//! Torrent metainfo handling ([BEP-3]).
//!
//! A `.torrent` file is a bencoded dictionary with an `announce` URL and an
//! `info` dictionary. The SHA-1 of the canonical encoding of `info` is the
//! torrent's [`InfoHash`], the identity peers check during the handshake.
//!
//! [`Metainfo::from_bytes`] decodes and validates a descriptor once; the rest
//! of the crate works with the typed [`Metainfo`] and [`Info`] structures and
//! never looks keys up in raw bencode again.
//!
//! # Examples
//!
//! ```no_run
//! use leech::metainfo::Metainfo;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let torrent = Metainfo::from_file("example.torrent")?;
//!
//! println!("Info hash: {}", torrent.info_hash);
//! println!("Total size: {} bytes", torrent.info.total_length);
//! for index in 0..torrent.info.piece_count() {
//!     println!("piece {}: {} bytes", index, torrent.info.piece_length(index));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Torrent Structure
//!
//! - **announce** - Primary tracker URL (required)
//! - **announce-list** - Additional tracker tiers (BEP-12)
//! - **info** - Hashed payload (required)
//!   - `piece length` - Nominal size of each piece in bytes
//!   - `pieces` - Concatenated 20-byte SHA-1 digests, one per piece
//!   - `length` (single file) OR `files` (list of `{path, length}`)
//!   - `name` - Suggested file or directory name
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

mod error;
mod info_hash;
mod torrent;

pub use error::MetainfoError;
pub use info_hash::InfoHash;
pub use torrent::{File, Info, Metainfo, PIECE_HASH_LEN};
