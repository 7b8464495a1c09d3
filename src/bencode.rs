//! Bencode encoding and decoding ([BEP-3]).
//!
//! Bencode is the serialization format used by `.torrent` files and tracker
//! responses. It has four data types:
//!
//! | Type | Format | Example |
//! |------|--------|---------|
//! | Integer | `i<number>e` | `i42e` → 42 |
//! | Byte String | `<length>:<data>` | `4:spam` → "spam" |
//! | List | `l<items>e` | `l4:spami42ee` → ["spam", 42] |
//! | Dictionary | `d<key><value>...e` | `d3:foo3:bare` → {"foo": "bar"} |
//!
//! Decoding is strict: a value must consume the whole input, and every
//! failure reports the byte offset where it was detected. Encoding is
//! canonical: dictionary keys are always emitted in ascending byte order,
//! which is what makes the info hash of a re-encoded `info` dictionary
//! reproducible.
//!
//! # Examples
//!
//! ```
//! use leech::bencode::{decode, encode, Value};
//!
//! let value = decode(b"d3:cow3:moo4:spami42ee").unwrap();
//! assert_eq!(value.get(b"cow").and_then(|v| v.as_str()), Some("moo"));
//! assert_eq!(value.get(b"spam").and_then(|v| v.as_integer()), Some(42));
//!
//! assert_eq!(encode(&value), b"d3:cow3:moo4:spami42ee");
//! ```
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

mod decode;
mod encode;
mod error;
mod value;

pub use decode::{decode, Decoder};
pub use encode::encode;
pub use error::BencodeError;
pub use value::Value;

#[cfg(test)]
mod tests;
