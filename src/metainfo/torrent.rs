use super::error::MetainfoError;
use super::info_hash::InfoHash;
use crate::bencode::{decode, encode, Value};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Length of one SHA-1 piece digest inside `pieces`.
pub const PIECE_HASH_LEN: usize = 20;

/// A parsed and validated torrent descriptor.
///
/// # Examples
///
/// ```
/// use leech::metainfo::Metainfo;
///
/// let data = b"d8:announce18:http://tracker/ann4:infod6:lengthi5e\
///              12:piece lengthi16384e6:pieces20:aaaaaaaaaaaaaaaaaaaaee";
/// let metainfo = Metainfo::from_bytes(data).unwrap();
/// assert_eq!(metainfo.info.piece_count(), 1);
/// assert_eq!(metainfo.info.piece_length(0), 5);
/// ```
#[derive(Debug, Clone)]
pub struct Metainfo {
    /// Primary tracker URL.
    pub announce: String,
    /// Multi-tier tracker list ([BEP-12](http://bittorrent.org/beps/bep_0012.html)).
    pub announce_list: Vec<Vec<String>>,
    /// The validated `info` dictionary.
    pub info: Info,
    /// SHA-1 of the canonical encoding of `info`.
    pub info_hash: InfoHash,
    pub creation_date: Option<i64>,
    pub comment: Option<String>,
    pub created_by: Option<String>,
    raw_info: Bytes,
}

/// The piece and file layout from the `info` dictionary.
#[derive(Debug, Clone)]
pub struct Info {
    /// Suggested name for the file or directory.
    pub name: Option<String>,
    /// Nominal number of bytes per piece; only the last piece may be shorter.
    pub piece_length: u64,
    /// SHA-1 digest of each piece.
    pub pieces: Vec<[u8; 20]>,
    /// Files in torrent order. Single-file torrents have exactly one entry.
    pub files: Vec<File>,
    /// Total size of all files combined.
    pub total_length: u64,
    pub private: bool,
}

/// A file within a torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// Path relative to the torrent root.
    pub path: PathBuf,
    pub length: u64,
    /// Byte offset of this file within the concatenated piece data.
    pub offset: u64,
}

impl Metainfo {
    /// Decodes and validates a torrent descriptor.
    ///
    /// The `info` value is re-encoded canonically before hashing, so a
    /// descriptor written with unsorted keys still hashes to the same value
    /// any conforming peer computes.
    ///
    /// # Errors
    ///
    /// - [`MetainfoError::Bencode`] if the bytes are not valid bencode
    /// - [`MetainfoError::MissingField`] if `announce` or `info` is absent
    /// - [`MetainfoError::InvalidLayout`] if `pieces` is not a multiple of 20
    ///   bytes, neither `length` nor `files` is present, or the piece count
    ///   disagrees with the total length
    pub fn from_bytes(data: &[u8]) -> Result<Self, MetainfoError> {
        let value = decode(data)?;
        let dict = value.as_dict().ok_or(MetainfoError::InvalidField("root"))?;

        let announce = dict
            .get(b"announce".as_slice())
            .ok_or(MetainfoError::MissingField("announce"))?
            .as_str()
            .ok_or(MetainfoError::InvalidField("announce"))?
            .to_string();

        let info_value = dict
            .get(b"info".as_slice())
            .ok_or(MetainfoError::MissingField("info"))?;

        let raw_info = Bytes::from(encode(info_value));
        let info_hash = InfoHash::from_info_bytes(&raw_info);
        let info = parse_info(info_value)?;

        let announce_list = dict
            .get(b"announce-list".as_slice())
            .and_then(|v| v.as_list())
            .map(|tiers| {
                tiers
                    .iter()
                    .filter_map(|tier| {
                        tier.as_list().map(|urls| {
                            urls.iter()
                                .filter_map(|u| u.as_str().map(String::from))
                                .collect()
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            announce,
            announce_list,
            info,
            info_hash,
            creation_date: dict
                .get(b"creation date".as_slice())
                .and_then(|v| v.as_integer()),
            comment: optional_str(dict, b"comment"),
            created_by: optional_str(dict, b"created by"),
            raw_info,
        })
    }

    /// Reads and parses a `.torrent` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MetainfoError> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Returns the canonical bencoding of the `info` dictionary.
    pub fn raw_info(&self) -> &Bytes {
        &self.raw_info
    }

    /// Returns all tracker URLs, `announce` first, without duplicates.
    pub fn trackers(&self) -> Vec<String> {
        let mut trackers = vec![self.announce.clone()];

        for tier in &self.announce_list {
            for tracker in tier {
                if !trackers.contains(tracker) {
                    trackers.push(tracker.clone());
                }
            }
        }

        trackers
    }
}

impl Info {
    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    /// Actual length of the piece at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`piece_count`](Self::piece_count).
    pub fn piece_length(&self, index: usize) -> u64 {
        self.check_index(index);
        if index + 1 == self.piece_count() {
            self.total_length - self.piece_length * index as u64
        } else {
            self.piece_length
        }
    }

    /// Expected SHA-1 digest of the piece at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`piece_count`](Self::piece_count).
    pub fn piece_hash(&self, index: usize) -> &[u8; 20] {
        self.check_index(index);
        &self.pieces[index]
    }

    /// Byte offset of the piece at `index` within the concatenated data.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`piece_count`](Self::piece_count).
    pub fn piece_offset(&self, index: usize) -> u64 {
        self.check_index(index);
        self.piece_length * index as u64
    }

    fn check_index(&self, index: usize) {
        assert!(
            index < self.piece_count(),
            "piece index {} out of range ({} pieces)",
            index,
            self.piece_count()
        );
    }
}

fn optional_str(dict: &BTreeMap<Bytes, Value>, key: &[u8]) -> Option<String> {
    dict.get(key).and_then(|v| v.as_str()).map(String::from)
}

fn non_negative(value: &Value, field: &'static str) -> Result<u64, MetainfoError> {
    value
        .as_integer()
        .and_then(|i| u64::try_from(i).ok())
        .ok_or(MetainfoError::InvalidField(field))
}

fn parse_info(value: &Value) -> Result<Info, MetainfoError> {
    let dict = value.as_dict().ok_or(MetainfoError::InvalidField("info"))?;

    let name = optional_str(dict, b"name");

    let piece_length = non_negative(
        dict.get(b"piece length".as_slice())
            .ok_or(MetainfoError::MissingField("piece length"))?,
        "piece length",
    )?;
    if piece_length == 0 {
        return Err(MetainfoError::InvalidLayout(
            "piece length must be positive".into(),
        ));
    }
    // Block offsets within a piece travel as u32 on the wire.
    if piece_length > u32::MAX as u64 {
        return Err(MetainfoError::InvalidLayout(format!(
            "piece length {} exceeds {}",
            piece_length,
            u32::MAX
        )));
    }

    let pieces_bytes = dict
        .get(b"pieces".as_slice())
        .ok_or(MetainfoError::MissingField("pieces"))?
        .as_bytes()
        .ok_or(MetainfoError::InvalidField("pieces"))?;

    if pieces_bytes.len() % PIECE_HASH_LEN != 0 {
        return Err(MetainfoError::InvalidLayout(format!(
            "pieces length {} is not a multiple of {}",
            pieces_bytes.len(),
            PIECE_HASH_LEN
        )));
    }

    let pieces: Vec<[u8; 20]> = pieces_bytes
        .chunks_exact(PIECE_HASH_LEN)
        .map(|chunk| {
            let mut arr = [0u8; 20];
            arr.copy_from_slice(chunk);
            arr
        })
        .collect();

    let private = dict
        .get(b"private".as_slice())
        .and_then(|v| v.as_integer())
        .map(|v| v == 1)
        .unwrap_or(false);

    let (files, total_length) = if let Some(length) = dict.get(b"length".as_slice()) {
        let length = non_negative(length, "length")?;
        let file = File {
            path: PathBuf::from(name.as_deref().unwrap_or_default()),
            length,
            offset: 0,
        };
        (vec![file], length)
    } else if let Some(files_value) = dict.get(b"files".as_slice()) {
        parse_files(files_value, name.as_deref())?
    } else {
        return Err(MetainfoError::InvalidLayout(
            "neither length nor files present".into(),
        ));
    };

    let expected = total_length.div_ceil(piece_length);
    if expected != pieces.len() as u64 {
        return Err(MetainfoError::InvalidLayout(format!(
            "{} piece hashes for {} bytes at piece length {} (expected {})",
            pieces.len(),
            total_length,
            piece_length,
            expected
        )));
    }

    Ok(Info {
        name,
        piece_length,
        pieces,
        files,
        total_length,
        private,
    })
}

fn parse_files(value: &Value, name: Option<&str>) -> Result<(Vec<File>, u64), MetainfoError> {
    let list = value.as_list().ok_or(MetainfoError::InvalidField("files"))?;

    let mut files = Vec::with_capacity(list.len());
    let mut offset = 0u64;

    for file_value in list {
        let length = non_negative(
            file_value
                .get(b"length")
                .ok_or(MetainfoError::MissingField("file length"))?,
            "file length",
        )?;

        let components = file_value
            .get(b"path")
            .and_then(|v| v.as_list())
            .ok_or(MetainfoError::MissingField("file path"))?;

        if components.is_empty() {
            return Err(MetainfoError::InvalidField("file path"));
        }
        let mut path: PathBuf = name.into_iter().collect();
        for component in components {
            path.push(component.as_str().ok_or(MetainfoError::InvalidField("file path"))?);
        }

        files.push(File {
            path,
            length,
            offset,
        });
        offset = offset.checked_add(length).ok_or_else(|| {
            MetainfoError::InvalidLayout("total length overflows".into())
        })?;
    }

    Ok((files, offset))
}
