use super::error::TrackerError;
use crate::bencode::{decode, Value};
use crate::constants::{DEFAULT_NUMWANT, DEFAULT_PORT};
use crate::metainfo::InfoHash;
use crate::peer::PeerId;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerEvent {
    None,
    Started,
    Stopped,
    Completed,
}

impl TrackerEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackerEvent::None => "",
            TrackerEvent::Started => "started",
            TrackerEvent::Stopped => "stopped",
            TrackerEvent::Completed => "completed",
        }
    }
}

/// Parameters of one announce.
///
/// `AnnounceRequest::new` fills in a fresh download: nothing uploaded or
/// downloaded yet, `event=started`, and the default port and peer count.
#[derive(Debug, Clone)]
pub struct AnnounceRequest {
    pub info_hash: InfoHash,
    pub peer_id: PeerId,
    pub port: u16,
    pub uploaded: u64,
    pub downloaded: u64,
    pub left: u64,
    pub event: TrackerEvent,
    pub numwant: u32,
}

impl AnnounceRequest {
    pub fn new(info_hash: InfoHash, peer_id: PeerId, left: u64) -> Self {
        Self {
            info_hash,
            peer_id,
            port: DEFAULT_PORT,
            uploaded: 0,
            downloaded: 0,
            left,
            event: TrackerEvent::Started,
            numwant: DEFAULT_NUMWANT,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_numwant(mut self, numwant: u32) -> Self {
        self.numwant = numwant;
        self
    }

    pub fn with_event(mut self, event: TrackerEvent) -> Self {
        self.event = event;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnnounceResponse {
    pub interval: Option<u32>,
    pub min_interval: Option<u32>,
    pub complete: Option<u32>,
    pub incomplete: Option<u32>,
    pub peers: Vec<SocketAddr>,
    pub peers6: Vec<SocketAddr>,
    pub warning_message: Option<String>,
    pub tracker_id: Option<String>,
}

impl AnnounceResponse {
    pub fn all_peers(&self) -> impl Iterator<Item = &SocketAddr> {
        self.peers.iter().chain(self.peers6.iter())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CompactPeer {
    pub ip: IpAddr,
    pub port: u16,
}

impl CompactPeer {
    pub fn from_v4_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 6 {
            return None;
        }
        let ip = Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]);
        let port = u16::from_be_bytes([bytes[4], bytes[5]]);
        Some(Self {
            ip: IpAddr::V4(ip),
            port,
        })
    }

    pub fn from_v6_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 18 {
            return None;
        }
        let mut ip_bytes = [0u8; 16];
        ip_bytes.copy_from_slice(&bytes[..16]);
        let ip = Ipv6Addr::from(ip_bytes);
        let port = u16::from_be_bytes([bytes[16], bytes[17]]);
        Some(Self {
            ip: IpAddr::V6(ip),
            port,
        })
    }

    pub fn to_socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

/// Parses a compact IPv4 peer list: 4 address bytes and a big-endian port
/// per peer.
pub fn parse_compact_peers(data: &[u8]) -> Result<Vec<SocketAddr>, TrackerError> {
    if data.len() % 6 != 0 {
        return Err(TrackerError::InvalidResponse(format!(
            "compact peers length {} is not a multiple of 6",
            data.len()
        )));
    }
    Ok(data
        .chunks_exact(6)
        .filter_map(CompactPeer::from_v4_bytes)
        .map(|p| p.to_socket_addr())
        .collect())
}

pub fn parse_compact_peers6(data: &[u8]) -> Vec<SocketAddr> {
    data.chunks_exact(18)
        .filter_map(CompactPeer::from_v6_bytes)
        .map(|p| p.to_socket_addr())
        .collect()
}

/// Parses a bencoded announce response body.
///
/// `peers` may be a compact byte string or a list of `{ip, port}`
/// dictionaries; either way it must be present. A `failure reason` turns the
/// whole response into [`TrackerError::Failure`].
pub fn parse_announce(body: &[u8]) -> Result<AnnounceResponse, TrackerError> {
    let value = decode(body)?;
    let dict = value
        .as_dict()
        .ok_or_else(|| TrackerError::InvalidResponse("expected dict".into()))?;

    if let Some(failure) = dict.get(b"failure reason".as_slice()) {
        let text = failure
            .as_bytes()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default();
        return Err(TrackerError::Failure(text));
    }

    let count = |key: &[u8]| {
        dict.get(key)
            .and_then(|v| v.as_integer())
            .and_then(|v| u32::try_from(v).ok())
    };
    let text = |key: &[u8]| dict.get(key).and_then(|v| v.as_str()).map(String::from);

    let mut response = AnnounceResponse {
        interval: count(b"interval"),
        min_interval: count(b"min interval"),
        complete: count(b"complete"),
        incomplete: count(b"incomplete"),
        warning_message: text(b"warning message"),
        tracker_id: text(b"tracker id"),
        ..Default::default()
    };

    match dict.get(b"peers".as_slice()) {
        Some(Value::Bytes(bytes)) => response.peers = parse_compact_peers(bytes)?,
        Some(Value::List(list)) => response.peers = parse_peer_dicts(list),
        Some(_) => return Err(TrackerError::InvalidResponse("unknown peers format".into())),
        None => return Err(TrackerError::InvalidResponse("missing peers".into())),
    }

    if let Some(peers6) = dict.get(b"peers6".as_slice()).and_then(|v| v.as_bytes()) {
        response.peers6 = parse_compact_peers6(peers6);
    }

    Ok(response)
}

fn parse_peer_dicts(list: &[Value]) -> Vec<SocketAddr> {
    list.iter()
        .filter_map(|peer| {
            let ip: IpAddr = peer.get(b"ip")?.as_str()?.parse().ok()?;
            let port = u16::try_from(peer.get(b"port")?.as_integer()?).ok()?;
            Some(SocketAddr::new(ip, port))
        })
        .collect()
}
