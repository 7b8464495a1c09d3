use super::error::PeerError;
use bytes::{Buf, BufMut, Bytes, BytesMut};

pub const PROTOCOL: &[u8] = b"BitTorrent protocol";
pub const HANDSHAKE_LEN: usize = 68;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageId {
    Choke = 0,
    Unchoke = 1,
    Interested = 2,
    NotInterested = 3,
    Have = 4,
    Bitfield = 5,
    Request = 6,
    Piece = 7,
    Cancel = 8,
}

impl TryFrom<u8> for MessageId {
    type Error = PeerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MessageId::Choke),
            1 => Ok(MessageId::Unchoke),
            2 => Ok(MessageId::Interested),
            3 => Ok(MessageId::NotInterested),
            4 => Ok(MessageId::Have),
            5 => Ok(MessageId::Bitfield),
            6 => Ok(MessageId::Request),
            7 => Ok(MessageId::Piece),
            8 => Ok(MessageId::Cancel),
            _ => Err(PeerError::InvalidMessageId(value)),
        }
    }
}

/// The fixed 68-byte handshake:
/// `<19><"BitTorrent protocol"><8 reserved><info_hash><peer_id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub info_hash: [u8; 20],
    pub peer_id: [u8; 20],
    pub reserved: [u8; 8],
}

impl Handshake {
    /// Builds a handshake advertising no protocol extensions.
    pub fn new(info_hash: [u8; 20], peer_id: [u8; 20]) -> Self {
        Self {
            info_hash,
            peer_id,
            reserved: [0u8; 8],
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HANDSHAKE_LEN);
        buf.put_u8(PROTOCOL.len() as u8);
        buf.put_slice(PROTOCOL);
        buf.put_slice(&self.reserved);
        buf.put_slice(&self.info_hash);
        buf.put_slice(&self.peer_id);
        buf.freeze()
    }

    /// Parses a received handshake, checking the protocol name length and
    /// literal. The info hash is returned for the caller to compare.
    pub fn decode(data: &[u8]) -> Result<Self, PeerError> {
        if data.len() < HANDSHAKE_LEN {
            return Err(PeerError::InvalidHandshake("truncated"));
        }

        if data[0] as usize != PROTOCOL.len() {
            return Err(PeerError::InvalidHandshake("protocol name length"));
        }

        if &data[1..20] != PROTOCOL {
            return Err(PeerError::InvalidHandshake("protocol name"));
        }

        let mut reserved = [0u8; 8];
        reserved.copy_from_slice(&data[20..28]);

        let mut info_hash = [0u8; 20];
        info_hash.copy_from_slice(&data[28..48]);

        let mut peer_id = [0u8; 20];
        peer_id.copy_from_slice(&data[48..68]);

        Ok(Self {
            info_hash,
            peer_id,
            reserved,
        })
    }
}

/// A peer wire message. Every message after the handshake is framed as
/// `<u32 big-endian length><u8 id><payload>`; a zero length is a keep-alive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    KeepAlive,
    Choke,
    Unchoke,
    Interested,
    NotInterested,
    Have { piece: u32 },
    Bitfield(Bytes),
    Request { index: u32, begin: u32, length: u32 },
    Piece { index: u32, begin: u32, data: Bytes },
    Cancel { index: u32, begin: u32, length: u32 },
}

impl Message {
    pub fn id(&self) -> Option<MessageId> {
        match self {
            Message::KeepAlive => None,
            Message::Choke => Some(MessageId::Choke),
            Message::Unchoke => Some(MessageId::Unchoke),
            Message::Interested => Some(MessageId::Interested),
            Message::NotInterested => Some(MessageId::NotInterested),
            Message::Have { .. } => Some(MessageId::Have),
            Message::Bitfield(_) => Some(MessageId::Bitfield),
            Message::Request { .. } => Some(MessageId::Request),
            Message::Piece { .. } => Some(MessageId::Piece),
            Message::Cancel { .. } => Some(MessageId::Cancel),
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();

        match self {
            Message::KeepAlive => {
                buf.put_u32(0);
            }
            Message::Choke | Message::Unchoke | Message::Interested | Message::NotInterested => {
                buf.put_u32(1);
                buf.put_u8(self.id().map_or(0, |id| id as u8));
            }
            Message::Have { piece } => {
                buf.put_u32(5);
                buf.put_u8(MessageId::Have as u8);
                buf.put_u32(*piece);
            }
            Message::Bitfield(bits) => {
                buf.put_u32(1 + bits.len() as u32);
                buf.put_u8(MessageId::Bitfield as u8);
                buf.put_slice(bits);
            }
            Message::Request {
                index,
                begin,
                length,
            }
            | Message::Cancel {
                index,
                begin,
                length,
            } => {
                buf.put_u32(13);
                buf.put_u8(self.id().map_or(0, |id| id as u8));
                buf.put_u32(*index);
                buf.put_u32(*begin);
                buf.put_u32(*length);
            }
            Message::Piece { index, begin, data } => {
                buf.put_u32(9 + data.len() as u32);
                buf.put_u8(MessageId::Piece as u8);
                buf.put_u32(*index);
                buf.put_u32(*begin);
                buf.put_slice(data);
            }
        }

        buf.freeze()
    }

    /// Decodes one complete frame, length prefix included.
    pub fn decode(mut data: Bytes) -> Result<Self, PeerError> {
        if data.len() < 4 {
            return Err(PeerError::InvalidMessage("too short".into()));
        }

        let length = data.get_u32() as usize;

        if length == 0 {
            return Ok(Message::KeepAlive);
        }

        if data.remaining() < length {
            return Err(PeerError::InvalidMessage("incomplete message".into()));
        }

        let id = MessageId::try_from(data.get_u8())?;
        let mut payload = data.split_to(length - 1);

        let expect = |len: usize, name: &str| {
            if payload.len() == len {
                Ok(())
            } else {
                Err(PeerError::InvalidMessage(format!(
                    "{} payload is {} bytes, expected {}",
                    name,
                    payload.len(),
                    len
                )))
            }
        };

        match id {
            MessageId::Choke => expect(0, "choke").map(|_| Message::Choke),
            MessageId::Unchoke => expect(0, "unchoke").map(|_| Message::Unchoke),
            MessageId::Interested => expect(0, "interested").map(|_| Message::Interested),
            MessageId::NotInterested => {
                expect(0, "not interested").map(|_| Message::NotInterested)
            }
            MessageId::Have => {
                expect(4, "have")?;
                Ok(Message::Have {
                    piece: payload.get_u32(),
                })
            }
            MessageId::Bitfield => Ok(Message::Bitfield(payload)),
            MessageId::Request => {
                expect(12, "request")?;
                Ok(Message::Request {
                    index: payload.get_u32(),
                    begin: payload.get_u32(),
                    length: payload.get_u32(),
                })
            }
            MessageId::Piece => {
                if payload.len() < 8 {
                    return Err(PeerError::InvalidMessage("piece too short".into()));
                }
                let index = payload.get_u32();
                let begin = payload.get_u32();
                Ok(Message::Piece {
                    index,
                    begin,
                    data: payload,
                })
            }
            MessageId::Cancel => {
                expect(12, "cancel")?;
                Ok(Message::Cancel {
                    index: payload.get_u32(),
                    begin: payload.get_u32(),
                    length: payload.get_u32(),
                })
            }
        }
    }
}
