use super::bitfield::Bitfield;
use super::choking::ChokingState;
use super::error::PeerError;
use super::message::{Handshake, Message};
use super::peer_id::PeerId;
use super::transport::PeerTransport;
use crate::metainfo::InfoHash;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, trace};

/// Lifecycle of a [`PeerSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, BitTorrent handshake not yet exchanged.
    HandshakePending,
    /// Handshake verified; messages may be exchanged.
    Ready,
    /// Closed by either side. Terminal.
    Closed,
}

/// One connection to a remote peer for a single torrent.
///
/// A session is driven by exactly one task. Incoming messages update the
/// choking flags and the peer's bitfield before being handed to the caller.
///
/// # Examples
///
/// ```no_run
/// use leech::metainfo::InfoHash;
/// use leech::peer::{PeerId, PeerSession};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let addr = "192.168.1.100:6881".parse()?;
/// let info_hash = InfoHash::from_hex("0123456789abcdef0123456789abcdef01234567")?;
///
/// let mut session =
///     PeerSession::connect(addr, info_hash, PeerId::generate(), Duration::from_secs(10)).await?;
/// session.handshake(Duration::from_secs(10)).await?;
/// session.send_interested().await?;
/// # Ok(())
/// # }
/// ```
pub struct PeerSession<S = TcpStream> {
    addr: SocketAddr,
    info_hash: InfoHash,
    our_peer_id: PeerId,
    remote_peer_id: Option<PeerId>,
    state: SessionState,
    /// Choking state for this connection.
    pub choking: ChokingState,
    bitfield: Option<Bitfield>,
    bytes_downloaded: u64,
    transport: Option<PeerTransport<S>>,
}

impl PeerSession<TcpStream> {
    /// Opens a TCP connection, failing with `ConnectTimeout` if it is not
    /// established within `wait`.
    pub async fn connect(
        addr: SocketAddr,
        info_hash: InfoHash,
        our_peer_id: PeerId,
        wait: Duration,
    ) -> Result<Self, PeerError> {
        trace!(%addr, "connecting");
        let stream = tokio::time::timeout(wait, TcpStream::connect(addr))
            .await
            .map_err(|_| PeerError::ConnectTimeout)??;
        Ok(Self::from_stream(addr, stream, info_hash, our_peer_id))
    }
}

impl<S> PeerSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an already connected stream. The session starts in
    /// `HandshakePending`.
    pub fn from_stream(
        addr: SocketAddr,
        stream: S,
        info_hash: InfoHash,
        our_peer_id: PeerId,
    ) -> Self {
        Self {
            addr,
            info_hash,
            our_peer_id,
            remote_peer_id: None,
            state: SessionState::HandshakePending,
            choking: ChokingState::default(),
            bitfield: None,
            bytes_downloaded: 0,
            transport: Some(PeerTransport::new(stream)),
        }
    }

    /// Sends our handshake and verifies the peer's.
    ///
    /// On any failure the session stays out of `Ready`; the caller is
    /// expected to [`close`](Self::close) it.
    pub async fn handshake(&mut self, wait: Duration) -> Result<(), PeerError> {
        if self.state != SessionState::HandshakePending {
            return Err(PeerError::NotReady);
        }
        let transport = self.transport.as_mut().ok_or(PeerError::NotReady)?;

        let ours = Handshake::new(*self.info_hash.as_bytes(), *self.our_peer_id.as_bytes());
        transport.send_handshake(&ours).await?;

        let theirs = transport.receive_handshake(wait).await?;
        if theirs.info_hash != *self.info_hash.as_bytes() {
            debug!(addr = %self.addr, "info hash mismatch");
            return Err(PeerError::InfoHashMismatch);
        }

        self.remote_peer_id = Some(PeerId(theirs.peer_id));
        self.state = SessionState::Ready;
        debug!(addr = %self.addr, peer_id = ?self.remote_peer_id, "handshake complete");
        Ok(())
    }

    /// Waits up to `wait` for the next message and applies its effect on the
    /// session.
    ///
    /// Returns `Ok(None)` if nothing arrived in time or a keep-alive was
    /// received. Any error leaves the session unusable.
    pub async fn receive(&mut self, wait: Duration) -> Result<Option<Message>, PeerError> {
        if self.state != SessionState::Ready {
            return Err(PeerError::NotReady);
        }
        let transport = self.transport.as_mut().ok_or(PeerError::NotReady)?;

        let message = match transport.receive_message(wait).await? {
            Some(Message::KeepAlive) | None => return Ok(None),
            Some(message) => message,
        };

        match &message {
            Message::Choke => {
                trace!(addr = %self.addr, "choked");
                self.choking.peer_choking = true;
            }
            Message::Unchoke => {
                trace!(addr = %self.addr, "unchoked");
                self.choking.peer_choking = false;
            }
            Message::Interested => self.choking.peer_interested = true,
            Message::NotInterested => self.choking.peer_interested = false,
            Message::Have { piece } => {
                trace!(addr = %self.addr, piece, "have");
            }
            Message::Bitfield(bits) => {
                trace!(addr = %self.addr, bytes = bits.len(), "bitfield");
                self.bitfield = Some(Bitfield::from_bytes(bits.clone()));
            }
            Message::Piece { data, .. } => {
                self.bytes_downloaded += data.len() as u64;
            }
            Message::Request { .. } | Message::Cancel { .. } | Message::KeepAlive => {}
        }

        Ok(Some(message))
    }

    pub async fn send(&mut self, message: &Message) -> Result<(), PeerError> {
        if self.state != SessionState::Ready {
            return Err(PeerError::NotReady);
        }
        let transport = self.transport.as_mut().ok_or(PeerError::NotReady)?;
        transport.send_message(message).await
    }

    pub async fn send_interested(&mut self) -> Result<(), PeerError> {
        self.send(&Message::Interested).await?;
        self.choking.am_interested = true;
        Ok(())
    }

    pub async fn send_not_interested(&mut self) -> Result<(), PeerError> {
        self.send(&Message::NotInterested).await?;
        self.choking.am_interested = false;
        Ok(())
    }

    pub async fn send_request(&mut self, index: u32, begin: u32, length: u32) -> Result<(), PeerError> {
        self.send(&Message::Request {
            index,
            begin,
            length,
        })
        .await
    }

    pub async fn send_cancel(&mut self, index: u32, begin: u32, length: u32) -> Result<(), PeerError> {
        self.send(&Message::Cancel {
            index,
            begin,
            length,
        })
        .await
    }

    /// Whether the peer's bitfield advertises `index`. False until a
    /// bitfield has been received.
    pub fn has_piece(&self, index: usize) -> bool {
        self.bitfield
            .as_ref()
            .is_some_and(|bitfield| bitfield.has_piece(index))
    }

    /// Shuts the connection down. Safe to call more than once.
    pub async fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.shutdown().await {
                trace!(addr = %self.addr, error = %e, "shutdown failed");
            }
            debug!(addr = %self.addr, "session closed");
        }
        self.state = SessionState::Closed;
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready && self.transport.is_some()
    }

    pub fn remote_peer_id(&self) -> Option<&PeerId> {
        self.remote_peer_id.as_ref()
    }

    pub fn bitfield(&self) -> Option<&Bitfield> {
        self.bitfield.as_ref()
    }

    pub fn bytes_downloaded(&self) -> u64 {
        self.bytes_downloaded
    }
}
