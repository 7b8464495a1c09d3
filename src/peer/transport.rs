use super::error::PeerError;
use super::message::{Handshake, Message, HANDSHAKE_LEN};
use bytes::BytesMut;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;
const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Length-prefixed framing over any byte stream.
///
/// Bytes of a partially received frame stay in the read buffer when a
/// receive times out, so the next receive resumes the same frame.
pub struct PeerTransport<S> {
    stream: S,
    read_buf: BytesMut,
}

impl<S> PeerTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            read_buf: BytesMut::with_capacity(32 * 1024),
        }
    }

    pub async fn send_handshake(&mut self, handshake: &Handshake) -> Result<(), PeerError> {
        self.write(&handshake.encode()).await
    }

    /// Reads exactly one 68-byte handshake, failing with `Timeout` if it does
    /// not arrive within `wait`.
    pub async fn receive_handshake(&mut self, wait: Duration) -> Result<Handshake, PeerError> {
        timeout(wait, self.fill(HANDSHAKE_LEN))
            .await
            .map_err(|_| PeerError::Timeout)??;

        let data = self.read_buf.split_to(HANDSHAKE_LEN);
        Handshake::decode(&data)
    }

    pub async fn send_message(&mut self, message: &Message) -> Result<(), PeerError> {
        self.write(&message.encode()).await
    }

    /// Waits up to `wait` for one complete frame. Returns `Ok(None)` if the
    /// wait elapses first.
    pub async fn receive_message(&mut self, wait: Duration) -> Result<Option<Message>, PeerError> {
        match timeout(wait, self.read_frame()).await {
            Ok(frame) => frame.map(Some),
            Err(_) => Ok(None),
        }
    }

    pub async fn shutdown(&mut self) -> Result<(), PeerError> {
        self.stream.shutdown().await?;
        Ok(())
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), PeerError> {
        timeout(WRITE_TIMEOUT, self.stream.write_all(data))
            .await
            .map_err(|_| PeerError::Timeout)??;
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<Message, PeerError> {
        self.fill(4).await?;

        let length = u32::from_be_bytes([
            self.read_buf[0],
            self.read_buf[1],
            self.read_buf[2],
            self.read_buf[3],
        ]) as usize;

        if length > MAX_MESSAGE_SIZE {
            return Err(PeerError::InvalidMessage(format!(
                "message too large: {}",
                length
            )));
        }

        let total_len = 4 + length;
        self.fill(total_len).await?;

        let data = self.read_buf.split_to(total_len);
        Message::decode(data.freeze())
    }

    // Cancel-safe: read_buf only appends bytes that were actually read.
    async fn fill(&mut self, len: usize) -> Result<(), PeerError> {
        while self.read_buf.len() < len {
            let n = self.stream.read_buf(&mut self.read_buf).await?;
            if n == 0 {
                return Err(PeerError::ConnectionClosed);
            }
        }
        Ok(())
    }
}
