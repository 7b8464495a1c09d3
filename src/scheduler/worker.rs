use super::config::DownloadConfig;
use super::error::PieceError;
use super::state::{PieceTable, WorkerId};
use crate::metainfo::Metainfo;
use crate::peer::{plan_blocks, BlockRequest, Message, PeerId, PeerSession};
use bytes::{Bytes, BytesMut};
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// State every worker of one download shares.
pub(crate) struct Shared {
    pub(crate) metainfo: Arc<Metainfo>,
    pub(crate) peer_id: PeerId,
    pub(crate) config: DownloadConfig,
    pub(crate) table: PieceTable,
    pub(crate) cancel: watch::Sender<bool>,
}

impl Shared {
    pub(crate) fn cancel(&self) {
        self.cancel.send_replace(true);
    }
}

/// Connects to `addr` and downloads from it until the torrent is complete,
/// the download is cancelled, or the peer fails.
pub(crate) async fn run_peer(shared: Arc<Shared>, id: WorkerId, addr: SocketAddr) {
    let session = match PeerSession::connect(
        addr,
        shared.metainfo.info_hash,
        shared.peer_id,
        shared.config.connect_timeout,
    )
    .await
    {
        Ok(session) => session,
        Err(e) => {
            debug!(worker = id, %addr, error = %e, "connect failed");
            return;
        }
    };

    Worker::new(id, session, shared).run().await;
}

/// Drives one peer session through the piece assignment loop.
pub(crate) struct Worker<S> {
    id: WorkerId,
    session: PeerSession<S>,
    shared: Arc<Shared>,
    cancel: watch::Receiver<bool>,
}

impl<S> Worker<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(id: WorkerId, session: PeerSession<S>, shared: Arc<Shared>) -> Self {
        let cancel = shared.cancel.subscribe();
        Self {
            id,
            session,
            shared,
            cancel,
        }
    }

    /// Runs to completion and always closes the session.
    pub(crate) async fn run(mut self) {
        let result = self.drive().await;
        self.session.close().await;

        let addr = self.session.addr();
        match result {
            Ok(()) => debug!(worker = self.id, %addr, "worker finished"),
            Err(PieceError::Cancelled) => debug!(worker = self.id, %addr, "worker cancelled"),
            Err(e) => debug!(worker = self.id, %addr, error = %e, "worker exited"),
        }
    }

    async fn drive(&mut self) -> Result<(), PieceError> {
        let config = &self.shared.config;
        let (handshake_timeout, failure_backoff, idle_backoff) =
            (config.handshake_timeout, config.failure_backoff, config.idle_backoff);

        self.session.handshake(handshake_timeout).await?;
        self.wait_for_bitfield().await?;

        loop {
            if self.shared.table.is_finished() {
                return Ok(());
            }
            if *self.cancel.borrow() {
                return Err(PieceError::Cancelled);
            }

            let session = &self.session;
            let claimed = self
                .shared
                .table
                .claim_first(self.id, |index| session.has_piece(index));

            let Some(index) = claimed else {
                trace!(worker = self.id, "no claimable piece");
                self.pause(idle_backoff).await?;
                continue;
            };

            debug!(worker = self.id, index, "claimed piece");
            match self.fetch_piece(index).await {
                Ok(data) => {
                    if self.shared.table.complete(index, self.id, data) {
                        let progress = self.shared.table.progress();
                        info!(
                            index,
                            addr = %self.session.addr(),
                            completed = progress.completed,
                            total = progress.total,
                            "piece verified"
                        );
                        if progress.is_complete() {
                            self.shared.cancel();
                        }
                    }
                }
                Err(e) if e.is_retryable() => {
                    self.shared.table.release(index, self.id);
                    warn!(worker = self.id, index, error = %e, "piece attempt failed");
                    self.pause(failure_backoff).await?;
                }
                Err(e) => {
                    self.shared.table.release(index, self.id);
                    return Err(e);
                }
            }
        }
    }

    async fn wait_for_bitfield(&mut self) -> Result<(), PieceError> {
        let read_timeout = self.shared.config.read_timeout;
        for _ in 0..self.shared.config.bitfield_polls {
            if self.session.bitfield().is_some() {
                break;
            }
            self.poll(read_timeout).await?;
        }
        if self.session.bitfield().is_none() {
            debug!(worker = self.id, addr = %self.session.addr(), "no bitfield received");
        }
        Ok(())
    }

    /// Downloads and verifies one claimed piece.
    async fn fetch_piece(&mut self, index: usize) -> Result<Bytes, PieceError> {
        let info = &self.shared.metainfo.info;
        let length = info.piece_length(index);
        let expected_hash = *info.piece_hash(index);
        let blocks = plan_blocks(index as u32, length, self.shared.config.block_size);

        self.ensure_unchoked().await?;

        for block in &blocks {
            self.session
                .send_request(block.piece, block.offset, block.length)
                .await?;
        }

        let received = self.collect_blocks(index as u32, &blocks).await?;
        if received.len() < blocks.len() {
            for block in blocks.iter().filter(|b| !received.contains_key(&b.offset)) {
                self.session
                    .send_cancel(block.piece, block.offset, block.length)
                    .await?;
            }
            return Err(PieceError::Stalled {
                received: received.len(),
                expected: blocks.len(),
            });
        }

        let mut piece = BytesMut::with_capacity(length as usize);
        for data in received.values() {
            piece.extend_from_slice(data);
        }

        if Sha1::digest(&piece).as_slice() != expected_hash.as_slice() {
            return Err(PieceError::Verification { index });
        }
        Ok(piece.freeze())
    }

    async fn ensure_unchoked(&mut self) -> Result<(), PieceError> {
        if !self.session.choking.am_interested {
            self.session.send_interested().await?;
        }

        let read_timeout = self.shared.config.read_timeout;
        let deadline = Instant::now() + self.shared.config.unchoke_timeout;
        while self.session.choking.peer_choking {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(PieceError::StillChoked);
            }
            self.poll(remaining.min(read_timeout)).await?;
        }
        Ok(())
    }

    /// Gathers `piece` messages for the requested blocks, keyed by offset.
    /// Stops early after too many consecutive empty polls.
    async fn collect_blocks(
        &mut self,
        index: u32,
        blocks: &[BlockRequest],
    ) -> Result<BTreeMap<u32, Bytes>, PieceError> {
        let read_timeout = self.shared.config.read_timeout;
        let max_empty_polls = self.shared.config.max_empty_polls;

        let mut received = BTreeMap::new();
        let mut empty_polls = 0;

        while received.len() < blocks.len() && empty_polls < max_empty_polls {
            match self.poll(read_timeout).await? {
                None => empty_polls += 1,
                Some(Message::Piece { index: i, begin, data }) if i == index => {
                    let requested = blocks
                        .iter()
                        .any(|b| b.offset == begin && b.length as usize == data.len());
                    if requested {
                        received.insert(begin, data);
                        empty_polls = 0;
                    } else {
                        trace!(worker = self.id, index, begin, "unrequested block");
                    }
                }
                Some(_) => {}
            }
        }
        Ok(received)
    }

    /// Waits for the peer while processing whatever it sends.
    async fn pause(&mut self, duration: Duration) -> Result<(), PieceError> {
        let deadline = Instant::now() + duration;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(());
            }
            self.poll(remaining).await?;
        }
    }

    /// One bounded read that also observes cancellation.
    async fn poll(&mut self, wait: Duration) -> Result<Option<Message>, PieceError> {
        if *self.cancel.borrow_and_update() {
            return Err(PieceError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.cancel.changed() => Err(PieceError::Cancelled),
            message = self.session.receive(wait) => Ok(message?),
        }
    }
}
