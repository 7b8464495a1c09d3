use super::config::DownloadConfig;
use super::error::DownloadError;
use super::state::{PieceTable, Progress};
use super::worker::{run_peer, Shared};
use crate::metainfo::Metainfo;
use crate::peer::PeerId;
use bytes::Bytes;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Downloads every piece of one torrent from a set of peers.
///
/// One worker task is spawned per peer address; at most
/// [`DownloadConfig::max_peers`] of them run at once. Workers claim pieces
/// from a shared [`PieceTable`], so no piece is fetched by two workers at the
/// same time.
///
/// # Examples
///
/// ```no_run
/// use leech::metainfo::Metainfo;
/// use leech::peer::PeerId;
/// use leech::scheduler::{DownloadConfig, Downloader};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let metainfo = Metainfo::from_file("example.torrent")?;
/// let peers = vec!["10.0.0.2:6881".parse()?];
///
/// let downloader = Downloader::new(metainfo, PeerId::generate(), DownloadConfig::default());
/// let pieces = downloader.run(peers).await?;
/// assert_eq!(pieces.len(), downloader.progress().total);
/// # Ok(())
/// # }
/// ```
pub struct Downloader {
    shared: Arc<Shared>,
}

/// Aborts a running download from another task.
#[derive(Clone)]
pub struct CancelHandle {
    shared: Arc<Shared>,
}

impl CancelHandle {
    /// Signals every worker to abandon its piece and close its session.
    pub fn cancel(&self) {
        self.shared.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.shared.cancel.borrow()
    }
}

impl Downloader {
    pub fn new(metainfo: impl Into<Arc<Metainfo>>, peer_id: PeerId, config: DownloadConfig) -> Self {
        let metainfo = metainfo.into();
        let table = PieceTable::new(metainfo.info.piece_count());
        let (cancel, _) = watch::channel(false);

        Self {
            shared: Arc::new(Shared {
                metainfo,
                peer_id,
                config,
                table,
                cancel,
            }),
        }
    }

    pub fn metainfo(&self) -> &Metainfo {
        &self.shared.metainfo
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn progress(&self) -> Progress {
        self.shared.table.progress()
    }

    /// The shared piece table, for inspecting partial results.
    pub fn state(&self) -> &PieceTable {
        &self.shared.table
    }

    /// Runs workers against `peers` until every piece is verified or every
    /// worker has exited. Duplicate addresses are tried once.
    ///
    /// Returns the verified pieces in index order.
    pub async fn run(
        &self,
        peers: impl IntoIterator<Item = SocketAddr>,
    ) -> Result<Vec<Bytes>, DownloadError> {
        let total = self.shared.table.len();
        let semaphore = Arc::new(Semaphore::new(self.shared.config.max_peers));
        let mut workers = JoinSet::new();
        let mut seen = HashSet::new();

        for addr in peers {
            if !seen.insert(addr) {
                continue;
            }
            let shared = Arc::clone(&self.shared);
            let semaphore = Arc::clone(&semaphore);
            let id = seen.len();
            workers.spawn(async move {
                let mut cancel = shared.cancel.subscribe();
                let permit = tokio::select! {
                    permit = semaphore.acquire_owned() => permit,
                    _ = cancelled(&mut cancel) => return,
                };
                let Ok(_permit) = permit else {
                    return;
                };
                if *cancel.borrow() {
                    return;
                }
                run_peer(shared, id, addr).await;
            });
        }

        info!(
            info_hash = %self.shared.metainfo.info_hash,
            peers = seen.len(),
            pieces = total,
            "download started"
        );

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "worker task failed");
            }
            let progress = self.progress();
            debug!(
                completed = progress.completed,
                total = progress.total,
                running = workers.len(),
                "worker exited"
            );
        }

        match self.shared.table.pieces() {
            Some(pieces) => {
                info!(pieces = total, "download complete");
                Ok(pieces)
            }
            None => {
                let completed = self.shared.table.completed_count();
                warn!(completed, total, "download incomplete");
                Err(DownloadError::Incomplete { completed, total })
            }
        }
    }
}

async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    while !*cancel.borrow_and_update() {
        if cancel.changed().await.is_err() {
            return;
        }
    }
}
