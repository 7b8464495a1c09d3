use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Identifies the worker holding a claim.
pub type WorkerId = usize;

#[derive(Debug, Clone)]
enum Slot {
    Missing,
    Claimed(WorkerId),
    Complete(Bytes),
}

/// A snapshot of how many pieces are verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }

    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Download state shared by all workers.
///
/// Each piece index has its own lock, so workers touching different pieces
/// never contend. A slot moves `Missing -> Claimed -> Complete`, or back to
/// `Missing` when its claim is released. No lock is held across an await.
#[derive(Debug)]
pub struct PieceTable {
    slots: Vec<Mutex<Slot>>,
    completed: AtomicUsize,
}

impl PieceTable {
    pub fn new(piece_count: usize) -> Self {
        Self {
            slots: (0..piece_count).map(|_| Mutex::new(Slot::Missing)).collect(),
            completed: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Claims `index` for `worker` if it is neither claimed nor complete.
    pub fn try_claim(&self, index: usize, worker: WorkerId) -> bool {
        let Some(slot) = self.slots.get(index) else {
            return false;
        };
        let mut slot = slot.lock();
        match *slot {
            Slot::Missing => {
                *slot = Slot::Claimed(worker);
                true
            }
            Slot::Claimed(_) | Slot::Complete(_) => false,
        }
    }

    /// Scans indices in ascending order and claims the first one that is
    /// missing and accepted by `eligible`.
    pub fn claim_first(
        &self,
        worker: WorkerId,
        eligible: impl Fn(usize) -> bool,
    ) -> Option<usize> {
        (0..self.slots.len())
            .find(|&index| self.is_missing(index) && eligible(index) && self.try_claim(index, worker))
    }

    /// Returns a claimed piece to `Missing`. Only the claiming worker can
    /// release it.
    pub fn release(&self, index: usize, worker: WorkerId) {
        if let Some(slot) = self.slots.get(index) {
            let mut slot = slot.lock();
            if matches!(*slot, Slot::Claimed(owner) if owner == worker) {
                *slot = Slot::Missing;
            }
        }
    }

    /// Stores verified bytes for a piece claimed by `worker`. Returns false
    /// if the worker no longer holds the claim.
    pub fn complete(&self, index: usize, worker: WorkerId, data: Bytes) -> bool {
        let Some(slot) = self.slots.get(index) else {
            return false;
        };
        let mut slot = slot.lock();
        match *slot {
            Slot::Claimed(owner) if owner == worker => {
                *slot = Slot::Complete(data);
                self.completed.fetch_add(1, Ordering::AcqRel);
                true
            }
            _ => false,
        }
    }

    pub fn is_missing(&self, index: usize) -> bool {
        self.slots
            .get(index)
            .is_some_and(|slot| matches!(*slot.lock(), Slot::Missing))
    }

    pub fn is_claimed(&self, index: usize) -> bool {
        self.slots
            .get(index)
            .is_some_and(|slot| matches!(*slot.lock(), Slot::Claimed(_)))
    }

    pub fn is_complete(&self, index: usize) -> bool {
        self.slots
            .get(index)
            .is_some_and(|slot| matches!(*slot.lock(), Slot::Complete(_)))
    }

    /// Number of verified pieces. Never blocks on piece locks.
    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.completed_count() == self.slots.len()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            completed: self.completed_count(),
            total: self.slots.len(),
        }
    }

    /// Verified bytes of one piece, if present.
    pub fn piece(&self, index: usize) -> Option<Bytes> {
        match &*self.slots.get(index)?.lock() {
            Slot::Complete(data) => Some(data.clone()),
            _ => None,
        }
    }

    pub fn completed_indices(&self) -> Vec<usize> {
        (0..self.slots.len())
            .filter(|&index| self.is_complete(index))
            .collect()
    }

    /// All pieces in index order, or `None` while any is missing.
    pub fn pieces(&self) -> Option<Vec<Bytes>> {
        (0..self.slots.len()).map(|index| self.piece(index)).collect()
    }
}
