//! Cooperative scheduling primitives.
//!
//! The simulation is single-threaded and driven from outside: the host
//! calls `on_frame` once per display refresh and `on_idle` whenever it has
//! a free turn. Long-running work is split so that one call never blocks
//! for long.
//!
//! - [`Completion`] is the observable outcome of an operation that
//!   finishes on a later tick.
//! - [`ChunkQueue`] holds deferred work and hands it out one fixed-size
//!   chunk per idle turn.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Outcome of a deferred operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Pending,
    Done,
    /// Superseded by a reset or a parameter change before it finished.
    Cancelled,
}

/// Shared handle to the status of a deferred operation.
///
/// Clones observe the same status. A completion settles at most once;
/// later attempts to settle it are ignored.
#[derive(Debug, Clone)]
pub struct Completion {
    status: Rc<Cell<Status>>,
}

impl Completion {
    pub(crate) fn pending() -> Self {
        Self {
            status: Rc::new(Cell::new(Status::Pending)),
        }
    }

    /// A completion that is already settled.
    pub(crate) fn settled(status: Status) -> Self {
        Self {
            status: Rc::new(Cell::new(status)),
        }
    }

    pub fn status(&self) -> Status {
        self.status.get()
    }

    pub fn is_pending(&self) -> bool {
        self.status() == Status::Pending
    }

    pub fn is_done(&self) -> bool {
        self.status() == Status::Done
    }

    pub fn is_cancelled(&self) -> bool {
        self.status() == Status::Cancelled
    }

    pub(crate) fn finish(&self) {
        self.settle(Status::Done);
    }

    pub(crate) fn cancel(&self) {
        self.settle(Status::Cancelled);
    }

    fn settle(&self, status: Status) {
        if self.status.get() == Status::Pending {
            self.status.set(status);
        }
    }
}

/// FIFO of deferred items, drained in chunks.
#[derive(Debug, Clone)]
pub struct ChunkQueue<T> {
    items: VecDeque<T>,
    chunk_size: usize,
}

impl<T> ChunkQueue<T> {
    /// A `chunk_size` of 0 is treated as 1.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            items: VecDeque::new(),
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) {
        self.items.extend(items);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Chunks left before the queue is empty.
    pub fn chunks_remaining(&self) -> usize {
        self.items.len().div_ceil(self.chunk_size)
    }

    /// Removes up to `chunk_size` items from the front.
    pub fn next_chunk(&mut self) -> Option<Vec<T>> {
        if self.items.is_empty() {
            return None;
        }
        let n = self.chunk_size.min(self.items.len());
        Some(self.items.drain(..n).collect())
    }

    /// Removes everything at once.
    pub fn drain_all(&mut self) -> Vec<T> {
        self.items.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
