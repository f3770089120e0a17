use crate::store::VectorId;
use std::collections::VecDeque;

/// Deferred flushes waiting for the host's next idle pass.
///
/// Entries are not removed on cancellation; the store checks each vector's
/// [`NotifyState`](super::NotifyState) when the entry comes up.
#[derive(Debug, Default)]
pub struct IdleQueue {
    queue: VecDeque<VectorId>,
}

impl IdleQueue {
    /// Queue a flush of `id`.
    pub fn schedule(&mut self, id: VectorId) {
        self.queue.push_back(id);
    }

    /// Take every entry queued so far. Entries scheduled while the batch is
    /// delivered wait for the next pass.
    pub fn take_batch(&mut self) -> Vec<VectorId> {
        self.queue.drain(..).collect()
    }

    /// Number of queued entries, cancelled ones included.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
