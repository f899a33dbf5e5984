//! FIFO storage for queued records
//!
//! A mutex-guarded ring of records with an atomic length hint. The consumer
//! side drains by swapping the whole buffer out, so the lock is never held
//! across a dispatch and enqueue never blocks behind one.

use crate::queue::record::QueuedEvent;
use std::collections::VecDeque;
use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub(crate) struct QueueStorage<K, A> {
    buffer: Mutex<VecDeque<QueuedEvent<K, A>>>,
    len_hint: AtomicUsize,
}

impl<K, A> QueueStorage<K, A> {
    pub(crate) fn new() -> Self {
        Self {
            buffer: Mutex::new(VecDeque::new()),
            len_hint: AtomicUsize::new(0),
        }
    }

    pub(crate) fn push(&self, record: QueuedEvent<K, A>) {
        let mut buffer = self.buffer.lock().unwrap();
        buffer.push_back(record);
        self.len_hint.store(buffer.len(), Ordering::SeqCst);
    }

    /// Replace the live buffer with an empty one and return the old buffer.
    ///
    /// Records enqueued after the swap land in the new buffer and are not
    /// part of the returned drain.
    pub(crate) fn swap_out(&self) -> VecDeque<QueuedEvent<K, A>> {
        let mut buffer = self.buffer.lock().unwrap();
        let drained = mem::take(&mut *buffer);
        self.len_hint.store(0, Ordering::SeqCst);
        drained
    }

    /// Copy the front record without consuming it.
    pub(crate) fn peek_front(&self) -> Option<QueuedEvent<K, A>>
    where
        K: Clone,
        A: Clone,
    {
        self.buffer.lock().unwrap().front().cloned()
    }

    /// Move the front record out of the queue.
    pub(crate) fn take_front(&self) -> Option<QueuedEvent<K, A>> {
        let mut buffer = self.buffer.lock().unwrap();
        let record = buffer.pop_front();
        self.len_hint.store(buffer.len(), Ordering::SeqCst);
        record
    }

    /// Racy emptiness hint; exact only at quiescence.
    pub(crate) fn is_empty(&self) -> bool {
        self.len_hint.load(Ordering::SeqCst) == 0
    }

    pub(crate) fn len(&self) -> usize {
        self.len_hint.load(Ordering::SeqCst)
    }
}
