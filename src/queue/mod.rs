//! Queued event dispatch
//!
//! Decouples event production from consumption across threads: producers
//! enqueue `(event, arguments)` records, consumers drain them and dispatch
//! each record to the callback list registered for its event key.
//!
//! # Overview
//!
//! - **Multiple producers**: any number of threads may enqueue concurrently;
//!   record order is the serialization order at the storage mutex.
//! - **Multiple consumers**: any number of threads may wait and process;
//!   each drained record is dispatched exactly once.
//! - **Batching**: a [`DisableNotifyGuard`] scope suppresses consumer
//!   wake-ups, then issues a single one when the scope ends.
//! - **Argument lifetime**: arguments are captured by value at enqueue time
//!   and destroyed as soon as their record is dispatched or the queue is
//!   dropped.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌────────────┐
//! │ Producer A │   │ Producer B │   │ Producer C │
//! └─────┬──────┘   └─────┬──────┘   └─────┬──────┘
//!       │ enqueue        │ enqueue        │ enqueue
//!       ▼                ▼                ▼
//! ┌──────────────────────────────────────────────────┐
//! │ EventQueue                                       │
//! │   QueueStorage ── FIFO, swapped out per drain    │
//! │   WaitBus ─────── condvar gate + suppression     │
//! │   key ──▶ CallbackList  (created on first use)   │
//! └─────┬──────────────────┬─────────────────────────┘
//!       │ wait / process   │ wait / process
//! ┌─────┴──────┐    ┌──────┴─────┐
//! │ Consumer 1 │    │ Consumer 2 │
//! └────────────┘    └────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use eventq::EventQueue;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let queue: EventQueue<u32, String> = EventQueue::new();
//! let seen = Arc::new(AtomicUsize::new(0));
//!
//! let counted = Arc::clone(&seen);
//! queue.append_listener(7, move |_message| {
//!     counted.fetch_add(1, Ordering::SeqCst);
//!     Ok(())
//! });
//!
//! queue.enqueue(7, "payload".to_string());
//! let processed = queue.process()?;
//! assert_eq!(processed, 1);
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//! # Ok(())
//! # }
//! ```

mod record;
mod storage;
mod wait;

pub use record::QueuedEvent;

use crate::callbacks::{CallbackList, DefaultPolicy, EventExtractor, ListPolicy, ListenerHandle};
use crate::error::{CallbackResult, DispatchError, DispatchResult};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use storage::QueueStorage;
use wait::WaitBus;

/// Multi-producer / multi-consumer FIFO of events with per-key listeners.
///
/// `K` is the event key (hashable, clonable), `A` the argument payload each
/// listener receives by reference, `P` the dispatch policy.
pub struct EventQueue<K, A, P = DefaultPolicy> {
    lists: RwLock<HashMap<K, Arc<CallbackList<A, P>>>>,
    storage: QueueStorage<K, A>,
    notifier: WaitBus,
}

impl<K, A, P> EventQueue<K, A, P>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            lists: RwLock::new(HashMap::new()),
            storage: QueueStorage::new(),
            notifier: WaitBus::new(),
        }
    }

    /// Register a listener at the back of the list for `event`.
    ///
    /// The callback list for a key is created on first registration.
    pub fn append_listener<F>(&self, event: K, callback: F) -> ListenerHandle<A>
    where
        F: Fn(&A) -> CallbackResult + Send + Sync + 'static,
    {
        self.list_for(event).append(callback)
    }

    /// Register a listener at the front of the list for `event`.
    pub fn prepend_listener<F>(&self, event: K, callback: F) -> ListenerHandle<A>
    where
        F: Fn(&A) -> CallbackResult + Send + Sync + 'static,
    {
        self.list_for(event).prepend(callback)
    }

    /// Register a listener in front of the one `before` refers to; appends
    /// if `before` is stale.
    pub fn insert_listener<F>(
        &self,
        event: K,
        callback: F,
        before: &ListenerHandle<A>,
    ) -> ListenerHandle<A>
    where
        F: Fn(&A) -> CallbackResult + Send + Sync + 'static,
    {
        self.list_for(event).insert(callback, before)
    }

    /// Remove the listener `handle` refers to from the list for `event`.
    ///
    /// Returns false if no list exists for the key or the handle is stale.
    pub fn remove_listener(&self, event: &K, handle: &ListenerHandle<A>) -> bool {
        match self.lookup(event) {
            Some(list) => list.remove(handle),
            None => false,
        }
    }

    /// Whether any listener is registered for `event`. Racy hint, like
    /// [`CallbackList::is_empty`].
    pub fn has_listeners(&self, event: &K) -> bool {
        self.lookup(event).is_some_and(|list| !list.is_empty())
    }

    /// Store a record for later processing and wake one waiting consumer
    /// (unless notifications are suppressed).
    ///
    /// Arguments are captured by value: whatever the producer does with its
    /// own copies afterwards cannot affect what listeners observe.
    pub fn enqueue(&self, event: K, args: A) {
        self.storage.push(QueuedEvent::new(event, args));
        self.notifier.notify_one();
    }

    /// Like [`enqueue`](Self::enqueue), with the key extracted from the
    /// payload by the policy.
    pub fn enqueue_extracted(&self, args: A) -> DispatchResult<()>
    where
        P: EventExtractor<K, A>,
    {
        let event = P::event_of(&args).map_err(|source| DispatchError::ExtractFailed { source })?;
        self.storage.push(QueuedEvent::new(event, args));
        self.notifier.notify_one();
        Ok(())
    }

    /// Drain the queue once and dispatch every drained record in FIFO
    /// order. Returns the number of records dispatched.
    ///
    /// The drain is a buffer swap: records enqueued while processing runs,
    /// including by listeners, are left for a later call. Listeners
    /// registered while processing runs are likewise invisible to the
    /// dispatches already underway. A listener error stops processing and
    /// drops the rest of the drained batch.
    pub fn process(&self) -> DispatchResult<usize>
    where
        P: ListPolicy<A>,
    {
        let drained = self.storage.swap_out();
        let mut processed = 0;
        for record in drained {
            match self.lookup(&record.event) {
                Some(list) => list.invoke(&record.args)?,
                None => log::trace!("drained record has no listeners for its event key"),
            }
            processed += 1;
        }
        Ok(processed)
    }

    /// Synchronously dispatch a record to the listeners for its key.
    ///
    /// Does not consume the record; a record obtained via
    /// [`peek_event`](Self::peek_event) or [`take_event`](Self::take_event)
    /// may be dispatched any number of times.
    pub fn dispatch(&self, record: &QueuedEvent<K, A>) -> DispatchResult<()>
    where
        P: ListPolicy<A>,
    {
        match self.lookup(&record.event) {
            Some(list) => list.invoke(&record.args),
            None => Ok(()),
        }
    }

    /// Copy the front record without consuming it. Requires clonable
    /// arguments.
    pub fn peek_event(&self) -> Option<QueuedEvent<K, A>>
    where
        A: Clone,
    {
        self.storage.peek_front()
    }

    /// Move the front record out of the queue. Works for move-only
    /// arguments; the record will not be seen by a later
    /// [`process`](Self::process).
    pub fn take_event(&self) -> Option<QueuedEvent<K, A>> {
        self.storage.take_front()
    }

    /// Block the calling thread until the queue is non-empty.
    pub fn wait(&self) {
        self.notifier.wait_until(|| !self.storage.is_empty());
    }

    /// Block until the queue is non-empty or `timeout` elapses. Returns
    /// true iff the queue was non-empty when the wait ended; a zero timeout
    /// makes this a poll.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        self.notifier
            .wait_for_until(timeout, || !self.storage.is_empty())
    }

    /// Racy emptiness hint for the record queue.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Approximate number of queued records.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Enter a scope during which enqueues do not wake consumers.
    ///
    /// Dropping the returned guard leaves the scope; when the last nested
    /// guard goes, a single wake-up is issued iff records are queued.
    pub fn suppress_notify(&self) -> DisableNotifyGuard<'_, K, A, P> {
        self.notifier.enter_suppression();
        DisableNotifyGuard { queue: self }
    }

    fn list_for(&self, event: K) -> Arc<CallbackList<A, P>> {
        if let Some(list) = self.lists.read().unwrap().get(&event) {
            return Arc::clone(list);
        }
        let mut lists = self.lists.write().unwrap();
        Arc::clone(lists.entry(event).or_default())
    }

    fn lookup(&self, event: &K) -> Option<Arc<CallbackList<A, P>>> {
        self.lists.read().unwrap().get(event).map(Arc::clone)
    }
}

impl<K, A, P> Default for EventQueue<K, A, P>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped suppression of consumer wake-ups, for batched enqueues.
///
/// Construction increments the queue's suppression depth, drop decrements
/// it; nesting is allowed. When the depth returns to zero and records are
/// queued, one wake-up is issued.
pub struct DisableNotifyGuard<'a, K, A, P = DefaultPolicy> {
    queue: &'a EventQueue<K, A, P>,
}

impl<K, A, P> Drop for DisableNotifyGuard<'_, K, A, P> {
    fn drop(&mut self) {
        if self.queue.notifier.leave_suppression() == 0 && !self.queue.storage.is_empty() {
            self.queue.notifier.force_notify();
        }
    }
}
