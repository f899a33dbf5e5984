//! Queued event records

/// One enqueued record: the event key plus the argument payload captured by
/// value at enqueue time.
///
/// Records are tuple-like: both fields are public and positionally
/// meaningful. A record is clonable (and therefore peekable) only when both
/// the key and the arguments are; move-only argument types still work with
/// [`take_event`](crate::queue::EventQueue::take_event).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedEvent<K, A> {
    /// Event key the record will be dispatched under.
    pub event: K,
    /// Arguments handed to every listener, owned by the record.
    pub args: A,
}

impl<K, A> QueuedEvent<K, A> {
    pub fn new(event: K, args: A) -> Self {
        Self { event, args }
    }
}
