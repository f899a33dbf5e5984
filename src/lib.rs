//! In-process event dispatch
//!
//! This crate provides two tightly coupled pieces:
//!
//! - [`CallbackList`]: an ordered, thread-safe registry of listeners that
//!   supports concurrent registration, removal and invocation. A listener
//!   added while a dispatch is running is not observed by that dispatch; a
//!   listener removed before a dispatch reaches it is not invoked.
//! - [`EventQueue`]: a multi-producer / multi-consumer FIFO of
//!   `(event, arguments)` records layered on per-key callback lists, with a
//!   wait/notify protocol for consumer threads and scoped suppression for
//!   batched enqueues.
//!
//! # Example
//!
//! ```rust
//! use eventq::EventQueue;
//! use std::sync::atomic::{AtomicI64, Ordering};
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let queue: EventQueue<&'static str, i64> = EventQueue::new();
//! let total = Arc::new(AtomicI64::new(0));
//!
//! let sum = Arc::clone(&total);
//! queue.append_listener("sample", move |value| {
//!     sum.fetch_add(*value, Ordering::SeqCst);
//!     Ok(())
//! });
//!
//! queue.enqueue("sample", 20);
//! queue.enqueue("sample", 22);
//! queue.process()?;
//! assert_eq!(total.load(Ordering::SeqCst), 42);
//! # Ok(())
//! # }
//! ```
//!
//! Listeners report failure by returning an error, which stops the dispatch
//! in progress and surfaces through [`DispatchError`]. The crate installs no
//! logger and spawns no threads of its own.

pub mod callbacks;
pub mod error;
pub mod queue;

pub use callbacks::{Callback, CallbackList, DefaultPolicy, EventExtractor, ListPolicy, ListenerHandle};
pub use error::{CallbackResult, DispatchError, DispatchResult};
pub use queue::{DisableNotifyGuard, EventQueue, QueuedEvent};
