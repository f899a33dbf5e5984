//! Thread-safe, ordered callback list
//!
//! The central guarantee is stability under concurrent mutation: listeners
//! may be added, removed and invoked from any number of threads, and an
//! in-flight invocation neither observes listeners added after it started
//! nor calls listeners removed before it reaches them.

use crate::callbacks::arena::{ListState, REMOVED_COUNTER};
use crate::callbacks::handle::ListenerHandle;
use crate::callbacks::policy::{DefaultPolicy, ListPolicy};
use crate::error::{CallbackResult, DispatchError, DispatchResult};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Type-erased listener stored in a [`CallbackList`].
pub type Callback<A> = Arc<dyn Fn(&A) -> CallbackResult + Send + Sync>;

/// Ordered list of listeners with a monotonic visibility counter.
///
/// Every insertion stamps the new entry with a fresh counter drawn from an
/// atomic shared by the whole list. An invocation snapshots the counter when
/// it starts and only visits entries stamped at or below the snapshot, which
/// is what keeps listeners added mid-dispatch invisible to that dispatch.
/// Removal tombstones the entry in place so concurrent iterations can step
/// past it; tombstones are recycled once no iteration is active.
///
/// The structural mutex is never held while a listener runs.
///
/// # Example
///
/// ```rust
/// use eventq::CallbackList;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let list: CallbackList<i32> = CallbackList::new();
/// let hits = Arc::new(AtomicUsize::new(0));
///
/// let recorded = Arc::clone(&hits);
/// let handle = list.append(move |value| {
///     recorded.fetch_add(*value as usize, Ordering::SeqCst);
///     Ok(())
/// });
///
/// list.invoke(&5).unwrap();
/// assert_eq!(hits.load(Ordering::SeqCst), 5);
///
/// assert!(list.remove(&handle));
/// list.invoke(&5).unwrap();
/// assert_eq!(hits.load(Ordering::SeqCst), 5);
/// ```
pub struct CallbackList<A, P = DefaultPolicy> {
    state: Arc<Mutex<ListState<A>>>,
    current_counter: AtomicU64,
    active_iterations: AtomicUsize,
    /// Approximate entry count; see [`is_empty`](Self::is_empty).
    len_hint: AtomicUsize,
    _policy: PhantomData<P>,
}

impl<A, P> CallbackList<A, P> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ListState::new())),
            current_counter: AtomicU64::new(0),
            active_iterations: AtomicUsize::new(0),
            len_hint: AtomicUsize::new(0),
            _policy: PhantomData,
        }
    }

    /// Register a listener at the back of the list.
    pub fn append<F>(&self, callback: F) -> ListenerHandle<A>
    where
        F: Fn(&A) -> CallbackResult + Send + Sync + 'static,
    {
        let counter = self.next_counter();
        let mut state = self.state.lock().unwrap();
        let index = state.allocate(Arc::new(callback), counter);
        state.link_back(index);
        self.len_hint.fetch_add(1, Ordering::SeqCst);
        self.handle_for(&state, index)
    }

    /// Register a listener at the front of the list.
    pub fn prepend<F>(&self, callback: F) -> ListenerHandle<A>
    where
        F: Fn(&A) -> CallbackResult + Send + Sync + 'static,
    {
        let counter = self.next_counter();
        let mut state = self.state.lock().unwrap();
        let index = state.allocate(Arc::new(callback), counter);
        state.link_front(index);
        self.len_hint.fetch_add(1, Ordering::SeqCst);
        self.handle_for(&state, index)
    }

    /// Register a listener in front of the one `before` refers to.
    ///
    /// If `before` is stale, or was issued by a different list, the new
    /// listener is appended at the back instead.
    pub fn insert<F>(&self, callback: F, before: &ListenerHandle<A>) -> ListenerHandle<A>
    where
        F: Fn(&A) -> CallbackResult + Send + Sync + 'static,
    {
        let counter = self.next_counter();
        let mut state = self.state.lock().unwrap();
        let index = state.allocate(Arc::new(callback), counter);
        if before.belongs_to(&self.state) && state.is_live(before.index(), before.generation()) {
            state.link_before(index, before.index());
        } else {
            state.link_back(index);
        }
        self.len_hint.fetch_add(1, Ordering::SeqCst);
        self.handle_for(&state, index)
    }

    /// Remove the listener `handle` refers to.
    ///
    /// Returns false if the handle is stale or belongs to another list.
    /// Removal during an invocation is allowed: an iteration that has not
    /// reached the entry yet will skip it.
    pub fn remove(&self, handle: &ListenerHandle<A>) -> bool {
        let callback = {
            let mut state = self.state.lock().unwrap();
            if !handle.belongs_to(&self.state)
                || !state.is_live(handle.index(), handle.generation())
            {
                return false;
            }
            let callback = state.unlink(handle.index());
            if self.active_iterations.load(Ordering::Acquire) == 0 {
                state.reclaim_graveyard();
            }
            callback
        };
        self.len_hint.fetch_sub(1, Ordering::SeqCst);
        // The listener may own resources whose Drop re-enters this list;
        // release it only after the lock is gone.
        drop(callback);
        true
    }

    /// Visit every eligible listener.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&Callback<A>),
    {
        self.walk(|_handle, callback| {
            f(callback);
            true
        });
    }

    /// Visit the handle of every eligible listener.
    pub fn for_each_with_handle<F>(&self, mut f: F)
    where
        F: FnMut(&ListenerHandle<A>),
    {
        self.walk(|handle, _callback| {
            f(handle);
            true
        });
    }

    /// Visit every eligible listener together with its handle.
    pub fn for_each_entry<F>(&self, mut f: F)
    where
        F: FnMut(&ListenerHandle<A>, &Callback<A>),
    {
        self.walk(|handle, callback| {
            f(handle, callback);
            true
        });
    }

    /// Visit eligible listeners until the visitor returns false.
    ///
    /// Returns false if the visitor stopped the walk early.
    pub fn for_each_while<F>(&self, mut f: F) -> bool
    where
        F: FnMut(&Callback<A>) -> bool,
    {
        self.walk(|_handle, callback| f(callback))
    }

    /// Whether the list currently has no listeners.
    ///
    /// This is a racy hint: it reads an atomic length counter without taking
    /// the structural mutex, so a concurrent mutation may not be reflected.
    pub fn is_empty(&self) -> bool {
        self.len_hint.load(Ordering::Relaxed) == 0
    }

    /// Approximate number of registered listeners.
    pub fn len(&self) -> usize {
        self.len_hint.load(Ordering::Relaxed)
    }

    fn handle_for(&self, state: &ListState<A>, index: usize) -> ListenerHandle<A> {
        ListenerHandle::new(
            Arc::downgrade(&self.state),
            index,
            state.slot(index).generation,
        )
    }

    /// Core iteration. Snapshots head under the lock, then the visibility
    /// counter, then steps through the chain re-locking per hop. Eligibility
    /// of each entry: not a tombstone, and stamped at or before the
    /// snapshot. The successor is read after the visit so a tombstoned
    /// cursor still has its escape pointer.
    fn walk<F>(&self, mut visit: F) -> bool
    where
        F: FnMut(&ListenerHandle<A>, &Callback<A>) -> bool,
    {
        let _iteration = IterationGuard::enter(&self.active_iterations, &self.state);

        let mut cursor = self.state.lock().unwrap().head;
        let visible_to = self.current_counter.load(Ordering::Acquire);

        while let Some(index) = cursor {
            let eligible = {
                let state = self.state.lock().unwrap();
                let slot = state.slot(index);
                if slot.counter != REMOVED_COUNTER && slot.counter <= visible_to {
                    slot.callback.clone().map(|cb| (slot.generation, cb))
                } else {
                    None
                }
            };
            if let Some((generation, callback)) = eligible {
                let handle = ListenerHandle::new(Arc::downgrade(&self.state), index, generation);
                if !visit(&handle, &callback) {
                    return false;
                }
            }
            cursor = self.state.lock().unwrap().slot(index).next;
        }
        true
    }

    /// Produce the counter for a new entry.
    ///
    /// The value is re-read after the increment rather than taken from the
    /// increment itself, so concurrent inserters all stamp values from one
    /// total order. On wrap-around every linked entry is renumbered to 1,
    /// keeping pre-existing entries older than anything inserted afterwards.
    fn next_counter(&self) -> u64 {
        self.current_counter.fetch_add(1, Ordering::AcqRel);
        let mut counter = self.current_counter.load(Ordering::Acquire);
        if counter == 0 {
            {
                let mut state = self.state.lock().unwrap();
                let mut cursor = state.head;
                while let Some(index) = cursor {
                    let slot = &mut state.slots[index];
                    slot.counter = 1;
                    cursor = slot.next;
                }
            }
            log::debug!("listener visibility counter wrapped; renumbered live entries");
            self.current_counter.fetch_add(1, Ordering::AcqRel);
            counter = self.current_counter.load(Ordering::Acquire);
        }
        counter
    }

    #[cfg(test)]
    pub(crate) fn seed_counter(&self, value: u64) {
        self.current_counter.store(value, Ordering::SeqCst);
    }
}

impl<A, P> CallbackList<A, P>
where
    P: ListPolicy<A>,
{
    /// Invoke every eligible listener with `args`.
    ///
    /// Stops and propagates the first listener error; otherwise consults the
    /// policy's continuation predicate after each listener.
    pub fn invoke(&self, args: &A) -> DispatchResult<()> {
        let mut failure = None;
        self.walk(|_handle, callback| match callback(args) {
            Ok(()) => P::can_continue_invoking(args),
            Err(source) => {
                failure = Some(source);
                false
            }
        });
        match failure {
            Some(source) => Err(DispatchError::ListenerFailed { source }),
            None => Ok(()),
        }
    }
}

impl<A, P> Default for CallbackList<A, P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks that an iteration is in flight so tombstones are not recycled
/// under it. The last iteration out sweeps the graveyard.
struct IterationGuard<'a, A> {
    active: &'a AtomicUsize,
    state: &'a Mutex<ListState<A>>,
}

impl<'a, A> IterationGuard<'a, A> {
    fn enter(active: &'a AtomicUsize, state: &'a Mutex<ListState<A>>) -> Self {
        active.fetch_add(1, Ordering::AcqRel);
        Self { active, state }
    }
}

impl<A> Drop for IterationGuard<'_, A> {
    fn drop(&mut self) {
        if self.active.fetch_sub(1, Ordering::AcqRel) == 1 {
            if let Ok(mut state) = self.state.lock() {
                // Re-check under the lock: another iteration may have started
                // since the decrement.
                if self.active.load(Ordering::Acquire) == 0 {
                    state.reclaim_graveyard();
                }
            }
        }
    }
}
