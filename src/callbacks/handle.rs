//! Listener handles
//!
//! A handle is a weak observer of one registered listener. It never keeps
//! the listener alive; once the entry is removed, or the owning list is
//! dropped, the handle reports dead.

use crate::callbacks::arena::ListState;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};

/// Opaque reference to a listener registered in a [`CallbackList`].
///
/// Handles are cheap to clone, compare by identity of the referenced entry,
/// and can be tested for liveness at any time. A default-constructed handle
/// refers to nothing and is dead from birth.
///
/// [`CallbackList`]: crate::callbacks::CallbackList
pub struct ListenerHandle<A> {
    state: Weak<Mutex<ListState<A>>>,
    index: usize,
    generation: u64,
}

impl<A> ListenerHandle<A> {
    pub(crate) fn new(state: Weak<Mutex<ListState<A>>>, index: usize, generation: u64) -> Self {
        Self {
            state,
            index,
            generation,
        }
    }

    /// Whether the referenced listener is still registered.
    pub fn is_live(&self) -> bool {
        match self.state.upgrade() {
            Some(state) => {
                let state = state.lock().unwrap();
                state.is_live(self.index, self.generation)
            }
            None => false,
        }
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether this handle was issued by the list owning `state`. A handle
    /// from one list must never index into another list's slots.
    pub(crate) fn belongs_to(&self, state: &Arc<Mutex<ListState<A>>>) -> bool {
        self.state.upgrade().is_some_and(|own| Arc::ptr_eq(&own, state))
    }
}

impl<A> Default for ListenerHandle<A> {
    fn default() -> Self {
        Self {
            state: Weak::new(),
            index: 0,
            generation: 0,
        }
    }
}

impl<A> Clone for ListenerHandle<A> {
    fn clone(&self) -> Self {
        Self {
            state: Weak::clone(&self.state),
            index: self.index,
            generation: self.generation,
        }
    }
}

impl<A> PartialEq for ListenerHandle<A> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
            && self.generation == other.generation
            && Weak::ptr_eq(&self.state, &other.state)
    }
}

impl<A> Eq for ListenerHandle<A> {}

impl<A> fmt::Debug for ListenerHandle<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("index", &self.index)
            .field("generation", &self.generation)
            .finish()
    }
}
