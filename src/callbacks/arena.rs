//! Slot arena backing a callback list
//!
//! Listener entries live in a slab of slots owned by the list; the doubly
//! linked chain is built from slot indexes rather than pointers, so the
//! back-links create no ownership cycle and freeing the list frees every
//! entry. Each slot carries a generation that is bumped when the slot is
//! recycled, which lets a handle validate itself with two field reads.

use crate::callbacks::list::Callback;

/// Counter value marking a slot as removed. Live slots always carry a
/// strictly positive counter.
pub(crate) const REMOVED_COUNTER: u64 = 0;

pub(crate) struct Slot<A> {
    pub(crate) callback: Option<Callback<A>>,
    /// Visibility counter stamped at insertion; `REMOVED_COUNTER` once the
    /// entry has been unlinked.
    pub(crate) counter: u64,
    pub(crate) generation: u64,
    pub(crate) previous: Option<usize>,
    pub(crate) next: Option<usize>,
}

/// Structural state of a callback list: the slab, the chain endpoints, the
/// free list, and the graveyard of tombstones awaiting a quiescent moment.
///
/// Every mutation of this struct happens under the list's mutex.
pub(crate) struct ListState<A> {
    pub(crate) slots: Vec<Slot<A>>,
    pub(crate) head: Option<usize>,
    pub(crate) tail: Option<usize>,
    free: Vec<usize>,
    graveyard: Vec<usize>,
}

impl<A> ListState<A> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            head: None,
            tail: None,
            free: Vec::new(),
            graveyard: Vec::new(),
        }
    }

    pub(crate) fn slot(&self, index: usize) -> &Slot<A> {
        &self.slots[index]
    }

    /// Whether the (index, generation) pair still names a linked entry.
    pub(crate) fn is_live(&self, index: usize, generation: u64) -> bool {
        self.slots.get(index).is_some_and(|slot| {
            slot.generation == generation && slot.counter != REMOVED_COUNTER
        })
    }

    /// Claim a slot for a new entry. The slot is not linked yet.
    pub(crate) fn allocate(&mut self, callback: Callback<A>, counter: u64) -> usize {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.callback = Some(callback);
            slot.counter = counter;
            slot.previous = None;
            slot.next = None;
            index
        } else {
            self.slots.push(Slot {
                callback: Some(callback),
                counter,
                generation: 0,
                previous: None,
                next: None,
            });
            self.slots.len() - 1
        }
    }

    pub(crate) fn link_back(&mut self, index: usize) {
        match self.tail {
            Some(tail) => {
                self.slots[index].previous = Some(tail);
                self.slots[tail].next = Some(index);
                self.tail = Some(index);
            }
            None => {
                self.head = Some(index);
                self.tail = Some(index);
            }
        }
    }

    pub(crate) fn link_front(&mut self, index: usize) {
        match self.head {
            Some(head) => {
                self.slots[index].next = Some(head);
                self.slots[head].previous = Some(index);
                self.head = Some(index);
            }
            None => {
                self.head = Some(index);
                self.tail = Some(index);
            }
        }
    }

    pub(crate) fn link_before(&mut self, index: usize, before: usize) {
        let previous = self.slots[before].previous;
        {
            let slot = &mut self.slots[index];
            slot.previous = previous;
            slot.next = Some(before);
        }
        if let Some(previous) = previous {
            self.slots[previous].next = Some(index);
        }
        self.slots[before].previous = Some(index);
        if self.head == Some(before) {
            self.head = Some(index);
        }
    }

    /// Unlink an entry and turn its slot into a tombstone.
    ///
    /// The tombstone keeps its `previous`/`next` fields so an iteration
    /// currently parked on it can still advance; the slot is recycled later
    /// via [`reclaim_graveyard`](Self::reclaim_graveyard). Returns the stored
    /// callback so the caller can drop it outside the lock.
    pub(crate) fn unlink(&mut self, index: usize) -> Option<Callback<A>> {
        let (previous, next) = {
            let slot = &self.slots[index];
            (slot.previous, slot.next)
        };
        if let Some(next) = next {
            self.slots[next].previous = previous;
        }
        if let Some(previous) = previous {
            self.slots[previous].next = next;
        }
        if self.head == Some(index) {
            self.head = next;
        }
        if self.tail == Some(index) {
            self.tail = previous;
        }

        let slot = &mut self.slots[index];
        slot.counter = REMOVED_COUNTER;
        self.graveyard.push(index);
        self.slots[index].callback.take()
    }

    /// Recycle every tombstone. Callers must ensure no iteration is active:
    /// an in-flight iteration may still be holding a tombstone's index as its
    /// cursor.
    pub(crate) fn reclaim_graveyard(&mut self) {
        while let Some(index) = self.graveyard.pop() {
            let slot = &mut self.slots[index];
            slot.generation = slot.generation.wrapping_add(1);
            slot.previous = None;
            slot.next = None;
            self.free.push(index);
        }
    }
}
