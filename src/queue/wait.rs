//! Consumer wake-up gate
//!
//! A condition variable plus a reentrant suppression depth. Producers pulse
//! the gate after enqueuing; consumers park on it with an emptiness
//! predicate supplied by the queue. While the suppression depth is positive
//! the pulses are skipped, which is how batched enqueues avoid waking a
//! consumer per record.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

pub(crate) struct WaitBus {
    /// Pulse count; exists so notification and predicate checks serialize
    /// on one mutex, which rules out lost wake-ups.
    gate: Mutex<u64>,
    wakeup: Condvar,
    suppression_depth: AtomicUsize,
}

impl WaitBus {
    pub(crate) fn new() -> Self {
        Self {
            gate: Mutex::new(0),
            wakeup: Condvar::new(),
            suppression_depth: AtomicUsize::new(0),
        }
    }

    /// Block until `ready` returns true. The predicate is re-checked after
    /// every wake, so spurious wakes go back to sleep.
    pub(crate) fn wait_until<F>(&self, mut ready: F)
    where
        F: FnMut() -> bool,
    {
        let mut pulses = self.gate.lock().unwrap();
        while !ready() {
            pulses = self.wakeup.wait(pulses).unwrap();
        }
    }

    /// Block until `ready` returns true or `timeout` elapses. Returns true
    /// iff the predicate held when the wait ended.
    pub(crate) fn wait_for_until<F>(&self, timeout: Duration, mut ready: F) -> bool
    where
        F: FnMut() -> bool,
    {
        let pulses = self.gate.lock().unwrap();
        let (_pulses, result) = self
            .wakeup
            .wait_timeout_while(pulses, timeout, |_| !ready())
            .unwrap();
        !result.timed_out()
    }

    /// Wake one parked consumer, unless notifications are suppressed.
    pub(crate) fn notify_one(&self) {
        if self.suppression_depth.load(Ordering::Acquire) > 0 {
            return;
        }
        self.pulse();
    }

    /// Wake one parked consumer regardless of suppression. Used when a
    /// suppression scope ends with records still queued.
    pub(crate) fn force_notify(&self) {
        self.pulse();
    }

    pub(crate) fn enter_suppression(&self) {
        self.suppression_depth.fetch_add(1, Ordering::AcqRel);
    }

    /// Drop one level of suppression; returns the remaining depth.
    pub(crate) fn leave_suppression(&self) -> usize {
        self.suppression_depth.fetch_sub(1, Ordering::AcqRel) - 1
    }

    #[cfg(test)]
    pub(crate) fn suppression_depth(&self) -> usize {
        self.suppression_depth.load(Ordering::SeqCst)
    }

    fn pulse(&self) {
        {
            let mut pulses = self.gate.lock().unwrap();
            *pulses = pulses.wrapping_add(1);
        }
        self.wakeup.notify_one();
    }
}
