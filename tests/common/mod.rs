//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

/// Payload whose copies are tallied per index: construction and cloning
/// increment the cell, dropping decrements it. All cells back at zero means
/// every copy was destroyed exactly once.
pub struct Counted {
    index: usize,
    cells: Arc<Mutex<Vec<i32>>>,
}

impl Counted {
    pub fn new(index: usize, cells: &Arc<Mutex<Vec<i32>>>) -> Self {
        cells.lock().unwrap()[index] += 1;
        Self {
            index,
            cells: Arc::clone(cells),
        }
    }
}

impl Clone for Counted {
    fn clone(&self) -> Self {
        self.cells.lock().unwrap()[self.index] += 1;
        Self {
            index: self.index,
            cells: Arc::clone(&self.cells),
        }
    }
}

impl Drop for Counted {
    fn drop(&mut self) {
        self.cells.lock().unwrap()[self.index] -= 1;
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
