//! Recoverable stores for text destroyed under the `kill` fail policy.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::Result;

/// Somewhere killed text can be retrieved from later.
pub trait RecoverableStore {
    fn stash(&mut self, text: String) -> Result<()>;
}

pub const DEFAULT_KILL_RING_CAPACITY: usize = 60;

/// Bounded in-memory ring of killed text, newest first.
///
/// Clones share the same ring, so a host can keep a handle for yanking
/// while the engine owns another.
#[derive(Debug, Clone)]
pub struct KillRing {
    entries: Rc<RefCell<VecDeque<String>>>,
    capacity: usize,
}

impl KillRing {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_KILL_RING_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Rc::new(RefCell::new(VecDeque::new())),
            capacity: capacity.max(1),
        }
    }

    /// Most recently killed text.
    pub fn latest(&self) -> Option<String> {
        self.entries.borrow().front().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().iter().cloned().collect()
    }
}

impl Default for KillRing {
    fn default() -> Self {
        Self::new()
    }
}

impl RecoverableStore for KillRing {
    fn stash(&mut self, text: String) -> Result<()> {
        let mut entries = self.entries.borrow_mut();
        entries.push_front(text);
        entries.truncate(self.capacity);
        Ok(())
    }
}
