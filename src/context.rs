//! Composition context: node identity allocation.
//!
//! Every node receives a `uid` from a [`ComposeContext`] at construction. The
//! counter lives in the context rather than in a global so that independent
//! trees (and independent tests) can each start from a clean slate, while all
//! trees sharing one context still get process-unique ids.

use std::cell::Cell;
use std::rc::Rc;

/// Shared identity counter handed to every [`Tree`](crate::dom::Tree).
///
/// Cloning is cheap and shares the underlying counter.
#[derive(Debug, Clone)]
pub struct ComposeContext {
    next_uid: Rc<Cell<u64>>,
}

impl ComposeContext {
    /// Create a fresh context whose first issued uid is `1`.
    pub fn new() -> Self {
        Self {
            next_uid: Rc::new(Cell::new(1)),
        }
    }

    /// Issue the next uid.
    ///
    /// # Panics
    ///
    /// Panics if the 64-bit counter is exhausted.
    pub fn next_uid(&self) -> u64 {
        let uid = self.next_uid.get();
        let next = uid.checked_add(1).expect("node uid counter overflowed");
        self.next_uid.set(next);
        uid
    }

    /// Number of uids issued so far.
    pub fn issued(&self) -> u64 {
        self.next_uid.get() - 1
    }
}

impl Default for ComposeContext {
    fn default() -> Self {
        Self::new()
    }
}
