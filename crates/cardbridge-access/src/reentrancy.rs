//! Reentrancy guard for entry points that call out to a payment rail.
//!
//! A rail transfer is the one place where control can pass to untrusted
//! code. The guard records which threads are currently inside a guarded
//! entry point; a second entry from the same thread is a reentrant call and
//! is rejected. Other threads are unaffected, so independent payers keep
//! running in parallel.
//!
//! One guard instance covers a whole family of entry points: a callback
//! from inside a token pull is rejected whether it targets intake or the
//! treasury.
//!
//! The guard only recognizes the calling thread. A callback that hands the
//! work to another thread and waits for it is not rejected. If that thread
//! pays for the same payer as the transfer in progress, it blocks on the
//! payer's ledger lock while the waiting callback holds it, and neither
//! side makes progress. Rails must not block on work they spawn for the
//! payer they are serving.

use std::collections::HashSet;
use std::thread::{self, ThreadId};

use cardbridge_types::{BridgeError, Result};
use parking_lot::Mutex;

/// Tracks threads currently inside a guarded entry point.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    inside: Mutex<HashSet<ThreadId>>,
}

impl ReentrancyGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a guarded section. Leaves it when the returned guard drops.
    ///
    /// # Errors
    /// Returns [`BridgeError::Reentrancy`] if the current thread is already inside.
    pub fn enter(&self) -> Result<EntryGuard<'_>> {
        let id = thread::current().id();
        if !self.inside.lock().insert(id) {
            tracing::warn!(thread = ?id, "Reentrant call rejected");
            return Err(BridgeError::Reentrancy);
        }
        Ok(EntryGuard { owner: self, id })
    }

    /// Whether the current thread is inside a guarded section.
    #[must_use]
    pub fn is_entered(&self) -> bool {
        self.inside.lock().contains(&thread::current().id())
    }
}

/// Proof of being inside a guarded section.
#[derive(Debug)]
#[must_use = "the section is left as soon as the guard is dropped"]
pub struct EntryGuard<'a> {
    owner: &'a ReentrancyGuard,
    id: ThreadId,
}

impl Drop for EntryGuard<'_> {
    fn drop(&mut self) {
        self.owner.inside.lock().remove(&self.id);
    }
}
