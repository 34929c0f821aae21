//! Binding table - the shared name → endpoint map.
//!
//! The map is copy-on-write: every mutation builds a new `HashMap` and
//! publishes it through an [`ArcSwap`]. Readers load the current version
//! without taking a lock, so:
//!
//! - a reader sees either the whole old map or the whole new map, never a
//!   half-applied change
//! - `snapshot_names` is consistent at the instant of the load
//! - writers never block readers and readers never block writers
//!
//! Writers are serialized among themselves by a mutex so that
//! check-then-insert (`insert_if_absent`) and check-then-remove are atomic.
//! Registration is rare compared to dispatch, which makes the copy cheap in
//! practice.

use crate::processor::RequestProcessor;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Shared handle to a registered endpoint
pub type ProcessorRef = Arc<dyn RequestProcessor>;

type Bindings = HashMap<String, ProcessorRef>;

/// Outcome of [`BindingTable::insert_if_absent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Bound; `total` is the number of bindings in the version this write published.
    Inserted { total: usize },
    /// A binding already existed; the table is unchanged.
    Occupied,
}

#[derive(Default)]
pub struct BindingTable {
    bindings: ArcSwap<Bindings>,
    write_lock: Mutex<()>,
}

impl BindingTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a binding.
    ///
    /// Returns the previous endpoint, if any, and the number of bindings in
    /// the version this write published. The count is taken under the write
    /// lock, so it is never another writer's.
    pub fn put(&self, name: &str, processor: ProcessorRef) -> (Option<ProcessorRef>, usize) {
        let _guard = self.write_lock.lock();
        let mut next = Bindings::clone(&self.bindings.load());
        let previous = next.insert(name.to_owned(), processor);
        let total = next.len();
        self.bindings.store(Arc::new(next));
        (previous, total)
    }

    /// Insert a binding only if `name` is currently unbound.
    pub fn insert_if_absent(&self, name: &str, processor: ProcessorRef) -> InsertOutcome {
        let _guard = self.write_lock.lock();
        let current = self.bindings.load_full();
        if current.contains_key(name) {
            return InsertOutcome::Occupied;
        }
        let mut next = Bindings::clone(&current);
        next.insert(name.to_owned(), processor);
        let total = next.len();
        self.bindings.store(Arc::new(next));
        InsertOutcome::Inserted { total }
    }

    /// Remove a binding, returning the endpoint and the number of bindings
    /// left in the version this write published.
    ///
    /// Nothing is republished when `name` is absent.
    pub fn remove(&self, name: &str) -> Option<(ProcessorRef, usize)> {
        let _guard = self.write_lock.lock();
        let current = self.bindings.load_full();
        if !current.contains_key(name) {
            return None;
        }
        let mut next = Bindings::clone(&current);
        let removed = next.remove(name)?;
        let remaining = next.len();
        self.bindings.store(Arc::new(next));
        Some((removed, remaining))
    }

    /// Current endpoint for `name`.
    ///
    /// The returned handle stays valid even if the binding is removed
    /// afterwards, which is what lets in-flight dispatches finish.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ProcessorRef> {
        self.bindings.load().get(name).map(Arc::clone)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.load().contains_key(name)
    }

    /// Names bound at the instant of the call, sorted.
    #[must_use]
    pub fn snapshot_names(&self) -> BTreeSet<String> {
        self.bindings.load().keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.load().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.load().is_empty()
    }
}

impl std::fmt::Debug for BindingTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingTable")
            .field("names", &self.snapshot_names())
            .finish()
    }
}
