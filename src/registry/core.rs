use super::binding_table::{BindingTable, InsertOutcome, ProcessorRef};
use crate::error::DispatchError;
use crate::runtime_config::DuplicatePolicy;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Registration lifecycle over a shared [`BindingTable`].
///
/// Cloning a `Registry` yields another handle to the same table; construct one
/// at the composition root and hand clones to registrars and callers.
#[derive(Clone, Debug)]
pub struct Registry {
    table: Arc<BindingTable>,
    duplicate_policy: DuplicatePolicy,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Empty registry that rejects duplicate registrations
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(DuplicatePolicy::Reject)
    }

    #[must_use]
    pub fn with_policy(duplicate_policy: DuplicatePolicy) -> Self {
        Self {
            table: Arc::new(BindingTable::new()),
            duplicate_policy,
        }
    }

    #[must_use]
    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    /// Bind `name` to `processor`.
    ///
    /// # Errors
    ///
    /// * `InvalidName` if `name` is empty
    /// * `DuplicateName` if `name` is bound and the policy is `Reject`; the
    ///   existing binding is left intact
    pub fn register(&self, name: &str, processor: ProcessorRef) -> Result<(), DispatchError> {
        if name.is_empty() {
            return Err(DispatchError::InvalidName);
        }

        let total = match self.duplicate_policy {
            DuplicatePolicy::Reject => match self.table.insert_if_absent(name, processor) {
                InsertOutcome::Inserted { total } => total,
                InsertOutcome::Occupied => {
                    return Err(DispatchError::DuplicateName {
                        name: name.to_owned(),
                    });
                }
            },
            DuplicatePolicy::Replace => match self.table.put(name, processor) {
                (Some(_), total) => {
                    warn!(
                        service_name = %name,
                        total_services = total,
                        "Replaced existing request processor"
                    );
                    return Ok(());
                }
                (None, total) => total,
            },
        };

        info!(
            service_name = %name,
            total_services = total,
            "Request processor registered"
        );
        Ok(())
    }

    /// Remove the binding for `name`.
    ///
    /// Later dispatches observe the removal immediately; dispatches that
    /// already resolved the endpoint run to completion.
    ///
    /// # Errors
    ///
    /// `NotFound` if `name` is not bound.
    pub fn unregister(&self, name: &str) -> Result<(), DispatchError> {
        match self.table.remove(name) {
            Some((_, remaining)) => {
                info!(
                    service_name = %name,
                    total_services = remaining,
                    "Request processor unregistered"
                );
                Ok(())
            }
            None => Err(DispatchError::NotFound {
                name: name.to_owned(),
            }),
        }
    }

    /// Snapshot of the registered names; may be stale as soon as it returns.
    #[must_use]
    pub fn registered_services(&self) -> BTreeSet<String> {
        self.table.snapshot_names()
    }

    /// Resolve `name` to its current endpoint
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<ProcessorRef> {
        self.table.get(name)
    }

    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.table.contains(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
