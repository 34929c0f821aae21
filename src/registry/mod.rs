//! # Registry Module
//!
//! Name → endpoint bindings and the registration lifecycle.
//!
//! - [`BindingTable`] is the concurrent map itself. Reads are lock-free and
//!   always observe a complete, published version of the map.
//! - [`Registry`] layers the naming rules on top: names must be non-empty,
//!   and a second `register` for a bound name fails with `DuplicateName`
//!   unless the registry was built with [`DuplicatePolicy::Replace`].
//!
//! Registry lifetime is process lifetime; nothing is persisted.
//!
//! [`DuplicatePolicy::Replace`]: crate::runtime_config::DuplicatePolicy::Replace

mod binding_table;
mod core;

pub use self::binding_table::{BindingTable, InsertOutcome, ProcessorRef};
pub use self::core::Registry;
