//! Plugin index: which installed plugin provides which command, source
//! handler, or hook, and where its code lives.
//!
//! The [`Index`](index::Index) is loaded from a single YAML file on
//! construction and rewritten in full after every successful registration or
//! removal.

pub mod error;
pub mod index;
pub mod store;
pub mod types;

pub use {
    error::{Error, Result},
    index::Index,
    store::IndexStore,
    types::{Claim, IndexState, PluginRecord, Registration},
};
