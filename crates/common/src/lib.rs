//! Shared error plumbing used across all plugdex crates.

pub mod error;

pub use error::FromMessage;
