//! Configuration loading, data directory overrides, and index scope
//! resolution.
//!
//! Config files: `plugdex.toml`, `plugdex.yaml`, or `plugdex.json`,
//! searched in `./` then `~/.config/plugdex/`.

pub mod error;
pub mod loader;
pub mod schema;
pub mod scope;

pub use {
    error::{Error, Result},
    loader::{
        clear_config_dir, clear_data_dir, config_dir, data_dir, discover_and_load,
        discover_and_load_from, load_config, set_config_dir, set_data_dir,
    },
    schema::{IndexConfig, PlugdexConfig},
    scope::{IndexScope, find_project_root, resolve_scope},
};
