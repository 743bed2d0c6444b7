//! Selects which index file a process should read and write.
//!
//! A directory tree containing the project marker file gets its own
//! project-local index, layered over the user's global index. Anywhere else
//! only the global index is used.

use std::path::{Path, PathBuf};

use crate::schema::IndexConfig;

/// The index files visible from a working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexScope {
    /// Outside any project: the global index is both read and written.
    Global { global: PathBuf },
    /// Inside a project: the global index is a read-only base layer and the
    /// project index is the write target.
    Project { global: PathBuf, local: PathBuf },
}

impl IndexScope {
    /// The file that registrations are written to.
    pub fn target(&self) -> &Path {
        match self {
            Self::Global { global } => global,
            Self::Project { local, .. } => local,
        }
    }

    pub fn global(&self) -> &Path {
        match self {
            Self::Global { global } | Self::Project { global, .. } => global,
        }
    }

    pub fn is_project(&self) -> bool {
        matches!(self, Self::Project { .. })
    }
}

/// Walk up from `start` looking for a directory containing the project marker.
pub fn find_project_root(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_file())
        .map(Path::to_path_buf)
}

/// Resolve the index scope for `start` with the global index rooted at
/// `global_root` (normally [`crate::data_dir`]).
pub fn resolve_scope(start: &Path, config: &IndexConfig, global_root: &Path) -> IndexScope {
    let global = global_root.join(&config.file_name);
    match find_project_root(start, &config.project_marker) {
        Some(root) => IndexScope::Project {
            global,
            local: root.join(&config.project_dir).join(&config.file_name),
        },
        None => IndexScope::Global { global },
    }
}
