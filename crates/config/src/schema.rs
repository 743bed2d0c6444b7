use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlugdexConfig {
    pub index: IndexConfig,
}

/// Where index files live relative to their root directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// File whose presence marks a project root (e.g. `Plugfile`).
    pub project_marker: String,
    /// Directory under the project root that holds project-local state.
    pub project_dir: String,
    /// Index file path, relative to the project dir or the global data dir.
    pub file_name: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            project_marker: "Plugfile".into(),
            project_dir: ".plugdex".into(),
            file_name: "plugin/index".into(),
        }
    }
}
