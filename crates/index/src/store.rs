//! On-disk representation of the index.
//!
//! The file is a YAML mapping with five top-level keys:
//!
//! ```yaml
//! commands:
//!   newco: new-plugin
//! hooks:
//!   after-install:
//!   - new-plugin
//! load_paths:
//!   new-plugin:
//!   - /plugins/new-plugin/lib
//! plugin_paths:
//!   new-plugin: /plugins/new-plugin
//! sources:
//!   new_source: new-plugin
//! ```
//!
//! Keys are written in ascending order so that saving the same state always
//! produces the same bytes.

use std::{
    collections::BTreeMap,
    ffi::OsString,
    path::{Path, PathBuf},
};

use {
    serde::{Deserialize, Serialize},
    tracing::debug,
};

use crate::{
    error::{Context, Error, Result},
    types::{IndexState, PluginRecord},
};

/// Serialized form. Field order is the order of the keys in the file.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct IndexDocument {
    commands: BTreeMap<String, String>,
    hooks: BTreeMap<String, Vec<String>>,
    load_paths: BTreeMap<String, Vec<String>>,
    plugin_paths: BTreeMap<String, PathBuf>,
    sources: BTreeMap<String, String>,
}

impl From<&IndexState> for IndexDocument {
    fn from(state: &IndexState) -> Self {
        let mut doc = Self {
            commands: state.commands.clone(),
            sources: state.sources.clone(),
            hooks: state
                .hooks
                .iter()
                .filter(|(_, subscribers)| !subscribers.is_empty())
                .map(|(event, subscribers)| (event.clone(), subscribers.clone()))
                .collect(),
            ..Self::default()
        };
        for (name, record) in &state.records {
            doc.plugin_paths.insert(name.clone(), record.path.clone());
            doc.load_paths
                .insert(name.clone(), record.load_paths.clone());
        }
        doc
    }
}

impl IndexDocument {
    /// Rebuild the in-memory state, rejecting content that breaks the
    /// record/table invariants.
    fn into_state(self, path: &Path) -> Result<IndexState> {
        let Self {
            commands,
            hooks,
            mut load_paths,
            plugin_paths,
            sources,
        } = self;

        if let Some(orphan) = load_paths.keys().find(|n| !plugin_paths.contains_key(*n)) {
            return Err(Error::corrupt(
                path,
                format!("load paths recorded for unknown plugin `{orphan}`"),
            ));
        }

        let records: BTreeMap<String, PluginRecord> = plugin_paths
            .into_iter()
            .map(|(name, plugin_path)| {
                let record = PluginRecord {
                    load_paths: load_paths.remove(&name).unwrap_or_default(),
                    name: name.clone(),
                    path: plugin_path,
                };
                (name, record)
            })
            .collect();

        let owners = commands
            .iter()
            .map(|(k, v)| ("command", k, v))
            .chain(sources.iter().map(|(k, v)| ("source", k, v)));
        for (kind, key, owner) in owners {
            if !records.contains_key(owner) {
                return Err(Error::corrupt(
                    path,
                    format!("{kind} `{key}` is owned by unknown plugin `{owner}`"),
                ));
            }
        }

        let mut state = IndexState {
            records,
            commands,
            sources,
            hooks: BTreeMap::new(),
        };
        for (event, subscribers) in hooks {
            let mut unique: Vec<String> = Vec::with_capacity(subscribers.len());
            for plugin in subscribers {
                if !state.records.contains_key(&plugin) {
                    return Err(Error::corrupt(
                        path,
                        format!("hook `{event}` is subscribed by unknown plugin `{plugin}`"),
                    ));
                }
                if !unique.contains(&plugin) {
                    unique.push(plugin);
                }
            }
            if !unique.is_empty() {
                state.hooks.insert(event, unique);
            }
        }
        Ok(state)
    }
}

/// Reads and writes the index file as a whole.
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the index, returning an empty state if the file is missing or
    /// blank.
    pub fn load(&self) -> Result<IndexState> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no index file yet");
                return Ok(IndexState::default());
            },
            Err(e) => return Err(e.into()),
        };
        let state = Self::parse(&data, &self.path)?;
        debug!(
            path = %self.path.display(),
            plugins = state.records.len(),
            "loaded plugin index"
        );
        Ok(state)
    }

    /// Save the index atomically via temp file + rename.
    pub fn save(&self, state: &IndexState) -> Result<()> {
        let data = Self::render(state)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.tmp_path();
        let replaced = std::fs::write(&tmp, data)
            .map_err(Error::from)
            .and_then(|()| {
                std::fs::rename(&tmp, &self.path)
                    .with_context(|| format!("failed to replace {}", self.path.display()))
            });
        if let Err(e) = replaced {
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }
        debug!(
            path = %self.path.display(),
            plugins = state.records.len(),
            "saved plugin index"
        );
        Ok(())
    }

    /// Serialize `state` to the on-disk format.
    pub fn render(state: &IndexState) -> Result<String> {
        serde_yaml::to_string(&IndexDocument::from(state)).map_err(Error::Serialize)
    }

    /// Parse the on-disk format. `path` is only used in error messages.
    pub fn parse(data: &str, path: &Path) -> Result<IndexState> {
        if data.trim().is_empty() {
            return Ok(IndexState::default());
        }
        let doc: IndexDocument = serde_yaml::from_str(data).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        doc.into_state(path)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("index"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::types::Registration};

    fn sample() -> IndexState {
        let mut state = IndexState::default();
        state.apply(
            Registration::new("new-plugin", "/plugins/new-plugin")
                .load_paths(["/plugins/new-plugin/lib"])
                .commands(["newco"])
                .sources(["new_source"])
                .hooks(["after-install"]),
        );
        state
    }

    #[test]
    fn test_load_missing_returns_default() {
        let tmp = tempfile::tempdir().unwrap();
        let store = IndexStore::new(tmp.path().join("missing"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_blank_file_is_empty_index() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("index");
        std::fs::write(&path, "\n  \n").unwrap();
        assert!(IndexStore::new(&path).load().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = IndexStore::new(tmp.path().join("plugin").join("index"));
        let state = sample();
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), state);
        assert!(!tmp.path().join("plugin").join("index.tmp").exists());
    }

    #[test]
    fn test_render_layout() {
        let rendered = IndexStore::render(&sample()).unwrap();
        assert_eq!(
            rendered,
            "commands:\n  newco: new-plugin\n\
             hooks:\n  after-install:\n  - new-plugin\n\
             load_paths:\n  new-plugin:\n  - /plugins/new-plugin/lib\n\
             plugin_paths:\n  new-plugin: /plugins/new-plugin\n\
             sources:\n  new_source: new-plugin\n"
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let mut a = IndexState::default();
        a.apply(Registration::new("zeta", "/z").commands(["zc"]));
        a.apply(Registration::new("alpha", "/a").commands(["ac"]));
        let mut b = IndexState::default();
        b.apply(Registration::new("alpha", "/a").commands(["ac"]));
        b.apply(Registration::new("zeta", "/z").commands(["zc"]));
        assert_eq!(
            IndexStore::render(&a).unwrap(),
            IndexStore::render(&b).unwrap()
        );
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let state = IndexStore::parse(
            "plugin_paths:\n  solo: /plugins/solo\n",
            Path::new("index"),
        )
        .unwrap();
        assert_eq!(state.records["solo"].path, PathBuf::from("/plugins/solo"));
        assert!(state.records["solo"].load_paths.is_empty());
        assert!(state.commands.is_empty());
    }

    #[test]
    fn test_malformed_yaml_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("index");
        std::fs::write(&path, "commands: [unterminated\n").unwrap();
        let err = IndexStore::new(&path).load().unwrap_err();
        assert!(matches!(err, Error::Parse { .. }), "got {err:?}");
    }

    #[test]
    fn test_wrong_shape_is_fatal() {
        let err = IndexStore::parse("commands:\n  - a\n  - b\n", Path::new("index")).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_dangling_owner_is_corrupt() {
        let err = IndexStore::parse(
            "commands:\n  newco: ghost\nplugin_paths:\n  real: /r\n",
            Path::new("index"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Corrupt { .. }));
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_orphan_load_paths_are_corrupt() {
        let err = IndexStore::parse("load_paths:\n  ghost:\n  - /g/lib\n", Path::new("index"))
            .unwrap_err();
        assert!(matches!(err, Error::Corrupt { .. }));
    }

    #[test]
    fn test_empty_hook_lists_and_duplicates_are_normalized() {
        let state = IndexStore::parse(
            "hooks:\n  dead: []\n  live:\n  - p\n  - p\nplugin_paths:\n  p: /p\n",
            Path::new("index"),
        )
        .unwrap();
        assert!(!state.hooks.contains_key("dead"));
        assert_eq!(state.hooks["live"], vec!["p".to_string()]);
    }

    #[test]
    fn test_save_fails_when_parent_is_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("blocker"), "").unwrap();
        let store = IndexStore::new(tmp.path().join("blocker").join("index"));
        assert!(store.save(&sample()).is_err());
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("index");
        // A non-empty directory at the target makes the rename fail after the
        // temp file has been written.
        std::fs::create_dir_all(path.join("occupied")).unwrap();
        let store = IndexStore::new(&path);

        let err = store.save(&sample()).unwrap_err();
        assert!(err.to_string().contains("failed to replace"));
        assert!(!tmp.path().join("index.tmp").exists());
        assert!(path.join("occupied").is_dir());
    }
}
