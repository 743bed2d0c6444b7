use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use {
    plugdex_config::IndexScope,
    tracing::{debug, info, warn},
};

use crate::{
    error::{Error, Result},
    store::IndexStore,
    types::{IndexState, PluginRecord, Registration},
};

/// Registry of installed plugins and the capabilities they provide.
///
/// Every successful mutation is written through to the backing file before
/// returning. A failed mutation leaves both memory and disk untouched.
#[derive(Debug)]
pub struct Index {
    store: IndexStore,
    state: IndexState,
    /// Plugins read from the global base layer while the write target is a
    /// project file. Removing them there would not survive a reopen.
    inherited: BTreeSet<String>,
    global: Option<PathBuf>,
}

impl Index {
    /// Open the index stored at `path`. A missing file yields an empty index.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = IndexStore::new(path);
        let state = store.load()?;
        Ok(Self {
            store,
            state,
            inherited: BTreeSet::new(),
            global: None,
        })
    }

    /// Open the index for a resolved scope.
    ///
    /// The global file is loaded first as a base layer without its sources.
    /// In project scope the project file is then overlaid in full and becomes
    /// the write target.
    pub fn open_scoped(scope: &IndexScope) -> Result<Self> {
        let store = IndexStore::new(scope.target());
        let mut state = IndexState::default();
        let mut inherited = BTreeSet::new();

        match IndexStore::new(scope.global()).load() {
            Ok(base) => {
                if scope.is_project() {
                    inherited.extend(base.records.keys().cloned());
                }
                state.merge(base, false);
            },
            Err(Error::Io(e)) if scope.is_project() => {
                warn!(
                    path = %scope.global().display(),
                    error = %e,
                    "skipping unreadable global plugin index"
                );
            },
            Err(e) => return Err(e),
        }
        if scope.is_project() {
            state.merge(store.load()?, true);
        }

        debug!(
            target_file = %store.path().display(),
            project = scope.is_project(),
            plugins = state.records.len(),
            "opened plugin index"
        );
        Ok(Self {
            store,
            state,
            inherited,
            global: scope.is_project().then(|| scope.global().to_path_buf()),
        })
    }

    /// Open the index visible from `dir` using the discovered configuration.
    pub fn for_directory(dir: &Path) -> Result<Self> {
        let config = plugdex_config::discover_and_load_from(dir);
        let scope = plugdex_config::resolve_scope(dir, &config.index, &plugdex_config::data_dir());
        Self::open_scoped(&scope)
    }

    /// Record a plugin and the capabilities it declares.
    ///
    /// Fails with [`Error::CommandConflict`] or [`Error::SourceConflict`] if
    /// another plugin already owns one of the requested names; command
    /// conflicts are reported first. Re-registering a plugin with names it
    /// already owns is not a conflict.
    pub fn register_plugin(&mut self, registration: Registration) -> Result<()> {
        if registration.name.is_empty() {
            return Err(Error::InvalidName);
        }

        let conflicts = IndexState::foreign_claims(
            &self.state.commands,
            &registration.commands,
            &registration.name,
        );
        if !conflicts.is_empty() {
            return Err(Error::CommandConflict {
                plugin: registration.name,
                conflicts,
            });
        }

        let conflicts = IndexState::foreign_claims(
            &self.state.sources,
            &registration.sources,
            &registration.name,
        );
        if !conflicts.is_empty() {
            return Err(Error::SourceConflict {
                plugin: registration.name,
                conflicts,
            });
        }

        let name = registration.name.clone();
        self.commit(|state| state.apply(registration))?;
        info!(plugin = %name, "registered plugin");
        Ok(())
    }

    /// Remove a plugin and everything it provides.
    ///
    /// Returns whether the plugin was installed. Unknown names are not an
    /// error; the index is still rewritten. In project scope, plugins that
    /// come from the global index are refused with
    /// [`Error::InheritedPlugin`] and nothing is changed.
    pub fn unregister_plugin(&mut self, name: &str) -> Result<bool> {
        if let (Some(plugin), Some(global)) = (self.inherited.get(name), &self.global) {
            return Err(Error::InheritedPlugin {
                plugin: plugin.clone(),
                global: global.clone(),
            });
        }
        let existed = self.commit(|state| state.purge(name))?;
        if existed {
            info!(plugin = %name, "unregistered plugin");
        } else {
            warn!(plugin = %name, "unregister requested for unknown plugin");
        }
        Ok(existed)
    }

    /// Apply `mutate` and persist. If the save fails, the in-memory state is
    /// restored to what it was before `mutate` ran.
    fn commit<T>(&mut self, mutate: impl FnOnce(&mut IndexState) -> T) -> Result<T> {
        let snapshot = self.state.clone();
        let out = mutate(&mut self.state);
        if let Err(e) = self.store.save(&self.state) {
            self.state = snapshot;
            return Err(e);
        }
        Ok(out)
    }

    // ── Queries ─────────────────────────────────────────────────────────────

    pub fn is_installed(&self, name: &str) -> bool {
        self.state.records.contains_key(name)
    }

    pub fn plugin_path(&self, name: &str) -> Option<&Path> {
        self.state.records.get(name).map(|r| r.path.as_path())
    }

    /// Load paths of `name`, empty if the plugin is unknown.
    pub fn load_paths(&self, name: &str) -> &[String] {
        self.state
            .records
            .get(name)
            .map(|r| r.load_paths.as_slice())
            .unwrap_or_default()
    }

    pub fn command_plugin(&self, command: &str) -> Option<&str> {
        self.state.commands.get(command).map(String::as_str)
    }

    pub fn source_plugin(&self, source: &str) -> Option<&str> {
        self.state.sources.get(source).map(String::as_str)
    }

    pub fn is_source(&self, source: &str) -> bool {
        self.state.sources.contains_key(source)
    }

    /// Plugins subscribed to `event`, in registration order.
    pub fn hook_plugins(&self, event: &str) -> &[String] {
        self.state
            .hooks
            .get(event)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Names of all installed plugins, sorted.
    pub fn installed_plugins(&self) -> Vec<&str> {
        self.state.records.keys().map(String::as_str).collect()
    }

    /// Commands owned by `plugin`, sorted.
    pub fn plugin_commands(&self, plugin: &str) -> Vec<&str> {
        self.state
            .commands
            .iter()
            .filter(|(_, owner)| owner.as_str() == plugin)
            .map(|(command, _)| command.as_str())
            .collect()
    }

    /// Sources owned by `plugin`, sorted.
    pub fn plugin_sources(&self, plugin: &str) -> Vec<&str> {
        self.state
            .sources
            .iter()
            .filter(|(_, owner)| owner.as_str() == plugin)
            .map(|(source, _)| source.as_str())
            .collect()
    }

    /// Events `plugin` is subscribed to, sorted.
    pub fn plugin_hooks(&self, plugin: &str) -> Vec<&str> {
        self.state
            .hooks
            .iter()
            .filter(|(_, subscribers)| subscribers.iter().any(|p| p == plugin))
            .map(|(event, _)| event.as_str())
            .collect()
    }

    pub fn record(&self, name: &str) -> Option<&PluginRecord> {
        self.state.records.get(name)
    }

    /// The file this index writes to.
    pub fn index_file(&self) -> &Path {
        self.store.path()
    }

    pub fn state(&self) -> &IndexState {
        &self.state
    }
}
