use std::{
    collections::{BTreeMap, BTreeSet},
    path::PathBuf,
};

use serde::{Deserialize, Serialize};

// ── Records ─────────────────────────────────────────────────────────────────

/// An installed plugin: where its code lives and what to put on the load path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRecord {
    pub name: String,
    pub path: PathBuf,
    pub load_paths: Vec<String>,
}

/// A capability name together with the plugin that currently owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub name: String,
    pub owner: String,
}

// ── Registration request ────────────────────────────────────────────────────

/// Everything a plugin declares when it is registered.
///
/// Capability lists may contain duplicates; they are treated as sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub path: PathBuf,
    pub load_paths: Vec<String>,
    pub commands: Vec<String>,
    pub sources: Vec<String>,
    pub hooks: Vec<String>,
}

impl Registration {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn load_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.load_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.commands = commands.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn hooks<I, S>(mut self, hooks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hooks = hooks.into_iter().map(Into::into).collect();
        self
    }
}

// ── Index state ─────────────────────────────────────────────────────────────

/// Plugin records plus the three capability tables.
///
/// Every plugin name stored as a table value has an entry in `records`, and
/// no hook event maps to an empty subscriber list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexState {
    pub records: BTreeMap<String, PluginRecord>,
    pub commands: BTreeMap<String, String>,
    pub sources: BTreeMap<String, String>,
    pub hooks: BTreeMap<String, Vec<String>>,
}

impl IndexState {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
            && self.commands.is_empty()
            && self.sources.is_empty()
            && self.hooks.is_empty()
    }

    /// Capabilities in `requested` owned by a plugin other than `plugin`.
    ///
    /// Each conflicting name is reported once, in ascending order.
    pub(crate) fn foreign_claims(
        table: &BTreeMap<String, String>,
        requested: &[String],
        plugin: &str,
    ) -> Vec<Claim> {
        requested
            .iter()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter_map(|name| match table.get(name) {
                Some(owner) if owner != plugin => Some(Claim {
                    name: name.to_owned(),
                    owner: owner.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Write a validated registration into the tables.
    pub(crate) fn apply(&mut self, registration: Registration) {
        let Registration {
            name,
            path,
            load_paths,
            commands,
            sources,
            hooks,
        } = registration;

        for command in commands {
            self.commands.insert(command, name.clone());
        }
        for source in sources {
            self.sources.insert(source, name.clone());
        }
        for event in hooks {
            let subscribers = self.hooks.entry(event).or_default();
            if !subscribers.contains(&name) {
                subscribers.push(name.clone());
            }
        }
        self.records.insert(name.clone(), PluginRecord {
            name,
            path,
            load_paths,
        });
    }

    /// Drop `plugin` from the records and every table. Returns whether a
    /// record existed.
    pub(crate) fn purge(&mut self, plugin: &str) -> bool {
        let existed = self.records.remove(plugin).is_some();
        self.commands.retain(|_, owner| owner != plugin);
        self.sources.retain(|_, owner| owner != plugin);
        self.hooks.retain(|_, subscribers| {
            subscribers.retain(|p| p != plugin);
            !subscribers.is_empty()
        });
        existed
    }

    /// Overlay `other` on top of `self`, key by key.
    ///
    /// With `include_sources` unset the other layer's source table is
    /// ignored; source handlers only make sense for the project that
    /// declared them.
    pub(crate) fn merge(&mut self, other: IndexState, include_sources: bool) {
        self.records.extend(other.records);
        self.commands.extend(other.commands);
        self.hooks.extend(other.hooks);
        if include_sources {
            self.sources.extend(other.sources);
        }
    }
}
