use std::path::PathBuf;

use {plugdex_common::FromMessage, thiserror::Error};

use crate::types::Claim;

#[derive(Debug, Error)]
pub enum Error {
    /// A requested command is already owned by another plugin.
    #[error("command(s) {} declared by {plugin} are already registered", describe(.conflicts))]
    CommandConflict {
        plugin: String,
        conflicts: Vec<Claim>,
    },

    /// A requested source is already owned by another plugin.
    #[error("source(s) {} declared by {plugin} are already registered", describe(.conflicts))]
    SourceConflict {
        plugin: String,
        conflicts: Vec<Claim>,
    },

    #[error("plugin name must not be empty")]
    InvalidName,

    /// The plugin comes from the global index and cannot be removed from
    /// inside a project.
    #[error("plugin {plugin} is installed globally ({}); unregister it outside the project", global.display())]
    InheritedPlugin { plugin: String, global: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to parse index file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize index: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("index file {} is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for the rejection errors raised by conflicting registrations.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::CommandConflict { .. } | Self::SourceConflict { .. }
        )
    }
}

fn describe(conflicts: &[Claim]) -> String {
    conflicts
        .iter()
        .map(|c| format!("`{}` (owned by {})", c.name, c.owner))
        .collect::<Vec<_>>()
        .join(", ")
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

plugdex_common::impl_context!();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_message_names_every_claim() {
        let err = Error::CommandConflict {
            plugin: "cplugin".into(),
            conflicts: vec![
                Claim {
                    name: "foo".into(),
                    owner: "aplugin".into(),
                },
                Claim {
                    name: "qux".into(),
                    owner: "bplugin".into(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "command(s) `foo` (owned by aplugin), `qux` (owned by bplugin) declared by cplugin are already registered"
        );
        assert!(err.is_conflict());
    }

    #[test]
    fn io_is_not_a_conflict() {
        let err = Error::from(std::io::Error::other("disk full"));
        assert!(!err.is_conflict());
    }
}
