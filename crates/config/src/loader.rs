use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::{debug, warn};

use crate::{
    error::{Context, Error, Result},
    schema::PlugdexConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "plugdex.toml",
    "plugdex.yaml",
    "plugdex.yml",
    "plugdex.json",
];

static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);
static DATA_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Override the user-global config directory for the rest of the process.
pub fn set_config_dir(dir: PathBuf) {
    if let Ok(mut guard) = CONFIG_DIR_OVERRIDE.lock() {
        *guard = Some(dir);
    }
}

pub fn clear_config_dir() {
    if let Ok(mut guard) = CONFIG_DIR_OVERRIDE.lock() {
        *guard = None;
    }
}

/// Override the data directory that holds the global index.
pub fn set_data_dir(dir: PathBuf) {
    if let Ok(mut guard) = DATA_DIR_OVERRIDE.lock() {
        *guard = Some(dir);
    }
}

pub fn clear_data_dir() {
    if let Ok(mut guard) = DATA_DIR_OVERRIDE.lock() {
        *guard = None;
    }
}

fn override_of(slot: &Mutex<Option<PathBuf>>) -> Option<PathBuf> {
    slot.lock().ok().and_then(|guard| guard.clone())
}

/// Returns the user-global config directory (`~/.config/plugdex/`).
pub fn config_dir() -> Option<PathBuf> {
    override_of(&CONFIG_DIR_OVERRIDE).or_else(|| {
        directories::ProjectDirs::from("", "", "plugdex").map(|d| d.config_dir().to_path_buf())
    })
}

/// Returns the data directory holding the global index.
///
/// Resolution: explicit override, then the platform data dir, then
/// `~/.plugdex`, then `./.plugdex` when no home directory is known.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = override_of(&DATA_DIR_OVERRIDE) {
        return dir;
    }
    if let Some(dirs) = directories::ProjectDirs::from("", "", "plugdex") {
        return dirs.data_dir().to_path_buf();
    }
    directories::BaseDirs::new()
        .map(|b| b.home_dir().join(".plugdex"))
        .unwrap_or_else(|| PathBuf::from(".plugdex"))
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<PlugdexConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_config(&raw, path)
}

/// Discover and load config from standard locations relative to the current
/// directory. See [`discover_and_load_from`].
pub fn discover_and_load() -> PlugdexConfig {
    discover_and_load_from(Path::new("."))
}

/// Discover and load config for `dir`.
///
/// Search order:
/// 1. `<dir>/plugdex.{toml,yaml,yml,json}` (project-local)
/// 2. `<config_dir>/plugdex.{toml,yaml,yml,json}` (user-global)
///
/// Returns `PlugdexConfig::default()` if no config file is found or the file
/// cannot be loaded.
pub fn discover_and_load_from(dir: &Path) -> PlugdexConfig {
    let Some(path) = find_config_file(dir, config_dir().as_deref()) else {
        debug!("no config file found, using defaults");
        return PlugdexConfig::default();
    };
    debug!(path = %path.display(), "loading config");
    match load_config(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            PlugdexConfig::default()
        },
    }
}

fn find_config_file(cwd: &Path, global: Option<&Path>) -> Option<PathBuf> {
    std::iter::once(cwd)
        .chain(global)
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)))
        .find(|p| p.is_file())
}

fn parse_config(raw: &str, path: &Path) -> Result<PlugdexConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => Err(Error::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_each_format() {
        let tmp = tempfile::tempdir().unwrap();
        let toml_path = tmp.path().join("plugdex.toml");
        std::fs::write(&toml_path, "[index]\nproject_dir = \".plug\"\n").unwrap();
        assert_eq!(load_config(&toml_path).unwrap().index.project_dir, ".plug");

        let yaml_path = tmp.path().join("plugdex.yaml");
        std::fs::write(&yaml_path, "index:\n  file_name: idx\n").unwrap();
        assert_eq!(load_config(&yaml_path).unwrap().index.file_name, "idx");

        let json_path = tmp.path().join("plugdex.json");
        std::fs::write(&json_path, r#"{"index":{"project_marker":"Plugs"}}"#).unwrap();
        assert_eq!(load_config(&json_path).unwrap().index.project_marker, "Plugs");
    }

    #[test]
    fn rejects_unknown_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("plugdex.ini");
        std::fs::write(&path, "x").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(Error::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/plugdex.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/plugdex.toml"));
    }

    #[test]
    fn local_config_wins_over_global() {
        let cwd = tempfile::tempdir().unwrap();
        let global = tempfile::tempdir().unwrap();
        std::fs::write(global.path().join("plugdex.toml"), "").unwrap();
        assert_eq!(
            find_config_file(cwd.path(), Some(global.path())),
            Some(global.path().join("plugdex.toml"))
        );

        std::fs::write(cwd.path().join("plugdex.yaml"), "").unwrap();
        assert_eq!(
            find_config_file(cwd.path(), Some(global.path())),
            Some(cwd.path().join("plugdex.yaml"))
        );
    }

    #[test]
    fn discovery_reads_the_given_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("plugdex.toml"),
            "[index]\nproject_marker = \"Plugs.lock\"\n",
        )
        .unwrap();
        assert_eq!(
            discover_and_load_from(dir.path()).index.project_marker,
            "Plugs.lock"
        );
    }

    #[test]
    fn malformed_discovered_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("plugdex.toml"), "[index\n").unwrap();
        assert_eq!(discover_and_load_from(dir.path()), PlugdexConfig::default());
    }

    #[test]
    fn data_dir_override_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        set_data_dir(tmp.path().to_path_buf());
        assert_eq!(data_dir(), tmp.path());
        clear_data_dir();
        assert_ne!(data_dir(), tmp.path());
    }
}
