use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::admin::github::{DEFAULT_API_BASE, DEFAULT_BRANCH};
use crate::catalog::DataSource;
use crate::error::{GuideError, Result};
use crate::storage::FileStore;
use crate::util::expand_tilde;

pub const DEFAULT_DATA_SOURCE: &str = "data";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideConfig {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
}

impl fmt::Display for GuideConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unset = "(default)";
        writeln!(f, "dataSource     {}", self.data_source.as_deref().unwrap_or(unset))?;
        writeln!(f, "apiBase        {}", self.api_base.as_deref().unwrap_or(unset))?;
        writeln!(f, "defaultBranch  {}", self.default_branch.as_deref().unwrap_or(unset))?;
        writeln!(f, "storagePath    {}", self.storage_path.as_deref().unwrap_or(unset))
    }
}

/// Values after applying flags over the config file over built-in defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub data_source: DataSource,
    pub api_base: String,
    pub default_branch: String,
    pub storage_path: PathBuf,
}

/// Command-line overrides; `None` means "not given".
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub data_source: Option<String>,
    pub api_base: Option<String>,
    pub storage_path: Option<String>,
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".heartopia").join("config.json"))
}

/// Reads the config file. Missing or unreadable files give `None`.
pub fn load_config(path: &Path) -> Option<GuideConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("ignoring invalid config {}: {e}", path.display());
            None
        }
    }
}

pub fn save_config(path: &Path, config: &GuideConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn resolve_path(overrides: &Overrides) -> Result<PathBuf> {
    overrides
        .config_path
        .clone()
        .or_else(config_path)
        .ok_or_else(|| GuideError::Custom("Cannot find home directory".into()))
}

fn empty_config() -> GuideConfig {
    GuideConfig {
        version: 1,
        ..GuideConfig::default()
    }
}

pub fn resolve(overrides: &Overrides) -> Result<Settings> {
    let config = resolve_path(overrides)
        .ok()
        .and_then(|path| load_config(&path))
        .unwrap_or_else(empty_config);

    let data_source = overrides
        .data_source
        .clone()
        .or(config.data_source)
        .unwrap_or_else(|| DEFAULT_DATA_SOURCE.to_string());
    let storage_path = match overrides.storage_path.clone().or(config.storage_path) {
        Some(path) => expand_tilde(&path),
        None => FileStore::default_path()
            .ok_or_else(|| GuideError::Custom("Cannot find home directory".into()))?,
    };

    Ok(Settings {
        data_source: DataSource::parse(&data_source),
        api_base: overrides
            .api_base
            .clone()
            .or(config.api_base)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        default_branch: config
            .default_branch
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
        storage_path,
    })
}

/// Updates one key of the config file and returns the new contents.
pub fn set_value(overrides: &Overrides, key: &str, value: &str) -> Result<GuideConfig> {
    let path = resolve_path(overrides)?;
    let mut config = load_config(&path).unwrap_or_else(empty_config);

    let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
    match key {
        "dataSource" => config.data_source = value,
        "apiBase" => config.api_base = value,
        "defaultBranch" => config.default_branch = value,
        "storagePath" => config.storage_path = value,
        other => {
            return Err(GuideError::Validation(format!(
                "unknown setting '{other}' (expected dataSource, apiBase, defaultBranch or storagePath)"
            )))
        }
    }

    save_config(&path, &config)?;
    Ok(config)
}

pub fn show(overrides: &Overrides) -> Result<GuideConfig> {
    let path = resolve_path(overrides)?;
    Ok(load_config(&path).unwrap_or_else(empty_config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides_in(dir: &Path) -> Overrides {
        Overrides {
            config_path: Some(dir.join("config.json")),
            storage_path: Some(dir.join("storage.json").to_string_lossy().to_string()),
            ..Overrides::default()
        }
    }

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = resolve(&overrides_in(dir.path())).unwrap();
        assert_eq!(settings.data_source, DataSource::Directory(PathBuf::from("data")));
        assert_eq!(settings.api_base, DEFAULT_API_BASE);
        assert_eq!(settings.default_branch, "main");
        assert_eq!(settings.storage_path, dir.path().join("storage.json"));
    }

    #[test]
    fn test_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = overrides_in(dir.path());
        set_value(&overrides, "dataSource", "https://guide.example/data").unwrap();
        set_value(&overrides, "defaultBranch", "gh-pages").unwrap();

        let settings = resolve(&overrides).unwrap();
        assert_eq!(
            settings.data_source,
            DataSource::Http("https://guide.example/data".into())
        );
        assert_eq!(settings.default_branch, "gh-pages");

        let flagged = Overrides {
            data_source: Some("local".into()),
            ..overrides
        };
        assert_eq!(
            resolve(&flagged).unwrap().data_source,
            DataSource::Directory(PathBuf::from("local"))
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = overrides_in(dir.path());
        assert!(set_value(&overrides, "theme", "dark").is_err());
        assert!(!dir.path().join("config.json").exists());
    }

    #[test]
    fn test_camel_case_file() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = overrides_in(dir.path());
        set_value(&overrides, "apiBase", "http://localhost:9000").unwrap();
        let raw = std::fs::read_to_string(dir.path().join("config.json")).unwrap();
        assert!(raw.contains("\"apiBase\""));
        assert!(raw.contains("\"version\": 1"));
        assert_eq!(show(&overrides).unwrap().api_base.as_deref(), Some("http://localhost:9000"));
    }
}
