use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::source::FetchConfig;

/// Environment variable naming the snapshot file; overrides the config file.
pub const SNAPSHOT_ENV: &str = "LINEARLENS_SNAPSHOT";

/// User configuration, read from `~/.linearlens/config.json`.
///
/// Every field is optional in the file; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON export to read teams, projects and issues from.
    pub snapshot_path: Option<PathBuf>,
    pub safe_mode: bool,
    /// Months covered by the `all` period and the monthly view.
    pub lookback_months: u32,
    pub issue_limit: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            safe_mode: true,
            lookback_months: 6,
            issue_limit: None,
        }
    }
}

impl Config {
    /// `~/.linearlens/config.json`
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::home_dir()
            .ok_or_else(|| Error::Config("cannot determine home directory".into()))?
            .join(".linearlens");
        Ok(dir.join("config.json"))
    }

    /// Load from the default path, falling back to defaults when the file is absent,
    /// then apply the environment override.
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        let config = if path.exists() {
            Self::load_from(&path)?
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Self::default()
        };
        Ok(config.with_snapshot_override(std::env::var_os(SNAPSHOT_ENV).map(PathBuf::from)))
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: Config = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("invalid config {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the snapshot path when an override is given.
    pub fn with_snapshot_override(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.snapshot_path = Some(path);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.lookback_months == 0 {
            return Err(Error::Config("lookback_months must be at least 1".into()));
        }
        Ok(())
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            safe_mode: self.safe_mode,
            issue_limit: self.issue_limit,
        }
    }

    pub fn snapshot_path(&self) -> Result<&Path> {
        self.snapshot_path.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "no snapshot configured. Pass --snapshot, set {SNAPSHOT_ENV}, or set snapshot_path in {}",
                Self::default_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "~/.linearlens/config.json".to_string())
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.safe_mode);
        assert_eq!(config.lookback_months, 6);
        assert!(config.snapshot_path.is_none());
        assert_eq!(config.fetch_config(), FetchConfig::default());
    }

    #[test]
    fn test_load_partial_file() {
        let file = write_config(r#"{"snapshot_path": "/tmp/export.json", "issue_limit": 500}"#);
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.snapshot_path, Some(PathBuf::from("/tmp/export.json")));
        assert_eq!(config.issue_limit, Some(500));
        assert_eq!(config.lookback_months, 6);
        assert!(config.safe_mode);
    }

    #[test]
    fn test_load_rejects_zero_lookback() {
        let file = write_config(r#"{"lookback_months": 0}"#);
        assert!(matches!(Config::load_from(file.path()), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let file = write_config("{ snapshot_path: ");
        let err = Config::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid config"));
    }

    #[test]
    fn test_snapshot_override() {
        let config = Config::default().with_snapshot_override(Some(PathBuf::from("/a.json")));
        assert_eq!(config.snapshot_path().unwrap(), Path::new("/a.json"));

        let config = config.with_snapshot_override(None);
        assert_eq!(config.snapshot_path().unwrap(), Path::new("/a.json"));
    }

    #[test]
    fn test_missing_snapshot_path_is_config_error() {
        assert!(matches!(
            Config::default().snapshot_path(),
            Err(Error::Config(_))
        ));
    }
}
