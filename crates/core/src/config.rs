//! Configuration structures for the trade validator.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Largest confirmation window a time delta can hold, in seconds.
pub const MAX_WINDOW_SECS: i64 = i64::MAX / 1000;

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cross-stream matching configuration.
    pub matching: MatchingConfig,
    /// Report output configuration.
    pub report: ReportConfig,
    /// Remote source / content store configuration.
    pub remote: RemoteConfig,
}

impl Config {
    /// Parse a JSON config. Missing sections and fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.matching.window_secs < 0 {
            return Err(Error::config("matching.window_secs must not be negative"));
        }
        if self.matching.window_secs > MAX_WINDOW_SECS {
            return Err(Error::config(format!(
                "matching.window_secs must not exceed {}",
                MAX_WINDOW_SECS
            )));
        }
        if self.report.output_root.as_os_str().is_empty() {
            return Err(Error::config("report.output_root must not be empty"));
        }
        if self.remote.fetch_timeout_secs == 0 {
            return Err(Error::config("remote.fetch_timeout_secs must be positive"));
        }
        Ok(())
    }
}

/// Cross-stream matching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Confirmation window in seconds, inclusive on both sides.
    pub window_secs: i64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self { window_secs: 60 }
    }
}

/// Report output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory under which each run gets its own `validation_<ts>` folder.
    pub output_root: PathBuf,
    /// Characters added to the widest value of each spreadsheet column.
    pub column_padding: usize,
    /// Indent width of the JSON artifacts.
    pub json_indent: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("validation_output"),
            column_padding: 3,
            json_indent: 4,
        }
    }
}

/// Remote source / content store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Content store REST API base.
    pub api_base: String,
    /// Base for raw file links.
    pub raw_base: String,
    /// Base for browsable folder links.
    pub web_base: String,
    /// Target repository, `owner/name`.
    pub repo: String,
    /// Bearer token for the content store.
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Branch the artifacts land on.
    pub branch: String,
    /// Remote folder holding every run.
    pub results_prefix: String,
    /// Timeout for fetching a stream.
    pub fetch_timeout_secs: u64,
    /// User-Agent sent with every request.
    pub user_agent: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            raw_base: "https://raw.githubusercontent.com".to_string(),
            web_base: "https://github.com".to_string(),
            repo: String::new(),
            token: None,
            branch: "main".to_string(),
            results_prefix: "validation_results".to_string(),
            fetch_timeout_secs: 15,
            user_agent: "trade-validator".to_string(),
        }
    }
}

impl RemoteConfig {
    /// Defaults with `repo` and `token` taken from `GITHUB_REPO` / `GITHUB_TOKEN`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(repo) = std::env::var("GITHUB_REPO") {
            config.repo = repo;
        }
        config.token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());
        config
    }

    /// Error unless both repository and token are set.
    pub fn require_credentials(&self) -> Result<(&str, &str)> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| Error::config("content store token is not set"))?;
        if self.repo.is_empty() {
            return Err(Error::config("content store repository is not set"));
        }
        Ok((self.repo.as_str(), token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.matching.window_secs, 60);
        assert_eq!(config.report.column_padding, 3);
        assert_eq!(config.report.output_root, PathBuf::from("validation_output"));
        assert_eq!(config.remote.fetch_timeout_secs, 15);
        assert_eq!(config.remote.results_prefix, "validation_results");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json_str(r#"{"report": {"output_root": "/tmp/runs"}}"#).unwrap();
        assert_eq!(config.report.output_root, PathBuf::from("/tmp/runs"));
        assert_eq!(config.report.json_indent, 4);
        assert_eq!(config.matching.window_secs, 60);
    }

    #[test]
    fn test_rejects_negative_window() {
        let err = Config::from_json_str(r#"{"matching": {"window_secs": -1}}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_oversized_window() {
        let json = format!(r#"{{"matching": {{"window_secs": {}}}}}"#, i64::MAX);
        let err = Config::from_json_str(&json).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let json = format!(r#"{{"matching": {{"window_secs": {}}}}}"#, MAX_WINDOW_SECS);
        assert!(Config::from_json_str(&json).is_ok());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"remote": {{"repo": "acme/results", "branch": "reports"}}}}"#).unwrap();
        let config = Config::from_json_file(file.path()).unwrap();
        assert_eq!(config.remote.repo, "acme/results");
        assert_eq!(config.remote.branch, "reports");
    }

    #[test]
    fn test_require_credentials() {
        let mut remote = RemoteConfig::default();
        assert!(remote.require_credentials().is_err());
        remote.repo = "acme/results".into();
        remote.token = Some("secret".into());
        assert_eq!(remote.require_credentials().unwrap(), ("acme/results", "secret"));
    }
}
