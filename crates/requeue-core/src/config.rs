use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::retry::{
    FailureKind, RetrySettings, UnknownFailureKind, DEFAULT_RETRY_FAILURES,
    DEFAULT_RETRY_HTTP_CODES,
};

/// Configuration that cannot be turned into a working retry policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("retry.exceptions: {0}")]
    UnknownFailureKind(#[from] UnknownFailureKind),
    #[error("retry.stats_base_key must not be empty")]
    EmptyStatsBaseKey,
}

/// `[retry]` section of config.toml.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// When false no retry policy is built at all.
    pub enabled: bool,
    /// Retries per request, not counting the first attempt.
    pub max_retry_times: u32,
    /// Response status codes that trigger a retry.
    pub http_codes: Vec<u16>,
    /// Failure kinds that trigger a retry, by short (`Dns`) or
    /// fully-qualified (`requeue::net::Dns`) name.
    pub exceptions: Vec<String>,
    /// Added to a request's priority on each retry; negative values push
    /// retries behind fresh requests.
    pub priority_adjust: i32,
    /// Prefix for stats counters (`<key>/count`, `<key>/max_reached`, ...).
    pub stats_base_key: String,
    /// Deprecated spelling of `exceptions`. Replaces it when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exceptions_to_retry: Option<Vec<String>>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retry_times: 2,
            http_codes: DEFAULT_RETRY_HTTP_CODES.to_vec(),
            exceptions: DEFAULT_RETRY_FAILURES
                .iter()
                .map(|k| k.short_name().to_string())
                .collect(),
            priority_adjust: -1,
            stats_base_key: "retry".to_string(),
            exceptions_to_retry: None,
        }
    }
}

impl RetryConfig {
    /// Resolve names into settings the policy can use directly.
    ///
    /// Returns `Ok(None)` when retries are disabled.
    pub fn resolve(&self) -> Result<Option<RetrySettings>, ConfigError> {
        if !self.enabled {
            tracing::debug!("retries disabled by configuration");
            return Ok(None);
        }
        let names = match &self.exceptions_to_retry {
            Some(legacy) => {
                tracing::warn!(
                    "retry.exceptions_to_retry is deprecated; use retry.exceptions instead"
                );
                legacy
            }
            None => &self.exceptions,
        };
        let retryable_failures: HashSet<FailureKind> = names
            .iter()
            .map(|n| n.parse::<FailureKind>())
            .collect::<Result<_, _>>()?;
        let stats_base_key = self.stats_base_key.trim().trim_end_matches('/');
        if stats_base_key.is_empty() {
            return Err(ConfigError::EmptyStatsBaseKey);
        }

        Ok(Some(RetrySettings {
            max_retry_times: self.max_retry_times,
            retryable_status_codes: self.http_codes.iter().copied().collect(),
            retryable_failures,
            priority_adjust: self.priority_adjust,
            stats_base_key: stats_base_key.to_string(),
        }))
    }
}

/// Global configuration loaded from `~/.config/requeue/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequeueConfig {
    #[serde(default)]
    pub retry: RetryConfig,
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("requeue")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<RequeueConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = RequeueConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<RequeueConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: RequeueConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_values() {
        let cfg = RequeueConfig::default();
        assert!(cfg.retry.enabled);
        assert_eq!(cfg.retry.max_retry_times, 2);
        assert_eq!(cfg.retry.priority_adjust, -1);
        assert!(cfg.retry.http_codes.contains(&503));
        assert!(cfg.retry.exceptions.iter().any(|e| e == "Timeout"));
    }

    #[test]
    fn default_config_resolves_to_default_settings() {
        let settings = RetryConfig::default().resolve().unwrap().unwrap();
        assert_eq!(settings, RetrySettings::default());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = RequeueConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: RequeueConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
        assert!(!toml.contains("exceptions_to_retry"));
    }

    #[test]
    fn config_toml_partial_retry_section() {
        let toml = r#"
            [retry]
            max_retry_times = 5
            http_codes = [503]
        "#;
        let cfg: RequeueConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.retry.max_retry_times, 5);
        assert_eq!(cfg.retry.http_codes, vec![503]);
        assert!(cfg.retry.enabled);
        assert_eq!(cfg.retry.priority_adjust, -1);
    }

    #[test]
    fn config_toml_empty_uses_defaults() {
        let cfg: RequeueConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, RequeueConfig::default());
    }

    #[test]
    fn disabled_resolves_to_none() {
        let cfg = RetryConfig {
            enabled: false,
            ..RetryConfig::default()
        };
        assert_eq!(cfg.resolve(), Ok(None));
    }

    #[test]
    fn unknown_exception_name_is_rejected() {
        let cfg = RetryConfig {
            exceptions: vec!["Timeout".to_string(), "Gremlins".to_string()],
            ..RetryConfig::default()
        };
        assert_eq!(
            cfg.resolve(),
            Err(ConfigError::UnknownFailureKind(UnknownFailureKind(
                "Gremlins".to_string()
            )))
        );
    }

    #[test]
    fn qualified_exception_names_resolve() {
        let cfg = RetryConfig {
            exceptions: vec!["requeue::net::Tls".to_string()],
            ..RetryConfig::default()
        };
        let settings = cfg.resolve().unwrap().unwrap();
        assert_eq!(settings.retryable_failures.len(), 1);
        assert!(settings.retryable_failures.contains(&FailureKind::Tls));
    }

    #[test]
    fn legacy_exception_list_replaces_current_one() {
        let toml = r#"
            [retry]
            exceptions = ["Timeout"]
            exceptions_to_retry = ["Dns", "Tunnel"]
        "#;
        let cfg: RequeueConfig = toml::from_str(toml).unwrap();
        let settings = cfg.retry.resolve().unwrap().unwrap();
        assert_eq!(
            settings.retryable_failures,
            HashSet::from([FailureKind::Dns, FailureKind::Tunnel])
        );
    }

    #[test]
    fn stats_base_key_is_normalised() {
        let cfg = RetryConfig {
            stats_base_key: "fetch/retry/".to_string(),
            ..RetryConfig::default()
        };
        let settings = cfg.resolve().unwrap().unwrap();
        assert_eq!(settings.stats_base_key, "fetch/retry");

        let empty = RetryConfig {
            stats_base_key: " ".to_string(),
            ..RetryConfig::default()
        };
        assert_eq!(empty.resolve(), Err(ConfigError::EmptyStatsBaseKey));
    }

    #[test]
    fn load_from_path_reads_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[retry]\nmax_retry_times = 7\npriority_adjust = 3").unwrap();
        f.flush().unwrap();
        let cfg = load_from_path(f.path()).unwrap();
        assert_eq!(cfg.retry.max_retry_times, 7);
        assert_eq!(cfg.retry.priority_adjust, 3);
    }

    #[test]
    fn load_from_path_reports_bad_toml() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[retry\nmax_retry_times = ").unwrap();
        f.flush().unwrap();
        let err = load_from_path(f.path()).unwrap_err();
        assert!(err.to_string().starts_with("parse config"));
    }
}
