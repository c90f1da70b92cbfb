//! # Configuration
//!
//! Manages the loading and parsing of the bot's settings file (`conf/settings.yaml`).
//! Key names follow the upper-case convention of the HySDS settings files so an
//! existing ops deployment can reuse its configuration unchanged.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::domain::errors::SettingsError;

pub const DEFAULT_SETTINGS_PATH: &str = "conf/settings.yaml";

/// Main settings structure.
/// Matches the layout of `conf/settings.yaml`.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Base URL of the Mozart job-status index, keyed by cluster name.
    #[serde(rename = "MOZART_ES_URL")]
    pub mozart_es_url: HashMap<String, String>,
    #[serde(rename = "BACKOFF_MAX_TRIES")]
    pub backoff_max_tries: u32,
    /// Upper bound for a single backoff delay, in seconds.
    #[serde(rename = "BACKOFF_MAX_VALUE")]
    pub backoff_max_value: f64,
    /// First backoff delay, in seconds. Doubles on every further attempt.
    #[serde(rename = "BACKOFF_BASE", default = "default_backoff_base")]
    pub backoff_base: f64,
    #[serde(rename = "BOT_TOKEN", default)]
    pub bot_token: Option<String>,
    #[serde(rename = "BOT_ID", default)]
    pub bot_id: Option<String>,
    #[serde(rename = "MATRIX_HOMESERVER", default)]
    pub matrix_homeserver: Option<String>,
    #[serde(rename = "POLL_INTERVAL", default = "default_poll_interval")]
    pub poll_interval: f64,
    #[serde(rename = "HTTP_TIMEOUT", default = "default_http_timeout")]
    pub http_timeout: u64,
    #[serde(rename = "LOG_DIR", default = "default_log_dir")]
    pub log_dir: String,
}

fn default_backoff_base() -> f64 {
    1.0
}

fn default_poll_interval() -> f64 {
    1.0
}

fn default_http_timeout() -> u64 {
    30
}

fn default_log_dir() -> String {
    "data".to_string()
}

impl Settings {
    /// Read and validate the settings file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|e| match e {
            SettingsError::Parse { source, .. } => SettingsError::Parse {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings =
            serde_yaml::from_str(content).map_err(|source| SettingsError::Parse {
                path: "<inline>".to_string(),
                source,
            })?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.backoff_max_tries == 0 {
            return Err(SettingsError::Invalid {
                key: "BACKOFF_MAX_TRIES",
                reason: "must be at least 1".to_string(),
            });
        }
        for (key, value) in [
            ("BACKOFF_MAX_VALUE", self.backoff_max_value),
            ("BACKOFF_BASE", self.backoff_base),
            ("POLL_INTERVAL", self.poll_interval),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SettingsError::Invalid {
                    key,
                    reason: format!("expected a non-negative number of seconds, got {value}"),
                });
            }
        }
        Ok(())
    }

    /// Index base URL for `cluster`, without a trailing slash.
    pub fn index_url(&self, cluster: &str) -> Option<&str> {
        self.mozart_es_url
            .get(cluster)
            .map(|url| url.trim_end_matches('/'))
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_secs_f64(self.backoff_base)
    }

    pub fn backoff_max_value(&self) -> Duration {
        Duration::from_secs_f64(self.backoff_max_value)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.poll_interval)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout)
    }
}

#[cfg(test)]
pub(crate) fn test_settings(clusters: &[(&str, &str)]) -> Settings {
    Settings {
        mozart_es_url: clusters
            .iter()
            .map(|(name, url)| (name.to_string(), url.to_string()))
            .collect(),
        backoff_max_tries: 3,
        backoff_max_value: 0.05,
        backoff_base: 0.01,
        bot_token: None,
        bot_id: Some("@opsbot:example.org".to_string()),
        matrix_homeserver: None,
        poll_interval: 0.01,
        http_timeout: 5,
        log_dir: "data".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
MOZART_ES_URL:
  ops: http://mozart.example.org:9200/
  dev: http://mozart-dev.example.org:9200
BACKOFF_MAX_TRIES: 10
BACKOFF_MAX_VALUE: 64
BOT_ID: "@opsbot:example.org"
"#;

    #[test]
    fn test_parse_with_defaults() {
        let settings = Settings::from_yaml(SAMPLE).unwrap();
        assert_eq!(settings.backoff_max_tries, 10);
        assert_eq!(settings.backoff_max_value(), Duration::from_secs(64));
        assert_eq!(settings.backoff_base(), Duration::from_secs(1));
        assert_eq!(settings.poll_interval(), Duration::from_secs(1));
        assert_eq!(settings.http_timeout(), Duration::from_secs(30));
        assert_eq!(settings.log_dir, "data");
        assert_eq!(settings.bot_id.as_deref(), Some("@opsbot:example.org"));
        assert!(settings.bot_token.is_none());
    }

    #[test]
    fn test_index_url_strips_trailing_slash() {
        let settings = Settings::from_yaml(SAMPLE).unwrap();
        assert_eq!(
            settings.index_url("ops"),
            Some("http://mozart.example.org:9200")
        );
        assert_eq!(
            settings.index_url("dev"),
            Some("http://mozart-dev.example.org:9200")
        );
        assert_eq!(settings.index_url("prod"), None);
    }

    #[test]
    fn test_missing_required_key() {
        let err = Settings::from_yaml("MOZART_ES_URL: {}\nBACKOFF_MAX_TRIES: 3\n").unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
        assert!(err.to_string().contains("BACKOFF_MAX_VALUE"));
    }

    #[test]
    fn test_zero_tries_rejected() {
        let err = Settings::from_yaml(
            "MOZART_ES_URL: {}\nBACKOFF_MAX_TRIES: 0\nBACKOFF_MAX_VALUE: 5\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Invalid {
                key: "BACKOFF_MAX_TRIES",
                ..
            }
        ));
    }

    #[test]
    fn test_negative_delay_rejected() {
        let err = Settings::from_yaml(
            "MOZART_ES_URL: {}\nBACKOFF_MAX_TRIES: 2\nBACKOFF_MAX_VALUE: -1\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("BACKOFF_MAX_VALUE"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.mozart_es_url.len(), 2);
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yaml");
        let err = Settings::load(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
        assert!(err.to_string().contains("missing.yaml"));

        let bad = dir.path().join("bad.yaml");
        std::fs::write(&bad, "MOZART_ES_URL: [").unwrap();
        let err = Settings::load(&bad).unwrap_err();
        assert!(err.to_string().contains("bad.yaml"));
    }
}
