//! Layered settings: built-in defaults, an optional TOML file, then
//! `TXBOARD_*` environment variables. Command-line flags are applied on top
//! by the binary.
//!
//! ```toml
//! url = "http://localhost:8080"
//! api_prefix = "/api/spring-tx-board"
//! refresh = 5
//! page_size = 25
//! tx_threshold = "1s"
//! conn_threshold = "500ms"
//! theme = "dark"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use ::config::{Config, Environment, File, FileFormat};
use anyhow::{bail, Result};
use serde::Deserialize;

use crate::data::duration::parse_millis;
use crate::data::model::AlarmingThreshold;
use crate::data::query::MAX_PAGE_SIZE;
use crate::source::DEFAULT_API_PREFIX;
use crate::ui::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeChoice {
    #[default]
    Auto,
    Dark,
    Light,
}

impl ThemeChoice {
    pub fn theme(self) -> Theme {
        match self {
            ThemeChoice::Auto => Theme::auto_detect(),
            ThemeChoice::Dark => Theme::dark(),
            ThemeChoice::Light => Theme::light(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the Transaction Log Service.
    pub url: Option<String>,
    /// Offline dump to read instead of a live service.
    pub file: Option<PathBuf>,
    pub api_prefix: String,
    /// Refresh interval in seconds.
    pub refresh: u64,
    /// HTTP request timeout in seconds.
    pub timeout: u64,
    pub page_size: u32,
    /// Pins the transaction threshold, e.g. "1s".
    pub tx_threshold: Option<String>,
    /// Pins the connection threshold, e.g. "750ms".
    pub conn_threshold: Option<String>,
    pub theme: ThemeChoice,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: None,
            file: None,
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            refresh: 5,
            timeout: 10,
            page_size: 10,
            tx_threshold: None,
            conn_threshold: None,
            theme: ThemeChoice::Auto,
            log_file: None,
        }
    }
}

impl Settings {
    /// Load settings from an optional TOML file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }
        let config = builder
            .add_source(Environment::with_prefix("TXBOARD").try_parsing(true))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            bail!("page_size must be between 1 and {}", MAX_PAGE_SIZE);
        }
        if self.refresh == 0 {
            bail!("refresh must be at least one second");
        }
        if self.timeout == 0 {
            bail!("timeout must be at least one second");
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Locally pinned threshold, if either value was given.
    ///
    /// A value left unset keeps its default.
    pub fn pinned_threshold(&self) -> Result<Option<AlarmingThreshold>> {
        if self.tx_threshold.is_none() && self.conn_threshold.is_none() {
            return Ok(None);
        }
        let mut threshold = AlarmingThreshold::default();
        if let Some(ref value) = self.tx_threshold {
            threshold.transaction = parse_millis(value)?;
        }
        if let Some(ref value) = self.conn_threshold {
            threshold.connection = parse_millis(value)?;
        }
        Ok(Some(threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_without_file() {
        let settings = Settings::default();
        assert_eq!(settings.api_prefix, "/api/spring-tx-board");
        assert_eq!(settings.refresh_interval(), Duration::from_secs(5));
        assert!(settings.validate().is_ok());
        assert_eq!(settings.pinned_threshold().unwrap(), None);
    }

    #[test]
    fn test_load_toml_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
url = "http://localhost:8080"
page_size = 50
refresh = 2
theme = "light"
conn_threshold = "750ms"
"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(settings.page_size, 50);
        assert_eq!(settings.refresh, 2);
        assert_eq!(settings.theme, ThemeChoice::Light);
        // untouched keys keep their defaults
        assert_eq!(settings.api_prefix, DEFAULT_API_PREFIX);

        let threshold = settings.pinned_threshold().unwrap().unwrap();
        assert_eq!(threshold.connection, 750);
        assert_eq!(threshold.transaction, 1000);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(Settings::load(Some(Path::new("/nonexistent/txboard.toml"))).is_err());
    }

    #[test]
    fn test_validate_rejects_page_size() {
        let settings = Settings {
            page_size: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_intervals() {
        let no_refresh = Settings {
            refresh: 0,
            ..Default::default()
        };
        assert!(no_refresh.validate().is_err());

        let no_timeout = Settings {
            timeout: 0,
            ..Default::default()
        };
        let err = no_timeout.validate().unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_bad_threshold() {
        let settings = Settings {
            tx_threshold: Some("soon".to_string()),
            ..Default::default()
        };
        assert!(settings.pinned_threshold().is_err());
    }
}
