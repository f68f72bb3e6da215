//! INI-style configuration of the client.
//!
//! A configuration text contains named sections of `key = value` pairs:
//!
//! ```ini
//! [metlog]
//! enabled = true
//! logger = payments
//! sender_backend = debug
//! sender_max_messages = 10
//! ```
//!
//! Every key starting with `sender_`, apart from `sender_backend` itself, is
//! handed to the sender factory with the prefix stripped.

use std::path::Path;

use config::{File, FileFormat, Value};

use crate::{Error, Result, Severity, sender::SenderOptions};

/// Parsed configuration text holding one or more sections.
#[derive(Debug, Clone)]
pub struct Config {
    inner: config::Config,
}

impl Config {
    /// Parses configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the text is not valid INI.
    pub fn parse(text: &str) -> Result<Self> {
        let inner = config::Config::builder()
            .add_source(File::from_str(text, FileFormat::Ini))
            .build()?;
        Ok(Self { inner })
    }

    /// Reads configuration from an INI file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file is missing or malformed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let inner = config::Config::builder()
            .add_source(File::from(path.as_ref()).format(FileFormat::Ini))
            .build()?;
        Ok(Self { inner })
    }

    /// Returns the typed settings stored in the section `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingSection`] if there is no such section, or an
    /// error describing the first invalid or missing key.
    pub fn section(&self, name: &str) -> Result<HelperConfig> {
        let table = self.inner.get_table(name).map_err(|err| match err {
            config::ConfigError::NotFound(_) => Error::MissingSection(name.to_owned()),
            other => Error::Config(other),
        })?;
        HelperConfig::from_table(name, table)
    }
}

/// Settings used to build a [`Client`](crate::Client) and its sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperConfig {
    /// When `false`, no client is installed and messages are dropped.
    pub enabled: bool,
    /// Free-form identifier of the integration that owns this section.
    pub backend: Option<String>,
    /// Name of the sender in the [`SenderRegistry`](crate::sender::SenderRegistry).
    pub sender_backend: String,
    pub sender_options: SenderOptions,
    pub logger: String,
    pub severity: Severity,
    pub env_version: String,
    /// Overrides the host name reported in messages.
    pub hostname: Option<String>,
}

impl HelperConfig {
    pub const DEFAULT_ENV_VERSION: &'static str = "0.8";

    /// Creates settings with defaults, sending through `sender_backend`.
    pub fn new(sender_backend: impl Into<String>) -> Self {
        Self {
            enabled: true,
            backend: None,
            sender_backend: sender_backend.into(),
            sender_options: SenderOptions::new(),
            logger: String::new(),
            severity: Severity::default(),
            env_version: Self::DEFAULT_ENV_VERSION.to_owned(),
            hostname: None,
        }
    }

    #[must_use]
    pub fn with_logger(mut self, logger: impl Into<String>) -> Self {
        self.logger = logger.into();
        self
    }

    #[must_use]
    pub fn with_sender_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.sender_options.insert(key, value);
        self
    }

    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    fn from_table(section: &str, table: config::Map<String, Value>) -> Result<Self> {
        let mut config = Self::new(String::new()).with_logger(section);
        let mut sender_backend = None;

        for (key, value) in table {
            match key.as_str() {
                "enabled" => {
                    config.enabled = value
                        .into_bool()
                        .map_err(|err| Error::invalid_value(&key, err))?;
                }
                "backend" => config.backend = Some(into_string(&key, value)?),
                "sender_backend" => sender_backend = Some(into_string(&key, value)?),
                "logger" => config.logger = into_string(&key, value)?,
                "severity" => {
                    let level = value
                        .into_int()
                        .map_err(|err| Error::invalid_value(&key, err))?;
                    let level = u8::try_from(level).map_err(|err| Error::invalid_value(&key, err))?;
                    config.severity = Severity::try_from(level)?;
                }
                "env_version" => config.env_version = into_string(&key, value)?,
                "hostname" => config.hostname = Some(into_string(&key, value)?),
                other => {
                    if let Some(option) = other.strip_prefix("sender_") {
                        let value = into_string(other, value)?;
                        config.sender_options.insert(option, value);
                    } else {
                        log::warn!("Ignoring unknown key `{other}` in section `{section}`");
                    }
                }
            }
        }

        config.sender_backend =
            sender_backend.ok_or_else(|| Error::MissingKey("sender_backend".to_owned()))?;
        Ok(config)
    }
}

fn into_string(key: &str, value: Value) -> Result<String> {
    value
        .into_string()
        .map(|value| value.trim().to_owned())
        .map_err(|err| Error::invalid_value(key, err))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const CONFIG: &str = r"
[test1]
enabled = true
backend = request_logging
sender_backend = debug
sender_max_messages = 10

[disabled]
enabled = false
sender_backend = stdout
logger = billing
severity = 3
";

    #[test]
    fn test_parse_section() {
        let config = Config::parse(CONFIG).unwrap().section("test1").unwrap();

        assert!(config.enabled);
        assert_eq!(config.backend.as_deref(), Some("request_logging"));
        assert_eq!(config.sender_backend, "debug");
        assert_eq!(config.sender_options.get("max_messages"), Some("10"));
        assert_eq!(config.sender_options.len(), 1);
        assert_eq!(config.logger, "test1");
        assert_eq!(config.severity, Severity::Informational);
        assert_eq!(config.env_version, HelperConfig::DEFAULT_ENV_VERSION);
    }

    #[test]
    fn test_parse_overrides() {
        let config = Config::parse(CONFIG).unwrap().section("disabled").unwrap();

        assert!(!config.enabled);
        assert_eq!(config.logger, "billing");
        assert_eq!(config.severity, Severity::Error);
        assert!(config.sender_options.is_empty());
    }

    #[test]
    fn test_missing_section_and_key() {
        let config = Config::parse(CONFIG).unwrap();
        assert!(matches!(
            config.section("absent"),
            Err(Error::MissingSection(name)) if name == "absent"
        ));

        let config = Config::parse("[broken]\nenabled = true\n").unwrap();
        assert!(matches!(
            config.section("broken"),
            Err(Error::MissingKey(key)) if key == "sender_backend"
        ));
    }

    #[test]
    fn test_invalid_values() {
        let config = Config::parse("[bad]\nsender_backend = debug\nseverity = 12\n").unwrap();
        assert!(matches!(
            config.section("bad"),
            Err(Error::InvalidValue { key, .. }) if key == "severity"
        ));

        let config = Config::parse("[bad]\nsender_backend = debug\nenabled = maybe\n").unwrap();
        assert!(matches!(
            config.section("bad"),
            Err(Error::InvalidValue { key, .. }) if key == "enabled"
        ));
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("metlog-context-{}.ini", std::process::id()));
        std::fs::write(&path, CONFIG).unwrap();

        let config = Config::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.section("test1").unwrap().sender_backend, "debug");
        assert!(matches!(
            Config::from_file(&path),
            Err(Error::Config(_))
        ));
    }
}
