//! Message client bound to a sender.

use std::sync::Arc;

use chrono::Utc;

use crate::{
    Message, Result, Severity,
    config::HelperConfig,
    sender::{Sender, SenderRegistry},
};

/// Builds structured messages and hands them to a [`Sender`].
///
/// The client fills every message envelope with its defaults: logger name,
/// severity, environment version, host name and process id.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use metlog_context::{Client, sender::DebugCaptureSender};
///
/// let sender = Arc::new(DebugCaptureSender::new());
/// let client = Client::new(sender.clone(), "payments");
///
/// client.log("counter", "1")?;
/// assert_eq!(sender.last().unwrap().logger, "payments");
/// # Ok::<(), metlog_context::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    sender: Arc<dyn Sender>,
    logger: String,
    severity: Severity,
    env_version: String,
    hostname: String,
    pid: u32,
}

impl Client {
    pub fn new(sender: Arc<dyn Sender>, logger: impl Into<String>) -> Self {
        Self {
            sender,
            logger: logger.into(),
            severity: Severity::default(),
            env_version: HelperConfig::DEFAULT_ENV_VERSION.to_owned(),
            hostname: default_hostname(),
            pid: std::process::id(),
        }
    }

    /// Builds a client and its sender from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the sender backend is unknown or rejects its options.
    pub fn from_config(config: &HelperConfig, registry: &SenderRegistry) -> Result<Self> {
        let sender = registry.create(&config.sender_backend, &config.sender_options)?;
        let mut client = Self::new(sender, config.logger.clone())
            .with_severity(config.severity)
            .with_env_version(config.env_version.clone());
        if let Some(hostname) = &config.hostname {
            client = client.with_hostname(hostname.clone());
        }
        Ok(client)
    }

    #[must_use]
    pub const fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    #[must_use]
    pub fn with_env_version(mut self, env_version: impl Into<String>) -> Self {
        self.env_version = env_version.into();
        self
    }

    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub const fn sender(&self) -> &Arc<dyn Sender> {
        &self.sender
    }

    #[must_use]
    pub fn logger(&self) -> &str {
        &self.logger
    }

    /// Returns a new message of the given type with the envelope filled in.
    #[must_use]
    pub fn message(&self, kind: impl Into<String>) -> Message {
        Message {
            timestamp: Utc::now(),
            logger: self.logger.clone(),
            kind: kind.into(),
            severity: self.severity,
            payload: String::new(),
            env_version: self.env_version.clone(),
            pid: self.pid,
            hostname: self.hostname.clone(),
            fields: serde_json::Map::new(),
        }
    }

    /// Hands the message to the sender.
    ///
    /// # Errors
    ///
    /// Returns the sender error.
    pub fn send(&self, message: &Message) -> Result<()> {
        self.sender.send(message)
    }

    /// Builds and sends a message with the given type and payload.
    ///
    /// # Errors
    ///
    /// Returns the sender error.
    pub fn log(&self, kind: impl Into<String>, payload: impl Into<String>) -> Result<()> {
        self.send(&self.message(kind).with_payload(payload))
    }
}

fn default_hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_owned())
}
