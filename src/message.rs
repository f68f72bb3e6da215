//! Structured message envelope handed to senders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Name of the field under which the request decorators put the context mapping.
pub const THREADLOCAL_FIELD: &str = "threadlocal";

/// Syslog severity of a message, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Severity {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    #[default]
    Informational = 6,
    Debug = 7,
}

impl Severity {
    /// Maps the severity onto the closest [`log::Level`].
    #[must_use]
    pub const fn to_log_level(self) -> log::Level {
        match self {
            Severity::Emergency | Severity::Alert | Severity::Critical | Severity::Error => {
                log::Level::Error
            }
            Severity::Warning => log::Level::Warn,
            Severity::Notice | Severity::Informational => log::Level::Info,
            Severity::Debug => log::Level::Debug,
        }
    }
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> Self {
        severity as Self
    }
}

// `Severity::Error` shadows the associated type, so the paths below are spelled out.
impl TryFrom<u8> for Severity {
    type Error = Error;

    fn try_from(value: u8) -> Result<Severity, Error> {
        Ok(match value {
            0 => Severity::Emergency,
            1 => Severity::Alert,
            2 => Severity::Critical,
            3 => Severity::Error,
            4 => Severity::Warning,
            5 => Severity::Notice,
            6 => Severity::Informational,
            7 => Severity::Debug,
            other => {
                return Err(Error::invalid_value(
                    "severity",
                    format_args!("{other} is not in 0..=7"),
                ));
            }
        })
    }
}

/// A single structured message.
///
/// Messages are usually obtained from [`Client::message`](crate::Client::message),
/// which fills the envelope with the client defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub timestamp: DateTime<Utc>,
    pub logger: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub payload: String,
    pub env_version: String,
    pub pid: u32,
    pub hostname: String,
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Message {
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }

    #[must_use]
    pub const fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }

    /// Returns the context mapping attached by the request decorators.
    #[must_use]
    pub fn threadlocal(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.field(THREADLOCAL_FIELD)?.as_object()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn message() -> Message {
        Message {
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            logger: "test".to_owned(),
            kind: "wsgi".to_owned(),
            severity: Severity::default(),
            payload: String::new(),
            env_version: "0.8".to_owned(),
            pid: 1,
            hostname: "localhost".to_owned(),
            fields: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_message_json_shape() {
        let message = message()
            .with_severity(Severity::Warning)
            .with_field(THREADLOCAL_FIELD, json!({ "foo": "bar" }));

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], json!("wsgi"));
        assert_eq!(value["severity"], json!(4));
        assert_eq!(value["fields"]["threadlocal"]["foo"], json!("bar"));
        assert_eq!(message.threadlocal().unwrap()["foo"], json!("bar"));
    }

    #[test]
    fn test_severity_bounds() {
        assert_eq!(Severity::try_from(7).unwrap(), Severity::Debug);
        assert!(Severity::try_from(8).is_err());
        assert!(serde_json::from_value::<Severity>(json!(9)).is_err());
        assert_eq!(Severity::Critical.to_log_level(), log::Level::Error);
    }
}
