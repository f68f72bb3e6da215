use std::any::Any;

use log::kv::{Key, Source, Value, VisitSource};

use super::Sender;
use crate::{Message, Result};

/// A sender forwarding messages to the [`log`] facade.
///
/// The message logger becomes the record target, the severity is mapped to
/// a [`log::Level`] and the payload becomes the record text. The envelope
/// properties and every entry of [`Message::fields`] are attached as
/// structured key/values, so any logger supporting `kv` can render them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSender;

impl Sender for LogSender {
    fn send(&self, message: &Message) -> Result<()> {
        let level = message.severity.to_log_level();
        let logger = log::logger();
        let record_meta = log::Metadata::builder()
            .level(level)
            .target(&message.logger)
            .build();
        if !logger.enabled(&record_meta) {
            return Ok(());
        }

        logger.log(
            &log::Record::builder()
                .args(format_args!("{}", message.payload))
                .level(level)
                .target(&message.logger)
                .key_values(&MessageRecords(message))
                .build(),
        );
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct MessageRecords<'a>(&'a Message);

impl Source for MessageRecords<'_> {
    fn visit<'kvs>(&'kvs self, visitor: &mut dyn VisitSource<'kvs>) -> Result<(), log::kv::Error> {
        let message = self.0;
        visitor.visit_pair(Key::from_str("type"), Value::from(message.kind.as_str()))?;
        visitor.visit_pair(Key::from_str("severity"), Value::from(u8::from(message.severity)))?;
        visitor.visit_pair(Key::from_str("env_version"), Value::from(message.env_version.as_str()))?;
        visitor.visit_pair(Key::from_str("pid"), Value::from(message.pid))?;
        visitor.visit_pair(Key::from_str("hostname"), Value::from(message.hostname.as_str()))?;
        for (key, value) in &message.fields {
            visitor.visit_pair(Key::from_str(key), Value::from_serde(value))?;
        }
        Ok(())
    }
}
