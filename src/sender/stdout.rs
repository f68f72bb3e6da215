use std::{
    any::Any,
    fmt,
    io::{self, Write},
};

use parking_lot::Mutex;

use super::Sender;
use crate::{Message, Result};

/// A sender writing every message as a single JSON line.
pub struct StdoutSender {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl StdoutSender {
    /// Creates a sender writing to the process standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Creates a sender writing to an arbitrary sink.
    pub fn new<W>(writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }
}

impl Sender for StdoutSender {
    fn send(&self, message: &Message) -> Result<()> {
        let line = serde_json::to_vec(message)?;

        let mut writer = self.writer.lock();
        writer.write_all(&line)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for StdoutSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdoutSender").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{Client, sender::DebugCaptureSender};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writes_json_lines() {
        let buffer = SharedBuffer::default();
        let sender = StdoutSender::new(buffer.clone());
        let client = Client::new(Arc::new(DebugCaptureSender::new()), "stdout-test");

        sender.send(&client.message("timer").with_payload("12")).unwrap();
        sender.send(&client.message("counter").with_payload("1")).unwrap();

        let output = String::from_utf8(buffer.0.lock().clone()).unwrap();
        let lines: Vec<Message> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].kind, "timer");
        assert_eq!(lines[1].payload, "1");
        assert_eq!(lines[1].logger, "stdout-test");
    }
}
