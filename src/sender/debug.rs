use std::{any::Any, collections::VecDeque};

use parking_lot::Mutex;

use super::{Sender, SenderOptions};
use crate::{Message, Result};

/// A sender that keeps messages in memory instead of transmitting them.
///
/// Messages are kept in the order they were sent. Once the buffer is full the
/// oldest message is evicted to make room for a new one.
///
/// Reads the `max_messages` option (default 100) when built from a
/// [`SenderRegistry`](super::SenderRegistry).
#[derive(Debug)]
pub struct DebugCaptureSender {
    capacity: usize,
    messages: Mutex<VecDeque<Message>>,
}

impl DebugCaptureSender {
    pub const DEFAULT_CAPACITY: usize = 100;

    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates a sender keeping at most `capacity` messages (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            messages: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Creates a sender from its backend options.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_messages` is not a number.
    pub fn from_options(options: &SenderOptions) -> Result<Self> {
        let capacity = options
            .parse("max_messages")?
            .unwrap_or(Self::DEFAULT_CAPACITY);
        Ok(Self::with_capacity(capacity))
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns a copy of the captured messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().iter().cloned().collect()
    }

    #[must_use]
    pub fn last(&self) -> Option<Message> {
        self.messages.lock().back().cloned()
    }

    /// Removes and returns the captured messages, oldest first.
    pub fn drain(&self) -> Vec<Message> {
        self.messages.lock().drain(..).collect()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

impl Default for DebugCaptureSender {
    fn default() -> Self {
        Self::new()
    }
}

impl Sender for DebugCaptureSender {
    fn send(&self, message: &Message) -> Result<()> {
        let mut messages = self.messages.lock();
        if messages.len() == self.capacity {
            messages.pop_front();
        }
        messages.push_back(message.clone());
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
