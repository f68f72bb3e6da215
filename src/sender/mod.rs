//! Pluggable message transports.
//!
//! A [`Sender`] receives every message built by a [`Client`](crate::Client).
//! Backends are looked up by name in a [`SenderRegistry`], which is how the
//! `sender_backend` configuration key selects one at setup time.

use std::{any::Any, collections::HashMap, fmt, str::FromStr, sync::Arc};

use crate::{Error, Message, Result};

pub use self::{debug::DebugCaptureSender, logger::LogSender, stdout::StdoutSender};

mod debug;
mod logger;
mod stdout;

/// A transport for finished messages.
pub trait Sender: Send + Sync + fmt::Debug {
    /// Transmits or records a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend could not accept the message.
    fn send(&self, message: &Message) -> Result<()>;

    /// Returns the sender as [`Any`], so that callers can reach a concrete
    /// backend such as [`DebugCaptureSender`].
    fn as_any(&self) -> &dyn Any;
}

/// Backend-specific settings, taken from the `sender_*` configuration keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SenderOptions(HashMap<String, String>);

impl SenderOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Parses the option stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if the value does not parse.
    pub fn parse<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.get(key)
            .map(|value| {
                value
                    .trim()
                    .parse()
                    .map_err(|err| Error::invalid_value(format!("sender_{key}"), err))
            })
            .transpose()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for SenderOptions
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Builds a sender from its options.
pub type SenderFactory = Arc<dyn Fn(&SenderOptions) -> Result<Arc<dyn Sender>> + Send + Sync>;

/// A registry of sender factories keyed by backend name.
///
/// [`SenderRegistry::default`] knows the built-in backends:
///
/// | name     | backend                 |
/// |----------|-------------------------|
/// | `debug`  | [`DebugCaptureSender`]  |
/// | `stdout` | [`StdoutSender`]        |
/// | `log`    | [`LogSender`]           |
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use metlog_context::sender::{DebugCaptureSender, SenderOptions, SenderRegistry};
///
/// let mut registry = SenderRegistry::default();
/// registry.register("capture", |_options| Ok(Arc::new(DebugCaptureSender::new())));
///
/// let sender = registry.create("capture", &SenderOptions::new())?;
/// assert!(sender.as_any().is::<DebugCaptureSender>());
/// # Ok::<(), metlog_context::Error>(())
/// ```
#[derive(Clone)]
pub struct SenderRegistry {
    factories: HashMap<String, SenderFactory>,
}

impl SenderRegistry {
    /// Creates a registry without any backends.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers a factory under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&SenderOptions) -> Result<Arc<dyn Sender>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Returns the registered backend names in alphabetical order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Builds the sender registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownBackend`] if nothing is registered under
    /// `name`, or the factory error if the backend rejects its options.
    pub fn create(&self, name: &str, options: &SenderOptions) -> Result<Arc<dyn Sender>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::UnknownBackend(name.to_owned()))?;
        log::debug!("Creating `{name}` sender");
        factory(options)
    }
}

impl Default for SenderRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register("debug", |options| {
                Ok(Arc::new(DebugCaptureSender::from_options(options)?))
            })
            .register("stdout", |_| Ok(Arc::new(StdoutSender::stdout())))
            .register("log", |_| Ok(Arc::new(LogSender)));
        registry
    }
}

impl fmt::Debug for SenderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenderRegistry")
            .field("backends", &self.names())
            .finish()
    }
}
