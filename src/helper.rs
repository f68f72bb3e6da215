//! Process-wide holder of the configured client.

use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

use crate::{
    Client, Message, Result,
    config::HelperConfig,
    sender::{Sender, SenderOptions, SenderRegistry},
};

static HELPER: LazyLock<Helper> = LazyLock::new(Helper::new);

/// Returns the process-wide helper used by the request decorators.
pub fn global() -> &'static Helper {
    &HELPER
}

/// Holds the current [`Client`] and the registry used to build its sender.
///
/// A helper starts unconfigured: until [`Helper::configure`] or
/// [`Helper::set_client`] installs a client, messages are silently dropped.
#[derive(Debug, Default)]
pub struct Helper {
    registry: RwLock<SenderRegistry>,
    client: RwLock<Option<Arc<Client>>>,
}

impl Helper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a client built from `config`, or removes the current client
    /// if the configuration is disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the sender cannot be built; the previous client
    /// stays in place in that case.
    pub fn configure(&self, config: &HelperConfig) -> Result<()> {
        if !config.enabled {
            log::debug!("Client for `{}` is disabled", config.logger);
            self.set_client(None);
            return Ok(());
        }

        let client = Client::from_config(config, &self.registry.read())?;
        log::debug!(
            "Configured client `{}` with `{}` sender",
            config.logger,
            config.sender_backend
        );
        self.set_client(Some(client));
        Ok(())
    }

    /// Registers an additional sender backend for later [`Helper::configure`] calls.
    pub fn register_sender<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn(&SenderOptions) -> Result<Arc<dyn Sender>> + Send + Sync + 'static,
    {
        self.registry.write().register(name, factory);
    }

    pub fn set_client(&self, client: Option<Client>) {
        *self.client.write() = client.map(Arc::new);
    }

    #[must_use]
    pub fn client(&self) -> Option<Arc<Client>> {
        self.client.read().clone()
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.client.read().is_some()
    }

    /// Sends a message through the current client, if any.
    ///
    /// # Errors
    ///
    /// Returns the sender error.
    pub fn send(&self, message: &Message) -> Result<()> {
        match self.client() {
            Some(client) => client.send(message),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sender::DebugCaptureSender;

    #[test]
    fn test_configure_and_disable() {
        let helper = Helper::new();
        assert!(!helper.is_enabled());

        helper.configure(&HelperConfig::new("debug").with_logger("app")).unwrap();
        let client = helper.client().unwrap();
        assert_eq!(client.logger(), "app");

        helper.send(&client.message("counter")).unwrap();
        let sender = client
            .sender()
            .as_any()
            .downcast_ref::<DebugCaptureSender>()
            .unwrap();
        assert_eq!(sender.len(), 1);

        helper.configure(&HelperConfig::new("debug").with_enabled(false)).unwrap();
        assert!(!helper.is_enabled());
        // Sending without a client is a no-op.
        helper.send(&client.message("counter")).unwrap();
        assert_eq!(sender.len(), 1);
    }

    #[test]
    fn test_failed_configure_keeps_client() {
        let helper = Helper::new();
        helper.configure(&HelperConfig::new("debug")).unwrap();

        assert!(helper.configure(&HelperConfig::new("unknown")).is_err());
        assert!(helper.is_enabled());
    }

    #[test]
    fn test_register_sender() {
        let capture = Arc::new(DebugCaptureSender::new());
        let helper = Helper::new();
        let shared: Arc<dyn Sender> = capture.clone();
        helper.register_sender("shared", move |_| Ok(shared.clone()));

        helper.configure(&HelperConfig::new("shared")).unwrap();
        helper.client().unwrap().log("counter", "1").unwrap();
        assert_eq!(capture.len(), 1);
    }
}
