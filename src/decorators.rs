//! Request handler wrappers emitting one message per handled request.
//!
//! A wrapped handler runs inside a [`thread_context`](crate::thread_context)
//! session. Anything the handler stores through
//! [`get_context`](crate::get_context) ends up in the `threadlocal` field of
//! the message sent when the handler returns, together with a `headers`
//! field describing the request.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use metlog_context::{
//!     Client, THREADLOCAL_FIELD,
//!     decorators::{Request, RequestInfo, apache_log_with},
//!     get_context,
//!     sender::DebugCaptureSender,
//! };
//!
//! let sender = Arc::new(DebugCaptureSender::new());
//! let client = Arc::new(Client::new(sender.clone(), "web"));
//!
//! let handler = apache_log_with(client, |request: &Request| {
//!     get_context().insert("user", "alice");
//!     request.path().len()
//! });
//!
//! let request = Request::new("/foo/bar").with_host("somehost.com").with_port(80);
//! assert_eq!(handler(&request)?, 8);
//!
//! let message = sender.last().unwrap();
//! assert_eq!(message.fields[THREADLOCAL_FIELD]["user"], "alice");
//! assert_eq!(message.fields["headers"]["path"], "/foo/bar");
//! # Ok::<(), metlog_context::Error>(())
//! ```

use std::sync::Arc;

use serde_json::json;

use crate::{Client, ContextMapping, Result, THREADLOCAL_FIELD, helper, with_context};

/// Message type used for request messages.
pub const REQUEST_MESSAGE_TYPE: &str = "wsgi";

/// Request attributes reported alongside the context mapping.
pub trait RequestInfo {
    fn path(&self) -> &str;

    fn host(&self) -> &str;

    fn port(&self) -> u16;

    fn user_agent(&self) -> Option<&str> {
        None
    }
}

/// A plain [`RequestInfo`] implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    path: String,
    host: String,
    port: u16,
    user_agent: Option<String>,
}

impl Request {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            host: "localhost".to_owned(),
            port: 80,
            user_agent: None,
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

impl RequestInfo for Request {
    fn path(&self) -> &str {
        &self.path
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }
}

/// Runs `handler` inside a context session and reports the request through
/// `client` once it returns.
///
/// Without a client the handler still runs in a session, but nothing is sent.
///
/// # Errors
///
/// Returns an error if the message could not be built or sent. The context
/// mapping is released in either case.
pub fn log_request<Req, R, H>(client: Option<&Client>, request: &Req, handler: H) -> Result<R>
where
    Req: RequestInfo + ?Sized,
    H: FnOnce(&Req) -> R,
{
    let mut headers = json!({
        "path": request.path(),
        "host": request.host(),
        "port": request.port(),
    });
    if let Some(user_agent) = request.user_agent() {
        headers["User-Agent"] = user_agent.into();
    }

    with_context(
        |mapping: &ContextMapping| {
            let Some(client) = client else {
                return Ok(());
            };
            let message = client
                .message(REQUEST_MESSAGE_TYPE)
                .with_field("headers", headers)
                .with_field(THREADLOCAL_FIELD, mapping.to_json()?);
            client.send(&message)
        },
        |_| handler(request),
    )
}

/// Wraps a handler so that every call is reported through the global
/// [`Helper`](crate::helper::Helper).
pub fn apache_log<Req, R, H>(handler: H) -> impl Fn(&Req) -> Result<R>
where
    Req: RequestInfo + ?Sized,
    H: Fn(&Req) -> R,
{
    move |request| {
        let client = helper::global().client();
        log_request(client.as_deref(), request, &handler)
    }
}

/// Wraps a handler so that every call is reported through `client`.
pub fn apache_log_with<Req, R, H>(client: Arc<Client>, handler: H) -> impl Fn(&Req) -> Result<R>
where
    Req: RequestInfo + ?Sized,
    H: Fn(&Req) -> R,
{
    move |request| log_request(Some(&client), request, &handler)
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::{get_context, has_context, sender::DebugCaptureSender};

    fn capture() -> (Arc<DebugCaptureSender>, Arc<Client>) {
        let sender = Arc::new(DebugCaptureSender::new());
        let client = Arc::new(Client::new(sender.clone(), "test"));
        (sender, client)
    }

    #[test]
    fn test_request_message() {
        let (sender, client) = capture();
        let handler = apache_log_with(client, |_: &Request| {
            get_context().insert("foo", "bar");
        });

        let request = Request::new("/foo/bar")
            .with_host("somehost.com")
            .with_port(8080)
            .with_user_agent("curl/8.0");
        handler(&request).unwrap();

        assert!(!has_context());
        let messages = sender.messages();
        assert_eq!(messages.len(), 1);

        let message = &messages[0];
        assert_eq!(message.kind, REQUEST_MESSAGE_TYPE);
        assert_eq!(message.threadlocal().unwrap()["foo"], json!("bar"));
        assert_eq!(
            message.fields["headers"],
            json!({
                "path": "/foo/bar",
                "host": "somehost.com",
                "port": 8080,
                "User-Agent": "curl/8.0",
            })
        );
    }

    #[test]
    fn test_untouched_context_sends_empty_mapping() {
        let (sender, client) = capture();
        let handler = apache_log_with(client, |request: &Request| request.port());

        assert_eq!(handler(&Request::new("/")).unwrap(), 80);
        assert_eq!(sender.last().unwrap().fields[THREADLOCAL_FIELD], json!({}));
    }

    fn fail() {
        panic!("handler failed");
    }

    #[test]
    fn test_panicking_handler_is_reported() {
        let (sender, client) = capture();
        let handler = apache_log_with(client, |_: &Request| {
            get_context().insert("stage", "before-panic");
            fail();
        });

        let result = catch_unwind(AssertUnwindSafe(|| handler(&Request::new("/boom"))));
        assert!(result.is_err());
        assert!(!has_context());
        assert_eq!(
            sender.last().unwrap().fields[THREADLOCAL_FIELD]["stage"],
            json!("before-panic")
        );
    }

    #[test]
    fn test_without_client() {
        let handler = |request: &Request| {
            log_request(None, request, |_| {
                get_context().insert("foo", 1);
                7
            })
        };

        assert_eq!(handler(&Request::new("/")).unwrap(), 7);
        assert!(!has_context());
    }
}
