//! # Overview
//!
#![doc = include_utils::include_md!("README.md:description")]
//!
//! Request-handling code often learns interesting facts piece by piece: the
//! user id after authentication, the cache outcome after a lookup, the row
//! count after a query. This library lets that code:
//!
//! - Accumulate key/value data for the current unit of work without passing
//!   a collector through every function.
//! - Keep the data of concurrent units of work isolated from each other.
//! - Emit everything as one structured message when the unit of work ends,
//!   even if it ends with an error or a panic.
//! - Plug in the transport, selected by name from configuration.
//!
//! The data lives in a [`ContextMapping`] owned by the current execution
//! context (a thread, or a future bound with [`FutureExt`]). A [`Session`]
//! bounds its lifetime: when the session exits, a flush callback receives the
//! mapping and the mapping is removed from the [`ContextStore`].
//!
//! ## Basic example
//!
#![doc = include_utils::include_md!("README.md:basic_example")]
//!
//! ## Request logging
//!
#![doc = include_utils::include_md!("README.md:request_example")]

use std::borrow::Cow;

pub use self::{
    client::Client,
    context_id::{ExecutionContextId, ExecutionScope},
    error::{Error, Result},
    future::{ExecutionContextFuture, FutureExt},
    mapping::{ContextFields, ContextMapping},
    message::{Message, Severity, THREADLOCAL_FIELD},
    session::Session,
    store::ContextStore,
    value::ContextValue,
};

mod client;
pub mod config;
mod context_id;
pub mod decorators;
mod error;
pub mod future;
pub mod helper;
mod mapping;
mod message;
pub mod sender;
mod session;
mod store;
mod value;

type StaticCowStr = Cow<'static, str>;

/// Returns `true` if the current execution context has a mapping.
#[must_use]
pub fn has_context() -> bool {
    ExecutionContextId::try_current().is_some_and(|id| ContextStore::global().has(id))
}

/// Returns the mapping of the current execution context, creating an empty
/// one if needed.
///
/// A mapping created this way outside of a session stays in the store until
/// [`clear_context`] is called or the execution context ends.
#[must_use]
pub fn get_context() -> ContextMapping {
    ContextStore::global().current_mapping()
}

/// Replaces the contents of the current mapping.
pub fn set_context<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> ContextMapping
where
    K: Into<StaticCowStr>,
    V: Into<ContextValue>,
{
    let fields = fields
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect();
    let mapping = ContextStore::global().current_mapping();
    mapping.replace(fields);
    mapping
}

/// Removes the mapping of the current execution context, if any.
pub fn clear_context() {
    if let Some(id) = ExecutionContextId::try_current() {
        ContextStore::global().clear(id);
    }
}

/// Enters a session over the mapping of the current execution context.
///
/// # Examples
///
/// ```
/// use metlog_context::{has_context, thread_context};
///
/// let session = thread_context(|mapping| {
///     assert_eq!(mapping.get("foo").and_then(|value| value.as_i64()), Some(42));
///     Ok(())
/// });
/// session.mapping().insert("foo", 42);
/// session.exit()?;
///
/// assert!(!has_context());
/// # Ok::<(), metlog_context::Error>(())
/// ```
pub fn thread_context<F>(callback: F) -> Session<'static, F>
where
    F: FnOnce(&ContextMapping) -> Result<()>,
{
    ContextStore::global().session(ExecutionContextId::current(), callback)
}

/// Runs `body` in a session over the mapping of the current execution context.
///
/// # Errors
///
/// Returns the error produced by the flush callback, after the mapping has
/// been released.
pub fn with_context<F, B, R>(callback: F, body: B) -> Result<R>
where
    F: FnOnce(&ContextMapping) -> Result<()>,
    B: FnOnce(&ContextMapping) -> R,
{
    ContextStore::global().with_session(ExecutionContextId::current(), callback, body)
}
