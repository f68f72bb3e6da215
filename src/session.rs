//! A scoped session over the current context mapping.

use std::panic::AssertUnwindSafe;

use crate::{ContextMapping, ContextStore, ExecutionContextId, Result};

/// A guard bounding the visible lifetime of a context mapping.
///
/// Entering a session makes sure a mapping exists for the execution context
/// and hands it out through [`Session::mapping`]. Leaving the session, either
/// through [`Session::exit`] or by dropping the guard (early return, `?`,
/// panic or cancelled future), runs the exit sequence exactly once:
///
/// 1. the flush callback is invoked with the mapping;
/// 2. the mapping is removed from the store if this session created it.
///
/// A session entered while a mapping already exists reuses that mapping and
/// leaves it in place on exit; only the session that created the mapping
/// removes it.
///
/// Only [`Session::exit`] can return the callback error. When the guard is
/// simply dropped, a failed callback is reported with [`log::error!`]. If the
/// callback panics while the thread is already unwinding, the second panic is
/// caught and reported the same way.
///
/// # Examples
///
/// ```
/// use metlog_context::{ContextStore, ExecutionContextId};
///
/// let store = ContextStore::new();
/// let id = ExecutionContextId::next();
///
/// let session = store.session(id, |mapping| {
///     assert_eq!(mapping.get("foo").and_then(|value| value.as_i64()), Some(42));
///     Ok(())
/// });
/// session.mapping().insert("foo", 42);
/// session.exit()?;
///
/// assert!(!store.has(id));
/// # Ok::<(), metlog_context::Error>(())
/// ```
#[must_use = "the flush callback fires as soon as the session is dropped"]
pub struct Session<'a, F>
where
    F: FnOnce(&ContextMapping) -> Result<()>,
{
    store: &'a ContextStore,
    id: ExecutionContextId,
    mapping: ContextMapping,
    owns_lifetime: bool,
    callback: Option<F>,
}

impl<'a, F> Session<'a, F>
where
    F: FnOnce(&ContextMapping) -> Result<()>,
{
    pub(crate) fn enter(store: &'a ContextStore, id: ExecutionContextId, callback: F) -> Self {
        let existed = store.has(id);
        let mapping = store.get_or_create(id);
        log::debug!("Entered context session for {id} (nested: {existed})");

        Self {
            store,
            id,
            mapping,
            owns_lifetime: !existed,
            callback: Some(callback),
        }
    }

    /// Returns the mapping of this session.
    pub const fn mapping(&self) -> &ContextMapping {
        &self.mapping
    }

    #[must_use]
    pub const fn id(&self) -> ExecutionContextId {
        self.id
    }

    /// Returns `true` if the mapping is removed when this session exits.
    #[must_use]
    pub const fn owns_lifetime(&self) -> bool {
        self.owns_lifetime
    }

    /// Leaves the session, invoking the flush callback.
    ///
    /// # Errors
    ///
    /// Returns the error produced by the flush callback. The mapping has
    /// already been removed from the store by then.
    pub fn exit(mut self) -> Result<()> {
        // If the callback panics, `Drop` still releases the mapping.
        let result = self.flush();
        self.release();
        result.unwrap_or(Ok(()))
    }

    fn flush(&mut self) -> Option<Result<()>> {
        let callback = self.callback.take()?;
        Some(callback(&self.mapping))
    }

    fn release(&mut self) {
        if std::mem::take(&mut self.owns_lifetime) {
            self.store.clear(self.id);
        }
        log::debug!("Left context session for {}", self.id);
    }
}

impl<F> Drop for Session<'_, F>
where
    F: FnOnce(&ContextMapping) -> Result<()>,
{
    fn drop(&mut self) {
        if self.callback.is_none() && !self.owns_lifetime {
            return;
        }

        let flushed = if std::thread::panicking() {
            // A second panic while unwinding would abort the process.
            std::panic::catch_unwind(AssertUnwindSafe(|| self.flush())).unwrap_or_else(|_| {
                log::error!("Context flush callback for {} panicked while unwinding", self.id);
                None
            })
        } else {
            self.flush()
        };
        if let Some(Err(err)) = flushed {
            log::error!("Context flush callback for {} failed: {err}", self.id);
        }
        self.release();
    }
}

impl<F> std::fmt::Debug for Session<'_, F>
where
    F: FnOnce(&ContextMapping) -> Result<()>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("mapping", &self.mapping)
            .field("owns_lifetime", &self.owns_lifetime)
            .finish_non_exhaustive()
    }
}
