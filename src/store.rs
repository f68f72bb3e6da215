//! Process-wide registry of context mappings.

use std::{collections::HashMap, sync::LazyLock};

use parking_lot::Mutex;

use crate::{
    ContextFields, ContextMapping, ExecutionContextId, Result,
    session::Session,
};

static GLOBAL_STORE: LazyLock<ContextStore> = LazyLock::new(ContextStore::new);

/// Registry holding at most one [`ContextMapping`] per [`ExecutionContextId`].
///
/// The registry lock is only taken to look up, insert or remove an entry;
/// it is never held while user code touches a mapping or while a flush
/// callback runs.
///
/// Most code uses the process-wide instance returned by
/// [`ContextStore::global`], either directly or through the crate-level
/// helpers such as [`get_context`](crate::get_context) and
/// [`thread_context`](crate::thread_context).
#[derive(Debug, Default)]
pub struct ContextStore {
    entries: Mutex<HashMap<ExecutionContextId, ContextMapping>>,
}

impl ContextStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide store.
    pub fn global() -> &'static Self {
        &GLOBAL_STORE
    }

    /// Returns `true` if a mapping exists for the given context.
    #[must_use]
    pub fn has(&self, id: ExecutionContextId) -> bool {
        self.entries.lock().contains_key(&id)
    }

    #[must_use]
    pub fn get(&self, id: ExecutionContextId) -> Option<ContextMapping> {
        self.entries.lock().get(&id).cloned()
    }

    /// Returns the mapping for the given context, creating an empty one if
    /// none exists yet.
    ///
    /// While the entry exists, every call returns a handle to the same mapping.
    pub fn get_or_create(&self, id: ExecutionContextId) -> ContextMapping {
        let (mapping, created) = {
            let mut entries = self.entries.lock();
            match entries.get(&id) {
                Some(mapping) => (mapping.clone(), false),
                None => {
                    let mapping = ContextMapping::new();
                    entries.insert(id, mapping.clone());
                    (mapping, true)
                }
            }
        };
        // Loggers may read the store themselves.
        if created {
            log::trace!("Created context mapping for {id}");
        }
        mapping
    }

    /// Returns the mapping of the current execution context, creating it if
    /// needed.
    ///
    /// While a thread is being torn down it has no identity of its own; the
    /// mapping returned then is detached and never stored, so nothing is
    /// left behind for an identifier that can no longer be cleared.
    pub(crate) fn current_mapping(&self) -> ContextMapping {
        match ExecutionContextId::try_current() {
            Some(id) => self.get_or_create(id),
            None => ContextMapping::new(),
        }
    }

    /// Replaces the contents of the mapping for the given context.
    ///
    /// An existing mapping keeps its identity, so handles obtained earlier
    /// observe the new contents.
    pub fn set(&self, id: ExecutionContextId, fields: ContextFields) -> ContextMapping {
        let mapping = self.get_or_create(id);
        mapping.replace(fields);
        mapping
    }

    /// Removes the mapping for the given context, if any.
    pub fn clear(&self, id: ExecutionContextId) {
        let removed = self.entries.lock().remove(&id);
        if removed.is_some() {
            log::trace!("Cleared context mapping for {id}");
        }
    }

    /// Returns the number of live mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Enters a scoped session for the given context.
    ///
    /// See [`Session`] for the exit semantics.
    pub fn session<F>(&self, id: ExecutionContextId, callback: F) -> Session<'_, F>
    where
        F: FnOnce(&ContextMapping) -> Result<()>,
    {
        Session::enter(self, id, callback)
    }

    /// Runs `body` inside a scoped session for the given context.
    ///
    /// The callback is invoked once `body` returns, and also if it panics.
    ///
    /// # Errors
    ///
    /// Returns the error produced by the flush callback. The mapping is
    /// cleaned up before the error is returned.
    pub fn with_session<F, B, R>(&self, id: ExecutionContextId, callback: F, body: B) -> Result<R>
    where
        F: FnOnce(&ContextMapping) -> Result<()>,
        B: FnOnce(&ContextMapping) -> R,
    {
        let session = self.session(id, callback);
        let output = body(session.mapping());
        session.exit()?;
        Ok(output)
    }
}
