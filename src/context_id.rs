//! Identity of the current execution context.

use std::{
    cell::RefCell,
    fmt,
    marker::PhantomData,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::ContextStore;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_SLOT: ThreadSlot = ThreadSlot::new();
    static SCOPE_STACK: ScopeStack = const { ScopeStack::new() };
}

/// Opaque identifier of a unit of work that owns its own context mapping.
///
/// Every thread gets its own identifier on first use. Asynchronous tasks,
/// which may hop between worker threads, can allocate a dedicated identifier
/// with [`ExecutionContextId::next`] and bind it with
/// [`FutureExt::in_execution_context`](crate::FutureExt::in_execution_context).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExecutionContextId(u64);

impl ExecutionContextId {
    /// Allocates a new process-unique identifier.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the identifier of the current execution context.
    ///
    /// This is the innermost identifier bound by [`ExecutionContextId::enter`]
    /// on this thread, or the thread's own identifier if nothing is bound.
    ///
    /// A thread that is being torn down no longer has an identifier of its
    /// own; each call then returns a fresh one. The crate-level helpers such
    /// as [`get_context`](crate::get_context) do not store anything under
    /// such identifiers.
    #[must_use]
    pub fn current() -> Self {
        Self::try_current().unwrap_or_else(Self::next)
    }

    /// Like [`ExecutionContextId::current`], but returns `None` once the
    /// thread-locals of the current thread have been destroyed.
    pub(crate) fn try_current() -> Option<Self> {
        if let Some(id) = SCOPE_STACK.try_with(ScopeStack::top).ok().flatten() {
            return Some(id);
        }
        THREAD_SLOT.try_with(|slot| slot.id).ok()
    }

    /// Binds this identifier to the current thread until the returned guard
    /// is dropped.
    #[must_use]
    pub fn enter<'a>(self) -> ExecutionScope<'a> {
        ExecutionScope::enter(self)
    }

    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ExecutionContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

/// A guard keeping an [`ExecutionContextId`] bound to the current thread.
///
/// Returned by [`ExecutionContextId::enter`].
#[non_exhaustive]
#[derive(Debug)]
pub struct ExecutionScope<'a> {
    // Make this guard unsendable.
    _marker: PhantomData<&'a *mut ()>,
}

impl ExecutionScope<'_> {
    fn enter(id: ExecutionContextId) -> Self {
        SCOPE_STACK.with(|stack| stack.push(id));
        Self {
            _marker: PhantomData,
        }
    }
}

impl Drop for ExecutionScope<'_> {
    fn drop(&mut self) {
        let _ = SCOPE_STACK.try_with(ScopeStack::pop);
    }
}

#[derive(Debug)]
struct ScopeStack {
    inner: RefCell<Vec<ExecutionContextId>>,
}

impl ScopeStack {
    const fn new() -> Self {
        Self {
            inner: RefCell::new(Vec::new()),
        }
    }

    fn push(&self, id: ExecutionContextId) {
        self.inner.borrow_mut().push(id);
    }

    fn pop(&self) -> Option<ExecutionContextId> {
        self.inner.borrow_mut().pop()
    }

    fn top(&self) -> Option<ExecutionContextId> {
        self.inner.borrow().last().copied()
    }
}

/// Owns the identifier of a thread and drops its mapping when the thread exits.
#[derive(Debug)]
struct ThreadSlot {
    id: ExecutionContextId,
}

impl ThreadSlot {
    fn new() -> Self {
        Self {
            id: ExecutionContextId::next(),
        }
    }
}

impl Drop for ThreadSlot {
    fn drop(&mut self) {
        ContextStore::global().clear(self.id);
    }
}
