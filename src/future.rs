//! Execution context propagation for futures.

use std::{pin::Pin, task::Poll};

use pin_project::{pin_project, pinned_drop};

use crate::{ContextStore, ExecutionContextId};

/// Extension trait binding a future to an [`ExecutionContextId`].
///
/// A task polled by a multi-threaded executor may run on a different worker
/// thread after every `.await`. Binding it to its own identifier keeps
/// [`get_context`](crate::get_context) and
/// [`thread_context`](crate::thread_context) pointing to the same mapping for
/// the whole life of the task.
pub trait FutureExt: Future + Sized {
    /// Polls this future with `id` as the current execution context.
    fn in_execution_context(self, id: ExecutionContextId) -> ExecutionContextFuture<Self>;

    /// Polls this future in a freshly allocated execution context.
    fn in_new_execution_context(self) -> ExecutionContextFuture<Self> {
        self.in_execution_context(ExecutionContextId::next())
    }
}

impl<F> FutureExt for F
where
    F: Future,
{
    fn in_execution_context(self, id: ExecutionContextId) -> ExecutionContextFuture<Self> {
        ExecutionContextFuture {
            inner: Some(self),
            id,
        }
    }
}

/// A future polled within a bound execution context.
///
/// When the future is dropped, whether completed or cancelled, the inner
/// future is dropped within the bound execution context, so sessions it holds
/// still flush against the right mapping. The mapping left for the execution
/// context in the global store is removed afterwards.
#[pin_project(PinnedDrop)]
#[derive(Debug)]
pub struct ExecutionContextFuture<F> {
    // Only emptied on drop.
    #[pin]
    inner: Option<F>,
    id: ExecutionContextId,
}

impl<F> ExecutionContextFuture<F> {
    pub const fn id(&self) -> ExecutionContextId {
        self.id
    }
}

impl<F> Future for ExecutionContextFuture<F>
where
    F: Future,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        let Some(inner) = this.inner.as_pin_mut() else {
            return Poll::Pending;
        };
        let _scope = this.id.enter();
        inner.poll(cx)
    }
}

#[pinned_drop]
impl<F> PinnedDrop for ExecutionContextFuture<F> {
    fn drop(self: Pin<&mut Self>) {
        let mut this = self.project();
        {
            let _scope = this.id.enter();
            this.inner.set(None);
        }
        ContextStore::global().clear(*this.id);
    }
}
