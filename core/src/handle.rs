use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::collection::Collection;
use crate::error::CollectionError;
use crate::scheduler::SharedScheduler;
use crate::trace::SharedTraceSink;

type BuildResult = Result<(), CollectionError>;
type Completion = Box<dyn FnOnce() + Send + 'static>;

/// Shared access to a collection plus the deferred index operations.
///
/// Synchronous operations go through [`CollectionHandle::read`] and
/// [`CollectionHandle::write`]. The `*_async` operations hand a rebuild to the
/// scheduler and return immediately; callers observe no index change until the
/// scheduled unit has run.
#[derive(Debug, Clone)]
pub struct CollectionHandle {
    name: Arc<str>,
    sink: SharedTraceSink,
    inner: Arc<RwLock<Collection>>,
    scheduler: SharedScheduler,
}

impl CollectionHandle {
    pub fn new(collection: Collection, scheduler: SharedScheduler) -> Self {
        Self {
            name: Arc::from(collection.name()),
            sink: Arc::clone(collection.sink()),
            inner: Arc::new(RwLock::new(collection)),
            scheduler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn read(&self) -> Result<RwLockReadGuard<'_, Collection>, CollectionError> {
        self.inner.read().map_err(|_| CollectionError::LockPoisoned)
    }

    pub fn write(&self) -> Result<RwLockWriteGuard<'_, Collection>, CollectionError> {
        self.inner.write().map_err(|_| CollectionError::LockPoisoned)
    }

    /// Schedules [`Collection::ensure_index`] to run once the caller yields.
    pub fn ensure_index_async(&self, property: impl Into<String>) -> IndexBuild {
        self.defer_index_build(property.into(), None)
    }

    /// Callback form of [`CollectionHandle::ensure_index_async`]. `on_complete`
    /// runs once after the rebuild, whether it succeeded or not.
    pub fn ensure_index_async_with<F>(
        &self,
        property: impl Into<String>,
        on_complete: F,
    ) -> IndexBuild
    where
        F: FnOnce() + Send + 'static,
    {
        self.defer_index_build(property.into(), Some(Box::new(on_complete)))
    }

    /// Schedules [`Collection::ensure_all_indexes`]; completion is signalled
    /// once after every index has been rebuilt.
    pub fn ensure_all_indexes_async(&self) -> IndexBuild {
        self.defer_all_indexes_build(None)
    }

    pub fn ensure_all_indexes_async_with<F>(&self, on_complete: F) -> IndexBuild
    where
        F: FnOnce() + Send + 'static,
    {
        self.defer_all_indexes_build(Some(Box::new(on_complete)))
    }

    fn defer_index_build(&self, property: String, on_complete: Option<Completion>) -> IndexBuild {
        self.sink
            .trace(format_args!("Scheduling index build for {property}"));
        self.defer(on_complete, move |collection| {
            collection.ensure_index(&property)
        })
    }

    fn defer_all_indexes_build(&self, on_complete: Option<Completion>) -> IndexBuild {
        self.sink.trace(format_args!(
            "Scheduling rebuild of all indexes on [{}]",
            self.name
        ));
        self.defer(on_complete, |collection| {
            collection.ensure_all_indexes();
            Ok(())
        })
    }

    fn defer<F>(&self, on_complete: Option<Completion>, rebuild: F) -> IndexBuild
    where
        F: FnOnce(&mut Collection) -> BuildResult + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let handle = self.clone();
        self.scheduler.schedule(Box::new(move || {
            let result = handle
                .write()
                .and_then(|mut collection| rebuild(&mut *collection));
            match &result {
                Ok(()) => handle.sink.trace(format_args!(
                    "Deferred index build on [{}] completed",
                    handle.name
                )),
                Err(error) => {
                    handle.sink.trace(format_args!(
                        "Deferred index build on [{}] failed: {error}",
                        handle.name
                    ));
                    tracing::warn!(collection = %handle.name, %error, "deferred index build failed");
                }
            }
            let _ = sender.send(result);
            if let Some(on_complete) = on_complete {
                on_complete();
            }
        }));
        IndexBuild { receiver }
    }
}

/// Completion of a deferred index build.
///
/// Awaiting it yields the rebuild's result. A unit dropped by its scheduler
/// without running resolves to [`CollectionError::BuildAborted`].
#[derive(Debug)]
pub struct IndexBuild {
    receiver: oneshot::Receiver<BuildResult>,
}

impl IndexBuild {
    /// Waits for the scheduled unit; same as awaiting the build directly.
    pub async fn wait(self) -> BuildResult {
        self.await
    }

    /// Non-blocking check; `None` while the build has not run yet.
    pub fn try_result(&mut self) -> Option<BuildResult> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                Some(Err(CollectionError::BuildAborted))
            }
        }
    }
}

impl Future for IndexBuild {
    type Output = BuildResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(CollectionError::BuildAborted)))
    }
}
