use std::collections::BTreeMap;

use crate::collection::Collection;
use crate::config::StoreConfig;
use crate::error::DatabaseError;
use crate::handle::CollectionHandle;
use crate::scheduler::{default_scheduler, SharedScheduler};
use crate::trace::{default_sink, SharedTraceSink};

/// A named registry of collections.
///
/// Collections created here share the database's trace sink and scheduler.
#[derive(Debug, Clone)]
pub struct Database {
    name: String,
    collections: BTreeMap<String, CollectionHandle>,
    sink: SharedTraceSink,
    scheduler: SharedScheduler,
}

impl Database {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_parts(name, default_sink(), default_scheduler())
    }

    pub fn with_config(name: impl Into<String>, config: &StoreConfig) -> Self {
        Self::with_parts(name, config.trace_sink(), default_scheduler())
    }

    pub fn with_parts(
        name: impl Into<String>,
        sink: SharedTraceSink,
        scheduler: SharedScheduler,
    ) -> Self {
        let name = name.into();
        sink.trace(format_args!("Creating db {name}"));
        Self {
            name,
            collections: BTreeMap::new(),
            sink,
            scheduler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    pub fn scheduler(&self) -> &SharedScheduler {
        &self.scheduler
    }

    /// Runs deferred index builds queued on a manual scheduler.
    pub fn run_pending_tasks(&self) -> usize {
        self.scheduler.run_pending()
    }

    pub fn add_collection(
        &mut self,
        name: impl Into<String>,
        doc_type: impl Into<String>,
    ) -> Result<CollectionHandle, DatabaseError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DatabaseError::InvalidName);
        }
        if self.collections.contains_key(&name) {
            return Err(DatabaseError::DuplicateCollection(name));
        }

        let collection = Collection::with_sink(name.clone(), doc_type, self.sink.clone());
        let handle = CollectionHandle::new(collection, self.scheduler.clone());
        self.collections.insert(name, handle.clone());
        Ok(handle)
    }

    pub fn get_collection(&self, name: &str) -> Option<CollectionHandle> {
        self.collections.get(name).cloned()
    }

    pub fn remove_collection(&mut self, name: &str) -> Option<CollectionHandle> {
        let removed = self.collections.remove(name);
        if removed.is_some() {
            self.sink
                .trace(format_args!("Removed collection [{name}] from db {}", self.name));
        }
        removed
    }

    pub fn collection_names(&self) -> Vec<String> {
        self.collections.keys().cloned().collect()
    }
}
