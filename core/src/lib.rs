#![forbid(unsafe_code)]
//! Core primitives for EmberDB.
//!
//! An embeddable in-memory document store: a [`Collection`] keeps an ordered
//! sequence of typed [`Document`]s with per-property [`Index`]es aligned to
//! it, and a [`Database`] is a named registry of collections. Index rebuilds
//! can be deferred onto a [`DeferredScheduler`] through a [`CollectionHandle`].

pub mod collection;
pub mod config;
pub mod database;
pub mod document;
mod env_utils;
pub mod error;
pub mod handle;
pub mod ids;
pub mod index;
pub mod scheduler;
pub mod trace;

pub use collection::{Collection, Found};
pub use config::StoreConfig;
pub use database::Database;
pub use document::{loose_eq, Document, DocumentId, Fields};
pub use error::{CollectionError, DatabaseError};
pub use handle::{CollectionHandle, IndexBuild};
pub use index::Index;
pub use scheduler::{
    DeferredScheduler, DeferredTask, ManualScheduler, SharedScheduler, TokioScheduler,
};
pub use trace::{NoopSink, SharedTraceSink, TraceSink, TracingSink};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
