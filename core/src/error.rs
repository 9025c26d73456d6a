use std::error::Error;
use std::fmt;

use crate::document::DocumentId;

/// Error type for collection operations.
///
/// Every variant is raised before any record or index is touched, so a failed
/// call leaves the collection exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// `add` received something that is not a structured document.
    InvalidInput(String),
    /// The record's type tag disagrees with the collection's bound type.
    TypeMismatch { expected: String, got: String },
    /// The collection type is empty outside the first-insert binding case.
    UnboundType,
    /// `add` was called on a record that already carries a stored id.
    DuplicateAdd { id: DocumentId },
    /// `update` was called on a record without a stored id known to the collection.
    UnsyncedUpdate,
    /// `delete` received something that is not a structured document.
    InvalidDocument(String),
    /// `delete` was called on a record that is not present in the collection.
    UntrackedDocument { id: Option<DocumentId> },
    /// `ensure_index` was called without a property name.
    MissingIndexProperty,
    /// The shared collection lock was poisoned by a panicking writer.
    LockPoisoned,
    /// A deferred index build was dropped before it could run.
    BuildAborted,
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(message) => {
                write!(f, "object being added must be a document: {message}")
            }
            Self::TypeMismatch { expected, got } => write!(
                f,
                "document type [{got}] is incongruent with collection type [{expected}]"
            ),
            Self::UnboundType => write!(f, "document is not a model: collection type is empty"),
            Self::DuplicateAdd { id } => write!(
                f,
                "document {id} is already in the collection, use update() instead"
            ),
            Self::UnsyncedUpdate => write!(
                f,
                "trying to update an unsynced document, add it with add() or add_many() first"
            ),
            Self::InvalidDocument(message) => write!(f, "parameter is not a document: {message}"),
            Self::UntrackedDocument { id: Some(id) } => {
                write!(f, "document {id} is not stored in the collection")
            }
            Self::UntrackedDocument { id: None } => {
                write!(f, "document has no id and is not stored in the collection")
            }
            Self::MissingIndexProperty => {
                write!(f, "attempting to set an index without an associated property")
            }
            Self::LockPoisoned => write!(f, "collection lock poisoned"),
            Self::BuildAborted => write!(f, "deferred index build was dropped before running"),
        }
    }
}

impl Error for CollectionError {}

/// Error type for database registry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    InvalidName,
    DuplicateCollection(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName => write!(f, "collection name must not be empty"),
            Self::DuplicateCollection(name) => write!(f, "collection '{name}' already exists"),
        }
    }
}

impl Error for DatabaseError {}
