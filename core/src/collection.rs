use std::collections::BTreeMap;

use serde_json::Value;

use crate::document::{loose_eq, Document, DocumentId, Fields, ID_PROPERTY, TYPE_PROPERTY};
use crate::error::CollectionError;
use crate::ids::IdGenerator;
use crate::index::Index;
use crate::trace::{default_sink, SharedTraceSink};

/// A record returned by a lookup together with its current position.
///
/// The position is only meaningful until the collection is mutated again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Found<'a> {
    pub position: usize,
    pub document: &'a Document,
}

/// Ordered, type-homogeneous store of documents plus their secondary indexes.
///
/// Every index holds one value per record, at the same position as the
/// record. All mutating operations validate first and only then touch
/// `records` and `indexes`, so a failed call leaves both unchanged.
#[derive(Debug, Clone)]
pub struct Collection {
    name: String,
    doc_type: String,
    records: Vec<Document>,
    indexes: BTreeMap<String, Index>,
    ids: IdGenerator,
    sink: SharedTraceSink,
    mutation_version: u64,
}

impl Collection {
    /// Creates a collection. An empty `doc_type` leaves it unbound until the first add.
    pub fn new(name: impl Into<String>, doc_type: impl Into<String>) -> Self {
        Self::with_sink(name, doc_type, default_sink())
    }

    pub fn with_sink(
        name: impl Into<String>,
        doc_type: impl Into<String>,
        sink: SharedTraceSink,
    ) -> Self {
        let mut collection = Self {
            name: name.into(),
            doc_type: doc_type.into(),
            records: Vec::new(),
            indexes: BTreeMap::new(),
            ids: IdGenerator::new(),
            sink,
            mutation_version: 0,
        };
        collection.sink.trace(format_args!(
            "Creating collection with name [{}] of type [{}]",
            collection.name, collection.doc_type
        ));
        collection.indexes.insert(
            ID_PROPERTY.to_string(),
            Index::build(ID_PROPERTY, &collection.records),
        );
        collection
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    pub fn is_bound(&self) -> bool {
        !self.doc_type.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn mutation_version(&self) -> u64 {
        self.mutation_version
    }

    pub fn get(&self, position: usize) -> Option<&Document> {
        self.records.get(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> + '_ {
        self.records.iter()
    }

    pub fn index(&self, property: &str) -> Option<&Index> {
        self.indexes.get(property)
    }

    pub fn index_values(&self, property: &str) -> Option<&[Value]> {
        self.indexes.get(property).map(Index::values)
    }

    pub fn has_index(&self, property: &str) -> bool {
        self.indexes.contains_key(property)
    }

    pub fn index_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.indexes.keys().map(String::as_str)
    }

    /// Builds an unstored document stamped with this collection's type.
    pub fn document(&self, mut fields: Fields) -> Document {
        let _ = fields.remove(ID_PROPERTY);
        let _ = fields.remove(TYPE_PROPERTY);
        Document {
            id: None,
            doc_type: self.doc_type.clone(),
            fields,
        }
    }

    /// Stores a new document and returns the id assigned to it.
    pub fn add(&mut self, mut document: Document) -> Result<DocumentId, CollectionError> {
        self.resolve_type(&mut document)?;
        if let Some(id) = document.stored_id() {
            return Err(CollectionError::DuplicateAdd { id });
        }

        if self.doc_type.is_empty() {
            self.doc_type = document.doc_type.clone();
            self.sink.trace(format_args!(
                "Collection [{}] bound to type [{}]",
                self.name, self.doc_type
            ));
        }

        let id = self.ids.next_id();
        document.id = Some(id);
        self.sink.trace(format_args!(
            "Adding document {id} to collection [{}]",
            self.name
        ));
        for index in self.indexes.values_mut() {
            index.push(&document);
        }
        self.records.push(document);
        self.bump_mutation_version();
        Ok(id)
    }

    /// Like [`Collection::add`], for documents still in JSON form.
    pub fn add_value(&mut self, value: Value) -> Result<DocumentId, CollectionError> {
        self.add(Document::from_value(value)?)
    }

    /// Adds documents in order and stops at the first failure.
    ///
    /// Documents added before the failing one stay stored.
    pub fn add_many(
        &mut self,
        documents: impl IntoIterator<Item = Document>,
    ) -> Result<Vec<DocumentId>, CollectionError> {
        documents
            .into_iter()
            .map(|document| self.add(document))
            .collect()
    }

    /// Creates the index on `property`, or rebuilds it in place if it already exists.
    pub fn ensure_index(&mut self, property: &str) -> Result<(), CollectionError> {
        if property.trim().is_empty() {
            return Err(CollectionError::MissingIndexProperty);
        }

        match self.indexes.get_mut(property) {
            Some(index) => {
                self.sink.trace(format_args!(
                    "Index {property} already exists, re-indexing"
                ));
                index.rebuild(&self.records);
            }
            None => {
                self.sink
                    .trace(format_args!("Creating new index {property}"));
                self.indexes
                    .insert(property.to_string(), Index::build(property, &self.records));
            }
        }
        Ok(())
    }

    pub fn ensure_all_indexes(&mut self) {
        for index in self.indexes.values_mut() {
            index.rebuild(&self.records);
        }
        self.sink.trace(format_args!(
            "Rebuilt {} indexes on collection [{}]",
            self.indexes.len(),
            self.name
        ));
    }

    /// Finds the last record whose `property` loosely equals `value`.
    ///
    /// Uses the index on `property` when there is one and falls back to a full
    /// reverse scan otherwise. Both paths agree on which record wins.
    pub fn find_one(&self, property: &str, value: &Value) -> Option<Found<'_>> {
        self.sink
            .trace(format_args!("Querying for {property}={value}"));
        let position = match self.indexes.get(property) {
            Some(index) => index.position_of(value),
            None => return self.find_one_unindexed(property, value),
        };
        position.and_then(|position| self.found_at(position))
    }

    pub fn find_one_unindexed(&self, property: &str, value: &Value) -> Option<Found<'_>> {
        self.records
            .iter()
            .rposition(|record| loose_eq(&record.property(property), value))
            .and_then(|position| self.found_at(position))
    }

    /// Replaces the stored record carrying `document.id` in full.
    pub fn update(&mut self, mut document: Document) -> Result<(), CollectionError> {
        let position = document
            .stored_id()
            .and_then(|id| self.position_of_id(id))
            .ok_or(CollectionError::UnsyncedUpdate)?;
        self.resolve_type(&mut document)?;

        self.records[position] = document;
        let replaced = &self.records[position];
        for index in self.indexes.values_mut() {
            index.set(position, replaced);
        }
        self.bump_mutation_version();
        Ok(())
    }

    /// Removes the stored record carrying `document.id` and returns it.
    pub fn delete(&mut self, document: &Document) -> Result<Document, CollectionError> {
        let id = document
            .stored_id()
            .ok_or(CollectionError::UntrackedDocument { id: None })?;
        let position = self
            .position_of_id(id)
            .ok_or(CollectionError::UntrackedDocument { id: Some(id) })?;

        self.sink.trace(format_args!(
            "Deleting document {id} from collection [{}]",
            self.name
        ));
        let removed = self.records.remove(position);
        for index in self.indexes.values_mut() {
            index.remove(position);
        }
        self.bump_mutation_version();
        Ok(removed)
    }

    /// Like [`Collection::delete`], for documents still in JSON form.
    pub fn delete_value(&mut self, value: Value) -> Result<Document, CollectionError> {
        let document = Document::from_value(value).map_err(|error| match error {
            CollectionError::InvalidInput(message) => CollectionError::InvalidDocument(message),
            other => other,
        })?;
        self.delete(&document)
    }

    /// Lazily yields every record matching `predicate`, in storage order.
    pub fn query<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = &'a Document> + 'a
    where
        P: Fn(&Document) -> bool + 'a,
    {
        self.records.iter().filter(move |record| predicate(*record))
    }

    fn resolve_type(&self, document: &mut Document) -> Result<(), CollectionError> {
        if self.doc_type.is_empty() {
            if !self.records.is_empty() || document.doc_type.is_empty() {
                return Err(CollectionError::UnboundType);
            }
            return Ok(());
        }
        if document.doc_type.is_empty() {
            document.doc_type = self.doc_type.clone();
            return Ok(());
        }
        if document.doc_type != self.doc_type {
            return Err(CollectionError::TypeMismatch {
                expected: self.doc_type.clone(),
                got: document.doc_type.clone(),
            });
        }
        Ok(())
    }

    fn position_of_id(&self, id: DocumentId) -> Option<usize> {
        self.find_one(ID_PROPERTY, &Value::from(id))
            .map(|found| found.position)
    }

    fn found_at(&self, position: usize) -> Option<Found<'_>> {
        self.records
            .get(position)
            .map(|document| Found { position, document })
    }

    fn bump_mutation_version(&mut self) {
        self.mutation_version = self.mutation_version.saturating_add(1);
    }

    pub(crate) fn sink(&self) -> &SharedTraceSink {
        &self.sink
    }
}
