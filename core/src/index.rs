use serde_json::Value;

use crate::document::{loose_eq, Document};

/// Secondary lookup structure for one property.
///
/// `values[i]` mirrors `records[i].property(property)` of the owning
/// collection. Lookups are linear scans from the end, so the most recently
/// positioned match wins.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    property: String,
    values: Vec<Value>,
}

impl Index {
    pub(crate) fn build(property: impl Into<String>, records: &[Document]) -> Self {
        let mut index = Self {
            property: property.into(),
            values: Vec::with_capacity(records.len()),
        };
        index.rebuild(records);
        index
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Position of the last value loosely equal to `value`.
    pub fn position_of(&self, value: &Value) -> Option<usize> {
        self.values
            .iter()
            .rposition(|candidate| loose_eq(candidate, value))
    }

    pub(crate) fn rebuild(&mut self, records: &[Document]) {
        self.values.clear();
        self.values
            .extend(records.iter().map(|record| record.property(&self.property)));
    }

    pub(crate) fn push(&mut self, record: &Document) {
        self.values.push(record.property(&self.property));
    }

    pub(crate) fn set(&mut self, position: usize, record: &Document) {
        if let Some(slot) = self.values.get_mut(position) {
            *slot = record.property(&self.property);
        }
    }

    pub(crate) fn remove(&mut self, position: usize) {
        if position < self.values.len() {
            let _ = self.values.remove(position);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn person(id: u64, name: &str) -> Document {
        let mut document = Document::new("Person").with_field("name", name);
        document.id = Some(id);
        document
    }

    #[test]
    fn build_mirrors_every_record() {
        let records = vec![person(1, "Alice"), Document::new("Person"), person(3, "Carol")];
        let index = Index::build("name", &records);

        assert_eq!(index.property(), "name");
        assert_eq!(
            index.values(),
            &[json!("Alice"), Value::Null, json!("Carol")][..]
        );
    }

    #[test]
    fn position_of_prefers_the_last_match() {
        let records = vec![person(1, "Alice"), person(2, "Bob"), person(3, "Alice")];
        let index = Index::build("name", &records);

        assert_eq!(index.position_of(&json!("Alice")), Some(2));
        assert_eq!(index.position_of(&json!("Bob")), Some(1));
        assert_eq!(index.position_of(&json!("Dave")), None);
    }

    #[test]
    fn positional_edits_keep_alignment() {
        let mut records = vec![person(1, "Alice"), person(2, "Bob")];
        let mut index = Index::build("id", &records);

        records.push(person(3, "Carol"));
        index.push(&records[2]);
        assert_eq!(index.values(), &[json!(1), json!(2), json!(3)][..]);

        index.set(1, &person(20, "Bob"));
        assert_eq!(index.values(), &[json!(1), json!(20), json!(3)][..]);

        index.remove(0);
        assert_eq!(index.values(), &[json!(20), json!(3)][..]);

        index.remove(10);
        index.set(10, &person(99, "ghost"));
        assert_eq!(index.len(), 2);
    }
}
