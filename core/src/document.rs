use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CollectionError;

pub type DocumentId = u64;
pub type Fields = Map<String, Value>;

pub const ID_PROPERTY: &str = "id";
pub const TYPE_PROPERTY: &str = "type";

/// A loosely-typed record: free-form fields plus the reserved `id` and `type` keys.
///
/// The JSON form is a flat object; `id` and `type` sit next to the user fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct Document {
    pub id: Option<DocumentId>,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Document {
    pub fn new(doc_type: impl Into<String>) -> Self {
        Self {
            id: None,
            doc_type: doc_type.into(),
            fields: Fields::new(),
        }
    }

    /// Builds an untyped document from a field map; reserved keys are lifted out.
    pub fn from_fields(fields: Fields) -> Result<Self, CollectionError> {
        let mut document = Self::new("");
        for (name, value) in fields {
            document.set(name, value)?;
        }
        Ok(document)
    }

    /// Parses a JSON value. Anything other than an object is rejected.
    pub fn from_value(value: Value) -> Result<Self, CollectionError> {
        match value {
            Value::Object(fields) => Self::from_fields(fields),
            other => Err(CollectionError::InvalidInput(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Builder form of [`Document::set`].
    ///
    /// A `type` that is neither a string nor null is a caller bug: debug builds
    /// panic on it, release builds leave the type tag unchanged. Use
    /// [`Document::set`] when the value is not known to be valid.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let result = self.set(name, value);
        debug_assert!(result.is_ok(), "with_field rejected a reserved key: {result:?}");
        self
    }

    /// Sets a field. `id` and `type` update the reserved slots instead of `fields`.
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), CollectionError> {
        let name = name.into();
        let value = value.into();
        match name.as_str() {
            ID_PROPERTY => self.id = parse_stored_id(&value),
            TYPE_PROPERTY => match value {
                Value::String(doc_type) => self.doc_type = doc_type,
                Value::Null => self.doc_type.clear(),
                other => {
                    return Err(CollectionError::InvalidInput(format!(
                        "type must be a string, got {}",
                        json_kind(&other)
                    )))
                }
            },
            _ => {
                self.fields.insert(name, value);
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The value an index on `name` mirrors for this document; absent fields read as null.
    pub fn property(&self, name: &str) -> Value {
        match name {
            ID_PROPERTY => self.id.map_or(Value::Null, Value::from),
            TYPE_PROPERTY => Value::String(self.doc_type.clone()),
            _ => self.fields.get(name).cloned().unwrap_or(Value::Null),
        }
    }

    /// The id, if it is one the collection could have assigned.
    pub fn stored_id(&self) -> Option<DocumentId> {
        self.id.filter(|id| *id > 0)
    }

    pub fn to_value(&self) -> Value {
        let mut object = Map::with_capacity(self.fields.len() + 2);
        object.insert(
            ID_PROPERTY.to_string(),
            self.id.map_or(Value::Null, Value::from),
        );
        object.insert(
            TYPE_PROPERTY.to_string(),
            Value::String(self.doc_type.clone()),
        );
        for (name, value) in &self.fields {
            object.insert(name.clone(), value.clone());
        }
        Value::Object(object)
    }
}

impl TryFrom<Value> for Document {
    type Error = CollectionError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        document.to_value()
    }
}

/// Loose equality over JSON values.
///
/// Strings, numbers and booleans are compared numerically when their kinds
/// differ (`"42" == 42`, `true == 1`). Null only equals null. Arrays and
/// objects compare element-wise with the same rules.
pub fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(left), Value::String(right)) => left == right,
        (Value::Bool(left), Value::Bool(right)) => left == right,
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .zip(right.iter())
                    .all(|(left, right)| loose_eq(left, right))
        }
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left.iter().all(|(name, left)| {
                    right
                        .get(name)
                        .is_some_and(|right| loose_eq(left, right))
                })
        }
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => false,
        _ => match (loose_number(left), loose_number(right)) {
            (Some(left), Some(right)) => left == right,
            _ => false,
        },
    }
}

fn loose_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok().filter(|number| number.is_finite())
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn parse_stored_id(value: &Value) -> Option<DocumentId> {
    value.as_u64().filter(|id| *id > 0)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests;
