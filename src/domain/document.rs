//! Untyped documents plus the filter and patch shapes the stores accept.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::id::RecordId;
use crate::storage::StorageError;

/// A stored record: an identifier plus an open set of JSON fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: RecordId,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: RecordId, fields: Map<String, Value>) -> Self {
        Self { id, fields }
    }

    /// Render the document as a single JSON object with the id inlined.
    ///
    /// A stored field literally named `id` is masked by the record id.
    pub fn into_value(self) -> Value {
        let mut fields = self.fields;
        fields.insert("id".to_string(), Value::String(self.id.to_string()));
        Value::Object(fields)
    }
}

/// Decode a document into a typed record shape.
pub fn decode<T: DeserializeOwned>(doc: Document) -> Result<T, StorageError> {
    let id = doc.id;
    serde_json::from_value(doc.into_value()).map_err(|err| StorageError::MalformedDocument {
        id: id.to_string(),
        message: err.to_string(),
    })
}

/// Conjunctive equality filter evaluated against a document.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    id: Option<RecordId>,
    equals: Vec<(String, Value)>,
}

impl Filter {
    /// Matches every document.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: RecordId) -> Self {
        Self {
            id: Some(id),
            equals: Vec::new(),
        }
    }

    /// Add an equality condition on a field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.push((name.into(), value.into()));
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        if let Some(id) = self.id
            && id != doc.id
        {
            return false;
        }
        self.equals
            .iter()
            .all(|(name, value)| doc.fields.get(name) == Some(value))
    }

    pub(crate) fn id(&self) -> Option<RecordId> {
        self.id
    }
}

/// Mutations applied to matched documents.
///
/// Sets replace a field outright. Pushes append to an array field, creating
/// it when absent; pushing onto an existing non-array leaves the field
/// unchanged. Pulls remove every element equal to the given value.
#[derive(Debug, Clone, Default)]
pub struct Patch {
    sets: Vec<(String, Value)>,
    pushes: Vec<(String, Value)>,
    pulls: Vec<(String, Value)>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.sets.push((name.into(), value.into()));
        self
    }

    pub fn push(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.pushes.push((name.into(), value.into()));
        self
    }

    pub fn pull(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.pulls.push((name.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty() && self.pushes.is_empty() && self.pulls.is_empty()
    }

    /// Apply the patch to a document's fields in place.
    ///
    /// Sets run first, then pushes, then pulls.
    pub fn apply(&self, fields: &mut Map<String, Value>) {
        for (name, value) in &self.sets {
            fields.insert(name.clone(), value.clone());
        }
        for (name, value) in &self.pushes {
            let entry = fields
                .entry(name.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = entry {
                items.push(value.clone());
            }
        }
        for (name, value) in &self.pulls {
            if let Some(Value::Array(items)) = fields.get_mut(name) {
                items.retain(|item| item != value);
            }
        }
    }
}
