//! Documents, structured query parameters and response envelopes.
//!
//! The federation layer treats documents as opaque: it only ever reads the
//! `id` field (and not even that on the merge path). Everything else is
//! forwarded between the caller and the backends untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field that holds the unique key of a document.
pub const ID_FIELD: &str = "id";

/// Default page size of a structured query with no `rows` value.
pub const DEFAULT_ROWS: usize = 10;

/// Default page start of a structured query with no `start` value.
pub const DEFAULT_START: usize = 0;

/// An ordered page of documents as returned by a backend.
pub type DocumentList = Vec<Document>;

/// A backend-defined record, stored as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: Map<String, Value>,
}

impl Document {
    /// Create a document holding only its key.
    pub fn new(id: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert(ID_FIELD.to_string(), Value::String(id.into()));
        Self { fields }
    }

    /// Wrap an existing JSON object.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Builder method to set a field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// The unique key, if the document carries a string `id`.
    pub fn id(&self) -> Option<&str> {
        self.fields.get(ID_FIELD).and_then(|v| v.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// Keep only the named fields. An empty list keeps everything.
    pub fn project(&self, names: &[String]) -> Document {
        if names.is_empty() {
            return self.clone();
        }
        let fields = self
            .fields
            .iter()
            .filter(|(k, _)| names.iter().any(|n| n == *k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Document { fields }
    }
}

impl From<Map<String, Value>> for Document {
    fn from(fields: Map<String, Value>) -> Self {
        Self::from_fields(fields)
    }
}

/// Structured query parameters.
///
/// `start` and `rows` are the pagination window; anything a backend needs
/// beyond the query string and field list travels in `extra` and is never
/// inspected by the federation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
    /// Backend query expression.
    pub query: String,

    /// Index of the first row to return (default: 0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,

    /// Maximum number of rows to return (default: 10).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,

    /// Field projection; empty means all stored fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,

    /// Backend-specific parameters (filters, sort, ...).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl QueryParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Builder method to set the window start.
    pub fn with_start(mut self, start: usize) -> Self {
        self.start = Some(start);
        self
    }

    /// Builder method to set the window size.
    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = Some(rows);
        self
    }

    /// Builder method to set the field projection.
    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }

    /// Builder method to add a backend-specific parameter.
    pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    pub fn effective_start(&self) -> usize {
        self.start.unwrap_or(DEFAULT_START)
    }

    pub fn effective_rows(&self) -> usize {
        self.rows.unwrap_or(DEFAULT_ROWS)
    }

    /// A copy of these parameters moved to another window.
    pub fn windowed(&self, start: usize, rows: usize) -> QueryParams {
        QueryParams {
            start: Some(start),
            rows: Some(rows),
            ..self.clone()
        }
    }
}

/// Response envelope of a structured query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// The requested page.
    pub documents: DocumentList,

    /// Total number of matches the backend reports for the query.
    pub num_found: u64,

    /// Time the backend spent answering (ms).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

impl QueryResponse {
    /// Create an empty response.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(documents: DocumentList, num_found: u64) -> Self {
        Self {
            documents,
            num_found,
            elapsed_ms: None,
        }
    }

    /// Append another response after this one.
    ///
    /// Documents are concatenated in block order, totals are summed.
    pub fn merge(mut self, other: QueryResponse) -> QueryResponse {
        self.documents.extend(other.documents);
        self.num_found = self.num_found.saturating_add(other.num_found);
        self.elapsed_ms = match (self.elapsed_ms, other.elapsed_ms) {
            (Some(a), Some(b)) => Some(a.saturating_add(b)),
            (a, b) => a.or(b),
        };
        self
    }
}
