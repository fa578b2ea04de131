// src/lib.rs
pub mod config;
pub mod document;
pub mod error;
pub mod federated;
pub mod score_map;

pub use crate::config::{ConfigError, MirrorConfig, WindowSizing};
pub use crate::document::{Document, DocumentList, QueryParams, QueryResponse};
pub use crate::error::ConnectorError;
pub use crate::federated::{MirrorConnector, SharedConnector, Slot};
pub use crate::score_map::{FacetMap, ScoreMap};

use async_trait::async_trait;

/// Capabilities of one search backend.
///
/// Implemented by every backend a [`MirrorConnector`] can hold, and by
/// `MirrorConnector` itself so mirrors can be nested.
#[async_trait]
pub trait SearchConnector: Send + Sync {
    /// Backend name for diagnostics.
    fn name(&self) -> &str {
        "backend"
    }

    // --- Reads ---

    /// Skip `offset` matches of `query` and return at most `count` documents.
    ///
    /// An empty `fields` list returns all stored fields.
    async fn query(
        &self,
        query: &str,
        offset: usize,
        count: usize,
        fields: &[String],
    ) -> Result<DocumentList, ConnectorError>;

    /// Run a structured query.
    async fn query_params(&self, params: &QueryParams) -> Result<QueryResponse, ConnectorError>;

    async fn get_by_id(
        &self,
        key: &str,
        fields: &[String],
    ) -> Result<Option<Document>, ConnectorError>;

    async fn exists_by_query(&self, query: &str) -> Result<bool, ConnectorError>;

    /// Number of documents matching `query`.
    async fn get_query_count(&self, query: &str) -> Result<u64, ConnectorError>;

    /// Value counts of each facet field for the documents matching `query`.
    async fn get_facets(
        &self,
        query: &str,
        max_results: usize,
        fields: &[String],
    ) -> Result<FacetMap, ConnectorError>;

    /// Total number of documents in the index, unfiltered.
    async fn get_size(&self) -> u64;

    // --- Writes ---

    async fn add(&self, document: &Document) -> Result<(), ConnectorError>;
    async fn add_batch(&self, documents: &[Document]) -> Result<(), ConnectorError>;
    async fn delete_by_id(&self, id: &str) -> Result<(), ConnectorError>;
    async fn delete_by_ids(&self, ids: &[String]) -> Result<(), ConnectorError>;
    async fn delete_by_query(&self, query: &str) -> Result<(), ConnectorError>;

    /// Delete every document.
    async fn clear(&self) -> Result<(), ConnectorError>;

    // --- Lifecycle ---

    async fn commit(&self, soft: bool) -> Result<(), ConnectorError>;
    async fn optimize(&self, max_segments: usize) -> Result<(), ConnectorError>;

    /// Release all backend resources. Must be idempotent.
    async fn close(&self) -> Result<(), ConnectorError>;
}
