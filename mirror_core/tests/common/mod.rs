//! In-memory backend used by the integration tests.
//!
//! Query language: `*:*` matches everything, `field:value` matches documents
//! whose string field equals `value` (quotes around the value are ignored).

#![allow(dead_code)]

use async_trait::async_trait;
use mirror_core::{
    ConnectorError, Document, DocumentList, FacetMap, QueryParams, QueryResponse, ScoreMap,
    SearchConnector,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Route `tracing` output through the test harness (`RUST_LOG=mirror=debug`).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Calls recorded across all backends sharing the log, as `(backend, op)`.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, backend: &str, op: &str) {
        self.calls
            .lock()
            .unwrap()
            .push((backend.to_string(), op.to_string()));
    }

    pub fn all(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Backends that received `op`, in call order.
    pub fn backends_for(&self, op: &str) -> Vec<String> {
        self.all()
            .into_iter()
            .filter(|(_, o)| o == op)
            .map(|(b, _)| b)
            .collect()
    }

    pub fn count(&self, backend: &str, op: &str) -> usize {
        self.all()
            .iter()
            .filter(|(b, o)| b == backend && o == op)
            .count()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

pub struct MemoryBackend {
    name: String,
    documents: Mutex<Vec<Document>>,
    failing: Mutex<HashSet<String>>,
    panicking: Mutex<HashSet<String>>,
    closed: Mutex<u32>,
    close_delay: Mutex<Option<Duration>>,
    closing: AtomicUsize,
    peak_closing: AtomicUsize,
    log: CallLog,
}

impl MemoryBackend {
    pub fn new(name: &str, log: &CallLog) -> Self {
        Self {
            name: name.to_string(),
            documents: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            panicking: Mutex::new(HashSet::new()),
            closed: Mutex::new(0),
            close_delay: Mutex::new(None),
            closing: AtomicUsize::new(0),
            peak_closing: AtomicUsize::new(0),
            log: log.clone(),
        }
    }

    /// A backend holding `n` documents `<prefix>0 .. <prefix>{n-1}`, all
    /// with `kind = "page"`.
    pub fn with_pages(name: &str, prefix: &str, n: usize, log: &CallLog) -> Self {
        let backend = Self::new(name, log);
        {
            let mut documents = backend.documents.lock().unwrap();
            for i in 0..n {
                documents.push(Document::new(format!("{prefix}{i}")).with_field("kind", "page"));
            }
        }
        backend
    }

    pub fn with_documents(self, documents: Vec<Document>) -> Self {
        self.documents.lock().unwrap().extend(documents);
        self
    }

    pub fn into_shared(self) -> Arc<MemoryBackend> {
        Arc::new(self)
    }

    /// Make every call of `op` fail with a backend error.
    pub fn fail_on(&self, op: &str) {
        self.failing.lock().unwrap().insert(op.to_string());
    }

    /// Make every call of `op` panic.
    pub fn panic_on(&self, op: &str) {
        self.panicking.lock().unwrap().insert(op.to_string());
    }

    /// Hold each `close()` open for `delay`.
    pub fn slow_close(&self, delay: Duration) {
        *self.close_delay.lock().unwrap() = Some(delay);
    }

    /// Most `close()` calls ever in flight at once on this backend.
    pub fn peak_concurrent_closes(&self) -> usize {
        self.peak_closing.load(Ordering::SeqCst)
    }

    pub fn ids(&self) -> Vec<String> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .filter_map(|d| d.id().map(str::to_string))
            .collect()
    }

    pub fn close_count(&self) -> u32 {
        *self.closed.lock().unwrap()
    }

    fn enter(&self, op: &str) -> Result<(), ConnectorError> {
        self.log.record(&self.name, op);
        if self.panicking.lock().unwrap().contains(op) {
            panic!("{} crashed in {op}", self.name);
        }
        if self.failing.lock().unwrap().contains(op) {
            return Err(ConnectorError::Backend(format!("{} refused {op}", self.name)));
        }
        Ok(())
    }

    fn matching(&self, query: &str) -> Vec<Document> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| matches(d, query))
            .cloned()
            .collect()
    }

    fn page(&self, query: &str, offset: usize, count: usize, fields: &[String]) -> DocumentList {
        self.matching(query)
            .iter()
            .skip(offset)
            .take(count)
            .map(|d| d.project(fields))
            .collect()
    }
}

fn matches(document: &Document, query: &str) -> bool {
    if query == "*:*" {
        return true;
    }
    let Some((field, value)) = query.split_once(':') else {
        return false;
    };
    let value = value.trim_matches('"');
    document.get(field).and_then(|v| v.as_str()) == Some(value)
}

#[async_trait]
impl SearchConnector for MemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(
        &self,
        query: &str,
        offset: usize,
        count: usize,
        fields: &[String],
    ) -> Result<DocumentList, ConnectorError> {
        self.enter("query")?;
        Ok(self.page(query, offset, count, fields))
    }

    async fn query_params(&self, params: &QueryParams) -> Result<QueryResponse, ConnectorError> {
        self.enter("query_params")?;
        let documents = self.page(
            &params.query,
            params.effective_start(),
            params.effective_rows(),
            &params.fields,
        );
        let num_found = self.matching(&params.query).len() as u64;
        Ok(QueryResponse::new(documents, num_found))
    }

    async fn get_by_id(
        &self,
        key: &str,
        fields: &[String],
    ) -> Result<Option<Document>, ConnectorError> {
        self.enter("get_by_id")?;
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id() == Some(key))
            .map(|d| d.project(fields)))
    }

    async fn exists_by_query(&self, query: &str) -> Result<bool, ConnectorError> {
        self.enter("exists_by_query")?;
        Ok(!self.matching(query).is_empty())
    }

    async fn get_query_count(&self, query: &str) -> Result<u64, ConnectorError> {
        self.enter("get_query_count")?;
        Ok(self.matching(query).len() as u64)
    }

    async fn get_facets(
        &self,
        query: &str,
        max_results: usize,
        fields: &[String],
    ) -> Result<FacetMap, ConnectorError> {
        self.enter("get_facets")?;
        let mut facets = FacetMap::new();
        for field in fields {
            let mut scores = ScoreMap::new();
            for document in self.matching(query) {
                if let Some(value) = document.get(field).and_then(|v| v.as_str()) {
                    scores.inc(value, 1);
                }
            }
            if !scores.is_empty() {
                let top: ScoreMap = scores.top(max_results).into_iter().collect();
                facets.insert(field.clone(), top);
            }
        }
        Ok(facets)
    }

    async fn get_size(&self) -> u64 {
        self.log.record(&self.name, "get_size");
        self.documents.lock().unwrap().len() as u64
    }

    async fn add(&self, document: &Document) -> Result<(), ConnectorError> {
        self.enter("add")?;
        self.documents.lock().unwrap().push(document.clone());
        Ok(())
    }

    async fn add_batch(&self, documents: &[Document]) -> Result<(), ConnectorError> {
        self.enter("add_batch")?;
        self.documents
            .lock()
            .unwrap()
            .extend(documents.iter().cloned());
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), ConnectorError> {
        self.enter("delete_by_id")?;
        self.documents.lock().unwrap().retain(|d| d.id() != Some(id));
        Ok(())
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<(), ConnectorError> {
        self.enter("delete_by_ids")?;
        self.documents
            .lock()
            .unwrap()
            .retain(|d| !ids.iter().any(|id| d.id() == Some(id.as_str())));
        Ok(())
    }

    async fn delete_by_query(&self, query: &str) -> Result<(), ConnectorError> {
        self.enter("delete_by_query")?;
        self.documents.lock().unwrap().retain(|d| !matches(d, query));
        Ok(())
    }

    async fn clear(&self) -> Result<(), ConnectorError> {
        self.enter("clear")?;
        self.documents.lock().unwrap().clear();
        Ok(())
    }

    async fn commit(&self, _soft: bool) -> Result<(), ConnectorError> {
        self.enter("commit")
    }

    async fn optimize(&self, _max_segments: usize) -> Result<(), ConnectorError> {
        self.enter("optimize")
    }

    async fn close(&self) -> Result<(), ConnectorError> {
        self.enter("close")?;
        let in_flight = self.closing.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_closing.fetch_max(in_flight, Ordering::SeqCst);
        let delay = *self.close_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.closing.fetch_sub(1, Ordering::SeqCst);
        *self.closed.lock().unwrap() += 1;
        Ok(())
    }
}
