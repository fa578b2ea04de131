//! The dual-slot federation connector.
//!
//! Every operation snapshots the two slots once and then takes one of three
//! paths: no backend (empty result or no-op), one backend (plain delegation)
//! or two backends (merge/aggregate).

use async_trait::async_trait;
use std::fmt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::facets::merge_facets;
use super::slots::{SharedConnector, Slot, Slots, Topology};
use super::stats::{FederationStats, FederationStatsSnapshot};
use super::window::{parse_id_lookup, Window};
use crate::config::{MirrorConfig, WindowSizing};
use crate::document::{Document, DocumentList, QueryParams, QueryResponse};
use crate::error::ConnectorError;
use crate::score_map::FacetMap;
use crate::SearchConnector;

const TRACE_TARGET: &str = "mirror.federation";

/// Presents two search backends as one index.
///
/// Reads combine both slots (slot 0's results first, then slot 1's); writes
/// go to slot 0 and then slot 1. Either slot may be empty at any time.
///
/// A single-row `id:<key>` query is answered by [`SearchConnector::get_by_id`]
/// and yields an empty list when no slot holds the document, so callers must
/// not assume the result has length 1.
pub struct MirrorConnector {
    slots: Slots,
    config: MirrorConfig,
    stats: FederationStats,
    close_lock: Mutex<()>,
}

impl MirrorConnector {
    /// Create a mirror with both slots empty.
    pub fn new() -> Self {
        Self::with_slots(None, None)
    }

    /// Create a mirror with the given slot occupants.
    pub fn with_slots(slot0: Option<SharedConnector>, slot1: Option<SharedConnector>) -> Self {
        Self {
            slots: Slots::new(slot0, slot1),
            config: MirrorConfig::default(),
            stats: FederationStats::default(),
            close_lock: Mutex::new(()),
        }
    }

    /// Builder method to replace the configuration.
    pub fn with_config(mut self, config: MirrorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    pub fn stats(&self) -> FederationStatsSnapshot {
        self.stats.snapshot()
    }

    /// Put `connector` into `slot`.
    ///
    /// The previous occupant is returned as is; closing it is up to the
    /// caller.
    pub fn attach(&self, slot: Slot, connector: SharedConnector) -> Option<SharedConnector> {
        info!(
            target: TRACE_TARGET,
            %slot,
            backend = connector.name(),
            "attaching backend"
        );
        self.slots.replace(slot, Some(connector))
    }

    /// Empty `slot` and close its occupant. Detaching an empty slot is a no-op.
    ///
    /// The slot is emptied before the close runs, so operations starting
    /// after this call never see the closing backend.
    pub async fn detach(&self, slot: Slot) -> Result<(), ConnectorError> {
        let Some(previous) = self.slots.replace(slot, None) else {
            return Ok(());
        };
        info!(
            target: TRACE_TARGET,
            %slot,
            backend = previous.name(),
            "detaching backend"
        );
        previous.close().await
    }

    pub fn is_attached(&self, slot: Slot) -> bool {
        self.slots.is_attached(slot)
    }

    /// Current occupant of `slot`.
    pub fn connector(&self, slot: Slot) -> Option<SharedConnector> {
        self.slots.get(slot)
    }

    /// Which slots are populated right now.
    pub fn topology(&self) -> Topology {
        self.slots.snapshot()
    }

    /// Total match count of slot 0, used to place the residual window.
    async fn slot0_size(
        &self,
        slot0: &SharedConnector,
        query: &str,
        fields: &[String],
    ) -> Result<usize, ConnectorError> {
        match self.config.window_sizing {
            WindowSizing::FullScan => {
                self.stats.record_full_scan();
                let all = Window::unbounded();
                let matches = slot0.query(query, all.offset, all.count, fields).await?;
                Ok(matches.len())
            }
            WindowSizing::QueryCount => {
                let count = slot0.get_query_count(query).await?;
                Ok(usize::try_from(count).unwrap_or(usize::MAX))
            }
        }
    }

    async fn merge_query(
        &self,
        slot0: &SharedConnector,
        slot1: &SharedConnector,
        query: &str,
        window: Window,
        fields: &[String],
    ) -> Result<DocumentList, ConnectorError> {
        let mut documents = slot0
            .query(query, window.offset, window.count, fields)
            .await?;
        if window.is_filled_by(documents.len()) {
            return Ok(documents);
        }

        self.stats.record_window_spill();
        let size0 = self.slot0_size(slot0, query, fields).await?;
        let residual = window.residual(documents.len(), size0);
        debug!(
            target: TRACE_TARGET,
            offset = window.offset,
            count = window.count,
            returned0 = documents.len(),
            size0,
            offset1 = residual.offset,
            count1 = residual.count,
            "window spills into slot1"
        );

        let rest = slot1
            .query(query, residual.offset, residual.count, fields)
            .await?;
        documents.extend(rest);
        Ok(documents)
    }

    async fn merge_query_params(
        &self,
        slot0: &SharedConnector,
        slot1: &SharedConnector,
        params: &QueryParams,
    ) -> Result<QueryResponse, ConnectorError> {
        let window = Window::new(params.effective_start(), params.effective_rows());
        let first = slot0.query_params(params).await?;
        let returned = first.documents.len();
        if window.is_filled_by(returned) {
            return Ok(first);
        }

        self.stats.record_window_spill();
        let size0 = match self.config.window_sizing {
            WindowSizing::FullScan => {
                self.stats.record_full_scan();
                let all = Window::unbounded();
                let scan = slot0
                    .query_params(&params.windowed(all.offset, all.count))
                    .await?;
                scan.documents.len()
            }
            WindowSizing::QueryCount => usize::try_from(first.num_found).unwrap_or(usize::MAX),
        };
        let residual = window.residual(returned, size0);
        debug!(
            target: TRACE_TARGET,
            start = window.offset,
            rows = window.count,
            returned0 = returned,
            size0,
            start1 = residual.offset,
            rows1 = residual.count,
            "structured window spills into slot1"
        );

        let second = slot1
            .query_params(&params.windowed(residual.offset, residual.count))
            .await?;
        Ok(first.merge(second))
    }

    async fn aggregate_count(
        &self,
        slot0: SharedConnector,
        slot1: SharedConnector,
        query: &str,
    ) -> u64 {
        let query0 = query.to_string();
        let query1 = query.to_string();
        let task0 = tokio::spawn(async move { slot0.get_query_count(&query0).await });
        let task1 = tokio::spawn(async move { slot1.get_query_count(&query1).await });
        let (joined0, joined1) = tokio::join!(task0, task1);

        let mut total = 0u64;
        for (slot, joined) in [(Slot::Zero, joined0), (Slot::One, joined1)] {
            match joined {
                Ok(Ok(count)) => total = total.saturating_add(count),
                Ok(Err(err)) => {
                    self.stats.record_suppressed_count_error();
                    warn!(
                        target: TRACE_TARGET,
                        %slot,
                        code = err.code_str(),
                        error = %err,
                        "query count failed, aggregate excludes this slot"
                    );
                }
                Err(err) => {
                    self.stats.record_suppressed_count_error();
                    warn!(
                        target: TRACE_TARGET,
                        %slot,
                        error = %err,
                        "query count task did not finish, aggregate excludes this slot"
                    );
                }
            }
        }
        total
    }
}

impl Default for MirrorConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MirrorConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MirrorConnector")
            .field("topology", &self.slots.snapshot())
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl SearchConnector for MirrorConnector {
    fn name(&self) -> &str {
        "mirror"
    }

    async fn query(
        &self,
        query: &str,
        offset: usize,
        count: usize,
        fields: &[String],
    ) -> Result<DocumentList, ConnectorError> {
        if offset == 0 && count == 1 && self.config.id_lookup_shortcut {
            if let Some(key) = parse_id_lookup(query, &self.config.id_field) {
                self.stats.record_id_lookup_shortcut();
                debug!(target: TRACE_TARGET, key, "single-row id query answered by lookup");
                let found = self.get_by_id(key, fields).await?;
                return Ok(found.into_iter().collect());
            }
        }

        match self.slots.snapshot() {
            Topology::Empty => Ok(DocumentList::new()),
            Topology::Slot0(only) | Topology::Slot1(only) => {
                only.query(query, offset, count, fields).await
            }
            Topology::Both(slot0, slot1) => {
                self.merge_query(&slot0, &slot1, query, Window::new(offset, count), fields)
                    .await
            }
        }
    }

    async fn query_params(&self, params: &QueryParams) -> Result<QueryResponse, ConnectorError> {
        match self.slots.snapshot() {
            Topology::Empty => Ok(QueryResponse::empty()),
            Topology::Slot0(only) | Topology::Slot1(only) => only.query_params(params).await,
            Topology::Both(slot0, slot1) => self.merge_query_params(&slot0, &slot1, params).await,
        }
    }

    async fn get_by_id(
        &self,
        key: &str,
        fields: &[String],
    ) -> Result<Option<Document>, ConnectorError> {
        let topology = self.slots.snapshot();
        for (_, connector) in topology.attached() {
            if let Some(document) = connector.get_by_id(key, fields).await? {
                return Ok(Some(document));
            }
        }
        Ok(None)
    }

    async fn exists_by_query(&self, query: &str) -> Result<bool, ConnectorError> {
        let topology = self.slots.snapshot();
        for (_, connector) in topology.attached() {
            if connector.exists_by_query(query).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn get_query_count(&self, query: &str) -> Result<u64, ConnectorError> {
        match self.slots.snapshot() {
            Topology::Empty => Ok(0),
            Topology::Slot0(only) | Topology::Slot1(only) => only.get_query_count(query).await,
            Topology::Both(slot0, slot1) => Ok(self.aggregate_count(slot0, slot1, query).await),
        }
    }

    async fn get_facets(
        &self,
        query: &str,
        max_results: usize,
        fields: &[String],
    ) -> Result<FacetMap, ConnectorError> {
        match self.slots.snapshot() {
            Topology::Empty => Ok(FacetMap::new()),
            Topology::Slot0(only) | Topology::Slot1(only) => {
                only.get_facets(query, max_results, fields).await
            }
            Topology::Both(slot0, slot1) => {
                let facets0 = slot0.get_facets(query, max_results, fields).await?;
                let facets1 = slot1.get_facets(query, max_results, fields).await?;
                Ok(merge_facets(facets0, facets1))
            }
        }
    }

    async fn get_size(&self) -> u64 {
        let topology = self.slots.snapshot();
        let mut size = 0u64;
        for (_, connector) in topology.attached() {
            size = size.saturating_add(connector.get_size().await);
        }
        size
    }

    async fn add(&self, document: &Document) -> Result<(), ConnectorError> {
        let topology = self.slots.snapshot();
        for (_, connector) in topology.attached() {
            connector.add(document).await?;
        }
        Ok(())
    }

    async fn add_batch(&self, documents: &[Document]) -> Result<(), ConnectorError> {
        let topology = self.slots.snapshot();
        for (_, connector) in topology.attached() {
            connector.add_batch(documents).await?;
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), ConnectorError> {
        let topology = self.slots.snapshot();
        for (_, connector) in topology.attached() {
            connector.delete_by_id(id).await?;
        }
        Ok(())
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<(), ConnectorError> {
        let topology = self.slots.snapshot();
        for (_, connector) in topology.attached() {
            connector.delete_by_ids(ids).await?;
        }
        Ok(())
    }

    async fn delete_by_query(&self, query: &str) -> Result<(), ConnectorError> {
        let topology = self.slots.snapshot();
        for (_, connector) in topology.attached() {
            connector.delete_by_query(query).await?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), ConnectorError> {
        let topology = self.slots.snapshot();
        for (_, connector) in topology.attached() {
            connector.clear().await?;
        }
        Ok(())
    }

    async fn commit(&self, soft: bool) -> Result<(), ConnectorError> {
        let topology = self.slots.snapshot();
        for (_, connector) in topology.attached() {
            connector.commit(soft).await?;
        }
        Ok(())
    }

    async fn optimize(&self, max_segments: usize) -> Result<(), ConnectorError> {
        let topology = self.slots.snapshot();
        for (_, connector) in topology.attached() {
            connector.optimize(max_segments).await?;
        }
        Ok(())
    }

    /// Close every attached backend.
    ///
    /// Both slots are always attempted; the first failure is returned after
    /// the second slot had its turn. Slots stay attached.
    async fn close(&self) -> Result<(), ConnectorError> {
        let _closing = self.close_lock.lock().await;
        let topology = self.slots.snapshot();
        let mut first_error = None;
        for (slot, connector) in topology.attached() {
            if let Err(err) = connector.close().await {
                warn!(
                    target: TRACE_TARGET,
                    %slot,
                    backend = connector.name(),
                    error = %err,
                    "backend close failed"
                );
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
