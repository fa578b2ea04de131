//! Counters for federation decisions that are otherwise invisible to callers.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct FederationStats {
    id_lookup_shortcuts: AtomicU64,
    window_spills: AtomicU64,
    full_scans: AtomicU64,
    suppressed_count_errors: AtomicU64,
}

impl FederationStats {
    pub(crate) fn record_id_lookup_shortcut(&self) {
        self.id_lookup_shortcuts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_window_spill(&self) {
        self.window_spills.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_full_scan(&self) {
        self.full_scans.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_suppressed_count_error(&self) {
        self.suppressed_count_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> FederationStatsSnapshot {
        FederationStatsSnapshot {
            id_lookup_shortcuts: self.id_lookup_shortcuts.load(Ordering::Relaxed),
            window_spills: self.window_spills.load(Ordering::Relaxed),
            full_scans: self.full_scans.load(Ordering::Relaxed),
            suppressed_count_errors: self.suppressed_count_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`FederationStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederationStatsSnapshot {
    /// Single-row `id:` queries answered through the id lookup.
    pub id_lookup_shortcuts: u64,
    /// Two-slot queries whose window reached into slot 1.
    pub window_spills: u64,
    /// Full scans of slot 0 used to size a spilling window.
    pub full_scans: u64,
    /// Per-slot count failures that were folded into a partial sum.
    pub suppressed_count_errors: u64,
}
