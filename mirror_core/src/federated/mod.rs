//! Federation of two search backends into one logical index.
//!
//! This module provides:
//! - `MirrorConnector`: the dual-slot connector itself
//! - `Slot` / `Topology`: slot addressing and per-operation snapshots
//! - `Window`: pagination arithmetic for the two-slot merge
//! - `FederationStats`: counters for otherwise silent decisions
//!
//! # Example
//!
//! ```ignore
//! use mirror_core::federated::{MirrorConnector, Slot};
//! use mirror_core::SearchConnector;
//!
//! let mirror = MirrorConnector::with_slots(Some(local), None);
//! mirror.attach(Slot::One, remote);
//! let page = mirror.query("host_s:yacy.net", 20, 10, &[]).await?;
//! ```

mod engine;
mod facets;
mod slots;
mod stats;
mod window;

pub use engine::MirrorConnector;
pub use facets::merge_facets;
pub use slots::{SharedConnector, Slot, Topology};
pub use stats::{FederationStats, FederationStatsSnapshot};
pub use window::{parse_id_lookup, Window};
