//! Slot storage and per-operation topology snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::SearchConnector;

/// A backend shared between the mirror and whoever attached it.
pub type SharedConnector = Arc<dyn SearchConnector>;

/// One of the two backend positions.
///
/// Slot 0 is consulted first wherever order is observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Zero,
    One,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::Zero, Slot::One];

    pub fn index(self) -> usize {
        match self {
            Slot::Zero => 0,
            Slot::One => 1,
        }
    }
}

impl TryFrom<usize> for Slot {
    type Error = usize;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(Slot::Zero),
            1 => Ok(Slot::One),
            other => Err(other),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot{}", self.index())
    }
}

/// Which slots were populated when an operation started.
///
/// Holding the `Arc` handles keeps both backends alive for the duration of
/// the operation even if a concurrent `detach` empties the slot.
#[derive(Clone)]
pub enum Topology {
    Empty,
    Slot0(SharedConnector),
    Slot1(SharedConnector),
    Both(SharedConnector, SharedConnector),
}

impl Topology {
    pub fn from_parts(slot0: Option<SharedConnector>, slot1: Option<SharedConnector>) -> Self {
        match (slot0, slot1) {
            (None, None) => Topology::Empty,
            (Some(c0), None) => Topology::Slot0(c0),
            (None, Some(c1)) => Topology::Slot1(c1),
            (Some(c0), Some(c1)) => Topology::Both(c0, c1),
        }
    }

    /// Attached backends in slot order.
    pub fn attached(&self) -> Vec<(Slot, &SharedConnector)> {
        match self {
            Topology::Empty => Vec::new(),
            Topology::Slot0(c0) => vec![(Slot::Zero, c0)],
            Topology::Slot1(c1) => vec![(Slot::One, c1)],
            Topology::Both(c0, c1) => vec![(Slot::Zero, c0), (Slot::One, c1)],
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Topology::Empty => 0,
            Topology::Slot0(_) | Topology::Slot1(_) => 1,
            Topology::Both(_, _) => 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Topology::Empty)
    }
}

impl fmt::Debug for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .attached()
            .iter()
            .map(|(slot, c)| format!("{slot}={}", c.name()))
            .collect();
        f.debug_tuple("Topology").field(&names).finish()
    }
}

/// The two slot cells.
///
/// Both live behind one lock so a snapshot never pairs an old slot 0 with a
/// new slot 1. The lock is never held across an `.await`.
pub(crate) struct Slots {
    cells: RwLock<[Option<SharedConnector>; 2]>,
}

impl Slots {
    pub(crate) fn new(slot0: Option<SharedConnector>, slot1: Option<SharedConnector>) -> Self {
        Self {
            cells: RwLock::new([slot0, slot1]),
        }
    }

    pub(crate) fn get(&self, slot: Slot) -> Option<SharedConnector> {
        let cells = self.cells.read().unwrap_or_else(PoisonError::into_inner);
        cells[slot.index()].clone()
    }

    pub(crate) fn is_attached(&self, slot: Slot) -> bool {
        let cells = self.cells.read().unwrap_or_else(PoisonError::into_inner);
        cells[slot.index()].is_some()
    }

    /// Put `connector` into `slot`, returning the previous occupant.
    pub(crate) fn replace(
        &self,
        slot: Slot,
        connector: Option<SharedConnector>,
    ) -> Option<SharedConnector> {
        let mut cells = self.cells.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut cells[slot.index()], connector)
    }

    pub(crate) fn snapshot(&self) -> Topology {
        let cells = self.cells.read().unwrap_or_else(PoisonError::into_inner);
        Topology::from_parts(cells[0].clone(), cells[1].clone())
    }
}
