use crate::pipeline::ItemState;
use crate::types::{ImageRef, SolveId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Full state of a batch at one instant
///
/// Items are kept in submission order. A snapshot always carries every item,
/// never only the one that changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSnapshot {
    pub items: Vec<(ImageRef, ItemState)>,
    pub taken_at: DateTime<Utc>,
}

/// Number of items in each lifecycle phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounts {
    pub pending: usize,
    pub in_flight: usize,
    pub completed: usize,
    pub failed: usize,
}

impl BatchCounts {
    pub fn total(&self) -> usize {
        self.pending + self.in_flight + self.completed + self.failed
    }
}

impl BatchSnapshot {
    pub fn new(items: Vec<(ImageRef, ItemState)>) -> Self {
        Self {
            items,
            taken_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, image: &ImageRef) -> Option<&ItemState> {
        self.items
            .iter()
            .find(|(candidate, _)| candidate == image)
            .map(|(_, state)| state)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ImageRef, ItemState)> {
        self.items.iter()
    }

    /// States in submission order
    pub fn states(&self) -> Vec<ItemState> {
        self.items.iter().map(|(_, state)| state.clone()).collect()
    }

    pub fn counts(&self) -> BatchCounts {
        let mut counts = BatchCounts::default();
        for (_, state) in &self.items {
            match state {
                ItemState::Pending => counts.pending += 1,
                ItemState::Processing(_) => counts.in_flight += 1,
                ItemState::Completed(_) => counts.completed += 1,
                ItemState::Failed(_) => counts.failed += 1,
            }
        }
        counts
    }

    /// Whether every item has reached `Completed` or `Failed`
    pub fn is_terminal(&self) -> bool {
        self.items.iter().all(|(_, state)| state.is_terminal())
    }
}

/// Aggregate outcome of a finished batch
///
/// Any completed item makes the batch a success; the failures of the other
/// items stay visible in the final snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchResult {
    /// Ids of the completed items, in submission order
    Success(Vec<SolveId>),
    /// Message of the first failed item, in submission order
    AllFailed(String),
}

impl BatchResult {
    /// Aggregate a snapshot whose items are all terminal
    ///
    /// Returns `None` while any item is still pending or in flight, or when
    /// the snapshot is empty.
    pub fn from_snapshot(snapshot: &BatchSnapshot) -> Option<Self> {
        if snapshot.is_empty() || !snapshot.is_terminal() {
            return None;
        }

        let ids: Vec<SolveId> = snapshot
            .iter()
            .filter_map(|(_, state)| state.solve_id())
            .collect();
        if !ids.is_empty() {
            return Some(BatchResult::Success(ids));
        }

        snapshot
            .iter()
            .find_map(|(_, state)| state.error_message())
            .map(|message| BatchResult::AllFailed(message.to_string()))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BatchResult::Success(_))
    }
}

/// One value on a batch progress stream
#[derive(Debug, Clone, PartialEq)]
pub enum BatchUpdate {
    /// Emitted after every item transition
    Progress(BatchSnapshot),
    /// Last value of the stream, once every item is terminal
    Finished {
        snapshot: BatchSnapshot,
        result: BatchResult,
    },
}

impl BatchUpdate {
    pub fn snapshot(&self) -> &BatchSnapshot {
        match self {
            BatchUpdate::Progress(snapshot) => snapshot,
            BatchUpdate::Finished { snapshot, .. } => snapshot,
        }
    }

    pub fn result(&self) -> Option<&BatchResult> {
        match self {
            BatchUpdate::Progress(_) => None,
            BatchUpdate::Finished { result, .. } => Some(result),
        }
    }
}
