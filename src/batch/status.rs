//! Shared status table of a running batch
//!
//! Every pipeline task of a batch reports its transitions here. Updates are
//! applied and published under one lock, so observers receive snapshots in
//! the order the table changed and every snapshot is internally consistent.

use crate::batch::types::{BatchResult, BatchSnapshot, BatchUpdate};
use crate::pipeline::ItemState;
use crate::types::ImageRef;
use log::{debug, info, warn};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::mpsc::UnboundedSender;

/// Failure recorded for a task that panicked before reporting a terminal state
pub const UNFINISHED_ITEM_MESSAGE: &str = "pipeline task ended unexpectedly";

#[derive(Debug)]
struct TableState {
    items: Vec<(ImageRef, ItemState)>,
    updates: Option<UnboundedSender<BatchUpdate>>,
    closed: bool,
    result: Option<BatchResult>,
}

impl TableState {
    fn snapshot(&self) -> BatchSnapshot {
        BatchSnapshot::new(self.items.clone())
    }

    fn send(&mut self, update: BatchUpdate) {
        let Some(updates) = &self.updates else {
            return;
        };
        if updates.send(update).is_err() {
            debug!("progress observer dropped; batch continues without it");
            self.updates = None;
        }
    }
}

/// Mutex-guarded mapping from each image of a batch to its current state
#[derive(Debug)]
pub struct StatusTable {
    state: Mutex<TableState>,
}

impl StatusTable {
    /// Create a table with every item `Pending`
    pub fn new(items: Vec<ImageRef>, updates: UnboundedSender<BatchUpdate>) -> Self {
        let items = items
            .into_iter()
            .map(|image| (image, ItemState::Pending))
            .collect();

        Self {
            state: Mutex::new(TableState {
                items,
                updates: Some(updates),
                closed: false,
                result: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TableState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Publish the current snapshot without changing anything
    pub fn publish(&self) {
        let mut state = self.lock();
        if state.closed {
            return;
        }
        let snapshot = state.snapshot();
        state.send(BatchUpdate::Progress(snapshot));
    }

    /// Apply a transition of the item at `index` and publish the new snapshot
    ///
    /// Returns false when the table is closed or the transition would move
    /// the item backwards; nothing is published in either case.
    pub fn update(&self, index: usize, next: ItemState) -> bool {
        let mut state = self.lock();
        if state.closed {
            return false;
        }

        let Some((image, current)) = state.items.get_mut(index) else {
            warn!("transition for unknown item #{}", index);
            return false;
        };
        if !current.can_advance_to(&next) {
            warn!("{}: ignoring transition {:?} -> {:?}", image, current, next);
            return false;
        }
        *current = next;

        let snapshot = state.snapshot();
        state.send(BatchUpdate::Progress(snapshot));
        true
    }

    /// Aggregate the batch once every task has stopped
    ///
    /// Items still not terminal are marked failed. The final snapshot and
    /// result are published and the progress stream is closed. Returns the
    /// result, or `None` if the table was closed or already finished.
    pub fn finish(&self) -> Option<BatchResult> {
        let mut state = self.lock();
        if state.closed || state.result.is_some() {
            return None;
        }

        for (image, item) in state.items.iter_mut() {
            if !item.is_terminal() {
                warn!("{}: no terminal state reported", image);
                *item = ItemState::Failed(UNFINISHED_ITEM_MESSAGE.to_string());
            }
        }

        let snapshot = state.snapshot();
        let result = BatchResult::from_snapshot(&snapshot)?;
        let counts = snapshot.counts();
        info!(
            "batch finished: {} completed, {} failed",
            counts.completed, counts.failed
        );

        state.result = Some(result.clone());
        state.send(BatchUpdate::Finished {
            snapshot,
            result: result.clone(),
        });
        state.updates = None;
        Some(result)
    }

    /// Stop publishing; later transitions are dropped
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.updates = None;
    }

    pub fn snapshot(&self) -> BatchSnapshot {
        self.lock().snapshot()
    }

    pub fn result(&self) -> Option<BatchResult> {
        self.lock().result.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.lock().result.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}
