//! In-process result store
//!
//! Keeps solve results in memory, indexed by id and by image content hash, so
//! a single instance serves as both the pipeline's [`ResultStore`] and its
//! [`SolveCache`]. The contents can be exported to and restored from JSON.

use crate::error::{Result, UploadError};
use crate::solve::traits::{ResultStore, SolveCache};
use crate::solve::types::{SolveResult, StoredSolve};
use crate::types::{ContentHash, SolveId};
use async_trait::async_trait;
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct StoreState {
    solves: BTreeMap<SolveId, SolveResult>,
    by_hash: HashMap<ContentHash, SolveId>,
    next_id: i64,
}

impl StoreState {
    fn insert(&mut self, id: SolveId, solve: SolveResult) {
        if let Some(hash) = &solve.image_hash {
            self.by_hash.insert(hash.clone(), id);
        }
        self.next_id = self.next_id.max(id.get());
        self.solves.insert(id, solve);
    }
}

/// Result store and solve cache backed by in-memory maps
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    state: Mutex<StoreState>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of stored results
    pub fn len(&self) -> usize {
        self.state().solves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().solves.is_empty()
    }

    /// All stored results, newest first
    pub fn all(&self) -> Vec<StoredSolve> {
        self.state()
            .solves
            .iter()
            .rev()
            .map(|(id, solve)| StoredSolve {
                id: *id,
                solve: solve.clone(),
            })
            .collect()
    }

    /// Export every stored result as a JSON array
    pub fn to_json(&self) -> Result<String> {
        let mut entries = self.all();
        entries.reverse();
        serde_json::to_string(&entries).map_err(UploadError::from)
    }

    /// Rebuild a store from a JSON export
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<StoredSolve> = serde_json::from_str(json)?;
        let mut state = StoreState::default();
        for entry in entries {
            if state.solves.contains_key(&entry.id) {
                return Err(UploadError::storage(
                    "import",
                    format!("Duplicate solve id {}", entry.id),
                ));
            }
            state.insert(entry.id, entry.solve);
        }

        Ok(Self {
            state: Mutex::new(state),
        })
    }
}

#[async_trait]
impl SolveCache for MemoryResultStore {
    async fn lookup(&self, hash: &ContentHash) -> Result<Option<StoredSolve>> {
        let state = self.state();
        let found = state.by_hash.get(hash).and_then(|id| {
            state.solves.get(id).map(|solve| StoredSolve {
                id: *id,
                solve: solve.clone(),
            })
        });
        Ok(found)
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn save(&self, solve: SolveResult) -> Result<SolveId> {
        let mut state = self.state();
        let id = SolveId::new(state.next_id + 1);
        state.insert(id, solve);
        debug!("stored solve {}", id);
        Ok(id)
    }

    async fn get_by_id(&self, id: SolveId) -> Result<Option<StoredSolve>> {
        Ok(self.state().solves.get(&id).map(|solve| StoredSolve {
            id,
            solve: solve.clone(),
        }))
    }

    async fn delete(&self, id: SolveId) -> Result<bool> {
        let mut state = self.state();
        let Some(removed) = state.solves.remove(&id) else {
            return Ok(false);
        };

        if let Some(hash) = removed.image_hash {
            if state.by_hash.get(&hash) == Some(&id) {
                state.by_hash.remove(&hash);
            }
        }
        Ok(true)
    }
}
