//! Undo history: a bounded stack of serialized whole-map snapshots.
//!
//! Snapshots are stored as JSON strings rather than structural clones so a
//! later mutation of live nodes can never reach into a stored snapshot.
//! Each snapshot is taken with its own history emptied, which keeps nesting
//! from growing without bound.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{BeliefError, Result};
use crate::state::{GraphState, SCHEMA_VERSION};

/// Maximum number of snapshots retained. The oldest is evicted first.
pub const HISTORY_CAPACITY: usize = 50;

/// A serialized full-state snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(String);

impl Snapshot {
    /// Serialize `state` with its history field emptied.
    ///
    /// The history is moved out for the duration of the call and put back
    /// afterwards, so nothing is cloned.
    pub fn capture(state: &mut GraphState) -> Result<Self> {
        let history = std::mem::take(&mut state.history);
        let json = serde_json::to_string(state);
        state.history = history;
        json.map(Snapshot)
            .map_err(|e| BeliefError::Serialization(e.to_string()))
    }

    /// Deserialize the snapshot back into a full state.
    ///
    /// The result must carry the current schema tag, have a core and pass
    /// [`GraphState::check_invariants`].
    pub fn restore(&self) -> Result<GraphState> {
        let state: GraphState = serde_json::from_str(&self.0)
            .map_err(|e| BeliefError::Deserialization(e.to_string()))?;
        if state.schema_version() != SCHEMA_VERSION {
            return Err(BeliefError::SchemaMismatch {
                found: state.schema_version().to_string(),
                expected: SCHEMA_VERSION.to_string(),
            });
        }
        if !state.is_initialized() {
            return Err(BeliefError::MissingCore);
        }
        state.check_invariants()?;
        Ok(state)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Ring-buffer of snapshots, newest at the back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    snapshots: VecDeque<Snapshot>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot, evicting from the front beyond capacity.
    pub fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.push_back(snapshot);
        self.enforce_capacity();
    }

    /// Remove and return the newest snapshot.
    pub fn pop(&mut self) -> Option<Snapshot> {
        self.snapshots.pop_back()
    }

    /// Drop the oldest entries until at most [`HISTORY_CAPACITY`] remain.
    pub fn enforce_capacity(&mut self) {
        while self.snapshots.len() > HISTORY_CAPACITY {
            self.snapshots.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Snapshots from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }
}
