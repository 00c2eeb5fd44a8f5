//! The graph store: the single owner of a belief map's state.
//!
//! All mutation goes through [`GraphStore`]. Precondition violations are
//! rejected with the state untouched; operations naming an unknown belief are
//! silent no-ops. Every successful mutation is persisted through the store's
//! [`StateSink`].

use tracing::{debug, info, warn};

use crate::belief::{
    check_confidence, normalize_notes, normalize_text, BeliefEdge, BeliefId, BeliefNode,
    BeliefStatus, Mode, NewBelief, Verdict, MAX_CONFIDENCE,
};
use crate::error::{BeliefError, Result};
use crate::history::Snapshot;
use crate::persist::{NullSink, StateSink};
use crate::policy::{evaluate_block, BlockChange};
use crate::state::GraphState;

/// Owns a [`GraphState`] and the sink it is persisted to.
pub struct GraphStore {
    state: GraphState,
    sink: Box<dyn StateSink>,
}

impl GraphStore {
    /// An empty store persisting to `sink`. Nothing is loaded from the sink.
    pub fn new(sink: impl StateSink + 'static) -> Self {
        Self {
            state: GraphState::default(),
            sink: Box::new(sink),
        }
    }

    /// An empty store that is never persisted.
    pub fn in_memory() -> Self {
        Self::new(NullSink)
    }

    /// A store resuming whatever `sink` last persisted.
    pub fn open(sink: impl StateSink + 'static) -> Result<Self> {
        let state = sink.load()?.unwrap_or_default();
        state.check_invariants()?;
        Ok(Self {
            state,
            sink: Box::new(sink),
        })
    }

    /// Read-only view of the current state.
    pub fn state(&self) -> &GraphState {
        &self.state
    }

    // --- Graph store operations ---

    /// Create the core belief, replacing any prior state.
    ///
    /// `confidence` defaults to 100.
    pub fn initialize(
        &mut self,
        mode: Mode,
        core_text: &str,
        notes: Option<String>,
        confidence: Option<u8>,
    ) -> Result<BeliefId> {
        let text = normalize_text(core_text)?;
        let confidence = check_confidence(confidence.unwrap_or(MAX_CONFIDENCE))?;

        let core = BeliefNode::core(text, normalize_notes(notes), confidence);
        let core_id = core.id;

        let mut state = GraphState::new(mode);
        state.nodes.insert(core_id, core);
        state.core_id = Some(core_id);
        state.active_upstream_id = Some(core_id);
        self.state = state;

        info!(%mode, core = %core_id, "initialized belief map");
        self.persist();
        Ok(core_id)
    }

    /// Insert a pending belief under `parent`.
    ///
    /// The parent defaults to the active upstream belief, then to the core.
    /// In sandbox mode the pre-insertion state is pushed onto the undo history
    /// first.
    pub fn insert_pending(
        &mut self,
        belief: NewBelief,
        parent: Option<BeliefId>,
    ) -> Result<BeliefId> {
        let core_id = self.state.core_id.ok_or(BeliefError::NoCore)?;
        let text = normalize_text(&belief.text)?;
        let confidence = check_confidence(belief.confidence)?;
        let parent_id = self.resolve_parent(parent, core_id)?;

        if self.state.mode == Mode::Sandbox {
            self.push_snapshot()?;
        }

        let node = BeliefNode::pending(text, normalize_notes(belief.notes), confidence, parent_id);
        let node_id = node.id;
        let edge = BeliefEdge::new(parent_id, node_id);
        self.state.nodes.insert(node_id, node);
        self.state.edges.insert(edge.id, edge);

        debug!(belief = %node_id, parent = %parent_id, "inserted pending belief");
        self.persist();
        Ok(node_id)
    }

    /// Record a classification result for a belief and run the blocking
    /// policy.
    ///
    /// Returns `false`, changing nothing, when `id` is unknown or is the
    /// core. The incoming edge's kind follows the new status on its own.
    pub fn apply_classification(
        &mut self,
        id: BeliefId,
        verdict: Verdict,
        tldr: Option<String>,
        explanation: Option<String>,
    ) -> bool {
        if self.state.core_id == Some(id) {
            warn!(belief = %id, "ignoring classification of the core belief");
            return false;
        }
        let Some(node) = self.state.nodes.get_mut(&id) else {
            debug!(belief = %id, "ignoring classification of unknown belief");
            return false;
        };

        let status = BeliefStatus::from(verdict);
        node.status = status;
        node.tldr = tldr;
        node.explanation = explanation;
        node.touch();

        let (blocker, change) =
            evaluate_block(self.state.mode, self.state.blocked_by_node_id, id, status);
        self.state.blocked_by_node_id = blocker;

        match change {
            BlockChange::Raised { node, replaced } => {
                info!(blocker = %node, ?replaced, %status, "growth blocked");
            }
            BlockChange::Cleared { node } => info!(former = %node, "growth unblocked"),
            BlockChange::Unchanged => {}
        }
        debug!(belief = %id, %status, "applied classification");

        self.persist();
        true
    }

    /// Set where the next belief attaches. No other effect, and not persisted
    /// until the next mutation.
    pub fn select_active(&mut self, id: Option<BeliefId>) {
        self.state.active_upstream_id = id;
    }

    /// Edit a belief's notes and confidence in place.
    ///
    /// Returns `Ok(false)` when `id` is unknown.
    pub fn update_notes_confidence(
        &mut self,
        id: BeliefId,
        notes: Option<String>,
        confidence: u8,
    ) -> Result<bool> {
        let confidence = check_confidence(confidence)?;
        let Some(node) = self.state.nodes.get_mut(&id) else {
            return Ok(false);
        };
        node.notes = normalize_notes(notes);
        node.confidence = confidence;
        node.touch();
        self.persist();
        Ok(true)
    }

    /// Replace a non-core belief's statement ahead of re-evaluation.
    ///
    /// The status is kept until the next classification, so revising a
    /// blocking belief does not by itself lift the block. Returns `Ok(false)`
    /// when `id` is unknown.
    pub fn revise_text(&mut self, id: BeliefId, text: &str) -> Result<bool> {
        if self.state.core_id == Some(id) {
            return Err(BeliefError::CoreImmutable);
        }
        let text = normalize_text(text)?;
        let Some(node) = self.state.nodes.get_mut(&id) else {
            return Ok(false);
        };
        node.text = text;
        node.touch();
        debug!(belief = %id, "revised belief text");
        self.persist();
        Ok(true)
    }

    // --- History ---

    /// Push the current state onto the undo history. Sandbox only; a no-op
    /// otherwise.
    pub fn push_snapshot(&mut self) -> Result<()> {
        if self.state.mode != Mode::Sandbox {
            return Ok(());
        }
        let snapshot = Snapshot::capture(&mut self.state)?;
        self.state.history.push(snapshot);
        Ok(())
    }

    /// Replace the whole state with the newest snapshot.
    ///
    /// Returns `Ok(false)` outside sandbox mode or when there is nothing to
    /// undo. A snapshot that does not restore to a valid sandbox map is put
    /// back and the state is unchanged.
    pub fn undo(&mut self) -> Result<bool> {
        if self.state.mode != Mode::Sandbox {
            return Ok(false);
        }
        let Some(snapshot) = self.state.history.pop() else {
            return Ok(false);
        };
        let restored = snapshot.restore().and_then(|restored| {
            if restored.mode == Mode::Sandbox {
                Ok(restored)
            } else {
                Err(BeliefError::InvalidState(format!(
                    "undo snapshot is a {} map",
                    restored.mode
                )))
            }
        });
        let mut restored = match restored {
            Ok(restored) => restored,
            Err(e) => {
                warn!(error = %e, "rejected undo snapshot");
                self.state.history.push(snapshot);
                return Err(e);
            }
        };
        restored.history = std::mem::take(&mut self.state.history);
        self.state = restored;

        info!(remaining = self.state.history.len(), "undo");
        self.persist();
        Ok(true)
    }

    // --- Records ---

    /// The live state as an exported JSON record, history included.
    pub fn export_json(&self) -> Result<String> {
        self.state.to_json()
    }

    /// Replace the state with an exported record.
    ///
    /// Rejected records leave the current state untouched.
    pub fn import_json(&mut self, json: &str) -> Result<()> {
        let state = GraphState::from_json(json).inspect_err(|e| {
            warn!(error = %e, "rejected imported belief map");
        })?;
        info!(
            mode = %state.mode,
            beliefs = state.node_count(),
            "imported belief map"
        );
        self.state = state;
        self.persist();
        Ok(())
    }

    /// Discard all state and forget the persisted record.
    pub fn reset(&mut self) -> Result<()> {
        self.state = GraphState::default();
        info!("reset belief map");
        self.sink.clear()
    }

    /// Persist the current state now, reporting any failure.
    pub fn flush(&mut self) -> Result<()> {
        self.sink.persist(&self.state)
    }

    // --- Helpers ---

    fn resolve_parent(&self, explicit: Option<BeliefId>, core_id: BeliefId) -> Result<BeliefId> {
        if let Some(parent) = explicit {
            if !self.state.nodes.contains_key(&parent) {
                return Err(BeliefError::ParentNotFound(parent));
            }
            return Ok(parent);
        }
        match self.state.active_upstream_id {
            Some(active) if self.state.nodes.contains_key(&active) => Ok(active),
            Some(stale) => {
                warn!(active = %stale, "active belief is unknown; attaching to the core");
                Ok(core_id)
            }
            None => Ok(core_id),
        }
    }

    /// Persistence is a side effect. A failure is logged and the in-memory
    /// state is kept; [`GraphStore::flush`] surfaces it to callers that care.
    fn persist(&mut self) {
        if let Err(e) = self.sink.persist(&self.state) {
            warn!(error = %e, "failed to persist belief map");
        }
    }
}
