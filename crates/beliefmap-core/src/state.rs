//! The aggregate belief map state and its derived queries.
//!
//! [`GraphState`] is what gets exported, imported, persisted and snapshotted.
//! It is mutated only through [`crate::GraphStore`]; everything here is a
//! read-only view.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::belief::{BeliefEdge, BeliefId, BeliefNode, BeliefStatus, EdgeId, EdgeKind, Mode};
use crate::error::{BeliefError, Result};
use crate::history::{History, HISTORY_CAPACITY};

/// Schema tag written into every exported record.
pub const SCHEMA_VERSION: &str = "v1";

/// Summary of belief statuses in the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub protected: usize,
    pub pending: usize,
    pub coherent: usize,
    pub contradictory: usize,
    pub harmful: usize,
    pub incoherent: usize,
    pub total: usize,
}

impl StatusSummary {
    /// Number of beliefs currently carrying a flag.
    pub fn flagged(&self) -> usize {
        self.contradictory + self.harmful + self.incoherent
    }
}

/// The whole belief map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphState {
    pub(crate) mode: Mode,
    pub(crate) nodes: HashMap<BeliefId, BeliefNode>,
    pub(crate) edges: HashMap<EdgeId, BeliefEdge>,
    pub(crate) core_id: Option<BeliefId>,
    pub(crate) active_upstream_id: Option<BeliefId>,
    pub(crate) blocked_by_node_id: Option<BeliefId>,
    #[serde(default)]
    pub(crate) history: History,
    pub(crate) schema_version: String,
}

impl GraphState {
    /// An empty, uninitialized map.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            nodes: HashMap::new(),
            edges: HashMap::new(),
            core_id: None,
            active_upstream_id: None,
            blocked_by_node_id: None,
            history: History::new(),
            schema_version: SCHEMA_VERSION.to_string(),
        }
    }

    // --- Fields ---

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn core_id(&self) -> Option<BeliefId> {
        self.core_id
    }

    /// Where the next inserted belief attaches by default.
    pub fn active_upstream_id(&self) -> Option<BeliefId> {
        self.active_upstream_id
    }

    /// The belief currently halting growth, if any.
    pub fn blocked_by(&self) -> Option<BeliefId> {
        self.blocked_by_node_id
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub fn is_initialized(&self) -> bool {
        self.core_id.is_some()
    }

    // --- Nodes and edges ---

    pub fn node(&self, id: BeliefId) -> Option<&BeliefNode> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &BeliefNode> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge(&self, id: EdgeId) -> Option<&BeliefEdge> {
        self.edges.get(&id)
    }

    pub fn edges(&self) -> impl Iterator<Item = &BeliefEdge> {
        self.edges.values()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn core(&self) -> Option<&BeliefNode> {
        self.core_id.and_then(|id| self.nodes.get(&id))
    }

    /// The blocking belief, resolved.
    pub fn blocker(&self) -> Option<&BeliefNode> {
        self.blocked_by_node_id.and_then(|id| self.nodes.get(&id))
    }

    /// The edge from a belief's primary parent to the belief.
    pub fn incoming_edge(&self, id: BeliefId) -> Option<&BeliefEdge> {
        let parent = self.nodes.get(&id)?.parent_id?;
        self.edges
            .values()
            .find(|e| e.target_id == id && e.source_id == parent)
    }

    /// Visual kind of an edge, read from its target's current status.
    pub fn edge_kind(&self, edge: &BeliefEdge) -> EdgeKind {
        self.nodes
            .get(&edge.target_id)
            .map(|n| EdgeKind::from(n.status))
            .unwrap_or(EdgeKind::Pending)
    }

    // --- Tree queries ---

    /// Direct children, oldest first.
    pub fn children(&self, id: BeliefId) -> Vec<&BeliefNode> {
        let mut children: Vec<&BeliefNode> = self
            .nodes
            .values()
            .filter(|n| n.parent_id == Some(id))
            .collect();
        children.sort_by(|a, b| by_creation(a, b));
        children
    }

    /// Ancestors of a belief ordered core → parent. Empty for the core and
    /// for unknown ids.
    pub fn ancestor_chain(&self, id: BeliefId) -> Vec<&BeliefNode> {
        let mut chain = Vec::new();
        let mut next = self.nodes.get(&id).and_then(|n| n.parent_id);
        while let Some(parent_id) = next {
            let Some(parent) = self.nodes.get(&parent_id) else {
                break;
            };
            chain.push(parent);
            if chain.len() > self.nodes.len() {
                // A cycle; the store never produces one.
                break;
            }
            next = parent.parent_id;
        }
        chain.reverse();
        chain
    }

    /// Distance from the core. `None` for unknown ids.
    pub fn depth(&self, id: BeliefId) -> Option<usize> {
        self.nodes.get(&id)?;
        Some(self.ancestor_chain(id).len())
    }

    /// Whether a new belief may be inserted right now.
    ///
    /// Insertion needs a core; in [`Mode::Professional`] it also needs no
    /// active block.
    pub fn can_grow(&self) -> bool {
        self.is_initialized()
            && (self.mode == Mode::Sandbox || self.blocked_by_node_id.is_none())
    }

    /// The most recent coherent, non-core beliefs, oldest first.
    pub fn recent_coherent(&self, limit: usize) -> Vec<&BeliefNode> {
        let mut coherent: Vec<&BeliefNode> = self
            .nodes
            .values()
            .filter(|n| !n.is_core && n.status == BeliefStatus::Coherent)
            .collect();
        coherent.sort_by(|a, b| by_creation(a, b));
        let skip = coherent.len().saturating_sub(limit);
        coherent.into_iter().skip(skip).collect()
    }

    /// Count beliefs per status.
    pub fn status_summary(&self) -> StatusSummary {
        let mut summary = StatusSummary::default();
        for n in self.nodes.values() {
            match n.status {
                BeliefStatus::Protected => summary.protected += 1,
                BeliefStatus::Pending => summary.pending += 1,
                BeliefStatus::Coherent => summary.coherent += 1,
                BeliefStatus::Contradictory => summary.contradictory += 1,
                BeliefStatus::Harmful => summary.harmful += 1,
                BeliefStatus::Incoherent => summary.incoherent += 1,
            }
            summary.total += 1;
        }
        summary
    }

    /// A copy with the undo history dropped, for structural comparison.
    pub fn without_history(&self) -> GraphState {
        GraphState {
            history: History::new(),
            ..self.clone()
        }
    }

    // --- Invariants ---

    /// Verify the structural invariants of the map.
    ///
    /// An empty map passes. Otherwise: the core exists and is the only
    /// protected belief, every other belief reaches the core through primary
    /// parents without a cycle and has its incoming edge, every edge joins
    /// existing beliefs, a block only exists in professional mode on a flagged
    /// belief, and history is within capacity and only kept in sandbox mode.
    pub fn check_invariants(&self) -> Result<()> {
        let core_id = match self.core_id {
            Some(id) => id,
            None if self.nodes.is_empty() && self.edges.is_empty() => return Ok(()),
            None => return Err(invalid("beliefs present without a core")),
        };

        let core = self
            .nodes
            .get(&core_id)
            .ok_or_else(|| invalid(format!("core {core_id} is missing from the belief set")))?;
        if !core.is_core || core.status != BeliefStatus::Protected || core.parent_id.is_some() {
            return Err(invalid("core belief must be a protected root"));
        }

        let edge_pairs: HashSet<(BeliefId, BeliefId)> = self
            .edges
            .values()
            .map(|e| (e.source_id, e.target_id))
            .collect();

        for (key, node) in &self.nodes {
            if *key != node.id {
                return Err(invalid(format!("belief keyed {key} carries id {}", node.id)));
            }
            if node.id == core_id {
                continue;
            }
            if node.is_core || node.status == BeliefStatus::Protected {
                return Err(invalid(format!(
                    "belief {} is protected but is not the core",
                    node.id
                )));
            }
            self.check_reaches_core(node, core_id)?;
            let parent = node.parent_id.unwrap_or(core_id);
            if !edge_pairs.contains(&(parent, node.id)) {
                return Err(invalid(format!("belief {} has no incoming edge", node.id)));
            }
        }

        for edge in self.edges.values() {
            if !self.nodes.contains_key(&edge.source_id) || !self.nodes.contains_key(&edge.target_id)
            {
                return Err(invalid(format!("edge {} is dangling", edge.id)));
            }
        }

        if let Some(blocker) = self.blocked_by_node_id {
            if self.mode == Mode::Sandbox {
                return Err(invalid("sandbox maps are never blocked"));
            }
            match self.nodes.get(&blocker) {
                Some(n) if n.status.is_flagged() => {}
                Some(n) => {
                    return Err(invalid(format!(
                        "blocker {blocker} has status {}, which is not flagged",
                        n.status
                    )))
                }
                None => return Err(invalid(format!("blocker {blocker} does not exist"))),
            }
        }

        if self.history.len() > HISTORY_CAPACITY {
            return Err(invalid("history exceeds capacity"));
        }
        if self.mode == Mode::Professional && !self.history.is_empty() {
            return Err(invalid("professional maps keep no undo history"));
        }

        Ok(())
    }

    fn check_reaches_core(&self, node: &BeliefNode, core_id: BeliefId) -> Result<()> {
        let mut current = node;
        for _ in 0..self.nodes.len() {
            let parent_id = current
                .parent_id
                .ok_or_else(|| invalid(format!("belief {} is detached from the core", node.id)))?;
            if parent_id == core_id {
                return Ok(());
            }
            current = self.nodes.get(&parent_id).ok_or_else(|| {
                invalid(format!(
                    "belief {} has unknown parent {parent_id}",
                    current.id
                ))
            })?;
        }
        Err(invalid(format!(
            "belief {} is part of a parent cycle",
            node.id
        )))
    }

    // --- Records ---

    /// Export the live state, history included.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| BeliefError::Serialization(e.to_string()))
    }

    /// Parse and validate an exported record.
    ///
    /// Rejects a schema tag other than [`SCHEMA_VERSION`], an absent core, any
    /// record that fails [`GraphState::check_invariants`], and any record whose
    /// undo history holds a snapshot that would not restore. An oversized
    /// history is truncated to its newest entries rather than rejected.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| BeliefError::Deserialization(e.to_string()))?;

        let version = value
            .get("schemaVersion")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        if version != SCHEMA_VERSION {
            return Err(BeliefError::SchemaMismatch {
                found: version.to_string(),
                expected: SCHEMA_VERSION.to_string(),
            });
        }
        if value.get("coreId").map_or(true, |v| v.is_null()) {
            return Err(BeliefError::MissingCore);
        }

        let mut state: GraphState = serde_json::from_value(value)
            .map_err(|e| BeliefError::Deserialization(e.to_string()))?;
        state.history.enforce_capacity();
        state.check_invariants()?;
        state.check_history()?;
        Ok(state)
    }

    /// Verify that every undo snapshot restores to a valid map in the same
    /// mode.
    pub fn check_history(&self) -> Result<()> {
        for (i, snapshot) in self.history.iter().enumerate() {
            let restored = snapshot
                .restore()
                .map_err(|e| invalid(format!("undo snapshot {i} is unusable: {e}")))?;
            if restored.mode != self.mode {
                return Err(invalid(format!(
                    "undo snapshot {i} is a {} map",
                    restored.mode
                )));
            }
        }
        Ok(())
    }
}

impl Default for GraphState {
    fn default() -> Self {
        Self::new(Mode::default())
    }
}

fn by_creation(a: &BeliefNode, b: &BeliefNode) -> Ordering {
    a.created_at
        .cmp(&b.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

fn invalid(msg: impl Into<String>) -> BeliefError {
    BeliefError::InvalidState(msg.into())
}
