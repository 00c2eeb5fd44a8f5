//! Belief types: nodes, edges, statuses, and operating modes.
//!
//! Every belief in a map occupies one of six statuses. Five of them can be
//! produced by classification (see [`Verdict`]); the sixth, `Protected`, is
//! reserved for the core belief and is never entered or left by any
//! transition.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BeliefError;

/// Unique identifier for a belief node.
pub type BeliefId = Uuid;

/// Unique identifier for a belief edge.
pub type EdgeId = Uuid;

/// Minimum length of a belief statement, in characters, after trimming.
pub const MIN_TEXT_CHARS: usize = 4;

/// Maximum length of a belief statement, in characters.
pub const MAX_TEXT_CHARS: usize = 600;

/// Upper bound of the confidence scale.
pub const MAX_CONFIDENCE: u8 = 100;

/// Operating mode of a session. Fixed at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    /// Flags are informational; undo is available.
    #[default]
    Sandbox,
    /// A flagged belief halts growth until it is resolved.
    Professional,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Sandbox => write!(f, "SANDBOX"),
            Mode::Professional => write!(f, "PROFESSIONAL"),
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Mode::Sandbox),
            "professional" => Ok(Mode::Professional),
            other => Err(format!(
                "unknown mode '{other}' (expected sandbox or professional)"
            )),
        }
    }
}

/// Status of a belief node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeliefStatus {
    /// Inserted, awaiting (or failed) classification.
    Pending,
    Coherent,
    Contradictory,
    Harmful,
    Incoherent,
    /// The core belief. Never classified.
    Protected,
}

impl BeliefStatus {
    /// Whether this status raises a flag that blocks growth in
    /// [`Mode::Professional`].
    pub fn is_flagged(&self) -> bool {
        matches!(
            self,
            BeliefStatus::Contradictory | BeliefStatus::Harmful | BeliefStatus::Incoherent
        )
    }

    /// Display color used by renderers for nodes and edges of this status.
    pub fn color(&self) -> &'static str {
        match self {
            BeliefStatus::Coherent => "#059669",
            BeliefStatus::Contradictory => "#eab308",
            BeliefStatus::Harmful => "#dc2626",
            BeliefStatus::Incoherent => "#92400e",
            BeliefStatus::Pending => "#a1a1aa",
            BeliefStatus::Protected => "#1e40af",
        }
    }
}

impl fmt::Display for BeliefStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BeliefStatus::Pending => write!(f, "pending"),
            BeliefStatus::Coherent => write!(f, "coherent"),
            BeliefStatus::Contradictory => write!(f, "contradictory"),
            BeliefStatus::Harmful => write!(f, "harmful"),
            BeliefStatus::Incoherent => write!(f, "incoherent"),
            BeliefStatus::Protected => write!(f, "protected"),
        }
    }
}

impl std::str::FromStr for BeliefStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("protected") {
            return Ok(BeliefStatus::Protected);
        }
        s.parse::<Verdict>()
            .map(BeliefStatus::from)
            .map_err(|_| format!("unknown status '{s}'"))
    }
}

/// A classification outcome. Everything a [`BeliefStatus`] can be except
/// `Protected`, so the classifier can never assign the core's status.
///
/// The same set doubles as the visual kind of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pending,
    Coherent,
    Contradictory,
    Harmful,
    Incoherent,
}

/// Visual kind of an edge, derived from its target's status.
pub type EdgeKind = Verdict;

impl Verdict {
    pub const ALL: [Verdict; 5] = [
        Verdict::Pending,
        Verdict::Coherent,
        Verdict::Contradictory,
        Verdict::Harmful,
        Verdict::Incoherent,
    ];

    pub fn is_flagged(&self) -> bool {
        BeliefStatus::from(*self).is_flagged()
    }

    pub fn color(&self) -> &'static str {
        BeliefStatus::from(*self).color()
    }
}

impl From<Verdict> for BeliefStatus {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Pending => BeliefStatus::Pending,
            Verdict::Coherent => BeliefStatus::Coherent,
            Verdict::Contradictory => BeliefStatus::Contradictory,
            Verdict::Harmful => BeliefStatus::Harmful,
            Verdict::Incoherent => BeliefStatus::Incoherent,
        }
    }
}

impl From<BeliefStatus> for EdgeKind {
    /// Protected targets render their inbound edge as coherent.
    fn from(status: BeliefStatus) -> Self {
        match status {
            BeliefStatus::Pending => Verdict::Pending,
            BeliefStatus::Coherent | BeliefStatus::Protected => Verdict::Coherent,
            BeliefStatus::Contradictory => Verdict::Contradictory,
            BeliefStatus::Harmful => Verdict::Harmful,
            BeliefStatus::Incoherent => Verdict::Incoherent,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        BeliefStatus::from(*self).fmt(f)
    }
}

impl std::str::FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verdict::ALL
            .into_iter()
            .find(|v| v.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unknown verdict '{s}' (expected pending, coherent, contradictory, harmful or incoherent)"
                )
            })
    }
}

/// A vertex of the belief tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeliefNode {
    /// Unique identifier.
    pub id: BeliefId,
    /// The belief statement.
    pub text: String,
    /// Free-text justification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Confidence on a 0..=100 scale.
    pub confidence: u8,
    /// Current status.
    pub status: BeliefStatus,
    /// Short verdict from the last classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tldr: Option<String>,
    /// Long rationale from the last classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Primary parent. `None` only for the core.
    pub parent_id: Option<BeliefId>,
    /// Secondary influences. Never consulted by layout, history or blocking.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub influences: Vec<BeliefId>,
    /// True only for the root.
    pub is_core: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BeliefNode {
    /// Create the protected core belief.
    pub fn core(text: impl Into<String>, notes: Option<String>, confidence: u8) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            notes,
            confidence,
            status: BeliefStatus::Protected,
            tldr: None,
            explanation: None,
            parent_id: None,
            influences: Vec::new(),
            is_core: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a pending belief attached to `parent`.
    pub fn pending(
        text: impl Into<String>,
        notes: Option<String>,
        confidence: u8,
        parent: BeliefId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            notes,
            confidence,
            status: BeliefStatus::Pending,
            tldr: None,
            explanation: None,
            parent_id: Some(parent),
            influences: Vec::new(),
            is_core: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Upstream ids, primary parent first.
    pub fn upstream_ids(&self) -> impl Iterator<Item = BeliefId> + '_ {
        self.parent_id.into_iter().chain(self.influences.iter().copied())
    }

    /// Touch the modification timestamp.
    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// A directed primary-parent → child relationship.
///
/// The visual kind is not stored; see [`crate::GraphState::edge_kind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeliefEdge {
    pub id: EdgeId,
    pub source_id: BeliefId,
    pub target_id: BeliefId,
}

impl BeliefEdge {
    pub fn new(source_id: BeliefId, target_id: BeliefId) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_id,
            target_id,
        }
    }
}

/// Content of a candidate belief as entered by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBelief {
    pub text: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub confidence: u8,
}

impl NewBelief {
    pub fn new(text: impl Into<String>, confidence: u8) -> Self {
        Self {
            text: text.into(),
            notes: None,
            confidence,
        }
    }

    /// Builder: set notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Trim a belief statement and check its length bounds.
pub fn normalize_text(text: &str) -> Result<String, BeliefError> {
    let trimmed = text.trim();
    let chars = trimmed.chars().count();
    if chars < MIN_TEXT_CHARS {
        return Err(BeliefError::TextTooShort {
            min: MIN_TEXT_CHARS,
            actual: chars,
        });
    }
    if chars > MAX_TEXT_CHARS {
        return Err(BeliefError::TextTooLong {
            max: MAX_TEXT_CHARS,
            actual: chars,
        });
    }
    Ok(trimmed.to_string())
}

/// Check that a confidence value is on the 0..=100 scale.
pub fn check_confidence(confidence: u8) -> Result<u8, BeliefError> {
    if confidence > MAX_CONFIDENCE {
        return Err(BeliefError::ConfidenceOutOfRange(confidence));
    }
    Ok(confidence)
}

/// Empty or whitespace-only notes are stored as `None`.
pub(crate) fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}
