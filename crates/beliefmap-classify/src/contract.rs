//! Wire shapes exchanged with a classifier.
//!
//! A request carries the session mode, the core belief, the candidate's
//! ancestor chain ordered core → parent, and the candidate itself. A response
//! carries one [`Verdict`] with a short summary and a longer explanation.

use beliefmap_core::{
    BeliefId, BeliefNode, BeliefStatus, GraphState, Mode, Verdict, MAX_CONFIDENCE,
    MAX_TEXT_CHARS,
};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Longest ancestor chain a request may carry.
pub const MAX_ANCESTORS: usize = 50;

/// Longest accepted response summary, in characters.
pub const MAX_SUMMARY_CHARS: usize = 240;

/// Longest accepted response explanation, in characters.
pub const MAX_EXPLANATION_CHARS: usize = 1200;

/// A belief's content as the classifier sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeliefInput {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub confidence: u8,
}

impl From<&BeliefNode> for BeliefInput {
    fn from(node: &BeliefNode) -> Self {
        Self {
            text: node.text.clone(),
            notes: node.notes.clone(),
            confidence: node.confidence,
        }
    }
}

/// An ancestor's content plus its current status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncestorInput {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub confidence: u8,
    pub status: BeliefStatus,
}

impl From<&BeliefNode> for AncestorInput {
    fn from(node: &BeliefNode) -> Self {
        Self {
            text: node.text.clone(),
            notes: node.notes.clone(),
            confidence: node.confidence,
            status: node.status,
        }
    }
}

/// Everything a classifier needs to judge one candidate belief.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyRequest {
    pub mode: Mode,
    pub core_belief: BeliefInput,
    /// Ancestors ordered core → parent.
    pub upstream_beliefs: Vec<AncestorInput>,
    pub new_belief: BeliefInput,
}

impl ClassifyRequest {
    /// Build the request for an existing non-core belief.
    ///
    /// Chains longer than [`MAX_ANCESTORS`] keep the ancestors nearest the
    /// candidate. `None` when the map has no core, `id` is unknown, or `id` is
    /// the core.
    pub fn for_belief(state: &GraphState, id: BeliefId) -> Option<Self> {
        let core = state.core()?;
        let node = state.node(id).filter(|n| !n.is_core)?;

        let chain = state.ancestor_chain(id);
        let skip = chain.len().saturating_sub(MAX_ANCESTORS);
        let upstream_beliefs = chain.into_iter().skip(skip).map(AncestorInput::from).collect();

        Some(Self {
            mode: state.mode(),
            core_belief: BeliefInput::from(core),
            upstream_beliefs,
            new_belief: BeliefInput::from(node),
        })
    }

    /// Check the bounds a classifier is promised before dispatch.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.upstream_beliefs.len() > MAX_ANCESTORS {
            return Err(GatewayError::InvalidRequest(format!(
                "{} ancestors exceed the limit of {MAX_ANCESTORS}",
                self.upstream_beliefs.len()
            )));
        }
        check_input("core belief", &self.core_belief.text, self.core_belief.confidence)?;
        check_input("new belief", &self.new_belief.text, self.new_belief.confidence)?;
        for (i, a) in self.upstream_beliefs.iter().enumerate() {
            check_input(&format!("ancestor {i}"), &a.text, a.confidence)?;
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, GatewayError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn check_input(what: &str, text: &str, confidence: u8) -> Result<(), GatewayError> {
    let chars = text.chars().count();
    if chars == 0 || chars > MAX_TEXT_CHARS {
        return Err(GatewayError::InvalidRequest(format!(
            "{what} text has {chars} characters, expected 1..={MAX_TEXT_CHARS}"
        )));
    }
    if confidence > MAX_CONFIDENCE {
        return Err(GatewayError::InvalidRequest(format!(
            "{what} confidence {confidence} is above {MAX_CONFIDENCE}"
        )));
    }
    Ok(())
}

/// A classifier's verdict on one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyResponse {
    pub status: Verdict,
    pub summary: String,
    pub full_explanation: String,
}

impl ClassifyResponse {
    pub fn new(
        status: Verdict,
        summary: impl Into<String>,
        full_explanation: impl Into<String>,
    ) -> Self {
        Self {
            status,
            summary: summary.into(),
            full_explanation: full_explanation.into(),
        }
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        let summary = self.summary.chars().count();
        if summary > MAX_SUMMARY_CHARS {
            return Err(GatewayError::InvalidResponse(format!(
                "summary has {summary} characters, limit is {MAX_SUMMARY_CHARS}"
            )));
        }
        let explanation = self.full_explanation.chars().count();
        if explanation > MAX_EXPLANATION_CHARS {
            return Err(GatewayError::InvalidResponse(format!(
                "explanation has {explanation} characters, limit is {MAX_EXPLANATION_CHARS}"
            )));
        }
        Ok(())
    }
}

/// Extract and validate a response from raw classifier output.
///
/// The output may wrap the JSON object in prose; everything from the first
/// `{` to the last `}` is parsed.
pub fn parse_response(raw: &str) -> Result<ClassifyResponse, GatewayError> {
    let start = raw.find('{').ok_or(GatewayError::NoJson)?;
    let end = raw.rfind('}').ok_or(GatewayError::NoJson)?;
    if end < start {
        return Err(GatewayError::NoJson);
    }
    let response: ClassifyResponse = serde_json::from_str(&raw[start..=end])?;
    response.validate()?;
    Ok(response)
}

/// Context handed to a suggestion source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionContext {
    pub core_text: String,
    /// Texts of the most recent coherent beliefs, oldest first.
    pub recent: Vec<String>,
}

/// A proposed next belief.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub suggested_belief: String,
    pub notes_hint: String,
    pub confidence: u8,
}

impl Suggestion {
    pub const TEXT_CHARS: std::ops::RangeInclusive<usize> = 4..=160;
    pub const NOTES_CHARS: std::ops::RangeInclusive<usize> = 4..=240;
    pub const CONFIDENCE: std::ops::RangeInclusive<u8> = 30..=70;

    pub fn validate(&self) -> Result<(), GatewayError> {
        let text = self.suggested_belief.chars().count();
        if !Self::TEXT_CHARS.contains(&text) {
            return Err(GatewayError::InvalidResponse(format!(
                "suggested belief has {text} characters, expected {:?}",
                Self::TEXT_CHARS
            )));
        }
        let notes = self.notes_hint.chars().count();
        if !Self::NOTES_CHARS.contains(&notes) {
            return Err(GatewayError::InvalidResponse(format!(
                "notes hint has {notes} characters, expected {:?}",
                Self::NOTES_CHARS
            )));
        }
        if !Self::CONFIDENCE.contains(&self.confidence) {
            return Err(GatewayError::InvalidResponse(format!(
                "suggested confidence {} is outside {:?}",
                self.confidence,
                Self::CONFIDENCE
            )));
        }
        Ok(())
    }
}
