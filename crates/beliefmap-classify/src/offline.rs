//! Deterministic gateways that need no network.

use beliefmap_core::Verdict;

use crate::contract::{ClassifyRequest, ClassifyResponse, Suggestion, SuggestionContext};
use crate::error::GatewayError;
use crate::gateway::{ClassifierGateway, SuggestionSource};

/// Classifies by keyword, for local sessions and tests.
///
/// Rules, first match wins, case-insensitive on the candidate text:
/// `lead` or `violence` is harmful, `never` together with `except` is
/// contradictory, `quantum vibes` is incoherent, `30%` stays pending, and
/// anything else is coherent.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn verdict_for(text: &str) -> Verdict {
        let t = text.to_lowercase();
        if t.contains("lead") || t.contains("violence") {
            Verdict::Harmful
        } else if t.contains("never") && t.contains("except") {
            Verdict::Contradictory
        } else if t.contains("quantum vibes") {
            Verdict::Incoherent
        } else if t.contains("30%") {
            Verdict::Pending
        } else {
            Verdict::Coherent
        }
    }
}

impl ClassifierGateway for KeywordClassifier {
    fn name(&self) -> &str {
        "keyword"
    }

    fn classify(&self, request: &ClassifyRequest) -> Result<ClassifyResponse, GatewayError> {
        request.validate()?;
        let status = Self::verdict_for(&request.new_belief.text);
        Ok(ClassifyResponse::new(
            status,
            format!("Keyword evaluation: {status}."),
            "Deterministic offline evaluation by keyword. Configure a remote classifier for a real judgment.",
        ))
    }
}

/// Returns the same verdict for every request.
#[derive(Debug, Clone)]
pub struct FixedVerdict {
    pub status: Verdict,
    pub summary: String,
    pub explanation: String,
}

impl FixedVerdict {
    pub fn new(status: Verdict) -> Self {
        Self {
            status,
            summary: format!("Marked {status} by hand."),
            explanation: String::new(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }
}

impl ClassifierGateway for FixedVerdict {
    fn name(&self) -> &str {
        "manual"
    }

    fn classify(&self, request: &ClassifyRequest) -> Result<ClassifyResponse, GatewayError> {
        request.validate()?;
        let response =
            ClassifyResponse::new(self.status, self.summary.clone(), self.explanation.clone());
        response.validate()?;
        Ok(response)
    }
}

/// Offers a fixed suggestion regardless of context.
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedSuggestions;

impl SuggestionSource for CannedSuggestions {
    fn suggest(&self, _context: &SuggestionContext) -> Result<Suggestion, GatewayError> {
        Ok(Suggestion {
            suggested_belief: "Universal school meals improve attendance.".into(),
            notes_hint: "Check districts that implemented universal meals.".into(),
            confidence: 55,
        })
    }
}
