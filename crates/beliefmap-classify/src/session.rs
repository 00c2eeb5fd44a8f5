//! The session driver: grows a belief map through a classifier.
//!
//! Inserting and classifying are separate store operations. [`Session`]
//! sequences them, enforces the growth block before inserting, and turns a
//! classifier failure into a pending belief that records why.

use beliefmap_core::{BeliefError, BeliefId, GraphState, GraphStore, Mode, NewBelief, Verdict};
use tracing::{debug, info, warn};

use crate::contract::{ClassifyRequest, ClassifyResponse, Suggestion, SuggestionContext};
use crate::error::{GatewayError, SessionError};
use crate::gateway::{ClassifierGateway, SuggestionSource};

/// Summary written to a belief whose classification failed.
pub const ANALYZER_ERROR_SUMMARY: &str = "Analyzer error.";

/// How many recent coherent beliefs a suggestion source sees.
pub const SUGGESTION_CONTEXT: usize = 3;

/// Result of sending one belief to the classifier.
#[derive(Debug)]
pub enum Outcome {
    Classified {
        belief: BeliefId,
        response: ClassifyResponse,
    },
    /// The classifier failed. Unless the belief was blocking growth, it is now
    /// pending with the error as its explanation.
    Failed {
        belief: BeliefId,
        error: GatewayError,
    },
}

impl Outcome {
    pub fn belief(&self) -> BeliefId {
        match self {
            Outcome::Classified { belief, .. } | Outcome::Failed { belief, .. } => *belief,
        }
    }

    /// The verdict, when classification succeeded.
    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            Outcome::Classified { response, .. } => Some(response.status),
            Outcome::Failed { .. } => None,
        }
    }
}

/// A store paired with the classifier that judges its beliefs.
pub struct Session<G> {
    store: GraphStore,
    gateway: G,
}

impl<G> Session<G> {
    pub fn new(store: GraphStore, gateway: G) -> Self {
        Self { store, gateway }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut GraphStore {
        &mut self.store
    }

    pub fn into_store(self) -> GraphStore {
        self.store
    }

    /// Ask `source` for a next belief. See [`suggest_next`].
    pub fn suggest(&self, source: &dyn SuggestionSource) -> Result<Suggestion, SessionError> {
        suggest_next(self.store.state(), source)
    }
}

impl<G: ClassifierGateway> Session<G> {

    /// Insert a candidate belief and classify it.
    ///
    /// Refused while a professional map is blocked. The belief stays in the
    /// map even when the classifier fails.
    pub fn grow(
        &mut self,
        belief: NewBelief,
        parent: Option<BeliefId>,
    ) -> Result<Outcome, SessionError> {
        let state = self.store.state();
        if state.mode() == Mode::Professional {
            if let Some(blocker) = state.blocked_by() {
                return Err(SessionError::Blocked(blocker));
            }
        }
        let id = self.store.insert_pending(belief, parent)?;
        self.classify(id)
    }

    /// Classify an existing belief again, with its current text and chain.
    pub fn reanalyze(&mut self, id: BeliefId) -> Result<Outcome, SessionError> {
        let state = self.store.state();
        if state.core_id() == Some(id) {
            return Err(SessionError::CoreNotClassified);
        }
        if state.node(id).is_none() {
            return Err(SessionError::UnknownBelief(id));
        }
        self.classify(id)
    }

    /// Re-evaluate the belief that is blocking growth.
    pub fn reanalyze_blocker(&mut self) -> Result<Outcome, SessionError> {
        let blocker = self
            .store
            .state()
            .blocked_by()
            .ok_or(SessionError::NotBlocked)?;
        self.reanalyze(blocker)
    }

    fn classify(&mut self, id: BeliefId) -> Result<Outcome, SessionError> {
        let request = ClassifyRequest::for_belief(self.store.state(), id)
            .ok_or(SessionError::UnknownBelief(id))?;

        match self.gateway.classify(&request) {
            Ok(response) => {
                debug!(
                    gateway = self.gateway.name(),
                    belief = %id,
                    status = %response.status,
                    "classified"
                );
                self.store.apply_classification(
                    id,
                    response.status,
                    Some(response.summary.clone()),
                    Some(response.full_explanation.clone()),
                );
                Ok(Outcome::Classified {
                    belief: id,
                    response,
                })
            }
            Err(error) => {
                warn!(
                    gateway = self.gateway.name(),
                    belief = %id,
                    error = %error,
                    "classification failed"
                );
                // A failed re-check must not lift a block by itself.
                if self.store.state().blocked_by() == Some(id) {
                    info!(belief = %id, "blocker keeps its status after failed classification");
                } else {
                    self.store.apply_classification(
                        id,
                        Verdict::Pending,
                        Some(ANALYZER_ERROR_SUMMARY.to_string()),
                        Some(error.to_string()),
                    );
                }
                Ok(Outcome::Failed { belief: id, error })
            }
        }
    }
}

/// Ask `source` for a next belief, given the core and the most recent
/// coherent beliefs. Suggestions are a sandbox feature.
pub fn suggest_next(
    state: &GraphState,
    source: &dyn SuggestionSource,
) -> Result<Suggestion, SessionError> {
    let core = state.core().ok_or(BeliefError::NoCore)?;
    if state.mode() != Mode::Sandbox {
        return Err(SessionError::SandboxOnly);
    }
    let context = SuggestionContext {
        core_text: core.text.clone(),
        recent: state
            .recent_coherent(SUGGESTION_CONTEXT)
            .into_iter()
            .map(|n| n.text.clone())
            .collect(),
    };
    let suggestion = source.suggest(&context)?;
    suggestion.validate()?;
    debug!(confidence = suggestion.confidence, "suggested belief");
    Ok(suggestion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::TextGateway;
    use crate::offline::{CannedSuggestions, FixedVerdict, KeywordClassifier};
    use beliefmap_core::BeliefStatus;
    use std::cell::Cell;

    fn session<G: ClassifierGateway>(mode: Mode, gateway: G) -> Session<G> {
        let mut store = GraphStore::in_memory();
        store
            .initialize(mode, "Children deserve safety", None, None)
            .unwrap();
        Session::new(store, gateway)
    }

    /// Fails while `failing` is set, otherwise answers by keyword.
    struct Flaky {
        failing: Cell<bool>,
    }

    impl ClassifierGateway for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        fn classify(&self, request: &ClassifyRequest) -> Result<ClassifyResponse, GatewayError> {
            if self.failing.get() {
                return Err(GatewayError::Transport("timed out".into()));
            }
            KeywordClassifier.classify(request)
        }
    }

    #[test]
    fn grow_classifies_new_belief() {
        let mut s = session(Mode::Sandbox, KeywordClassifier);
        let outcome = s
            .grow(NewBelief::new("Reading to children helps literacy", 70), None)
            .unwrap();
        assert_eq!(outcome.verdict(), Some(Verdict::Coherent));
        let node = s.store().state().node(outcome.belief()).unwrap();
        assert_eq!(node.status, BeliefStatus::Coherent);
        assert!(node.tldr.is_some());
    }

    #[test]
    fn professional_flag_blocks_further_growth() {
        let mut s = session(Mode::Professional, KeywordClassifier);
        let flagged = s
            .grow(NewBelief::new("Lead paint is harmless", 40), None)
            .unwrap()
            .belief();
        assert_eq!(s.store().state().blocked_by(), Some(flagged));

        let err = s
            .grow(NewBelief::new("Parks improve wellbeing", 60), None)
            .unwrap_err();
        assert!(matches!(err, SessionError::Blocked(id) if id == flagged));
        assert_eq!(s.store().state().node_count(), 2);
    }

    #[test]
    fn sandbox_flag_does_not_block() {
        let mut s = session(Mode::Sandbox, KeywordClassifier);
        s.grow(NewBelief::new("Violence teaches respect", 40), None)
            .unwrap();
        s.grow(NewBelief::new("Parks improve wellbeing", 60), None)
            .unwrap();
        assert_eq!(s.store().state().node_count(), 3);
    }

    #[test]
    fn revise_then_reanalyze_blocker_lifts_block() {
        let mut s = session(Mode::Professional, KeywordClassifier);
        let id = s
            .grow(NewBelief::new("Never lie except when convenient", 50), None)
            .unwrap()
            .belief();
        assert_eq!(s.store().state().blocked_by(), Some(id));

        s.store_mut()
            .revise_text(id, "Honesty builds trust over time")
            .unwrap();
        let outcome = s.reanalyze_blocker().unwrap();
        assert_eq!(outcome.belief(), id);
        assert_eq!(outcome.verdict(), Some(Verdict::Coherent));
        assert_eq!(s.store().state().blocked_by(), None);
        assert!(matches!(
            s.reanalyze_blocker(),
            Err(SessionError::NotBlocked)
        ));
    }

    #[test]
    fn failure_marks_pending_with_reason() {
        let gateway = TextGateway::new("broken", |_: &str| Ok("not json".to_string()));
        let mut s = session(Mode::Professional, gateway);
        let outcome = s
            .grow(NewBelief::new("Parks improve wellbeing", 60), None)
            .unwrap();
        assert!(matches!(outcome, Outcome::Failed { error: GatewayError::NoJson, .. }));

        let node = s.store().state().node(outcome.belief()).unwrap();
        assert_eq!(node.status, BeliefStatus::Pending);
        assert_eq!(node.tldr.as_deref(), Some(ANALYZER_ERROR_SUMMARY));
        assert_eq!(
            node.explanation.as_deref(),
            Some("no JSON object in classifier output")
        );
        assert!(s.store().state().can_grow());
    }

    #[test]
    fn failed_blocker_recheck_keeps_block() {
        let mut s = session(
            Mode::Professional,
            Flaky {
                failing: Cell::new(false),
            },
        );
        let id = s
            .grow(NewBelief::new("Quantum vibes cure colds", 50), None)
            .unwrap()
            .belief();
        assert_eq!(s.store().state().blocked_by(), Some(id));

        s.gateway.failing.set(true);
        let outcome = s.reanalyze_blocker().unwrap();
        assert!(matches!(outcome, Outcome::Failed { .. }));
        let state = s.store().state();
        assert_eq!(state.blocked_by(), Some(id));
        assert_eq!(state.node(id).unwrap().status, BeliefStatus::Incoherent);
    }

    #[test]
    fn reanalyze_rejects_core_and_unknown() {
        let mut s = session(Mode::Sandbox, FixedVerdict::new(Verdict::Coherent));
        let core = s.store().state().core_id().unwrap();
        assert!(matches!(
            s.reanalyze(core),
            Err(SessionError::CoreNotClassified)
        ));
        assert!(matches!(
            s.reanalyze(BeliefId::nil()),
            Err(SessionError::UnknownBelief(_))
        ));
    }

    #[test]
    fn grow_requires_core() {
        let mut s = Session::new(GraphStore::in_memory(), KeywordClassifier);
        let err = s
            .grow(NewBelief::new("Parks improve wellbeing", 60), None)
            .unwrap_err();
        assert!(matches!(err, SessionError::Belief(BeliefError::NoCore)));
    }

    #[test]
    fn grow_rejects_invalid_text_without_inserting() {
        let mut s = session(Mode::Sandbox, KeywordClassifier);
        assert!(s.grow(NewBelief::new("ok", 60), None).is_err());
        assert_eq!(s.store().state().node_count(), 1);
    }

    /// Records the context it was asked with.
    struct Recording {
        seen: std::cell::RefCell<Option<SuggestionContext>>,
    }

    impl SuggestionSource for Recording {
        fn suggest(&self, context: &SuggestionContext) -> Result<Suggestion, GatewayError> {
            *self.seen.borrow_mut() = Some(context.clone());
            CannedSuggestions.suggest(context)
        }
    }

    #[test]
    fn suggest_sees_core_and_recent_coherent() {
        let mut s = session(Mode::Sandbox, KeywordClassifier);
        for text in [
            "Parks improve wellbeing",
            "Lead pipes are fine",
            "Walking school buses work",
            "Crossing guards reduce injuries",
            "Street lighting deters crime",
        ] {
            s.grow(NewBelief::new(text, 60), None).unwrap();
        }
        let source = Recording {
            seen: std::cell::RefCell::new(None),
        };
        let suggestion = s.suggest(&source).unwrap();
        assert_eq!(suggestion.confidence, 55);

        let ctx = source.seen.borrow().clone().unwrap();
        assert_eq!(ctx.core_text, "Children deserve safety");
        assert_eq!(ctx.recent.len(), SUGGESTION_CONTEXT);
        assert!(!ctx.recent.iter().any(|t| t.contains("Lead")));
    }

    #[test]
    fn suggest_is_sandbox_only() {
        let s = session(Mode::Professional, KeywordClassifier);
        assert!(matches!(
            s.suggest(&CannedSuggestions),
            Err(SessionError::SandboxOnly)
        ));
        assert!(matches!(
            suggest_next(&GraphState::new(Mode::Sandbox), &CannedSuggestions),
            Err(SessionError::Belief(BeliefError::NoCore))
        ));
    }

    #[test]
    fn suggest_next_needs_no_gateway() {
        let mut store = GraphStore::in_memory();
        store
            .initialize(Mode::Sandbox, "Children deserve safety", None, None)
            .unwrap();
        let suggestion = suggest_next(store.state(), &CannedSuggestions).unwrap();
        assert!(suggestion.validate().is_ok());
    }

    #[test]
    fn suggest_rejects_out_of_range_suggestion() {
        struct Overconfident;
        impl SuggestionSource for Overconfident {
            fn suggest(&self, _: &SuggestionContext) -> Result<Suggestion, GatewayError> {
                Ok(Suggestion {
                    suggested_belief: "Everything is fine".into(),
                    notes_hint: "Trust me".into(),
                    confidence: 99,
                })
            }
        }
        let s = session(Mode::Sandbox, KeywordClassifier);
        assert!(matches!(
            s.suggest(&Overconfident),
            Err(SessionError::Gateway(GatewayError::InvalidResponse(_)))
        ));
    }
}
