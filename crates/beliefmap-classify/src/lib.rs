//! Classification for belief maps.
//!
//! Defines the contract with an external classifier ([`ClassifyRequest`] in,
//! [`ClassifyResponse`] out), the [`ClassifierGateway`] seam, two offline
//! gateways, and the [`Session`] driver that inserts beliefs and records the
//! classifier's verdicts in a [`beliefmap_core::GraphStore`].

pub mod contract;
pub mod error;
pub mod gateway;
pub mod offline;
pub mod session;

pub use contract::{
    parse_response, AncestorInput, BeliefInput, ClassifyRequest, ClassifyResponse, Suggestion,
    SuggestionContext, MAX_ANCESTORS, MAX_EXPLANATION_CHARS, MAX_SUMMARY_CHARS,
};
pub use error::{GatewayError, SessionError};
pub use gateway::{ClassifierGateway, SuggestionSource, TextGateway};
pub use offline::{CannedSuggestions, FixedVerdict, KeywordClassifier};
pub use session::{suggest_next, Outcome, Session, ANALYZER_ERROR_SUMMARY, SUGGESTION_CONTEXT};
