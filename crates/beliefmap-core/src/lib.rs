//! Belief map engine.
//!
//! A belief map is a tree of short natural-language statements rooted at one
//! protected core belief. Every other belief is inserted as pending under a
//! parent, then receives a verdict from an external classifier. What a flagged
//! verdict does depends on the session [`Mode`]: in sandbox mode it is
//! informational and every insertion can be undone; in professional mode the
//! most recently flagged belief halts growth until it is re-evaluated as not
//! flagged.
//!
//! The central abstraction is the [`GraphStore`], which owns a [`GraphState`]
//! and persists it through a [`StateSink`] after every mutation. The
//! [`layout`] module places the tree on concentric rings for drawing.

pub mod belief;
pub mod error;
pub mod history;
pub mod layout;
pub mod persist;
pub mod policy;
pub mod serialize;
pub mod state;
pub mod store;

pub use belief::{
    check_confidence, normalize_text, BeliefEdge, BeliefId, BeliefNode, BeliefStatus, EdgeId,
    EdgeKind, Mode, NewBelief, Verdict, MAX_CONFIDENCE, MAX_TEXT_CHARS, MIN_TEXT_CHARS,
};
pub use error::BeliefError;
pub use history::{History, Snapshot, HISTORY_CAPACITY};
pub use layout::{layout, layout_with, LayoutConfig, Placement, RadialLayout};
pub use persist::{FileSink, MemorySink, NullSink, StateSink};
pub use policy::{evaluate_block, BlockChange};
pub use serialize::MapFile;
pub use state::{GraphState, StatusSummary, SCHEMA_VERSION};
pub use store::GraphStore;
