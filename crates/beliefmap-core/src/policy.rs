//! Mode-dependent blocking policy.
//!
//! Invoked after every classification. In sandbox mode a flag is
//! informational and growth is never blocked. In professional mode the most
//! recently flagged belief becomes the blocker, and the block lifts once that
//! same belief stops being flagged.

use crate::belief::{BeliefId, BeliefStatus, Mode};

/// How a classification changed the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockChange {
    /// The block is as it was.
    Unchanged,
    /// `node` now blocks growth (possibly replacing an earlier blocker).
    Raised { node: BeliefId, replaced: Option<BeliefId> },
    /// The block held by `node` was lifted.
    Cleared { node: BeliefId },
}

/// Decide the blocker after `node` was classified as `status`.
///
/// Returns the new blocker and a description of the change.
pub fn evaluate_block(
    mode: Mode,
    current: Option<BeliefId>,
    node: BeliefId,
    status: BeliefStatus,
) -> (Option<BeliefId>, BlockChange) {
    match mode {
        Mode::Sandbox => match current {
            // Unreachable through the store, but a sandbox map never keeps one.
            Some(held) => (None, BlockChange::Cleared { node: held }),
            None => (None, BlockChange::Unchanged),
        },
        Mode::Professional => {
            if status.is_flagged() {
                let change = if current == Some(node) {
                    BlockChange::Unchanged
                } else {
                    BlockChange::Raised {
                        node,
                        replaced: current,
                    }
                };
                (Some(node), change)
            } else if current == Some(node) {
                (None, BlockChange::Cleared { node })
            } else {
                (current, BlockChange::Unchanged)
            }
        }
    }
}
