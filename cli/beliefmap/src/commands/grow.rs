//! `beliefmap add`, `reanalyze` and `suggest`: commands that consult a
//! classifier.

use beliefmap_classify::{suggest_next, CannedSuggestions, Outcome, Session, SessionError};
use beliefmap_core::{GraphStore, NewBelief, Verdict};

use super::{resolve_id, save, short_id, Workspace};

/// Confidence given to a new belief when none is supplied.
pub const DEFAULT_CONFIDENCE: u8 = 60;

/// `beliefmap add <text>`: insert a belief and classify it.
pub fn add(
    ws: &Workspace,
    text: &str,
    notes: Option<&str>,
    confidence: u8,
    parent: Option<&str>,
    verdict: Option<Verdict>,
) -> anyhow::Result<()> {
    let store = ws.open_initialized()?;
    let parent = parent.map(|p| resolve_id(store.state(), p)).transpose()?;

    let mut belief = NewBelief::new(text, confidence);
    if let Some(notes) = notes {
        belief = belief.with_notes(notes);
    }

    let mut session = Session::new(store, ws.gateway(verdict)?);
    let outcome = match session.grow(belief, parent) {
        Ok(outcome) => outcome,
        Err(SessionError::Blocked(blocker)) => {
            let text = session
                .store()
                .state()
                .node(blocker)
                .map(|n| n.text.clone())
                .unwrap_or_default();
            anyhow::bail!(
                "growth is blocked by {} \"{text}\"\nRevise it and run `beliefmap reanalyze`.",
                short_id(blocker)
            );
        }
        Err(e) => return Err(e.into()),
    };

    let mut store = session.into_store();
    save(&mut store)?;
    report(&store, &outcome);
    Ok(())
}

/// `beliefmap reanalyze [id]`: classify a belief again. Without an id, the
/// belief blocking growth is re-evaluated.
pub fn reanalyze(ws: &Workspace, id: Option<&str>, verdict: Option<Verdict>) -> anyhow::Result<()> {
    let store = ws.open_initialized()?;
    let id = id.map(|p| resolve_id(store.state(), p)).transpose()?;

    let mut session = Session::new(store, ws.gateway(verdict)?);
    let outcome = match id {
        Some(id) => session.reanalyze(id)?,
        None => session.reanalyze_blocker()?,
    };

    let mut store = session.into_store();
    save(&mut store)?;
    report(&store, &outcome);
    Ok(())
}

/// `beliefmap suggest`: propose a next belief (sandbox only).
pub fn suggest(ws: &Workspace) -> anyhow::Result<()> {
    let store = ws.open_initialized()?;
    let suggestion = suggest_next(store.state(), &CannedSuggestions)?;

    println!("Suggested belief: {}", suggestion.suggested_belief);
    println!("  Notes hint: {}", suggestion.notes_hint);
    println!("  Confidence: {}", suggestion.confidence);
    println!();
    println!(
        "Add it with: beliefmap add \"{}\" --confidence {}",
        suggestion.suggested_belief, suggestion.confidence
    );
    Ok(())
}

fn report(store: &GraphStore, outcome: &Outcome) {
    let state = store.state();
    let id = outcome.belief();
    let Some(node) = state.node(id) else {
        return;
    };

    match outcome {
        Outcome::Classified { response, .. } => {
            println!("{} [{}] {}", short_id(id), response.status, node.text);
            if !response.summary.is_empty() {
                println!("  {}", response.summary);
            }
        }
        Outcome::Failed { error, .. } => {
            println!("{} [{}] {}", short_id(id), node.status, node.text);
            println!("  classifier failed: {error}");
        }
    }

    if state.blocked_by() == Some(id) {
        println!("  Growth is blocked until this belief is revised and re-evaluated.");
    } else if let Some(blocker) = state.blocked_by() {
        println!("  Growth remains blocked by {}.", short_id(blocker));
    }
}
