//! Commands that change the map without consulting a classifier.

use beliefmap_core::Mode;

use super::{resolve_id, save, short_id, Workspace};

/// `beliefmap select [id]`: choose where the next belief attaches. Without
/// an id, new beliefs attach to the core.
pub fn select(ws: &Workspace, id: Option<&str>) -> anyhow::Result<()> {
    let mut store = ws.open_initialized()?;
    let id = id.map(|p| resolve_id(store.state(), p)).transpose()?;
    store.select_active(id);
    save(&mut store)?;

    match id.and_then(|id| store.state().node(id)) {
        Some(node) => println!("New beliefs attach to {} \"{}\"", short_id(node.id), node.text),
        None => println!("New beliefs attach to the core"),
    }
    Ok(())
}

/// `beliefmap edit <id>`: change notes and confidence.
pub fn edit(
    ws: &Workspace,
    id: &str,
    notes: Option<&str>,
    confidence: Option<u8>,
) -> anyhow::Result<()> {
    let mut store = ws.open_initialized()?;
    let id = resolve_id(store.state(), id)?;
    let Some(node) = store.state().node(id) else {
        anyhow::bail!("no belief {id}");
    };

    let notes = notes.map(str::to_string).or_else(|| node.notes.clone());
    let confidence = confidence.unwrap_or(node.confidence);
    store.update_notes_confidence(id, notes, confidence)?;
    save(&mut store)?;

    println!("Updated {} (confidence {confidence})", short_id(id));
    Ok(())
}

/// `beliefmap revise <id> <text>`: reword a belief ahead of re-evaluation.
pub fn revise(ws: &Workspace, id: &str, text: &str) -> anyhow::Result<()> {
    let mut store = ws.open_initialized()?;
    let id = resolve_id(store.state(), id)?;
    store.revise_text(id, text)?;
    save(&mut store)?;

    println!("Revised {}", short_id(id));
    if let Some(node) = store.state().node(id) {
        if node.status.is_flagged() {
            println!(
                "  Still {} until re-evaluated: beliefmap reanalyze {}",
                node.status,
                short_id(id)
            );
        }
    }
    Ok(())
}

/// `beliefmap undo`: roll back the last insertion (sandbox only).
pub fn undo(ws: &Workspace) -> anyhow::Result<()> {
    let mut store = ws.open_initialized()?;
    if store.state().mode() != Mode::Sandbox {
        anyhow::bail!("undo is only available in sandbox mode");
    }
    if !store.undo()? {
        println!("Nothing to undo.");
        return Ok(());
    }
    save(&mut store)?;
    println!(
        "Undone. {} beliefs, {} more undo steps.",
        store.state().node_count(),
        store.state().history().len()
    );
    Ok(())
}

/// `beliefmap reset`: discard the map.
pub fn reset(ws: &Workspace) -> anyhow::Result<()> {
    let mut store = ws.open_store()?;
    store.reset()?;
    println!("Removed belief map at {}", ws.state_path.display());
    Ok(())
}
