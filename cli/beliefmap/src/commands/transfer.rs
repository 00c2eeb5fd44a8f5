//! `beliefmap export` and `beliefmap import`: move a map as a JSON record.

use std::path::Path;

use anyhow::Context;

use super::{save, Workspace};

/// Write the map, history included, to `output` or stdout.
pub fn export(ws: &Workspace, output: Option<&Path>) -> anyhow::Result<()> {
    let store = ws.open_initialized()?;
    let json = store.export_json()?;

    match output {
        Some(path) => {
            std::fs::write(path, json.as_bytes())
                .with_context(|| format!("writing {}", path.display()))?;
            eprintln!(
                "Exported {} beliefs to {}",
                store.state().node_count(),
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Replace the map with the record in `path`.
pub fn import(ws: &Workspace, path: &Path) -> anyhow::Result<()> {
    let json =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

    let mut store = ws.open_store()?;
    store
        .import_json(&json)
        .with_context(|| format!("importing {}", path.display()))?;
    save(&mut store)?;

    let state = store.state();
    println!(
        "Imported {} map with {} beliefs ({} undo steps)",
        state.mode(),
        state.node_count(),
        state.history().len()
    );
    Ok(())
}
