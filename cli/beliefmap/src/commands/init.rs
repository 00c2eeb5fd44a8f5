//! `beliefmap init`: start a new belief map around a core belief.

use beliefmap_core::Mode;

use super::{save, short_id, Workspace};
use crate::manifest::{BeliefMapManifest, MANIFEST_FILE};

pub fn run(
    ws: &Workspace,
    core: &str,
    mode: Option<Mode>,
    notes: Option<&str>,
    confidence: Option<u8>,
    force: bool,
) -> anyhow::Result<()> {
    let mut store = ws.open_store()?;
    if store.state().is_initialized() && !force {
        anyhow::bail!(
            "a belief map already exists at {}\nPass --force to replace it.",
            ws.state_path.display()
        );
    }

    let mode = match mode {
        Some(mode) => mode,
        None => ws.manifest.default_mode()?.unwrap_or_default(),
    };

    let core_id = store.initialize(mode, core, notes.map(str::to_string), confidence)?;
    save(&mut store)?;

    if !ws.has_manifest {
        let manifest_path = ws.root.join(MANIFEST_FILE);
        std::fs::write(&manifest_path, BeliefMapManifest::template(mode))?;
        println!("Created {}", manifest_path.display());
    }

    println!("Initialized {mode} belief map at {}", ws.state_path.display());
    println!("  Core: {} ({})", core.trim(), short_id(core_id));
    if mode == Mode::Professional {
        println!("  A flagged belief will block growth until it is re-evaluated.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use beliefmap_core::BeliefStatus;

    #[test]
    fn init_creates_state_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::discover(dir.path(), None).unwrap();
        run(&ws, "Everyone deserves dignity", Some(Mode::Professional), None, None, false).unwrap();

        assert!(ws.state_path.is_file());
        assert!(dir.path().join(MANIFEST_FILE).is_file());

        let store = ws.open_initialized().unwrap();
        let core = store.state().core().unwrap();
        assert_eq!(core.status, BeliefStatus::Protected);
        assert_eq!(core.confidence, 100);
        assert_eq!(store.state().mode(), Mode::Professional);
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::discover(dir.path(), None).unwrap();
        run(&ws, "First core belief", None, None, None, false).unwrap();
        assert!(run(&ws, "Second core belief", None, None, None, false).is_err());

        let ws = Workspace::discover(dir.path(), None).unwrap();
        run(&ws, "Second core belief", None, None, Some(80), true).unwrap();
        let store = ws.open_initialized().unwrap();
        assert_eq!(store.state().core().unwrap().text, "Second core belief");
    }

    #[test]
    fn init_uses_manifest_mode() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "[map]\nmode = \"professional\"\n").unwrap();
        let ws = Workspace::discover(dir.path(), None).unwrap();
        run(&ws, "Everyone deserves dignity", None, None, None, false).unwrap();
        assert_eq!(ws.open_initialized().unwrap().state().mode(), Mode::Professional);
    }
}
