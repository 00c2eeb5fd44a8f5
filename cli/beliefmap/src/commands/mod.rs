//! CLI command implementations.

pub mod grow;
pub mod init;
pub mod inspect;
pub mod revise;
pub mod transfer;

use std::path::{Path, PathBuf};

use anyhow::Context;
use beliefmap_classify::{ClassifierGateway, FixedVerdict, KeywordClassifier};
use beliefmap_core::{BeliefId, BeliefNode, FileSink, GraphState, GraphStore, Verdict};

use crate::manifest::{BeliefMapManifest, ClassifierKind, DEFAULT_STATE_PATH};

/// Where a command runs: the manifest in effect and the state file it names.
pub struct Workspace {
    pub manifest: BeliefMapManifest,
    /// Directory holding the manifest, or the working directory without one.
    pub root: PathBuf,
    pub state_path: PathBuf,
    pub has_manifest: bool,
}

impl Workspace {
    /// Resolve the workspace from `cwd`, with an optional state file override.
    pub fn discover(cwd: &Path, state_override: Option<&Path>) -> anyhow::Result<Self> {
        let (manifest, root, has_manifest) = match BeliefMapManifest::find_and_load(cwd)? {
            Some((manifest, dir)) => (manifest, dir, true),
            None => (BeliefMapManifest::default(), cwd.to_path_buf(), false),
        };
        let state_path = match state_override {
            Some(path) => cwd.join(path),
            None if has_manifest => manifest.state_path(&root),
            None => cwd.join(DEFAULT_STATE_PATH),
        };
        Ok(Self {
            manifest,
            root,
            state_path,
            has_manifest,
        })
    }

    /// Open the persisted map. An absent state file yields an empty map.
    pub fn open_store(&self) -> anyhow::Result<GraphStore> {
        GraphStore::open(FileSink::new(&self.state_path))
            .with_context(|| format!("opening belief map at {}", self.state_path.display()))
    }

    /// Open the persisted map, requiring it to be initialized.
    pub fn open_initialized(&self) -> anyhow::Result<GraphStore> {
        let store = self.open_store()?;
        if !store.state().is_initialized() {
            anyhow::bail!(
                "no belief map at {}\nRun `beliefmap init <core belief>` first.",
                self.state_path.display()
            );
        }
        Ok(store)
    }

    /// The gateway for classifying: an explicit verdict wins, then the
    /// manifest's classifier kind.
    pub fn gateway(&self, verdict: Option<Verdict>) -> anyhow::Result<Box<dyn ClassifierGateway>> {
        match (verdict, self.manifest.classifier.kind) {
            (Some(v), _) => Ok(Box::new(FixedVerdict::new(v))),
            (None, ClassifierKind::Keyword) => Ok(Box::new(KeywordClassifier)),
            (None, ClassifierKind::Manual) => {
                anyhow::bail!("the manual classifier needs --verdict <status>")
            }
        }
    }
}

/// Persist and report any deferred write failure.
pub fn save(store: &mut GraphStore) -> anyhow::Result<()> {
    store.flush().context("saving belief map")
}

/// Find a belief by id prefix.
pub fn resolve_id(state: &GraphState, prefix: &str) -> anyhow::Result<BeliefId> {
    let prefix = prefix.to_ascii_lowercase();
    let matches: Vec<&BeliefNode> = state
        .nodes()
        .filter(|n| n.id.to_string().starts_with(&prefix))
        .collect();

    match matches.len() {
        0 => anyhow::bail!("no belief found with ID prefix '{prefix}'"),
        1 => Ok(matches[0].id),
        n => anyhow::bail!(
            "ambiguous ID prefix '{prefix}' matches {n} beliefs; use a longer prefix"
        ),
    }
}

/// First eight characters of an id, for tables.
pub fn short_id(id: BeliefId) -> String {
    id.to_string()[..8].to_string()
}

/// Truncate text to `max` characters with an ellipsis.
pub fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}
