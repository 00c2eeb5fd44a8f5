//! `beliefmap.toml` parsing and session configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use beliefmap_core::{LayoutConfig, Mode};
use serde::{Deserialize, Serialize};

/// Name of the manifest file searched for.
pub const MANIFEST_FILE: &str = "beliefmap.toml";

/// Where the sealed state file lives when nothing else says so.
pub const DEFAULT_STATE_PATH: &str = ".beliefmap/state.bmap";

/// The top-level manifest. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeliefMapManifest {
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub layout: LayoutSection,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// `[map]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// State file path, relative to the manifest's directory.
    #[serde(default = "default_state_path")]
    pub state: String,
    /// Mode used by `beliefmap init` when `--mode` is not given.
    #[serde(default)]
    pub mode: Option<String>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            state: default_state_path(),
            mode: None,
        }
    }
}

fn default_state_path() -> String {
    DEFAULT_STATE_PATH.to_string()
}

/// `[layout]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSection {
    pub inner_radius: f64,
    pub min_ring_step: f64,
    pub radius_fraction: f64,
    /// Viewport used by `beliefmap layout` when none is given.
    pub width: f64,
    pub height: f64,
}

impl Default for LayoutSection {
    fn default() -> Self {
        let geometry = LayoutConfig::default();
        Self {
            inner_radius: geometry.inner_radius,
            min_ring_step: geometry.min_ring_step,
            radius_fraction: geometry.radius_fraction,
            width: 1000.0,
            height: 1000.0,
        }
    }
}

impl LayoutSection {
    pub fn geometry(&self) -> LayoutConfig {
        LayoutConfig {
            inner_radius: self.inner_radius,
            min_ring_step: self.min_ring_step,
            radius_fraction: self.radius_fraction,
        }
    }
}

/// `[classifier]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub kind: ClassifierKind,
}

/// Which gateway judges new beliefs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// Offline keyword rules.
    #[default]
    Keyword,
    /// The verdict is given on the command line with `--verdict`.
    Manual,
}

impl BeliefMapManifest {
    /// Search upward from `start_dir` for a `beliefmap.toml` file, parse and
    /// return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest: BeliefMapManifest = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Parse a manifest from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing beliefmap.toml")
    }

    /// The state file, resolved against the manifest's directory.
    pub fn state_path(&self, manifest_dir: &Path) -> PathBuf {
        manifest_dir.join(&self.map.state)
    }

    /// The configured default mode, if any.
    pub fn default_mode(&self) -> Result<Option<Mode>> {
        self.map
            .mode
            .as_deref()
            .map(|m| {
                m.parse::<Mode>()
                    .map_err(|e| anyhow::anyhow!("[map] mode: {e}"))
            })
            .transpose()
    }

    /// Generate the default template for `beliefmap init`.
    pub fn template(mode: Mode) -> String {
        let mode = mode.to_string().to_lowercase();
        format!(
            r#"[map]
state = "{DEFAULT_STATE_PATH}"
mode = "{mode}"

[layout]
width = 1000.0
height = 1000.0

[classifier]
kind = "keyword"
"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_manifest() {
        let toml_str = r#"
[map]
state = "maps/ethics.bmap"
mode = "professional"

[layout]
inner_radius = 30.0
min_ring_step = 80.0
radius_fraction = 0.4
width = 1600.0
height = 900.0

[classifier]
kind = "manual"
"#;
        let manifest = BeliefMapManifest::from_str(toml_str).unwrap();
        assert_eq!(manifest.map.state, "maps/ethics.bmap");
        assert_eq!(manifest.default_mode().unwrap(), Some(Mode::Professional));
        assert_eq!(manifest.classifier.kind, ClassifierKind::Manual);
        let geometry = manifest.layout.geometry();
        assert_eq!(geometry.inner_radius, 30.0);
        assert_eq!(geometry.min_ring_step, 80.0);
        assert_eq!(manifest.layout.width, 1600.0);
        assert_eq!(
            manifest.state_path(Path::new("/work")),
            Path::new("/work/maps/ethics.bmap")
        );
    }

    #[test]
    fn parse_empty_manifest() {
        let manifest = BeliefMapManifest::from_str("").unwrap();
        assert_eq!(manifest.map.state, DEFAULT_STATE_PATH);
        assert_eq!(manifest.default_mode().unwrap(), None);
        assert_eq!(manifest.classifier.kind, ClassifierKind::Keyword);
        assert_eq!(manifest.layout.geometry(), LayoutConfig::default());
        assert_eq!(manifest.layout.height, 1000.0);
    }

    #[test]
    fn partial_layout_keeps_defaults() {
        let manifest = BeliefMapManifest::from_str("[layout]\nwidth = 500.0\n").unwrap();
        assert_eq!(manifest.layout.width, 500.0);
        assert_eq!(manifest.layout.height, 1000.0);
        assert_eq!(manifest.layout.inner_radius, 40.0);
    }

    #[test]
    fn reject_bad_mode_and_kind() {
        let manifest = BeliefMapManifest::from_str("[map]\nmode = \"chaotic\"\n").unwrap();
        assert!(manifest.default_mode().is_err());
        assert!(BeliefMapManifest::from_str("[classifier]\nkind = \"oracle\"\n").is_err());
    }

    #[test]
    fn reject_invalid_toml() {
        assert!(BeliefMapManifest::from_str("this is not valid toml [[[").is_err());
    }

    #[test]
    fn template_is_valid_toml() {
        let template = BeliefMapManifest::template(Mode::Sandbox);
        let manifest = BeliefMapManifest::from_str(&template).unwrap();
        assert_eq!(manifest.default_mode().unwrap(), Some(Mode::Sandbox));
        assert_eq!(manifest.map.state, DEFAULT_STATE_PATH);
    }

    #[test]
    fn find_and_load_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "[map]\nmode = \"sandbox\"\n").unwrap();

        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let (manifest, found_dir) = BeliefMapManifest::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(found_dir, dir.path());
        assert_eq!(manifest.default_mode().unwrap(), Some(Mode::Sandbox));
    }

    #[test]
    fn find_and_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "[map\n").unwrap();
        let err = BeliefMapManifest::find_and_load(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing"));
    }
}
