//! Persistence sinks for the graph store.
//!
//! The store writes the full state after every mutation. Where it goes is up
//! to the [`StateSink`] the store was built with.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{BeliefError, Result};
use crate::serialize::MapFile;
use crate::state::GraphState;

/// Destination for persisted belief map state.
pub trait StateSink {
    /// Load the previously persisted state, if any.
    fn load(&self) -> Result<Option<GraphState>>;

    /// Persist the full state.
    fn persist(&mut self, state: &GraphState) -> Result<()>;

    /// Forget any persisted state.
    fn clear(&mut self) -> Result<()>;
}

/// Discards everything. For sessions that are never saved.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl StateSink for NullSink {
    fn load(&self) -> Result<Option<GraphState>> {
        Ok(None)
    }

    fn persist(&mut self, _state: &GraphState) -> Result<()> {
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Keeps the last exported JSON record in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    record: Option<String>,
    writes: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last persisted record.
    pub fn record(&self) -> Option<&str> {
        self.record.as_deref()
    }

    /// How many times state was persisted.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl StateSink for MemorySink {
    fn load(&self) -> Result<Option<GraphState>> {
        self.record.as_deref().map(GraphState::from_json).transpose()
    }

    fn persist(&mut self, state: &GraphState) -> Result<()> {
        self.record = Some(state.to_json()?);
        self.writes += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.record = None;
        Ok(())
    }
}

/// Writes the sealed [`MapFile`] format to a path on disk.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, detail: String) -> BeliefError {
        BeliefError::Persist {
            path: self.path.clone(),
            detail,
        }
    }
}

impl StateSink for FileSink {
    fn load(&self) -> Result<Option<GraphState>> {
        if !self.path.is_file() {
            return Ok(None);
        }
        let data = std::fs::read(&self.path).map_err(|e| self.io_error(format!("reading: {e}")))?;
        let file = MapFile::from_bytes(&data)?;
        debug!(path = %self.path.display(), nodes = file.state.node_count(), "loaded belief map");
        Ok(Some(file.state))
    }

    fn persist(&mut self, state: &GraphState) -> Result<()> {
        if !state.is_initialized() {
            return self.clear();
        }
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .map_err(|e| self.io_error(format!("creating directory: {e}")))?;
        }
        let bytes = MapFile::new(state.clone()).to_bytes()?;
        std::fs::write(&self.path, bytes).map_err(|e| self.io_error(format!("writing: {e}")))?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .map_err(|e| self.io_error(format!("removing: {e}")))?;
        }
        Ok(())
    }
}
