//! Sealed on-disk state file format.
//!
//! Wraps the exported JSON record in a small binary envelope so truncation
//! and corruption are caught before the record is trusted.
//!
//! Layout:
//!   [magic: 4 bytes "BMAP"] [version_major: 1] [version_minor: 1]
//!   [mode: 1] [reserved: 1] [node_count: u32 LE] [edge_count: u32 LE]
//!   [payload_length: u32 LE] [json_payload: N bytes] [sha256: 32 bytes]

use sha2::{Digest, Sha256};

use crate::belief::Mode;
use crate::error::{BeliefError, Result};
use crate::state::GraphState;

const MAP_MAGIC: [u8; 4] = *b"BMAP";

const VERSION_MAJOR: u8 = 0;
const VERSION_MINOR: u8 = 1;

const HEADER_SIZE: usize = 4 + 1 + 1 + 1 + 1 + 4 + 4 + 4; // 20 bytes

const HASH_SIZE: usize = 32;

/// A sealed belief map file.
#[derive(Debug, Clone)]
pub struct MapFile {
    pub state: GraphState,
}

impl MapFile {
    pub fn new(state: GraphState) -> Self {
        Self { state }
    }

    /// Seal the state into bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let json =
            serde_json::to_vec(&self.state).map_err(|e| BeliefError::Serialization(e.to_string()))?;

        let mut buf = Vec::with_capacity(HEADER_SIZE + json.len() + HASH_SIZE);
        buf.extend_from_slice(&MAP_MAGIC);
        buf.push(VERSION_MAJOR);
        buf.push(VERSION_MINOR);
        buf.push(mode_byte(self.state.mode()));
        buf.push(0);
        buf.extend_from_slice(&(self.state.node_count() as u32).to_le_bytes());
        buf.extend_from_slice(&(self.state.edge_count() as u32).to_le_bytes());
        buf.extend_from_slice(&(json.len() as u32).to_le_bytes());
        buf.extend_from_slice(&json);

        let hash = Sha256::digest(&buf);
        buf.extend_from_slice(&hash);

        Ok(buf)
    }

    /// Open sealed bytes, verifying envelope, hash, counts and the record's
    /// own invariants.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE + HASH_SIZE {
            return Err(BeliefError::TooShort {
                expected: HEADER_SIZE + HASH_SIZE,
                actual: data.len(),
            });
        }

        if data[0..4] != MAP_MAGIC {
            return Err(BeliefError::InvalidMagic);
        }

        let major = data[4];
        let minor = data[5];
        if major != VERSION_MAJOR {
            return Err(BeliefError::UnsupportedVersion { major, minor });
        }

        let node_count = read_u32(data, 8);
        let edge_count = read_u32(data, 12);
        let payload_len = read_u32(data, 16) as usize;

        let payload_end = HEADER_SIZE + payload_len;
        if data.len() < payload_end + HASH_SIZE {
            return Err(BeliefError::TooShort {
                expected: payload_end + HASH_SIZE,
                actual: data.len(),
            });
        }

        let stored_hash = &data[payload_end..payload_end + HASH_SIZE];
        let computed_hash = Sha256::digest(&data[..payload_end]);
        if computed_hash.as_slice() != stored_hash {
            return Err(BeliefError::IntegrityFailed {
                expected: hex_encode(stored_hash),
                actual: hex_encode(computed_hash.as_slice()),
            });
        }

        let json = std::str::from_utf8(&data[HEADER_SIZE..payload_end])
            .map_err(|e| BeliefError::Deserialization(e.to_string()))?;
        let state = GraphState::from_json(json)?;

        if state.node_count() != node_count as usize {
            return Err(BeliefError::Deserialization(format!(
                "node count mismatch: header says {node_count}, payload has {}",
                state.node_count()
            )));
        }
        if state.edge_count() != edge_count as usize {
            return Err(BeliefError::Deserialization(format!(
                "edge count mismatch: header says {edge_count}, payload has {}",
                state.edge_count()
            )));
        }
        if data[6] != mode_byte(state.mode()) {
            return Err(BeliefError::Deserialization(
                "mode byte disagrees with payload".into(),
            ));
        }

        Ok(Self { state })
    }
}

fn mode_byte(mode: Mode) -> u8 {
    match mode {
        Mode::Sandbox => 0,
        Mode::Professional => 1,
    }
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::belief::NewBelief;
    use crate::store::GraphStore;

    fn sample_state() -> GraphState {
        let mut store = GraphStore::in_memory();
        store
            .initialize(Mode::Professional, "Human well-being matters", None, Some(90))
            .unwrap();
        store
            .insert_pending(NewBelief::new("Clean air improves health", 80), None)
            .unwrap();
        store.state().clone()
    }

    #[test]
    fn sealed_round_trip() {
        let state = sample_state();
        let bytes = MapFile::new(state.clone()).to_bytes().unwrap();
        assert_eq!(&bytes[0..4], b"BMAP");
        let opened = MapFile::from_bytes(&bytes).unwrap();
        assert_eq!(opened.state, state);
    }

    #[test]
    fn invalid_magic() {
        let mut data = vec![0x00; 100];
        data[0..4].copy_from_slice(b"NOPE");
        assert!(matches!(
            MapFile::from_bytes(&data),
            Err(BeliefError::InvalidMagic)
        ));
    }

    #[test]
    fn corruption_detected() {
        let mut bytes = MapFile::new(sample_state()).to_bytes().unwrap();
        bytes[HEADER_SIZE + 3] ^= 0xFF;
        assert!(matches!(
            MapFile::from_bytes(&bytes),
            Err(BeliefError::IntegrityFailed { .. })
        ));
    }

    #[test]
    fn truncation_detected() {
        let bytes = MapFile::new(sample_state()).to_bytes().unwrap();
        let cut = &bytes[..bytes.len() - 10];
        assert!(matches!(
            MapFile::from_bytes(cut),
            Err(BeliefError::TooShort { .. })
        ));
        assert!(matches!(
            MapFile::from_bytes(b"BMAP"),
            Err(BeliefError::TooShort { .. })
        ));
    }

    #[test]
    fn future_major_version_rejected() {
        let mut bytes = MapFile::new(sample_state()).to_bytes().unwrap();
        bytes[4] = 9;
        assert!(matches!(
            MapFile::from_bytes(&bytes),
            Err(BeliefError::UnsupportedVersion { major: 9, .. })
        ));
    }
}
