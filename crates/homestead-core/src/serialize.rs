//! Snapshot support for the engine.
//!
//! Binary serialization via `bitcode` with a versioned header. Catalog,
//! both ledgers, and the craft queue are persistent; pending events are
//! transient and dropped on restore.

use crate::catalog::Catalog;
use crate::engine::Engine;
use crate::id::{AccountId, ParcelKey};
use crate::ledger::Ledger;
use crate::queue::CraftQueue;
use crate::units::BlockNumber;
use serde::{Deserialize, Serialize};

/// Magic number identifying a homestead engine snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x484F_4D45;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

/// Header prepended to every snapshot. Enables format detection and version
/// checking before trusting the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Block number at which the snapshot was captured.
    pub block: BlockNumber,
}

impl SnapshotHeader {
    pub fn new(block: BlockNumber) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            block,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

/// The serializable portion of the engine state. Excludes the pending
/// event buffer (transient by contract).
#[derive(Debug, Serialize, Deserialize)]
struct EngineSnapshot {
    header: SnapshotHeader,
    catalog: Catalog,
    owned: Ledger<AccountId>,
    attached: Ledger<ParcelKey>,
    queue: CraftQueue,
}

/// Read just the header from serialized data, for version detection before
/// deciding whether to restore.
pub fn read_snapshot_header(data: &[u8]) -> Result<SnapshotHeader, DeserializeError> {
    let snapshot: EngineSnapshot =
        bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
    Ok(snapshot.header)
}

impl Engine {
    /// Serialize the full persistent state, stamped with the capture block.
    pub fn save(&self, at_block: BlockNumber) -> Result<Vec<u8>, SerializeError> {
        let snapshot = EngineSnapshot {
            header: SnapshotHeader::new(at_block),
            catalog: self.catalog.clone(),
            owned: self.owned.clone(),
            attached: self.attached.clone(),
            queue: self.queue.clone(),
        };
        bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Restore an engine from a snapshot. The pending event buffer starts
    /// empty.
    pub fn restore(data: &[u8]) -> Result<Engine, DeserializeError> {
        let snapshot: EngineSnapshot =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        snapshot.header.validate()?;
        Ok(Engine {
            catalog: snapshot.catalog,
            owned: snapshot.owned,
            attached: snapshot.attached,
            queue: snapshot.queue,
            events: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_validates_current_version() {
        let header = SnapshotHeader::new(42);
        assert!(header.validate().is_ok());
        assert_eq!(header.block, 42);
    }

    #[test]
    fn header_rejects_wrong_magic() {
        let header = SnapshotHeader {
            magic: 0xDEAD_BEEF,
            version: FORMAT_VERSION,
            block: 0,
        };
        assert!(matches!(
            header.validate(),
            Err(DeserializeError::InvalidMagic(0xDEAD_BEEF))
        ));
    }

    #[test]
    fn header_rejects_future_version() {
        let header = SnapshotHeader {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION + 1,
            block: 0,
        };
        assert!(matches!(
            header.validate(),
            Err(DeserializeError::FutureVersion(_))
        ));
    }

    #[test]
    fn garbage_data_fails_to_decode() {
        assert!(matches!(
            Engine::restore(&[0xFF, 0x00, 0x13, 0x37]),
            Err(DeserializeError::Decode(_))
        ));
    }
}
