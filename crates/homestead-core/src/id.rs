use serde::{Deserialize, Serialize};

/// Identifies an installation type in the catalog. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstallationTypeId(pub u32);

/// Identifies an entry in the craft queue. Assigned monotonically, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QueueItemId(pub u64);

/// Opaque account identifier assigned by the host environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub u64);

/// Identifies the contract family a parcel belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RealmId(pub u32);

/// Identifies a parcel: the (parent contract, parcel id) pair installations
/// attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParcelKey {
    pub realm: RealmId,
    pub parcel: u64,
}

impl ParcelKey {
    pub fn new(realm: RealmId, parcel: u64) -> Self {
        Self { realm, parcel }
    }
}
