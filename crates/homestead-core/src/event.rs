//! Events emitted by the engine for observability by external indexers.
//!
//! Events are buffered inside the engine and drained by the host after each
//! operation. They are transient: snapshots do not include them.

use crate::id::{AccountId, InstallationTypeId, ParcelKey, QueueItemId};
use crate::units::BlockNumber;

/// An engine event. All events carry the block at which they occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// An instant craft (or a claim) minted installations into the owner ledger.
    Minted {
        owner: AccountId,
        installation_type: InstallationTypeId,
        quantity: u64,
        block: BlockNumber,
    },
    /// A time-gated craft was scheduled.
    Scheduled {
        id: QueueItemId,
        owner: AccountId,
        installation_type: InstallationTypeId,
        ready_at: BlockNumber,
        block: BlockNumber,
    },
    /// An accelerant burn removed wait blocks from a queue entry.
    TimeReduced {
        id: QueueItemId,
        blocks_removed: u64,
        block: BlockNumber,
    },
    /// A queue entry was claimed.
    Claimed { id: QueueItemId, block: BlockNumber },
    /// An installation moved from an owner ledger onto a parcel.
    Equipped {
        parcel: ParcelKey,
        installation_type: InstallationTypeId,
        block: BlockNumber,
    },
    /// An installation moved from a parcel back to its owner.
    Unequipped {
        parcel: ParcelKey,
        installation_type: InstallationTypeId,
        block: BlockNumber,
    },
}
