//! The craft queue: append-only table of scheduled, time-gated crafts.
//!
//! Entries are keyed by a monotonically assigned [`QueueItemId`] and are
//! never deleted. `ready_at` only ever moves downward (acceleration) and
//! `claimed` flips false -> true exactly once.

use crate::id::{AccountId, InstallationTypeId, QueueItemId};
use crate::units::BlockNumber;
use serde::{Deserialize, Serialize};

/// A pending, time-gated craft awaiting claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: QueueItemId,
    /// The only account allowed to claim or accelerate this entry.
    pub owner: AccountId,
    pub installation_type: InstallationTypeId,
    /// First block at which the entry may be claimed. Mutable only downward.
    pub ready_at: BlockNumber,
    /// Write-once. A claimed entry is never mutated again.
    pub claimed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("queue entry {0:?} does not exist")]
    NotFound(QueueItemId),
    #[error("account {caller:?} does not own queue entry {id:?}")]
    NotOwner { id: QueueItemId, caller: AccountId },
    #[error("queue entry {0:?} was already claimed")]
    AlreadyClaimed(QueueItemId),
    #[error("queue entry {id:?} is already ready at block {ready_at}")]
    AlreadyReady { id: QueueItemId, ready_at: BlockNumber },
    #[error("queue entry {id:?} is not ready until block {ready_at} (current {current})")]
    NotReady {
        id: QueueItemId,
        ready_at: BlockNumber,
        current: BlockNumber,
    },
}

/// Append-only craft schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftQueue {
    entries: Vec<QueueEntry>,
}

impl CraftQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id and store a new, unclaimed entry.
    pub fn schedule(
        &mut self,
        owner: AccountId,
        installation_type: InstallationTypeId,
        ready_at: BlockNumber,
    ) -> QueueItemId {
        let id = QueueItemId(self.entries.len() as u64);
        self.entries.push(QueueEntry {
            id,
            owner,
            installation_type,
            ready_at,
            claimed: false,
        });
        id
    }

    pub fn get(&self, id: QueueItemId) -> Option<&QueueEntry> {
        self.entries.get(id.0 as usize)
    }

    /// Validate an acceleration and compute the clamped block count it would
    /// remove, without mutating the entry. The engine burns the accelerant
    /// for exactly this amount before committing via [`accelerate`], so a
    /// failed burn leaves the queue untouched.
    ///
    /// [`accelerate`]: CraftQueue::accelerate
    pub fn quote_accelerate(
        &self,
        id: QueueItemId,
        caller: AccountId,
        requested: u64,
        current: BlockNumber,
    ) -> Result<u64, QueueError> {
        let entry = self.get(id).ok_or(QueueError::NotFound(id))?;
        if entry.owner != caller {
            return Err(QueueError::NotOwner { id, caller });
        }
        if entry.claimed {
            return Err(QueueError::AlreadyClaimed(id));
        }
        if current >= entry.ready_at {
            return Err(QueueError::AlreadyReady {
                id,
                ready_at: entry.ready_at,
            });
        }
        Ok(requested.min(entry.ready_at - current))
    }

    /// Remove up to `requested` blocks of remaining wait, clamped to the
    /// distance left. Returns the blocks actually removed; `ready_at` never
    /// drops below `current`.
    pub fn accelerate(
        &mut self,
        id: QueueItemId,
        caller: AccountId,
        requested: u64,
        current: BlockNumber,
    ) -> Result<u64, QueueError> {
        let removed = self.quote_accelerate(id, caller, requested, current)?;
        let Some(entry) = self.entries.get_mut(id.0 as usize) else {
            return Err(QueueError::NotFound(id));
        };
        entry.ready_at -= removed;
        Ok(removed)
    }

    /// Mark an entry claimed and return its installation type for minting.
    pub fn claim(
        &mut self,
        id: QueueItemId,
        caller: AccountId,
        current: BlockNumber,
    ) -> Result<InstallationTypeId, QueueError> {
        let Some(entry) = self.entries.get_mut(id.0 as usize) else {
            return Err(QueueError::NotFound(id));
        };
        if entry.owner != caller {
            return Err(QueueError::NotOwner { id, caller });
        }
        if entry.claimed {
            return Err(QueueError::AlreadyClaimed(id));
        }
        if current < entry.ready_at {
            return Err(QueueError::NotReady {
                id,
                ready_at: entry.ready_at,
                current,
            });
        }
        entry.claimed = true;
        Ok(entry.installation_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unclaimed entries belonging to `owner`, in scheduling order.
    pub fn pending_for(&self, owner: AccountId) -> Vec<&QueueEntry> {
        self.entries
            .iter()
            .filter(|e| e.owner == owner && !e.claimed)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId(1)
    }

    fn bob() -> AccountId {
        AccountId(2)
    }

    fn ty() -> InstallationTypeId {
        InstallationTypeId(0)
    }

    #[test]
    fn schedule_assigns_monotonic_ids() {
        let mut q = CraftQueue::new();
        let a = q.schedule(alice(), ty(), 100);
        let b = q.schedule(alice(), ty(), 200);
        assert_eq!(a, QueueItemId(0));
        assert_eq!(b, QueueItemId(1));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn accelerate_clamps_to_remaining_distance() {
        let mut q = CraftQueue::new();
        let id = q.schedule(alice(), ty(), 1100);
        // 50 blocks remain at block 1050; requesting 150 removes only 50.
        let removed = q.accelerate(id, alice(), 150, 1050).unwrap();
        assert_eq!(removed, 50);
        assert_eq!(q.get(id).unwrap().ready_at, 1050);
    }

    #[test]
    fn accelerate_partial_leaves_remaining_wait() {
        let mut q = CraftQueue::new();
        let id = q.schedule(alice(), ty(), 1100);
        let removed = q.accelerate(id, alice(), 30, 1000).unwrap();
        assert_eq!(removed, 30);
        assert_eq!(q.get(id).unwrap().ready_at, 1070);
    }

    #[test]
    fn accelerate_rejects_non_owner() {
        let mut q = CraftQueue::new();
        let id = q.schedule(alice(), ty(), 1100);
        let result = q.accelerate(id, bob(), 10, 1000);
        assert!(matches!(result, Err(QueueError::NotOwner { .. })));
        assert_eq!(q.get(id).unwrap().ready_at, 1100);
    }

    #[test]
    fn accelerate_rejects_already_ready() {
        let mut q = CraftQueue::new();
        let id = q.schedule(alice(), ty(), 1100);
        let result = q.accelerate(id, alice(), 10, 1100);
        assert!(matches!(result, Err(QueueError::AlreadyReady { .. })));
    }

    #[test]
    fn quote_matches_accelerate_without_mutating() {
        let mut q = CraftQueue::new();
        let id = q.schedule(alice(), ty(), 1100);
        let quoted = q.quote_accelerate(id, alice(), 999, 1040).unwrap();
        assert_eq!(q.get(id).unwrap().ready_at, 1100);
        let removed = q.accelerate(id, alice(), 999, 1040).unwrap();
        assert_eq!(quoted, removed);
    }

    #[test]
    fn claim_requires_readiness_and_ownership() {
        let mut q = CraftQueue::new();
        let id = q.schedule(alice(), ty(), 1100);

        let result = q.claim(id, alice(), 1099);
        assert!(matches!(result, Err(QueueError::NotReady { .. })));

        let result = q.claim(id, bob(), 1100);
        assert!(matches!(result, Err(QueueError::NotOwner { .. })));

        assert_eq!(q.claim(id, alice(), 1100).unwrap(), ty());
    }

    #[test]
    fn claim_is_exactly_once() {
        let mut q = CraftQueue::new();
        let id = q.schedule(alice(), ty(), 100);
        q.claim(id, alice(), 100).unwrap();
        let result = q.claim(id, alice(), 101);
        assert!(matches!(result, Err(QueueError::AlreadyClaimed(_))));
    }

    #[test]
    fn claimed_entries_cannot_be_accelerated() {
        let mut q = CraftQueue::new();
        let id = q.schedule(alice(), ty(), 100);
        q.claim(id, alice(), 100).unwrap();
        let result = q.accelerate(id, alice(), 10, 50);
        assert!(matches!(result, Err(QueueError::AlreadyClaimed(_))));
    }

    #[test]
    fn unknown_entry_errors() {
        let mut q = CraftQueue::new();
        assert!(matches!(
            q.claim(QueueItemId(9), alice(), 100),
            Err(QueueError::NotFound(_))
        ));
        assert!(matches!(
            q.accelerate(QueueItemId(9), alice(), 1, 100),
            Err(QueueError::NotFound(_))
        ));
    }

    #[test]
    fn pending_for_filters_owner_and_claimed() {
        let mut q = CraftQueue::new();
        let a = q.schedule(alice(), ty(), 100);
        q.schedule(bob(), ty(), 100);
        let c = q.schedule(alice(), ty(), 200);
        q.claim(a, alice(), 100).unwrap();

        let pending = q.pending_for(alice());
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, c);
    }
}
