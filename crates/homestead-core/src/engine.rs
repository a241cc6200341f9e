//! The crafting engine: orchestrates catalog validation, cost deduction,
//! queue scheduling, claiming, acceleration, and equip/unequip transfers.
//!
//! The engine is a single-threaded deterministic state machine. Every public
//! operation is a transaction boundary: all validation and fallible
//! collaborator calls happen before the first internal mutation, so a
//! failure leaves no partial state behind. The one two-step external
//! sequence (cost deduction followed by an accelerant burn) is unwound with
//! [`ResourceBank::refund`] when the burn fails.

use crate::catalog::Catalog;
use crate::event::Event;
use crate::host::{
    ACCELERANT_PER_BLOCK, AccelerantToken, EquipAuthority, InsufficientAccelerant,
    InsufficientResources, ParcelState, ResourceBank,
};
use crate::id::{AccountId, InstallationTypeId, ParcelKey, QueueItemId};
use crate::ledger::{Ledger, LedgerError};
use crate::queue::{CraftQueue, QueueError};
use crate::units::BlockNumber;

// ---------------------------------------------------------------------------
// Errors and outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CraftError {
    #[error("unknown installation type {0:?}")]
    NotFound(InstallationTypeId),
    #[error("installation type {0:?} is deprecated")]
    Deprecated(InstallationTypeId),
    #[error("craft amount must be non-zero")]
    InvalidAmount,
    #[error("cost arithmetic overflow for {amount} units of {installation_type:?}")]
    CostOverflow {
        installation_type: InstallationTypeId,
        amount: u64,
    },
    #[error(transparent)]
    Resources(#[from] InsufficientResources),
    #[error(transparent)]
    Accelerant(#[from] InsufficientAccelerant),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("queue ids and amounts differ in length: {ids} vs {amounts}")]
    ArgumentMismatch { ids: usize, amounts: usize },
    #[error("request {index} failed: {source}")]
    Request {
        index: usize,
        #[source]
        source: CraftError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum EquipError {
    #[error("caller {0:?} is not authorized to equip or unequip")]
    Unauthorized(AccountId),
    #[error(transparent)]
    Capacity(#[from] crate::host::CapacityExceeded),
    #[error(transparent)]
    StillActive(#[from] crate::host::StillActive),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// What a craft produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CraftOutcome {
    /// The type was instant; the units landed in the owner ledger directly.
    Minted {
        installation_type: InstallationTypeId,
        quantity: u64,
    },
    /// The type is time-gated; one queue entry per unit was scheduled.
    Queued {
        ids: Vec<QueueItemId>,
        ready_at: BlockNumber,
    },
}

/// One request in a batch craft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CraftRequest {
    pub installation_type: InstallationTypeId,
    /// Units of this type to produce. Zero is rejected.
    pub amount: u64,
    /// Wait blocks to remove per unit, clamped to the craft time.
    pub acceleration_budget: u64,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Owned engine state: catalog, the two ledgers, the craft queue, and the
/// pending event buffer. Multiple independent instances may coexist (tests
/// rely on this); nothing here is process-global.
#[derive(Debug)]
pub struct Engine {
    pub(crate) catalog: Catalog,
    /// Installations held by accounts.
    pub(crate) owned: Ledger<AccountId>,
    /// Installations attached to parcels.
    pub(crate) attached: Ledger<ParcelKey>,
    pub(crate) queue: CraftQueue,
    /// Events emitted since last drain. Transient; excluded from snapshots.
    pub(crate) events: Vec<Event>,
}

impl Engine {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            owned: Ledger::new(),
            attached: Ledger::new(),
            queue: CraftQueue::new(),
            events: Vec::new(),
        }
    }

    // -- Read API --

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn queue(&self) -> &CraftQueue {
        &self.queue
    }

    /// Ledger of installations held by accounts.
    pub fn owned(&self) -> &Ledger<AccountId> {
        &self.owned
    }

    /// Ledger of installations attached to parcels.
    pub fn attached(&self) -> &Ledger<ParcelKey> {
        &self.attached
    }

    // -- Event API --

    /// Drain all pending events. Returns events and clears the internal list.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Read-only view of pending events.
    pub fn pending_events(&self) -> &[Event] {
        &self.events
    }

    // -- Crafting --

    /// Craft `amount` units of one installation type. This is the single
    /// primitive behind both one-off and batch crafting.
    ///
    /// Instant types (craft time 0) mint straight into the owner ledger.
    /// Time-gated types get one queue entry per unit at
    /// `current + craft_time`, each accelerated by `acceleration_budget`
    /// (clamped to the craft time); the accelerant burn covers exactly the
    /// blocks actually removed across all units.
    #[allow(clippy::too_many_arguments)]
    pub fn craft<B: ResourceBank, A: AccelerantToken>(
        &mut self,
        bank: &mut B,
        accelerant: &mut A,
        requester: AccountId,
        installation_type: InstallationTypeId,
        amount: u64,
        acceleration_budget: u64,
        current: BlockNumber,
    ) -> Result<CraftOutcome, CraftError> {
        let (craft_time, unit_cost) = match self.catalog.get(installation_type) {
            Some(ty) => (ty.craft_time, ty.cost),
            None => return Err(CraftError::NotFound(installation_type)),
        };
        if !self.catalog.is_craftable(installation_type, current) {
            return Err(CraftError::Deprecated(installation_type));
        }
        if amount == 0 {
            return Err(CraftError::InvalidAmount);
        }

        let overflow = || CraftError::CostOverflow {
            installation_type,
            amount,
        };
        let total_cost = unit_cost.checked_scale(amount).ok_or_else(overflow)?;

        // Everything fallible about the accelerant is computed up front so a
        // deducted cost can be unwound on burn failure.
        let per_unit_removed = acceleration_budget.min(craft_time);
        let burn_total = (per_unit_removed as u128)
            .checked_mul(amount as u128)
            .and_then(|b| b.checked_mul(ACCELERANT_PER_BLOCK))
            .ok_or_else(overflow)?;

        bank.deduct(requester, &total_cost)?;

        if craft_time == 0 {
            self.owned.credit(requester, installation_type, amount);
            self.events.push(Event::Minted {
                owner: requester,
                installation_type,
                quantity: amount,
                block: current,
            });
            return Ok(CraftOutcome::Minted {
                installation_type,
                quantity: amount,
            });
        }

        if burn_total > 0
            && let Err(e) = accelerant.burn_from(requester, burn_total)
        {
            bank.refund(requester, &total_cost);
            return Err(e.into());
        }

        let ready_at = current.saturating_add(craft_time);
        let mut ids = Vec::with_capacity(amount as usize);
        for _ in 0..amount {
            let id = self.queue.schedule(requester, installation_type, ready_at);
            self.events.push(Event::Scheduled {
                id,
                owner: requester,
                installation_type,
                ready_at,
                block: current,
            });
            if per_unit_removed > 0 {
                let removed =
                    self.queue
                        .accelerate(id, requester, acceleration_budget, current)?;
                debug_assert_eq!(removed, per_unit_removed);
                self.events.push(Event::TimeReduced {
                    id,
                    blocks_removed: removed,
                    block: current,
                });
            }
            ids.push(id);
        }

        Ok(CraftOutcome::Queued {
            ids,
            ready_at: ready_at - per_unit_removed,
        })
    }

    /// Apply a sequence of craft requests. Each request is atomic on its
    /// own; the first failure aborts the remaining batch while the effects
    /// of earlier requests stay committed.
    pub fn batch_craft<B: ResourceBank, A: AccelerantToken>(
        &mut self,
        bank: &mut B,
        accelerant: &mut A,
        requester: AccountId,
        requests: &[CraftRequest],
        current: BlockNumber,
    ) -> Result<Vec<CraftOutcome>, BatchError> {
        let mut outcomes = Vec::with_capacity(requests.len());
        for (index, req) in requests.iter().enumerate() {
            let outcome = self
                .craft(
                    bank,
                    accelerant,
                    requester,
                    req.installation_type,
                    req.amount,
                    req.acceleration_budget,
                    current,
                )
                .map_err(|source| BatchError::Request { index, source })?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    // -- Claiming --

    /// Claim one ready queue entry and mint its installation to the owner.
    pub fn claim(
        &mut self,
        requester: AccountId,
        id: QueueItemId,
        current: BlockNumber,
    ) -> Result<InstallationTypeId, QueueError> {
        let installation_type = self.queue.claim(id, requester, current)?;
        self.owned.credit(requester, installation_type, 1);
        self.events.push(Event::Claimed { id, block: current });
        Ok(installation_type)
    }

    /// Claim many entries. Claims of unrelated entries are causally
    /// independent, so each id is tried on its own and failures do not block
    /// the rest of the call.
    pub fn claim_many(
        &mut self,
        requester: AccountId,
        ids: &[QueueItemId],
        current: BlockNumber,
    ) -> Vec<(QueueItemId, Result<InstallationTypeId, QueueError>)> {
        ids.iter()
            .map(|&id| (id, self.claim(requester, id, current)))
            .collect()
    }

    // -- Acceleration --

    /// Remove wait blocks from queue entries, burning the accelerant for
    /// exactly the blocks actually removed (clamped per entry). `ids` and
    /// `amounts` are parallel arrays. The first failure aborts the remaining
    /// pairs; earlier pairs stay committed.
    pub fn reduce_craft_time<A: AccelerantToken>(
        &mut self,
        accelerant: &mut A,
        requester: AccountId,
        ids: &[QueueItemId],
        amounts: &[u64],
        current: BlockNumber,
    ) -> Result<Vec<u64>, BatchError> {
        if ids.len() != amounts.len() {
            return Err(BatchError::ArgumentMismatch {
                ids: ids.len(),
                amounts: amounts.len(),
            });
        }

        let mut removed_per_entry = Vec::with_capacity(ids.len());
        for (index, (&id, &requested)) in ids.iter().zip(amounts.iter()).enumerate() {
            let wrap = |source: CraftError| BatchError::Request { index, source };

            // Quote first: the burn must cover the clamped amount, and a
            // failed burn must leave the entry untouched.
            let removed = self
                .queue
                .quote_accelerate(id, requester, requested, current)
                .map_err(|e| wrap(e.into()))?;
            if removed > 0 {
                accelerant
                    .burn_from(requester, removed as u128 * ACCELERANT_PER_BLOCK)
                    .map_err(|e| wrap(e.into()))?;
                let applied = self
                    .queue
                    .accelerate(id, requester, requested, current)
                    .map_err(|e| wrap(e.into()))?;
                debug_assert_eq!(applied, removed);
                self.events.push(Event::TimeReduced {
                    id,
                    blocks_removed: applied,
                    block: current,
                });
            }
            removed_per_entry.push(removed);
        }
        Ok(removed_per_entry)
    }

    // -- Equip / unequip --

    /// Move one unit of an installation from the owner ledger onto a parcel.
    /// All checks precede the first mutation; the debit/credit pair commits
    /// together or not at all.
    #[allow(clippy::too_many_arguments)]
    pub fn equip<Auth: EquipAuthority, P: ParcelState>(
        &mut self,
        authority: &Auth,
        parcels: &P,
        requester: AccountId,
        owner: AccountId,
        parcel: ParcelKey,
        installation_type: InstallationTypeId,
        current: BlockNumber,
    ) -> Result<(), EquipError> {
        if !authority.is_authorized_caller(requester) {
            return Err(EquipError::Unauthorized(requester));
        }
        let have = self.owned.balance_of(owner, installation_type);
        if have < 1 {
            return Err(LedgerError::InsufficientBalance {
                holder: format!("{owner:?}"),
                installation_type,
                have,
                need: 1,
            }
            .into());
        }
        parcels.check_capacity(parcel, installation_type)?;

        self.owned.debit(owner, installation_type, 1)?;
        self.attached.credit(parcel, installation_type, 1);
        self.events.push(Event::Equipped {
            parcel,
            installation_type,
            block: current,
        });
        Ok(())
    }

    /// Move one unit of an installation from a parcel back to its owner.
    #[allow(clippy::too_many_arguments)]
    pub fn unequip<Auth: EquipAuthority, P: ParcelState>(
        &mut self,
        authority: &Auth,
        parcels: &P,
        requester: AccountId,
        owner: AccountId,
        parcel: ParcelKey,
        installation_type: InstallationTypeId,
        current: BlockNumber,
    ) -> Result<(), EquipError> {
        if !authority.is_authorized_caller(requester) {
            return Err(EquipError::Unauthorized(requester));
        }
        let have = self.attached.balance_of(parcel, installation_type);
        if have < 1 {
            return Err(LedgerError::InsufficientBalance {
                holder: format!("{parcel:?}"),
                installation_type,
                have,
                need: 1,
            }
            .into());
        }
        parcels.check_dependent_effects_clear(parcel, installation_type)?;

        self.attached.debit(parcel, installation_type, 1)?;
        self.owned.credit(owner, installation_type, 1);
        self.events.push(Event::Unequipped {
            parcel,
            installation_type,
            block: current,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ResourceAmounts;
    use crate::test_utils::*;

    #[test]
    fn unknown_type_fails_before_deduction() {
        let mut engine = Engine::new(sample_catalog());
        let mut bank = TestBank::new();
        bank.grant(alice(), ResourceAmounts::new([100, 0, 0, 0]));
        let mut accelerant = TestAccelerant::new();

        let result = engine.craft(
            &mut bank,
            &mut accelerant,
            alice(),
            InstallationTypeId(99),
            1,
            0,
            10,
        );
        assert!(matches!(result, Err(CraftError::NotFound(_))));
        assert_eq!(bank.balance(alice()), ResourceAmounts::new([100, 0, 0, 0]));
    }

    #[test]
    fn zero_amount_fails_before_deduction() {
        let mut engine = Engine::new(sample_catalog());
        let mut bank = TestBank::new();
        bank.grant(alice(), ResourceAmounts::new([100, 0, 0, 0]));
        let mut accelerant = TestAccelerant::new();

        let result = engine.craft(&mut bank, &mut accelerant, alice(), campfire(), 0, 0, 10);
        assert!(matches!(result, Err(CraftError::InvalidAmount)));
        assert_eq!(bank.balance(alice()), ResourceAmounts::new([100, 0, 0, 0]));
    }

    #[test]
    fn deprecated_type_fails_despite_resources() {
        let mut engine = Engine::new(sample_catalog());
        let mut bank = TestBank::new();
        bank.grant(alice(), ResourceAmounts::new([1000, 0, 0, 0]));
        let mut accelerant = TestAccelerant::new();

        let result = engine.craft(&mut bank, &mut accelerant, alice(), obsolete(), 1, 0, 10);
        assert!(matches!(result, Err(CraftError::Deprecated(_))));
    }

    #[test]
    fn scheduled_deprecation_closes_crafting_window() {
        let mut engine = Engine::new(sample_catalog());
        let mut bank = TestBank::new();
        bank.grant(alice(), ResourceAmounts::new([100, 0, 0, 0]));
        let mut accelerant = TestAccelerant::new();

        // sunset deprecates at block 2000: craftable before, not after.
        engine
            .craft(&mut bank, &mut accelerant, alice(), sunset(), 1, 0, 1999)
            .unwrap();
        let result = engine.craft(&mut bank, &mut accelerant, alice(), sunset(), 1, 0, 2000);
        assert!(matches!(result, Err(CraftError::Deprecated(_))));
    }

    #[test]
    fn instant_type_mints_without_queueing() {
        let mut engine = Engine::new(sample_catalog());
        let mut bank = TestBank::new();
        bank.grant(alice(), ResourceAmounts::new([100, 0, 0, 0]));
        let mut accelerant = TestAccelerant::new();

        let outcome = engine
            .craft(&mut bank, &mut accelerant, alice(), campfire(), 3, 0, 10)
            .unwrap();
        assert_eq!(
            outcome,
            CraftOutcome::Minted {
                installation_type: campfire(),
                quantity: 3
            }
        );
        assert!(engine.queue().is_empty());
        assert_eq!(engine.owned().balance_of(alice(), campfire()), 3);
        // campfire costs [5,0,0,0] per unit.
        assert_eq!(bank.balance(alice()), ResourceAmounts::new([85, 0, 0, 0]));
    }

    #[test]
    fn timed_type_queues_one_entry_per_unit() {
        let mut engine = Engine::new(sample_catalog());
        let mut bank = TestBank::new();
        bank.grant(alice(), ResourceAmounts::new([100, 0, 0, 0]));
        let mut accelerant = TestAccelerant::new();

        let outcome = engine
            .craft(&mut bank, &mut accelerant, alice(), harvester(), 2, 0, 1000)
            .unwrap();
        let CraftOutcome::Queued { ids, ready_at } = outcome else {
            panic!("expected Queued outcome");
        };
        assert_eq!(ids.len(), 2);
        assert_eq!(ready_at, 1100);
        assert_eq!(engine.queue().len(), 2);
        assert_eq!(engine.owned().balance_of(alice(), harvester()), 0);
    }

    #[test]
    fn craft_budget_burns_exactly_clamped_blocks() {
        let mut engine = Engine::new(sample_catalog());
        let mut bank = TestBank::new();
        bank.grant(alice(), ResourceAmounts::new([100, 0, 0, 0]));
        let mut accelerant = TestAccelerant::new();
        accelerant.grant(alice(), u128::MAX);

        // harvester takes 100 blocks; a budget of 130 is clamped to 100.
        let outcome = engine
            .craft(&mut bank, &mut accelerant, alice(), harvester(), 1, 130, 1000)
            .unwrap();
        let CraftOutcome::Queued { ids, ready_at } = outcome else {
            panic!("expected Queued outcome");
        };
        assert_eq!(ready_at, 1000);
        assert_eq!(engine.queue().get(ids[0]).unwrap().ready_at, 1000);
        assert_eq!(accelerant.total_burned(alice()), 100 * ACCELERANT_PER_BLOCK);
    }

    #[test]
    fn failed_burn_refunds_cost_and_queues_nothing() {
        let mut engine = Engine::new(sample_catalog());
        let mut bank = TestBank::new();
        bank.grant(alice(), ResourceAmounts::new([10, 0, 0, 0]));
        let mut accelerant = TestAccelerant::new(); // no accelerant balance

        let result = engine.craft(&mut bank, &mut accelerant, alice(), harvester(), 1, 50, 1000);
        assert!(matches!(result, Err(CraftError::Accelerant(_))));
        assert_eq!(bank.balance(alice()), ResourceAmounts::new([10, 0, 0, 0]));
        assert!(engine.queue().is_empty());
        assert!(engine.pending_events().is_empty());
    }

    #[test]
    fn insufficient_resources_propagates() {
        let mut engine = Engine::new(sample_catalog());
        let mut bank = TestBank::new();
        bank.grant(alice(), ResourceAmounts::new([9, 0, 0, 0]));
        let mut accelerant = TestAccelerant::new();

        let result = engine.craft(&mut bank, &mut accelerant, alice(), harvester(), 1, 0, 1000);
        assert!(matches!(result, Err(CraftError::Resources(_))));
        assert!(engine.queue().is_empty());
    }

    #[test]
    fn cost_overflow_detected_before_deduction() {
        let mut engine = Engine::new(sample_catalog());
        let mut bank = TestBank::new();
        bank.grant(alice(), ResourceAmounts::new([u64::MAX, 0, 0, 0]));
        let mut accelerant = TestAccelerant::new();

        let result = engine.craft(
            &mut bank,
            &mut accelerant,
            alice(),
            harvester(),
            u64::MAX,
            0,
            1000,
        );
        assert!(matches!(result, Err(CraftError::CostOverflow { .. })));
        assert_eq!(
            bank.balance(alice()),
            ResourceAmounts::new([u64::MAX, 0, 0, 0])
        );
    }

    #[test]
    fn claim_mints_one_unit() {
        let mut engine = Engine::new(sample_catalog());
        let mut bank = TestBank::new();
        bank.grant(alice(), ResourceAmounts::new([10, 0, 0, 0]));
        let mut accelerant = TestAccelerant::new();

        let outcome = engine
            .craft(&mut bank, &mut accelerant, alice(), harvester(), 1, 0, 1000)
            .unwrap();
        let CraftOutcome::Queued { ids, .. } = outcome else {
            panic!("expected Queued outcome");
        };

        let ty = engine.claim(alice(), ids[0], 1100).unwrap();
        assert_eq!(ty, harvester());
        assert_eq!(engine.owned().balance_of(alice(), harvester()), 1);
    }

    #[test]
    fn reduce_craft_time_rejects_length_mismatch() {
        let mut engine = Engine::new(sample_catalog());
        let mut accelerant = TestAccelerant::new();
        let result = engine.reduce_craft_time(
            &mut accelerant,
            alice(),
            &[QueueItemId(0)],
            &[10, 20],
            1000,
        );
        assert!(matches!(result, Err(BatchError::ArgumentMismatch { .. })));
    }

    #[test]
    fn zero_requested_blocks_burn_nothing() {
        let mut engine = Engine::new(sample_catalog());
        let mut bank = TestBank::new();
        bank.grant(alice(), ResourceAmounts::new([10, 0, 0, 0]));
        let mut accelerant = TestAccelerant::new();

        let CraftOutcome::Queued { ids, .. } = engine
            .craft(&mut bank, &mut accelerant, alice(), harvester(), 1, 0, 1000)
            .unwrap()
        else {
            panic!("expected Queued outcome");
        };

        let removed = engine
            .reduce_craft_time(&mut accelerant, alice(), &ids, &[0], 1010)
            .unwrap();
        assert_eq!(removed, vec![0]);
        assert_eq!(accelerant.total_burned(alice()), 0);
    }
}
