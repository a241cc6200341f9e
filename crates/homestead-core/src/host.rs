//! Contracts for the host-environment collaborators the engine consumes.
//!
//! The engine never touches resource balances, accelerant tokens, or parcel
//! occupancy itself; the host supplies implementations of these traits with
//! every operation. Each call either fully succeeds or fully fails before
//! any engine state is mutated (the one exception, a failed accelerant burn
//! after a cost deduction, is unwound via [`ResourceBank::refund`]).

use crate::id::{AccountId, InstallationTypeId, ParcelKey};
use crate::resources::ResourceAmounts;

/// Accelerant base units burned per block of wait removed. The token uses
/// an 18-decimal native unit; one whole unit removes one block.
pub const ACCELERANT_PER_BLOCK: u128 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("insufficient resources for account {0:?}")]
pub struct InsufficientResources(pub AccountId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("insufficient accelerant balance or allowance for account {0:?}")]
pub struct InsufficientAccelerant(pub AccountId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("parcel {0:?} cannot hold another installation of type {1:?}")]
pub struct CapacityExceeded(pub ParcelKey, pub InstallationTypeId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("installation type {1:?} on parcel {0:?} still has active effects")]
pub struct StillActive(pub ParcelKey, pub InstallationTypeId);

/// Resource accounting. Deductions are atomic: either the full cost is
/// taken or nothing is.
pub trait ResourceBank {
    fn deduct(
        &mut self,
        account: AccountId,
        cost: &ResourceAmounts,
    ) -> Result<(), InsufficientResources>;

    /// Compensation credit: returns a previously deducted cost when a later
    /// step of the same operation fails. Must not fail.
    fn refund(&mut self, account: AccountId, cost: &ResourceAmounts);
}

/// The burnable accelerant token. Called only with exactly
/// `blocks_removed * ACCELERANT_PER_BLOCK` base units.
pub trait AccelerantToken {
    fn burn_from(
        &mut self,
        account: AccountId,
        base_units: u128,
    ) -> Result<(), InsufficientAccelerant>;
}

/// Restricts equip/unequip to the designated parcel-controller identity.
pub trait EquipAuthority {
    fn is_authorized_caller(&self, requester: AccountId) -> bool;
}

/// Parcel occupancy and effect state, owned by the host.
pub trait ParcelState {
    /// Whether the parcel can take one more installation of this type.
    fn check_capacity(
        &self,
        parcel: ParcelKey,
        installation_type: InstallationTypeId,
    ) -> Result<(), CapacityExceeded>;

    /// Whether dependent effects (e.g. active resource generation) have been
    /// stopped, a precondition for unequipping.
    fn check_dependent_effects_clear(
        &self,
        parcel: ParcelKey,
        installation_type: InstallationTypeId,
    ) -> Result<(), StillActive>;
}
