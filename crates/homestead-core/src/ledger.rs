//! Balance ledgers: `(holder, installation type) -> quantity` with an
//! explicit per-holder set of known type ids for enumeration.
//!
//! Two instances live in the engine: one keyed by [`AccountId`] (owned
//! installations) and one keyed by [`ParcelKey`] (installations attached to
//! a parcel). Invariant: a type id is a member of a holder's known set iff
//! its balance is non-zero.
//!
//! [`AccountId`]: crate::id::AccountId
//! [`ParcelKey`]: crate::id::ParcelKey

use crate::id::InstallationTypeId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Keys a ledger instance. Ordered so enumeration and snapshots are
/// deterministic.
pub trait HolderKey: Copy + Ord + std::fmt::Debug {}

impl<T: Copy + Ord + std::fmt::Debug> HolderKey for T {}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient balance of {installation_type:?} for {holder}: have {have}, need {need}")]
    InsufficientBalance {
        holder: String,
        installation_type: InstallationTypeId,
        have: u64,
        need: u64,
    },
}

/// A balance table for one holder-key space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger<K: HolderKey> {
    balances: BTreeMap<K, BTreeMap<InstallationTypeId, u64>>,
    known: BTreeMap<K, BTreeSet<InstallationTypeId>>,
}

impl<K: HolderKey> Default for Ledger<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: HolderKey> Ledger<K> {
    pub fn new() -> Self {
        Self {
            balances: BTreeMap::new(),
            known: BTreeMap::new(),
        }
    }

    /// Increase a balance. A zero amount is a no-op and does not register
    /// the type id in the known set.
    pub fn credit(&mut self, holder: K, installation_type: InstallationTypeId, amount: u64) {
        if amount == 0 {
            return;
        }
        let slot = self
            .balances
            .entry(holder)
            .or_default()
            .entry(installation_type)
            .or_insert(0);
        *slot = slot.saturating_add(amount);
        self.known.entry(holder).or_default().insert(installation_type);
    }

    /// Decrease a balance. Fails without mutating if `amount` exceeds the
    /// current balance. A balance that reaches zero is pruned from both the
    /// balance table and the known set.
    pub fn debit(
        &mut self,
        holder: K,
        installation_type: InstallationTypeId,
        amount: u64,
    ) -> Result<(), LedgerError> {
        if amount == 0 {
            return Ok(());
        }
        let have = self.balance_of(holder, installation_type);
        if amount > have {
            return Err(LedgerError::InsufficientBalance {
                holder: format!("{holder:?}"),
                installation_type,
                have,
                need: amount,
            });
        }

        let remaining = have - amount;
        if remaining == 0 {
            if let Some(types) = self.balances.get_mut(&holder) {
                types.remove(&installation_type);
                if types.is_empty() {
                    self.balances.remove(&holder);
                }
            }
            if let Some(set) = self.known.get_mut(&holder) {
                set.remove(&installation_type);
                if set.is_empty() {
                    self.known.remove(&holder);
                }
            }
        } else if let Some(types) = self.balances.get_mut(&holder)
            && let Some(slot) = types.get_mut(&installation_type)
        {
            *slot = remaining;
        }
        Ok(())
    }

    pub fn balance_of(&self, holder: K, installation_type: InstallationTypeId) -> u64 {
        self.balances
            .get(&holder)
            .and_then(|types| types.get(&installation_type))
            .copied()
            .unwrap_or(0)
    }

    /// All (type id, quantity) pairs with non-zero balance for a holder,
    /// sorted by type id.
    pub fn enumerate(&self, holder: K) -> Vec<(InstallationTypeId, u64)> {
        let Some(set) = self.known.get(&holder) else {
            return Vec::new();
        };
        set.iter()
            .map(|&ty| (ty, self.balance_of(holder, ty)))
            .collect()
    }

    /// Number of holders with at least one non-zero balance.
    pub fn holder_count(&self) -> usize {
        self.known.len()
    }

    /// Diagnostic: the known set matches the non-zero balance entries
    /// exactly. Checked by property tests; always true for a ledger mutated
    /// only through `credit`/`debit`.
    pub fn is_consistent(&self) -> bool {
        let from_balances: BTreeMap<K, BTreeSet<InstallationTypeId>> = self
            .balances
            .iter()
            .map(|(holder, types)| {
                (
                    *holder,
                    types
                        .iter()
                        .filter(|&(_, &q)| q > 0)
                        .map(|(&ty, _)| ty)
                        .collect::<BTreeSet<_>>(),
                )
            })
            .filter(|entry| !entry.1.is_empty())
            .collect();
        from_balances == self.known
    }
}
