//! Fixtures shared by unit, integration, and property tests: a small
//! catalog and in-memory host collaborators.

use crate::catalog::{Catalog, CatalogBuilder, InstallationTypeDef, ReservoirStats};
use crate::host::{
    AccelerantToken, CapacityExceeded, EquipAuthority, InsufficientAccelerant,
    InsufficientResources, ParcelState, ResourceBank, StillActive,
};
use crate::id::{AccountId, InstallationTypeId, ParcelKey, RealmId};
use crate::resources::ResourceAmounts;
use crate::units::Fixed64;
use std::collections::{BTreeSet, HashMap};

pub fn alice() -> AccountId {
    AccountId(1)
}

pub fn bob() -> AccountId {
    AccountId(2)
}

pub fn parcel_a() -> ParcelKey {
    ParcelKey::new(RealmId(0), 7)
}

pub fn parcel_b() -> ParcelKey {
    ParcelKey::new(RealmId(0), 8)
}

/// Instant type: craft time 0, cost [5,0,0,0], level 1.
pub fn campfire() -> InstallationTypeId {
    InstallationTypeId(0)
}

/// Timed type: craft time 100, cost [10,0,0,0], level 1.
pub fn harvester() -> InstallationTypeId {
    InstallationTypeId(1)
}

/// Reservoir type: craft time 50, cost [0,20,0,5], level 2.
pub fn cistern() -> InstallationTypeId {
    InstallationTypeId(2)
}

/// Flag-deprecated type.
pub fn obsolete() -> InstallationTypeId {
    InstallationTypeId(3)
}

/// Deprecates at block 2000.
pub fn sunset() -> InstallationTypeId {
    InstallationTypeId(4)
}

pub fn sample_catalog() -> Catalog {
    let mut b = CatalogBuilder::new();
    b.register(InstallationTypeDef {
        name: "campfire".to_string(),
        craft_time: 0,
        cost: ResourceAmounts::new([5, 0, 0, 0]),
        level: 1,
        reservoir: None,
    });
    b.register(InstallationTypeDef {
        name: "harvester".to_string(),
        craft_time: 100,
        cost: ResourceAmounts::new([10, 0, 0, 0]),
        level: 1,
        reservoir: None,
    });
    b.register(InstallationTypeDef {
        name: "cistern".to_string(),
        craft_time: 50,
        cost: ResourceAmounts::new([0, 20, 0, 5]),
        level: 2,
        reservoir: Some(ReservoirStats {
            spill_rate: Fixed64::from_num(2),
            spill_radius: 3,
            capacity: 500,
        }),
    });
    b.register(InstallationTypeDef {
        name: "obsolete".to_string(),
        craft_time: 10,
        cost: ResourceAmounts::new([1, 0, 0, 0]),
        level: 1,
        reservoir: None,
    });
    b.register(InstallationTypeDef {
        name: "sunset".to_string(),
        craft_time: 0,
        cost: ResourceAmounts::new([1, 0, 0, 0]),
        level: 1,
        reservoir: None,
    });
    b.deprecate("obsolete").expect("obsolete is registered");
    b.schedule_deprecation("sunset", 2000)
        .expect("sunset is registered");
    b.build().expect("sample catalog is valid")
}

/// In-memory resource bank.
#[derive(Debug, Default)]
pub struct TestBank {
    balances: HashMap<AccountId, ResourceAmounts>,
    /// Count of successful deductions, for asserting call patterns.
    pub deductions: u32,
}

impl TestBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, account: AccountId, amounts: ResourceAmounts) {
        let entry = self.balances.entry(account).or_default();
        *entry = entry.saturating_add(&amounts);
    }

    pub fn balance(&self, account: AccountId) -> ResourceAmounts {
        self.balances.get(&account).copied().unwrap_or_default()
    }
}

impl ResourceBank for TestBank {
    fn deduct(
        &mut self,
        account: AccountId,
        cost: &ResourceAmounts,
    ) -> Result<(), InsufficientResources> {
        let have = self.balance(account);
        let remaining = have
            .checked_sub(cost)
            .ok_or(InsufficientResources(account))?;
        self.balances.insert(account, remaining);
        self.deductions += 1;
        Ok(())
    }

    fn refund(&mut self, account: AccountId, cost: &ResourceAmounts) {
        self.grant(account, *cost);
    }
}

/// In-memory accelerant token with a burn log.
#[derive(Debug, Default)]
pub struct TestAccelerant {
    balances: HashMap<AccountId, u128>,
    pub burned: Vec<(AccountId, u128)>,
}

impl TestAccelerant {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, account: AccountId, base_units: u128) {
        *self.balances.entry(account).or_default() += base_units;
    }

    pub fn total_burned(&self, account: AccountId) -> u128 {
        self.burned
            .iter()
            .filter(|(a, _)| *a == account)
            .map(|(_, units)| units)
            .sum()
    }
}

impl AccelerantToken for TestAccelerant {
    fn burn_from(
        &mut self,
        account: AccountId,
        base_units: u128,
    ) -> Result<(), InsufficientAccelerant> {
        let balance = self.balances.entry(account).or_default();
        if *balance < base_units {
            return Err(InsufficientAccelerant(account));
        }
        *balance -= base_units;
        self.burned.push((account, base_units));
        Ok(())
    }
}

/// Authorizes exactly one caller, the designated parcel controller.
#[derive(Debug)]
pub struct Gatekeeper {
    authorized: AccountId,
}

impl Gatekeeper {
    pub fn new(authorized: AccountId) -> Self {
        Self { authorized }
    }
}

impl EquipAuthority for Gatekeeper {
    fn is_authorized_caller(&self, requester: AccountId) -> bool {
        requester == self.authorized
    }
}

/// Parcel occupancy stub: parcels/types marked full reject equips, those
/// marked active reject unequips.
#[derive(Debug, Default)]
pub struct ParcelRules {
    full: BTreeSet<(ParcelKey, InstallationTypeId)>,
    active: BTreeSet<(ParcelKey, InstallationTypeId)>,
}

impl ParcelRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_full(&mut self, parcel: ParcelKey, installation_type: InstallationTypeId) {
        self.full.insert((parcel, installation_type));
    }

    pub fn mark_active(&mut self, parcel: ParcelKey, installation_type: InstallationTypeId) {
        self.active.insert((parcel, installation_type));
    }
}

impl ParcelState for ParcelRules {
    fn check_capacity(
        &self,
        parcel: ParcelKey,
        installation_type: InstallationTypeId,
    ) -> Result<(), CapacityExceeded> {
        if self.full.contains(&(parcel, installation_type)) {
            return Err(CapacityExceeded(parcel, installation_type));
        }
        Ok(())
    }

    fn check_dependent_effects_clear(
        &self,
        parcel: ParcelKey,
        installation_type: InstallationTypeId,
    ) -> Result<(), StillActive> {
        if self.active.contains(&(parcel, installation_type)) {
            return Err(StillActive(parcel, installation_type));
        }
        Ok(())
    }
}
