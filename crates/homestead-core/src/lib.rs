//! Homestead Core -- the crafting-queue and asset-ledger engine.
//!
//! This crate tracks crafting, time-gated completion, and placement of
//! discrete installations owned by accounts or attached to parcels. It is a
//! single-threaded deterministic state machine: the host environment applies
//! operations sequentially, and every public operation either fully commits
//! or fully fails.
//!
//! # Craft Lifecycle
//!
//! 1. **Craft** -- [`engine::Engine::craft`] validates the type against the
//!    [`catalog::Catalog`], deducts the resource cost through the host's
//!    [`host::ResourceBank`], and either mints instantly into the owner
//!    ledger or schedules queue entries at `current + craft_time`.
//! 2. **Accelerate** -- [`engine::Engine::reduce_craft_time`] burns the
//!    accelerant token for exactly the wait blocks actually removed
//!    (clamped to the remaining distance, never below the current block).
//! 3. **Claim** -- [`engine::Engine::claim`] mints a ready entry into the
//!    owner ledger, exactly once.
//! 4. **Equip / Unequip** -- [`engine::Engine::equip`] moves a unit from
//!    the owner ledger onto a parcel under host-checked authorization and
//!    capacity rules; unequip is the symmetric transfer back.
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- Owned engine state and operation orchestrator.
//! - [`catalog::Catalog`] -- Immutable registry of installation types
//!   (frozen at build).
//! - [`ledger::Ledger`] -- Balance table with an explicit known-type set
//!   per holder.
//! - [`queue::CraftQueue`] -- Append-only schedule of time-gated crafts.
//! - [`host`] -- Contracts for the host collaborators (resource bank,
//!   accelerant token, equip authority, parcel state).
//! - [`event::Event`] -- Engine events drained by the host after each
//!   operation.
//! - [`serialize`] -- Versioned binary snapshots via bitcode.

pub mod catalog;
pub mod engine;
pub mod event;
pub mod host;
pub mod id;
pub mod ledger;
pub mod queue;
pub mod resources;
pub mod serialize;
pub mod units;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
