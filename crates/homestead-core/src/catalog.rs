use crate::id::InstallationTypeId;
use crate::resources::ResourceAmounts;
use crate::units::{BlockNumber, Fixed64};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Spillover stats for reservoir installations. Opaque to crafting logic;
/// exposed read-only for the resource-generation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservoirStats {
    /// Resource units spilled per block.
    pub spill_rate: Fixed64,
    /// Radius of the spill area, in parcel grid cells.
    pub spill_radius: u32,
    /// Maximum stored resource before spilling begins.
    pub capacity: u64,
}

/// An installation type definition in the catalog. Immutable once the
/// catalog is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationType {
    pub id: InstallationTypeId,
    pub name: String,
    /// Blocks between crafting and claimability. `0` means instant mint.
    pub craft_time: u64,
    /// Per-unit craft cost.
    pub cost: ResourceAmounts,
    /// Tier requirement. Always >= 1.
    pub level: u8,
    pub deprecated: bool,
    /// If set, the type is treated as deprecated from this block onward
    /// even when `deprecated` was not flipped.
    pub deprecate_at: Option<BlockNumber>,
    pub reservoir: Option<ReservoirStats>,
}

impl InstallationType {
    pub fn is_reservoir(&self) -> bool {
        self.reservoir.is_some()
    }
}

/// The registerable fields of an installation type. The builder assigns
/// the id and the deprecation flags start cleared.
#[derive(Debug, Clone)]
pub struct InstallationTypeDef {
    pub name: String,
    pub craft_time: u64,
    pub cost: ResourceAmounts,
    pub level: u8,
    pub reservoir: Option<ReservoirStats>,
}

/// Builder for constructing an immutable Catalog.
/// Three-phase lifecycle: registration -> deprecation mutations -> finalization.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    types: Vec<InstallationType>,
    name_to_id: BTreeMap<String, InstallationTypeId>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase 1: Register an installation type. Returns its ID.
    pub fn register(&mut self, def: InstallationTypeDef) -> InstallationTypeId {
        let id = InstallationTypeId(self.types.len() as u32);
        self.name_to_id.insert(def.name.clone(), id);
        self.types.push(InstallationType {
            id,
            name: def.name,
            craft_time: def.craft_time,
            cost: def.cost,
            level: def.level,
            deprecated: false,
            deprecate_at: None,
            reservoir: def.reservoir,
        });
        id
    }

    /// Phase 2: Flag an existing type as deprecated, by name.
    pub fn deprecate(&mut self, name: &str) -> Result<(), CatalogError> {
        let id = self
            .name_to_id
            .get(name)
            .ok_or_else(|| CatalogError::UnknownName(name.to_string()))?;
        self.types[id.0 as usize].deprecated = true;
        Ok(())
    }

    /// Phase 2: Schedule deprecation of an existing type at a future block.
    pub fn schedule_deprecation(
        &mut self,
        name: &str,
        at_block: BlockNumber,
    ) -> Result<(), CatalogError> {
        let id = self
            .name_to_id
            .get(name)
            .ok_or_else(|| CatalogError::UnknownName(name.to_string()))?;
        self.types[id.0 as usize].deprecate_at = Some(at_block);
        Ok(())
    }

    /// Lookup a type ID by name.
    pub fn type_id(&self, name: &str) -> Option<InstallationTypeId> {
        self.name_to_id.get(name).copied()
    }

    /// Phase 3: Finalize and build the immutable catalog.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        let mut seen = std::collections::BTreeSet::new();
        for ty in &self.types {
            if !seen.insert(ty.name.as_str()) {
                return Err(CatalogError::DuplicateName(ty.name.clone()));
            }
            if ty.level == 0 {
                return Err(CatalogError::InvalidLevel(ty.name.clone()));
            }
        }

        Ok(Catalog {
            types: self.types,
            name_to_id: self.name_to_id,
        })
    }
}

/// Immutable catalog. Frozen after build(). Safe to share for concurrent reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    types: Vec<InstallationType>,
    name_to_id: BTreeMap<String, InstallationTypeId>,
}

impl Catalog {
    pub fn get(&self, id: InstallationTypeId) -> Option<&InstallationType> {
        self.types.get(id.0 as usize)
    }

    pub fn type_id(&self, name: &str) -> Option<InstallationTypeId> {
        self.name_to_id.get(name).copied()
    }

    /// Whether the type exists and may still be crafted at `at_block`.
    pub fn is_craftable(&self, id: InstallationTypeId, at_block: BlockNumber) -> bool {
        self.get(id).is_some_and(|ty| {
            !ty.deprecated && ty.deprecate_at.is_none_or(|cutoff| at_block < cutoff)
        })
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn types(&self) -> impl Iterator<Item = &InstallationType> {
        self.types.iter()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate installation type name: {0}")]
    DuplicateName(String),
    #[error("unknown installation type name: {0}")]
    UnknownName(String),
    #[error("installation type '{0}' must have a positive level")]
    InvalidLevel(String),
}
