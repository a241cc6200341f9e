//! File-facing schema for installation type definitions.
//!
//! These structs mirror what catalog authors write by hand; defaults keep
//! the common case short (instant craft, free, level 1, not a reservoir).

use homestead_core::catalog::{InstallationTypeDef, ReservoirStats};
use homestead_core::resources::{RESOURCE_KINDS, ResourceAmounts};
use homestead_core::units::f64_to_fixed64;
use serde::{Deserialize, Serialize};

fn default_level() -> u8 {
    1
}

/// One installation type as authored in a data file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallationTypeSpec {
    pub name: String,
    #[serde(default)]
    pub craft_time: u64,
    #[serde(default)]
    pub cost: [u64; RESOURCE_KINDS],
    #[serde(default = "default_level")]
    pub level: u8,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub deprecate_at: Option<u64>,
    #[serde(default)]
    pub reservoir: Option<ReservoirSpec>,
}

/// Reservoir stats as authored. The spill rate is written as a decimal and
/// converted to fixed-point when the catalog is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservoirSpec {
    pub spill_rate: f64,
    pub spill_radius: u32,
    pub capacity: u64,
}

impl InstallationTypeSpec {
    /// The registerable portion of the spec (deprecation flags are applied
    /// separately, in the builder's mutation phase).
    pub fn to_def(&self) -> InstallationTypeDef {
        InstallationTypeDef {
            name: self.name.clone(),
            craft_time: self.craft_time,
            cost: ResourceAmounts::new(self.cost),
            level: self.level,
            reservoir: self.reservoir.as_ref().map(|r| ReservoirStats {
                spill_rate: f64_to_fixed64(r.spill_rate),
                spill_radius: r.spill_radius,
                capacity: r.capacity,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_sparse_specs() {
        let spec: InstallationTypeSpec = serde_json::from_str(r#"{"name": "bench"}"#).unwrap();
        assert_eq!(spec.craft_time, 0);
        assert_eq!(spec.cost, [0, 0, 0, 0]);
        assert_eq!(spec.level, 1);
        assert!(!spec.deprecated);
        assert!(spec.deprecate_at.is_none());
        assert!(spec.reservoir.is_none());
    }

    #[test]
    fn to_def_converts_reservoir_rate_to_fixed_point() {
        let spec = InstallationTypeSpec {
            name: "cistern".to_string(),
            craft_time: 50,
            cost: [0, 20, 0, 5],
            level: 2,
            deprecated: false,
            deprecate_at: None,
            reservoir: Some(ReservoirSpec {
                spill_rate: 2.5,
                spill_radius: 3,
                capacity: 500,
            }),
        };
        let def = spec.to_def();
        let stats = def.reservoir.unwrap();
        assert_eq!(stats.spill_rate, f64_to_fixed64(2.5));
        assert_eq!(stats.capacity, 500);
    }
}
