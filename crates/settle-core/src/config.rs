//! Engine tuning knobs.
//!
//! [`EngineConfig`] is the human-facing form (plain `f64`/`u32`, every field
//! defaulted so data files only list what they change). It is validated and
//! converted once into [`Tuning`], the fixed-point form the tick loop reads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed64, f64_to_fixed64};
use crate::resource::{ResourceAmounts, ResourceType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for cosmetic terrain generation.
    pub seed: u64,
    /// Global water level at which water extraction stops.
    pub water_ceiling: f64,
    /// Extractor fill ratio that triggers an overflow drain.
    pub extractor_overflow_threshold: f64,
    /// Processing building fill ratio that triggers an overflow drain.
    pub processing_overflow_threshold: f64,
    /// A storage neighbor must have strictly more spare room than this.
    pub min_storage_spare: f64,
    /// Units per tick moved by a connection created without an explicit rate.
    pub default_connection_rate: f64,
    pub food_per_capita: f64,
    pub water_per_capita: f64,
    pub win_population: u32,
    pub win_components: f64,
    pub initial_population: u32,
    pub max_population: u32,
    /// When set, population grows by one per tick while both food and water
    /// stay at or above this amount after consumption.
    pub growth_surplus: Option<f64>,
    pub starting_inventory: BTreeMap<ResourceType, f64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            water_ceiling: 200.0,
            extractor_overflow_threshold: 0.8,
            processing_overflow_threshold: 0.7,
            min_storage_spare: 10.0,
            default_connection_rate: 1.0,
            food_per_capita: 0.5,
            water_per_capita: 0.3,
            win_population: 10,
            win_components: 50.0,
            initial_population: 1,
            max_population: 20,
            growth_surplus: None,
            starting_inventory: BTreeMap::from([
                (ResourceType::Food, 10.0),
                (ResourceType::Wood, 20.0),
                (ResourceType::Stone, 10.0),
            ]),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("initial population {initial} must be in 1..={max}")]
    Population { initial: u32, max: u32 },
}

fn check(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    // NaN fails both comparisons, so it is rejected here too.
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Keep every quantity well inside Fixed64's integer range.
        const LIMIT: f64 = 1.0e9;

        check("water_ceiling", self.water_ceiling, 0.0, LIMIT)?;
        check(
            "extractor_overflow_threshold",
            self.extractor_overflow_threshold,
            0.0,
            1.0,
        )?;
        check(
            "processing_overflow_threshold",
            self.processing_overflow_threshold,
            0.0,
            1.0,
        )?;
        check("min_storage_spare", self.min_storage_spare, 0.0, LIMIT)?;
        check(
            "default_connection_rate",
            self.default_connection_rate,
            f64::MIN_POSITIVE,
            LIMIT,
        )?;
        check("food_per_capita", self.food_per_capita, 0.0, LIMIT)?;
        check("water_per_capita", self.water_per_capita, 0.0, LIMIT)?;
        check("win_components", self.win_components, 0.0, LIMIT)?;
        if let Some(surplus) = self.growth_surplus {
            check("growth_surplus", surplus, 0.0, LIMIT)?;
        }
        for quantity in self.starting_inventory.values() {
            check("starting_inventory", *quantity, 0.0, LIMIT)?;
        }
        if self.initial_population == 0 || self.initial_population > self.max_population {
            return Err(ConfigError::Population {
                initial: self.initial_population,
                max: self.max_population,
            });
        }
        Ok(())
    }

    /// Validate and convert to the fixed-point form.
    pub fn tuning(&self) -> Result<Tuning, ConfigError> {
        self.validate()?;
        Ok(Tuning {
            water_ceiling: f64_to_fixed64(self.water_ceiling),
            extractor_overflow_threshold: f64_to_fixed64(self.extractor_overflow_threshold),
            processing_overflow_threshold: f64_to_fixed64(self.processing_overflow_threshold),
            min_storage_spare: f64_to_fixed64(self.min_storage_spare),
            default_connection_rate: f64_to_fixed64(self.default_connection_rate),
            food_per_capita: f64_to_fixed64(self.food_per_capita),
            water_per_capita: f64_to_fixed64(self.water_per_capita),
            win_population: self.win_population,
            win_components: f64_to_fixed64(self.win_components),
            initial_population: self.initial_population,
            max_population: self.max_population,
            growth_surplus: self.growth_surplus.map(f64_to_fixed64),
            starting_inventory: self
                .starting_inventory
                .iter()
                .map(|(r, q)| (*r, f64_to_fixed64(*q)))
                .collect(),
        })
    }
}

/// Validated fixed-point tuning read by the tick loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuning {
    pub water_ceiling: Fixed64,
    pub extractor_overflow_threshold: Fixed64,
    pub processing_overflow_threshold: Fixed64,
    pub min_storage_spare: Fixed64,
    pub default_connection_rate: Fixed64,
    pub food_per_capita: Fixed64,
    pub water_per_capita: Fixed64,
    pub win_population: u32,
    pub win_components: Fixed64,
    pub initial_population: u32,
    pub max_population: u32,
    pub growth_surplus: Option<Fixed64>,
    pub starting_inventory: ResourceAmounts,
}
