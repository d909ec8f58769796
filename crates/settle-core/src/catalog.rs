//! Immutable building and recipe catalog.
//!
//! Built once through [`CatalogBuilder`], validated in [`CatalogBuilder::build`],
//! and then shared read-only by the engine. Definitions are addressed by
//! dense numeric ids; names are only used at the data boundary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed64, div_ceil};
use crate::id::{BuildingTypeId, RecipeId};
use crate::resource::{ResourceNodeKind, ResourceType};

/// Progress a processing cycle must reach before outputs are released.
pub const FULL_PROGRESS: Fixed64 = Fixed64::const_from_int(100);

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Behavior class of a building definition, with the fields that class needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildingKind {
    /// Sits on a resource node and credits its yield every tick.
    Extractor {
        capacity: Fixed64,
        /// Node kinds this building may be placed on.
        targets: Vec<ResourceNodeKind>,
    },
    /// Runs one bound recipe at a time.
    Processing { capacity: Fixed64 },
    /// Passive store that receives overflow.
    Storage { capacity: Fixed64 },
    /// Provides connections. Holds nothing.
    Logistics,
}

impl BuildingKind {
    /// Buffer capacity, absent for logistics.
    pub fn capacity(&self) -> Option<Fixed64> {
        match self {
            BuildingKind::Extractor { capacity, .. }
            | BuildingKind::Processing { capacity }
            | BuildingKind::Storage { capacity } => Some(*capacity),
            BuildingKind::Logistics => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BuildingKind::Extractor { .. } => "extractor",
            BuildingKind::Processing { .. } => "processing",
            BuildingKind::Storage { .. } => "storage",
            BuildingKind::Logistics => "logistics",
        }
    }
}

/// A building definition in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingDefinition {
    pub name: String,
    pub kind: BuildingKind,
}

impl BuildingDefinition {
    /// Whether this is an extractor that may sit on `node`.
    pub fn extracts_from(&self, node: ResourceNodeKind) -> bool {
        matches!(&self.kind, BuildingKind::Extractor { targets, .. } if targets.contains(&node))
    }
}

/// A recipe input/output entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeEntry {
    pub resource: ResourceType,
    pub quantity: Fixed64,
}

impl RecipeEntry {
    pub fn new(resource: ResourceType, quantity: Fixed64) -> Self {
        Self { resource, quantity }
    }
}

/// A recipe definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeDefinition {
    pub name: String,
    /// The processing building type that may run this recipe.
    pub building: BuildingTypeId,
    pub inputs: Vec<RecipeEntry>,
    pub outputs: Vec<RecipeEntry>,
    /// Cycle length in simulated seconds.
    pub processing_time: Fixed64,
    progress_step: Fixed64,
}

impl RecipeDefinition {
    /// Progress added per tick, rounded up so a cycle finishes within
    /// `ceil(processing_time)` ticks.
    pub fn progress_step(&self) -> Fixed64 {
        self.progress_step
    }

    /// Output kinds not also consumed by this recipe. These are the kinds a
    /// processing building drains to neighboring storage.
    pub fn overflow_outputs(&self) -> impl Iterator<Item = ResourceType> + '_ {
        self.outputs
            .iter()
            .map(|e| e.resource)
            .filter(|r| !self.inputs.iter().any(|i| i.resource == *r))
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for constructing an immutable [`Catalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    buildings: Vec<BuildingDefinition>,
    building_name_to_id: HashMap<String, BuildingTypeId>,
    recipes: Vec<PendingRecipe>,
    recipe_name_to_id: HashMap<String, RecipeId>,
    duplicates: Vec<String>,
}

#[derive(Debug)]
struct PendingRecipe {
    name: String,
    building: BuildingTypeId,
    inputs: Vec<RecipeEntry>,
    outputs: Vec<RecipeEntry>,
    processing_time: Fixed64,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a building definition. Returns its ID.
    pub fn register_building(&mut self, name: &str, kind: BuildingKind) -> BuildingTypeId {
        let id = BuildingTypeId(self.buildings.len() as u32);
        if self.building_name_to_id.insert(name.to_string(), id).is_some() {
            self.duplicates.push(name.to_string());
        }
        self.buildings.push(BuildingDefinition {
            name: name.to_string(),
            kind,
        });
        id
    }

    /// Register a recipe. Returns its ID.
    pub fn register_recipe(
        &mut self,
        name: &str,
        building: BuildingTypeId,
        inputs: Vec<RecipeEntry>,
        outputs: Vec<RecipeEntry>,
        processing_time: Fixed64,
    ) -> RecipeId {
        let id = RecipeId(self.recipes.len() as u32);
        if self.recipe_name_to_id.insert(name.to_string(), id).is_some() {
            self.duplicates.push(name.to_string());
        }
        self.recipes.push(PendingRecipe {
            name: name.to_string(),
            building,
            inputs,
            outputs,
            processing_time,
        });
        id
    }

    /// Lookup building type ID by name.
    pub fn building_id(&self, name: &str) -> Option<BuildingTypeId> {
        self.building_name_to_id.get(name).copied()
    }

    /// Lookup recipe ID by name.
    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_name_to_id.get(name).copied()
    }

    /// Finalize and build the immutable catalog.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        if let Some(name) = self.duplicates.into_iter().next() {
            return Err(CatalogError::DuplicateName(name));
        }

        for def in &self.buildings {
            if matches!(def.kind.capacity(), Some(c) if c < Fixed64::ZERO) {
                return Err(CatalogError::NegativeCapacity(def.name.clone()));
            }
        }

        let mut recipes = Vec::with_capacity(self.recipes.len());
        for pending in self.recipes {
            let building = self
                .buildings
                .get(pending.building.0 as usize)
                .ok_or(CatalogError::InvalidBuildingRef(pending.building))?;
            if !matches!(building.kind, BuildingKind::Processing { .. }) {
                return Err(CatalogError::NotProcessing {
                    recipe: pending.name,
                    building: building.name.clone(),
                });
            }
            if pending
                .inputs
                .iter()
                .chain(&pending.outputs)
                .any(|e| e.quantity < Fixed64::ZERO)
            {
                return Err(CatalogError::NegativeQuantity(pending.name));
            }
            let progress_step = div_ceil(FULL_PROGRESS, pending.processing_time)
                .ok_or_else(|| CatalogError::NonPositiveTime(pending.name.clone()))?;
            recipes.push(RecipeDefinition {
                name: pending.name,
                building: pending.building,
                inputs: pending.inputs,
                outputs: pending.outputs,
                processing_time: pending.processing_time,
                progress_step,
            });
        }

        Ok(Catalog {
            buildings: self.buildings,
            building_name_to_id: self.building_name_to_id,
            recipes,
            recipe_name_to_id: self.recipe_name_to_id,
        })
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable catalog. Frozen after build(). Thread-safe to share.
#[derive(Debug, Clone)]
pub struct Catalog {
    buildings: Vec<BuildingDefinition>,
    building_name_to_id: HashMap<String, BuildingTypeId>,
    recipes: Vec<RecipeDefinition>,
    recipe_name_to_id: HashMap<String, RecipeId>,
}

impl Catalog {
    pub fn building(&self, id: BuildingTypeId) -> Option<&BuildingDefinition> {
        self.buildings.get(id.0 as usize)
    }

    pub fn building_id(&self, name: &str) -> Option<BuildingTypeId> {
        self.building_name_to_id.get(name).copied()
    }

    pub fn recipe(&self, id: RecipeId) -> Option<&RecipeDefinition> {
        self.recipes.get(id.0 as usize)
    }

    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_name_to_id.get(name).copied()
    }

    /// Every recipe eligible for `building`, in catalog order.
    pub fn recipes_for_building(
        &self,
        building: BuildingTypeId,
    ) -> impl Iterator<Item = (RecipeId, &RecipeDefinition)> {
        self.recipes
            .iter()
            .enumerate()
            .filter(move |(_, r)| r.building == building)
            .map(|(i, r)| (RecipeId(i as u32), r))
    }

    /// The first eligible recipe, bound to newly placed processing buildings.
    pub fn default_recipe(&self, building: BuildingTypeId) -> Option<RecipeId> {
        self.recipes_for_building(building).next().map(|(id, _)| id)
    }

    pub fn buildings(&self) -> impl Iterator<Item = (BuildingTypeId, &BuildingDefinition)> {
        self.buildings
            .iter()
            .enumerate()
            .map(|(i, b)| (BuildingTypeId(i as u32), b))
    }

    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate definition name: {0}")]
    DuplicateName(String),
    #[error("recipe references unknown building type {0:?}")]
    InvalidBuildingRef(BuildingTypeId),
    #[error("recipe {recipe} targets non-processing building {building}")]
    NotProcessing { recipe: String, building: String },
    #[error("recipe {0} has a non-positive processing time")]
    NonPositiveTime(String),
    #[error("recipe {0} has a negative quantity")]
    NegativeQuantity(String),
    #[error("building {0} has a negative capacity")]
    NegativeCapacity(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(v: f64) -> Fixed64 {
        Fixed64::from_num(v)
    }

    fn smelter_catalog() -> (CatalogBuilder, BuildingTypeId) {
        let mut b = CatalogBuilder::new();
        let smelter = b.register_building(
            "smelter",
            BuildingKind::Processing {
                capacity: fixed(50.0),
            },
        );
        (b, smelter)
    }

    #[test]
    fn register_and_lookup() {
        let (mut b, smelter) = smelter_catalog();
        let smelt = b.register_recipe(
            "smelt_iron",
            smelter,
            vec![RecipeEntry::new(ResourceType::IronOre, fixed(2.0))],
            vec![
                RecipeEntry::new(ResourceType::IronBar, fixed(1.0)),
                RecipeEntry::new(ResourceType::Slag, fixed(0.5)),
            ],
            fixed(2.0),
        );
        let catalog = b.build().unwrap();
        assert_eq!(catalog.building_id("smelter"), Some(smelter));
        assert_eq!(catalog.recipe_id("smelt_iron"), Some(smelt));
        assert_eq!(catalog.recipe(smelt).unwrap().progress_step(), fixed(50.0));
        assert_eq!(catalog.building(smelter).unwrap().kind.capacity(), Some(fixed(50.0)));
    }

    #[test]
    fn recipes_for_building_in_catalog_order() {
        let (mut b, smelter) = smelter_catalog();
        let foundry = b.register_building(
            "foundry",
            BuildingKind::Processing {
                capacity: fixed(50.0),
            },
        );
        let first = b.register_recipe("a", smelter, vec![], vec![], fixed(1.0));
        b.register_recipe("b", foundry, vec![], vec![], fixed(1.0));
        let third = b.register_recipe("c", smelter, vec![], vec![], fixed(1.0));
        let catalog = b.build().unwrap();

        let ids: Vec<_> = catalog.recipes_for_building(smelter).map(|(id, _)| id).collect();
        assert_eq!(ids, vec![first, third]);
        assert_eq!(catalog.default_recipe(smelter), Some(first));
    }

    #[test]
    fn building_without_recipes_has_no_default() {
        let mut b = CatalogBuilder::new();
        let plant = b.register_building(
            "power_plant",
            BuildingKind::Processing {
                capacity: fixed(50.0),
            },
        );
        let catalog = b.build().unwrap();
        assert_eq!(catalog.default_recipe(plant), None);
    }

    #[test]
    fn duplicate_names_rejected() {
        let (mut b, _) = smelter_catalog();
        b.register_building("smelter", BuildingKind::Logistics);
        assert_eq!(
            b.build().unwrap_err(),
            CatalogError::DuplicateName("smelter".to_string())
        );
    }

    #[test]
    fn zero_time_rejected() {
        let (mut b, smelter) = smelter_catalog();
        b.register_recipe("instant", smelter, vec![], vec![], Fixed64::ZERO);
        assert_eq!(
            b.build().unwrap_err(),
            CatalogError::NonPositiveTime("instant".to_string())
        );
    }

    #[test]
    fn negative_quantity_rejected() {
        let (mut b, smelter) = smelter_catalog();
        b.register_recipe(
            "bad",
            smelter,
            vec![RecipeEntry::new(ResourceType::Coal, fixed(-1.0))],
            vec![],
            fixed(1.0),
        );
        assert!(matches!(b.build(), Err(CatalogError::NegativeQuantity(_))));
    }

    #[test]
    fn recipe_on_storage_rejected() {
        let mut b = CatalogBuilder::new();
        let chest = b.register_building(
            "storage_small",
            BuildingKind::Storage {
                capacity: fixed(100.0),
            },
        );
        b.register_recipe("nope", chest, vec![], vec![], fixed(1.0));
        assert!(matches!(b.build(), Err(CatalogError::NotProcessing { .. })));
    }

    #[test]
    fn unknown_building_ref_rejected() {
        let mut b = CatalogBuilder::new();
        b.register_recipe("orphan", BuildingTypeId(9), vec![], vec![], fixed(1.0));
        assert_eq!(
            b.build().unwrap_err(),
            CatalogError::InvalidBuildingRef(BuildingTypeId(9))
        );
    }

    #[test]
    fn overflow_outputs_exclude_inputs() {
        let (mut b, smelter) = smelter_catalog();
        let refine = b.register_recipe(
            "refine_coal",
            smelter,
            vec![
                RecipeEntry::new(ResourceType::Coal, fixed(3.0)),
                RecipeEntry::new(ResourceType::Stone, fixed(1.0)),
            ],
            vec![RecipeEntry::new(ResourceType::Coal, fixed(5.0))],
            fixed(4.0),
        );
        let catalog = b.build().unwrap();
        assert_eq!(catalog.recipe(refine).unwrap().overflow_outputs().count(), 0);
    }

    #[test]
    fn extractor_targets() {
        let def = BuildingDefinition {
            name: "extractor".into(),
            kind: BuildingKind::Extractor {
                capacity: fixed(100.0),
                targets: vec![ResourceNodeKind::WaterSource],
            },
        };
        assert!(def.extracts_from(ResourceNodeKind::WaterSource));
        assert!(!def.extracts_from(ResourceNodeKind::CoalDeposit));
    }
}
