//! Serde data file structs for game content definitions.
//!
//! These structs define the on-disk format for buildings, recipes and maps.
//! Quantities are plain floats on disk and become `Fixed64` only when the
//! loader resolves them into a [`Catalog`](settle_core::catalog::Catalog).

use serde::Deserialize;
use settle_core::resource::{ResourceNodeKind, ResourceType};

// ===========================================================================
// Buildings
// ===========================================================================

/// Behavior class named in a building entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKindData {
    Extractor,
    Processing,
    Storage,
    Logistics,
}

/// A building definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildingData {
    pub name: String,
    pub kind: BuildingKindData,
    /// Required for every kind except logistics.
    #[serde(default)]
    pub capacity: Option<f64>,
    /// Node kinds an extractor may sit on.
    #[serde(default)]
    pub targets: Vec<ResourceNodeKind>,
}

// ===========================================================================
// Recipes
// ===========================================================================

/// A recipe definition in a data file.
///
/// `inputs` and `outputs` use the short tuple form `(resource, quantity)`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub name: String,
    /// Name of the processing building that runs this recipe.
    pub building: String,
    #[serde(default)]
    pub inputs: Vec<(ResourceType, f64)>,
    pub outputs: Vec<(ResourceType, f64)>,
    /// Seconds per cycle.
    pub time: f64,
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn building_ron_with_implicit_some() {
        let src = r#"#![enable(implicit_some)]
(name: "miner", kind: extractor, capacity: 100.0, targets: [coal_deposit, stone_quarry])"#;
        let data: BuildingData = ron::from_str(src).unwrap();
        assert_eq!(data.kind, BuildingKindData::Extractor);
        assert_eq!(data.capacity, Some(100.0));
        assert_eq!(
            data.targets,
            vec![ResourceNodeKind::CoalDeposit, ResourceNodeKind::StoneQuarry]
        );
    }

    #[test]
    fn logistics_needs_no_capacity() {
        let data: BuildingData =
            serde_json::from_str(r#"{"name": "conveyor", "kind": "logistics"}"#).unwrap();
        assert_eq!(data.kind, BuildingKindData::Logistics);
        assert!(data.capacity.is_none());
        assert!(data.targets.is_empty());
    }

    #[test]
    fn recipe_json_tuples() {
        let src = r#"{
            "name": "smelt_iron",
            "building": "smelter",
            "inputs": [["iron_ore", 2.0]],
            "outputs": [["iron_bar", 1.0], ["slag", 0.5]],
            "time": 2.0
        }"#;
        let data: RecipeData = serde_json::from_str(src).unwrap();
        assert_eq!(data.inputs, vec![(ResourceType::IronOre, 2.0)]);
        assert_eq!(data.outputs[1], (ResourceType::Slag, 0.5));
    }

    #[test]
    fn unknown_resource_is_a_parse_error() {
        let src = r#"{"name": "x", "building": "smelter", "outputs": [["gold", 1.0]], "time": 1.0}"#;
        assert!(serde_json::from_str::<RecipeData>(src).is_err());
    }
}
