//! Built-in content compiled into the crate: the `fantasy_world` map and the
//! standard building and recipe catalogs.

use serde::de::DeserializeOwned;
use settle_core::catalog::Catalog;
use settle_core::config::EngineConfig;
use settle_core::map::MapConfig;
use std::path::Path;

use crate::loader::{DataLoadError, Format, GameData, deserialize_str, resolve_catalog};
use crate::schema::{BuildingData, RecipeData};

const FANTASY_WORLD: &str = include_str!("../data/fantasy_world.ron");
const BUILDINGS: &str = include_str!("../data/buildings.ron");
const RECIPES: &str = include_str!("../data/recipes.ron");

fn parse<T: DeserializeOwned>(content: &str, name: &str) -> Result<T, DataLoadError> {
    deserialize_str(content, Format::Ron, Path::new(name))
}

/// The 30x20 starting map with sixteen resource nodes.
pub fn fantasy_world() -> Result<MapConfig, DataLoadError> {
    let map: MapConfig = parse(FANTASY_WORLD, "builtin/fantasy_world.ron")?;
    map.validate()?;
    Ok(map)
}

/// Eleven buildings and nine recipes.
pub fn standard_catalog() -> Result<Catalog, DataLoadError> {
    let buildings: Vec<BuildingData> = parse(BUILDINGS, "builtin/buildings.ron")?;
    let recipes: Vec<RecipeData> = parse(RECIPES, "builtin/recipes.ron")?;
    resolve_catalog(
        &buildings,
        Path::new("builtin/buildings.ron"),
        &recipes,
        Path::new("builtin/recipes.ron"),
    )
}

/// The built-in map and catalog with default tuning.
pub fn builtin_game_data() -> Result<GameData, DataLoadError> {
    Ok(GameData {
        map: fantasy_world()?,
        catalog: standard_catalog()?,
        config: EngineConfig::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use settle_core::grid::Position;
    use settle_core::resource::{ResourceNodeKind, ResourceType};
    use settle_core::test_utils;

    #[test]
    fn fantasy_world_layout() {
        let map = fantasy_world().unwrap();
        assert_eq!((map.width, map.height), (30, 20));
        assert_eq!(map.nodes.len(), 16);

        let count = |kind: ResourceNodeKind| map.nodes.iter().filter(|n| n.kind == kind).count();
        assert_eq!(count(ResourceNodeKind::WaterSource), 5);
        assert_eq!(count(ResourceNodeKind::IronOreDeposit), 4);
        assert_eq!(count(ResourceNodeKind::CoalDeposit), 4);
        assert_eq!(count(ResourceNodeKind::StoneQuarry), 3);

        let rich_ore = map
            .nodes
            .iter()
            .find(|n| n.position == Position::new(12, 8))
            .unwrap();
        assert_eq!(rich_ore.kind, ResourceNodeKind::IronOreDeposit);
        assert_eq!(rich_ore.tier.get(), 3);
    }

    #[test]
    fn catalog_matches_the_in_code_catalog() {
        let loaded = standard_catalog().unwrap();
        let reference = test_utils::standard_catalog();
        assert_eq!(loaded.building_count(), 11);
        assert_eq!(loaded.recipe_count(), 9);

        for (id, def) in reference.buildings() {
            assert_eq!(loaded.building(id), Some(def), "building {}", def.name);
        }
        for name in [
            "smelt_iron",
            "refine_coal",
            "process_stone",
            "forge_steel_bar",
            "refine_steel",
            "forge_component",
            "craft_component",
            "craft_advanced_component",
            "craft_food",
        ] {
            let a = loaded.recipe_id(name).and_then(|id| loaded.recipe(id));
            let b = reference.recipe_id(name).and_then(|id| reference.recipe(id));
            assert_eq!(a, b, "recipe {name}");
        }
    }

    #[test]
    fn smelter_defaults_to_smelt_iron() {
        let catalog = standard_catalog().unwrap();
        let smelter = catalog.building_id("smelter").unwrap();
        let default = catalog.default_recipe(smelter).unwrap();
        assert_eq!(catalog.recipe(default).unwrap().name, "smelt_iron");
        assert_eq!(catalog.recipes_for_building(smelter).count(), 3);
    }

    #[test]
    fn builtin_engine_runs() {
        let data = builtin_game_data().unwrap();
        let mut engine = data.engine().unwrap();
        assert_eq!(engine.state().entities().len(), 16);
        assert_eq!(engine.state().population(), 1);

        let extractor = engine.catalog().building_id("extractor").unwrap();
        let pump = engine.place_entity(extractor, Position::new(15, 3)).unwrap();
        engine.tick();
        let water = engine
            .state()
            .entities()
            .buffer(pump)
            .unwrap()
            .amount(ResourceType::Water);
        assert_eq!(water, test_utils::fixed(3.0));
    }
}
