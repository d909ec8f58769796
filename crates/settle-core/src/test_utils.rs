//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::catalog::{BuildingKind, Catalog, CatalogBuilder, RecipeEntry};
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::fixed::Fixed64;
use crate::grid::Position;
use crate::id::{BuildingTypeId, EntityId};
use crate::map::{MapConfig, NodeSeed};
use crate::processor::ProcessingState;
use crate::resource::{ResourceNodeKind, ResourceType, StorageBuffer, Tier};

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Standard content
// ===========================================================================

fn entries(list: &[(ResourceType, f64)]) -> Vec<RecipeEntry> {
    list.iter()
        .map(|(r, q)| RecipeEntry::new(*r, fixed(*q)))
        .collect()
}

/// The standard building and recipe catalog, built in code.
pub fn standard_catalog() -> Catalog {
    use ResourceNodeKind::*;
    use ResourceType::*;

    let mut b = CatalogBuilder::new();
    b.register_building(
        "miner",
        BuildingKind::Extractor {
            capacity: fixed(100.0),
            targets: vec![IronOreDeposit, CoalDeposit, StoneQuarry],
        },
    );
    b.register_building(
        "extractor",
        BuildingKind::Extractor {
            capacity: fixed(100.0),
            targets: vec![WaterSource],
        },
    );
    let processing = BuildingKind::Processing {
        capacity: fixed(50.0),
    };
    let smelter = b.register_building("smelter", processing.clone());
    let foundry = b.register_building("foundry", processing.clone());
    let constructor = b.register_building("constructor", processing.clone());
    b.register_building("power_plant", processing);
    b.register_building("conveyor", BuildingKind::Logistics);
    b.register_building("splitter", BuildingKind::Logistics);
    for (name, capacity) in [
        ("storage_small", 100.0),
        ("storage_medium", 250.0),
        ("storage_large", 500.0),
    ] {
        b.register_building(
            name,
            BuildingKind::Storage {
                capacity: fixed(capacity),
            },
        );
    }

    let recipes: [(&str, BuildingTypeId, &[(ResourceType, f64)], &[(ResourceType, f64)], f64); 9] = [
        ("smelt_iron", smelter, &[(IronOre, 2.0)], &[(IronBar, 1.0), (Slag, 0.5)], 2.0),
        ("refine_coal", smelter, &[(Coal, 3.0), (Stone, 1.0)], &[(Coal, 5.0)], 4.0),
        ("process_stone", smelter, &[(Stone, 4.0)], &[(Stone, 6.0)], 2.0),
        ("forge_steel_bar", foundry, &[(IronBar, 2.0), (Coal, 1.0)], &[(AdvancedMetal, 1.0)], 4.0),
        ("refine_steel", foundry, &[(IronBar, 3.0), (Coal, 2.0)], &[(IronBar, 6.0)], 5.0),
        ("forge_component", foundry, &[(AdvancedMetal, 1.0), (Stone, 1.0)], &[(Component, 2.0)], 4.0),
        ("craft_component", constructor, &[(IronBar, 1.0), (Stone, 2.0)], &[(Component, 1.0)], 4.0),
        (
            "craft_advanced_component",
            constructor,
            &[(AdvancedMetal, 1.0), (Component, 2.0)],
            &[(Component, 4.0)],
            6.0,
        ),
        ("craft_food", constructor, &[(Water, 2.0), (Stone, 1.0)], &[(Food, 3.0)], 3.0),
    ];
    for (name, building, inputs, outputs, time) in recipes {
        b.register_recipe(name, building, entries(inputs), entries(outputs), fixed(time));
    }

    b.build().expect("standard catalog is valid")
}

// ===========================================================================
// Maps and engines
// ===========================================================================

pub fn node_seed(kind: ResourceNodeKind, x: i32, y: i32, tier: u8) -> NodeSeed {
    NodeSeed {
        kind,
        position: Position::new(x, y),
        tier: Tier::new(tier).expect("tier in 1..=3"),
    }
}

pub fn map_with_nodes(width: u32, height: u32, nodes: &[(ResourceNodeKind, i32, i32, u8)]) -> MapConfig {
    MapConfig {
        width,
        height,
        nodes: nodes
            .iter()
            .map(|&(kind, x, y, tier)| node_seed(kind, x, y, tier))
            .collect(),
    }
}

pub fn engine_with_config(map: &MapConfig, config: EngineConfig) -> Engine {
    Engine::initialize(map, standard_catalog(), config).expect("test engine initializes")
}

pub fn engine_with_nodes(
    width: u32,
    height: u32,
    nodes: &[(ResourceNodeKind, i32, i32, u8)],
) -> Engine {
    engine_with_config(&map_with_nodes(width, height, nodes), EngineConfig::default())
}

pub fn empty_engine(width: u32, height: u32) -> Engine {
    engine_with_nodes(width, height, &[])
}

// ===========================================================================
// Entity helpers
// ===========================================================================

/// Look up a building definition by name.
pub fn building(engine: &Engine, name: &str) -> BuildingTypeId {
    engine
        .catalog()
        .building_id(name)
        .unwrap_or_else(|| panic!("unknown building {name}"))
}

/// Place a building by name, panicking on rejection.
pub fn place(engine: &mut Engine, name: &str, x: i32, y: i32) -> EntityId {
    let def = building(engine, name);
    engine
        .place_entity(def, Position::new(x, y))
        .unwrap_or_else(|e| panic!("placing {name} at ({x}, {y}): {e}"))
}

pub fn buffer(engine: &Engine, id: EntityId) -> &StorageBuffer {
    engine
        .state()
        .entities()
        .buffer(id)
        .expect("entity has a buffer")
}

pub fn amount(engine: &Engine, id: EntityId, resource: ResourceType) -> Fixed64 {
    buffer(engine, id).amount(resource)
}

/// Add resources straight into an entity's buffer, bypassing capacity.
pub fn deposit(engine: &mut Engine, id: EntityId, resource: ResourceType, quantity: Fixed64) {
    engine
        .state_mut()
        .entities
        .buffer_mut(id)
        .expect("entity has a buffer")
        .add(resource, quantity);
}

pub fn processing_state(engine: &Engine, id: EntityId) -> &ProcessingState {
    match engine.state().entity(id).map(|r| &r.entity) {
        Some(crate::entity::Entity::Processing { processing, .. }) => processing,
        other => panic!("not a processing building: {other:?}"),
    }
}

// ===========================================================================
// Inventory helpers
// ===========================================================================

pub fn inventory(engine: &Engine, resource: ResourceType) -> Fixed64 {
    engine.state().inventory().amount(resource)
}

/// Overwrite one global inventory amount.
pub fn set_inventory(engine: &mut Engine, resource: ResourceType, quantity: Fixed64) {
    let inv = &mut engine.state_mut().inventory;
    let current = inv.amount(resource);
    inv.consume(resource, current);
    inv.add(resource, quantity);
}

pub fn set_population(engine: &mut Engine, population: u32) {
    engine.state_mut().population = population;
}
