//! Read-only snapshots of simulation state.
//!
//! All types are owned copies with no references into engine storage, so a
//! UI layer can hold them across ticks or serialize them.

use serde::Serialize;

use crate::catalog::Catalog;
use crate::entity::Entity;
use crate::fixed::{Fixed64, Ticks};
use crate::grid::Position;
use crate::id::{ConnectionId, EntityId};
use crate::processor::ProcessingPhase;
use crate::resource::{ResourceNodeKind, ResourceType};
use crate::state::SimulationState;

// ---------------------------------------------------------------------------
// Entity snapshot
// ---------------------------------------------------------------------------

/// Behavior class of a snapshotted entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    ResourceNode { node: ResourceNodeKind, tier: u8 },
    Extractor,
    Processing,
    Storage,
    Logistics,
}

/// Recipe progress of a processing building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingSnapshot {
    /// Recipe name, if bound to a known recipe.
    pub recipe: Option<String>,
    pub phase: ProcessingPhase,
    /// 0 to 100.
    pub progress: Fixed64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    /// Building definition name; the node kind name for resource nodes.
    pub definition: String,
    pub position: Position,
    pub kind: EntityKind,
    /// Non-zero buffer contents in enumeration order.
    pub contents: Vec<(ResourceType, Fixed64)>,
    pub capacity: Option<Fixed64>,
    pub processing: Option<ProcessingSnapshot>,
}

// ---------------------------------------------------------------------------
// Connection snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionSnapshot {
    pub id: ConnectionId,
    pub source: EntityId,
    pub dest: EntityId,
    pub rate: Fixed64,
    /// Name of the logistics building providing the link.
    pub kind: Option<String>,
}

// ---------------------------------------------------------------------------
// Simulation snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationSnapshot {
    pub turn: Ticks,
    pub population: u32,
    pub won: bool,
    pub state_hash: u64,
    pub width: u32,
    pub height: u32,
    pub inventory: Vec<(ResourceType, Fixed64)>,
    pub entities: Vec<EntitySnapshot>,
    pub connections: Vec<ConnectionSnapshot>,
}

impl SimulationSnapshot {
    pub fn capture(state: &SimulationState, catalog: &Catalog) -> Self {
        let building_name = |id| catalog.building(id).map(|b| b.name.clone());

        let entities = state
            .entities()
            .iter()
            .map(|(id, record)| {
                let kind = match &record.entity {
                    Entity::ResourceNode { kind, tier } => EntityKind::ResourceNode {
                        node: *kind,
                        tier: tier.get(),
                    },
                    Entity::Extractor { .. } => EntityKind::Extractor,
                    Entity::Processing { .. } => EntityKind::Processing,
                    Entity::Storage { .. } => EntityKind::Storage,
                    Entity::Logistics => EntityKind::Logistics,
                };
                let definition = match (&record.entity, record.building) {
                    (Entity::ResourceNode { kind, .. }, _) => kind.name().to_string(),
                    (_, Some(building)) => building_name(building).unwrap_or_default(),
                    (_, None) => String::new(),
                };
                let processing = match &record.entity {
                    Entity::Processing { processing, .. } => Some(ProcessingSnapshot {
                        recipe: processing
                            .recipe
                            .and_then(|r| catalog.recipe(r))
                            .map(|r| r.name.clone()),
                        phase: processing.phase(),
                        progress: processing.progress,
                    }),
                    _ => None,
                };
                let buffer = record.entity.buffer();
                EntitySnapshot {
                    id,
                    definition,
                    position: record.position,
                    kind,
                    contents: buffer
                        .map(|b| b.amounts().nonzero().collect())
                        .unwrap_or_default(),
                    capacity: buffer.map(|b| b.capacity()),
                    processing,
                }
            })
            .collect();

        let connections = state
            .connections()
            .iter()
            .map(|(id, c)| ConnectionSnapshot {
                id,
                source: c.source,
                dest: c.dest,
                rate: c.rate,
                kind: c.kind.and_then(building_name),
            })
            .collect();

        Self {
            turn: state.turn(),
            population: state.population(),
            won: state.has_won(),
            state_hash: state.state_hash(),
            width: state.grid().width(),
            height: state.grid().height(),
            inventory: state.inventory().amounts().nonzero().collect(),
            entities,
            connections,
        }
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn inventory_amount(&self, resource: ResourceType) -> Fixed64 {
        self.inventory
            .iter()
            .find(|(r, _)| *r == resource)
            .map_or(Fixed64::ZERO, |(_, q)| *q)
    }
}
