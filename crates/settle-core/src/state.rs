//! The authoritative simulation state owned by the engine.

use slotmap::Key;

use crate::config::Tuning;
use crate::entity::{Entity, EntityRecord, EntityRegistry};
use crate::fixed::Ticks;
use crate::grid::{Direction, Grid, GridError, Position, Tile};
use crate::id::EntityId;
use crate::map::{MapConfig, MapConfigError};
use crate::resource::{GlobalInventory, ResourceAmounts};
use crate::rng::SimRng;
use crate::sim::StateHash;
use crate::transport::ConnectionList;

/// Everything the tick loop reads and writes. Only the engine mutates it;
/// callers get `&SimulationState` between ticks.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub(crate) grid: Grid,
    pub(crate) entities: EntityRegistry,
    pub(crate) connections: ConnectionList,
    pub(crate) inventory: GlobalInventory,
    pub(crate) population: u32,
    pub(crate) turn: Ticks,
    pub(crate) won: bool,
    pub(crate) state_hash: u64,
}

impl SimulationState {
    /// Build a fresh world: terrain from `seed`, resource nodes from `map`.
    pub(crate) fn build(map: &MapConfig, seed: u64, tuning: &Tuning) -> Result<Self, MapConfigError> {
        map.validate()?;

        let mut rng = SimRng::new(seed);
        let mut grid = Grid::generate(map.width, map.height, &mut rng);
        let mut entities = EntityRegistry::new();
        for node in &map.nodes {
            let id = entities.insert(EntityRecord {
                building: None,
                position: node.position,
                entity: Entity::ResourceNode {
                    kind: node.kind,
                    tier: node.tier,
                },
            });
            grid.place(node.position, id).map_err(|e| match e {
                GridError::OutOfBounds(p) => MapConfigError::OutOfBounds(p),
            })?;
        }

        let mut state = Self {
            grid,
            entities,
            connections: ConnectionList::new(),
            inventory: GlobalInventory::new(tuning.starting_inventory),
            population: tuning.initial_population,
            turn: 0,
            won: false,
            state_hash: 0,
        };
        state.state_hash = state.compute_hash();
        Ok(state)
    }

    // -- Accessors --

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    pub fn connections(&self) -> &ConnectionList {
        &self.connections
    }

    pub fn inventory(&self) -> &GlobalInventory {
        &self.inventory
    }

    pub fn population(&self) -> u32 {
        self.population
    }

    pub fn turn(&self) -> Ticks {
        self.turn
    }

    pub fn has_won(&self) -> bool {
        self.won
    }

    /// Hash recorded at the end of the last tick (or at initialization).
    pub fn state_hash(&self) -> u64 {
        self.state_hash
    }

    // -- Queries --

    pub fn entity(&self, id: EntityId) -> Option<&EntityRecord> {
        self.entities.get(id)
    }

    pub fn entities_at(&self, pos: Position) -> &[EntityId] {
        self.grid.entities_at(pos)
    }

    pub fn tile(&self, pos: Position) -> Option<&Tile> {
        self.grid.tile(pos)
    }

    pub fn is_occupied(&self, pos: Position) -> bool {
        self.grid.is_occupied(pos)
    }

    /// Entities on each in-bounds orthogonal neighbor, in scan order.
    pub fn neighbors(&self, pos: Position) -> Vec<(Direction, &[EntityId])> {
        self.grid
            .neighbors(pos)
            .map(|(d, p)| (d, self.grid.entities_at(p)))
            .collect()
    }

    /// Sum of every buffer plus the global inventory.
    pub fn total_resources(&self) -> ResourceAmounts {
        let mut total = *self.inventory.amounts();
        for (_, record) in self.entities.iter() {
            if let Some(buffer) = record.entity.buffer() {
                for (resource, quantity) in buffer.amounts().nonzero() {
                    total.add(resource, quantity);
                }
            }
        }
        total
    }

    // -- Hashing --

    /// FNV-1a over every simulated quantity, in deterministic order.
    pub fn compute_hash(&self) -> u64 {
        let mut hasher = StateHash::new();
        hasher.write_u64(self.turn);
        hasher.write_u32(self.population);
        hasher.write_u32(self.won as u32);
        for (_, quantity) in self.inventory.amounts().iter() {
            hasher.write_fixed64(quantity);
        }

        // SlotMap iteration is insertion order since entities are never removed.
        for (_, record) in self.entities.iter() {
            hasher.write_i32(record.position.x);
            hasher.write_i32(record.position.y);
            hasher.write_u32(record.building.map_or(u32::MAX, |b| b.0));
            match &record.entity {
                Entity::ResourceNode { kind, tier } => {
                    hasher.write_u32(0);
                    hasher.write_u32(*kind as u32);
                    hasher.write_u32(tier.get() as u32);
                }
                Entity::Extractor { .. } => hasher.write_u32(1),
                Entity::Processing { processing, .. } => {
                    hasher.write_u32(2);
                    hasher.write_u32(processing.recipe.map_or(u32::MAX, |r| r.0));
                    hasher.write_fixed64(processing.progress);
                    hasher.write_u32(processing.is_processing as u32);
                }
                Entity::Storage { .. } => hasher.write_u32(3),
                Entity::Logistics => hasher.write_u32(4),
            }
            if let Some(buffer) = record.entity.buffer() {
                for (_, quantity) in buffer.amounts().iter() {
                    hasher.write_fixed64(quantity);
                }
            }
        }

        for (_, connection) in self.connections.iter() {
            hasher.write_u64(connection.source.data().as_ffi());
            hasher.write_u64(connection.dest.data().as_ffi());
            hasher.write_fixed64(connection.rate);
        }

        hasher.finish()
    }
}
