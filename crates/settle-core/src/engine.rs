//! The simulation engine: owns the state and runs the tick pipeline.
//!
//! # Tick Pipeline
//!
//! Each call to [`Engine::tick`] runs five phases in order:
//!
//! 1. **Extraction** -- Extractors credit their node's yield, then drain to
//!    neighboring storage past the extractor threshold.
//! 2. **Processing** -- Recipe cycles start, advance or complete, then drain
//!    outputs to neighboring storage past the processing threshold.
//! 3. **Transport** -- Connections move resources in creation order.
//! 4. **Population** -- Food and water upkeep, population change, win check.
//! 5. **Bookkeeping** -- Turn counter and state hash.
//!
//! Mutations (`place_entity`, `set_recipe`, `connect`, `disconnect`,
//! `collect_to_player_inventory`) run between ticks and either succeed or
//! leave the state untouched.

use crate::catalog::{BuildingKind, Catalog};
use crate::command::{Command, CommandError, CommandOutcome, CommandQueue, StepResult};
use crate::config::{ConfigError, EngineConfig, Tuning};
use crate::entity::{Deposit, Entity, EntityRecord};
use crate::extraction::{self, ExtractionOutcome};
use crate::fixed::Fixed64;
use crate::grid::Position;
use crate::id::{BuildingTypeId, ConnectionId, EntityId, RecipeId};
use crate::map::{MapConfig, MapConfigError};
use crate::overflow;
use crate::population;
use crate::processor::{self, ProcessingState};
use crate::query::SimulationSnapshot;
use crate::resource::{ResourceNodeKind, ResourceType, StorageBuffer};
use crate::sim::TickReport;
use crate::state::SimulationState;
use crate::transport::{self, Connection};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why `place_entity` refused. The state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementRejected {
    #[error("position {0} is outside the grid")]
    OutOfBounds(Position),
    #[error("unknown building definition {0:?}")]
    UnknownDefinition(BuildingTypeId),
    #[error("tile {0} is occupied")]
    Occupied(Position),
    #[error("building cannot be placed on the {} at {position}", .node.name())]
    IncompatibleNode {
        position: Position,
        node: ResourceNodeKind,
    },
}

/// Why a mutating command was a no-op. The state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Unchanged {
    #[error("unknown entity {0:?}")]
    UnknownEntity(EntityId),
    #[error("unknown recipe {0:?}")]
    UnknownRecipe(RecipeId),
    #[error("entity {0:?} is not a processing building")]
    NotProcessingBuilding(EntityId),
    #[error("recipe {recipe:?} cannot run in entity {entity:?}")]
    RecipeNotEligible { entity: EntityId, recipe: RecipeId },
    #[error("connection already exists as {0:?}")]
    DuplicateConnection(ConnectionId),
    #[error("entity {0:?} cannot connect to itself")]
    SelfConnection(EntityId),
    #[error("entity {0:?} has no buffer")]
    NoBuffer(EntityId),
    #[error("building type {0:?} is not a logistics building")]
    NotLogistics(BuildingTypeId),
    #[error("connection rate must be positive")]
    InvalidRate,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("invalid map: {0}")]
    Map(#[from] MapConfigError),
    #[error("invalid engine config: {0}")]
    Config(#[from] ConfigError),
}

/// Optional overrides for a new connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionSpec {
    /// Units per tick; the configured default when `None`.
    pub rate: Option<Fixed64>,
    /// Logistics building providing the link; `conveyor` when `None`.
    pub kind: Option<BuildingTypeId>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The simulation engine. Owns the single authoritative state and runs the
/// five-phase tick pipeline over it.
#[derive(Debug)]
pub struct Engine {
    state: SimulationState,
    /// Freshly built state, restored by `reset`.
    initial: SimulationState,
    catalog: Catalog,
    config: EngineConfig,
    tuning: Tuning,
    map: MapConfig,
    default_link: Option<BuildingTypeId>,
}

impl Engine {
    /// Build the grid, place every resource node from `map`, and seed the
    /// global inventory and population from `config`.
    pub fn initialize(
        map: &MapConfig,
        catalog: Catalog,
        config: EngineConfig,
    ) -> Result<Self, InitError> {
        let tuning = config.tuning()?;
        let state = SimulationState::build(map, config.seed, &tuning)?;
        let default_link = catalog
            .building_id("conveyor")
            .filter(|id| matches!(catalog.building(*id).map(|b| &b.kind), Some(BuildingKind::Logistics)));

        tracing::info!(
            width = map.width,
            height = map.height,
            nodes = map.nodes.len(),
            buildings = catalog.building_count(),
            recipes = catalog.recipe_count(),
            "simulation initialized"
        );

        Ok(Self {
            initial: state.clone(),
            state,
            catalog,
            config,
            tuning,
            map: map.clone(),
            default_link,
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn map(&self) -> &MapConfig {
        &self.map
    }

    #[cfg(any(test, feature = "test-utils"))]
    pub(crate) fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    /// Owned, read-only copy of the current state.
    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot::capture(&self.state, &self.catalog)
    }

    /// Discard all progress and rebuild from the retained map and config.
    pub fn reset(&mut self) {
        self.state = self.initial.clone();
        tracing::info!("simulation reset");
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Place a building. Extractors may share a tile with a matching resource
    /// node; every other placement needs an empty tile.
    pub fn place_entity(
        &mut self,
        definition: BuildingTypeId,
        position: Position,
    ) -> Result<EntityId, PlacementRejected> {
        let result = self.try_place(definition, position);
        match &result {
            Ok(id) => tracing::debug!(?definition, %position, entity = ?id, "entity placed"),
            Err(e) => tracing::debug!(?definition, %position, error = %e, "placement rejected"),
        }
        result
    }

    fn try_place(
        &mut self,
        definition: BuildingTypeId,
        position: Position,
    ) -> Result<EntityId, PlacementRejected> {
        if !self.state.grid.in_bounds(position) {
            return Err(PlacementRejected::OutOfBounds(position));
        }
        let def = self
            .catalog
            .building(definition)
            .ok_or(PlacementRejected::UnknownDefinition(definition))?;

        let deposit = match self.state.grid.entities_at(position) {
            [] => None,
            [only] => match self.state.entities.get(*only).map(|r| &r.entity) {
                Some(Entity::ResourceNode { kind, tier }) => {
                    if !def.extracts_from(*kind) {
                        return Err(PlacementRejected::IncompatibleNode {
                            position,
                            node: *kind,
                        });
                    }
                    Some(Deposit {
                        kind: *kind,
                        tier: *tier,
                    })
                }
                _ => return Err(PlacementRejected::Occupied(position)),
            },
            _ => return Err(PlacementRejected::Occupied(position)),
        };

        let entity = match &def.kind {
            BuildingKind::Extractor { capacity, .. } => Entity::Extractor {
                buffer: StorageBuffer::new(*capacity),
                deposit,
            },
            BuildingKind::Processing { capacity } => Entity::Processing {
                buffer: StorageBuffer::new(*capacity),
                processing: ProcessingState::new(self.catalog.default_recipe(definition)),
            },
            BuildingKind::Storage { capacity } => Entity::Storage {
                buffer: StorageBuffer::new(*capacity),
            },
            BuildingKind::Logistics => Entity::Logistics,
        };

        let id = self.state.entities.insert(EntityRecord {
            building: Some(definition),
            position,
            entity,
        });
        self.state
            .grid
            .place(position, id)
            .map_err(|_| PlacementRejected::OutOfBounds(position))?;
        Ok(id)
    }

    /// Rebind a processing building's recipe. Progress and any consumed
    /// inputs of the current cycle are discarded.
    pub fn set_recipe(&mut self, entity: EntityId, recipe: RecipeId) -> Result<(), Unchanged> {
        let result = self.try_set_recipe(entity, recipe);
        if let Err(e) = &result {
            tracing::debug!(?entity, ?recipe, error = %e, "set_recipe ignored");
        }
        result
    }

    fn try_set_recipe(&mut self, entity: EntityId, recipe: RecipeId) -> Result<(), Unchanged> {
        let recipe_def = self
            .catalog
            .recipe(recipe)
            .ok_or(Unchanged::UnknownRecipe(recipe))?;
        let record = self
            .state
            .entities
            .get_mut(entity)
            .ok_or(Unchanged::UnknownEntity(entity))?;
        let eligible = record.building == Some(recipe_def.building);
        let Entity::Processing { processing, .. } = &mut record.entity else {
            return Err(Unchanged::NotProcessingBuilding(entity));
        };
        if !eligible {
            return Err(Unchanged::RecipeNotEligible { entity, recipe });
        }
        processing.bind(recipe);
        Ok(())
    }

    /// Connect `source` to `dest` with the default rate and conveyor kind.
    pub fn connect(&mut self, source: EntityId, dest: EntityId) -> Result<ConnectionId, Unchanged> {
        self.connect_with(source, dest, ConnectionSpec::default())
    }

    pub fn connect_with(
        &mut self,
        source: EntityId,
        dest: EntityId,
        spec: ConnectionSpec,
    ) -> Result<ConnectionId, Unchanged> {
        let result = self.try_connect(source, dest, spec);
        match &result {
            Ok(id) => tracing::debug!(?source, ?dest, connection = ?id, "connected"),
            Err(e) => tracing::debug!(?source, ?dest, error = %e, "connect ignored"),
        }
        result
    }

    fn try_connect(
        &mut self,
        source: EntityId,
        dest: EntityId,
        spec: ConnectionSpec,
    ) -> Result<ConnectionId, Unchanged> {
        for id in [source, dest] {
            if !self.state.entities.contains(id) {
                return Err(Unchanged::UnknownEntity(id));
            }
        }
        if source == dest {
            return Err(Unchanged::SelfConnection(source));
        }
        if let Some(existing) = self.state.connections.between(source, dest) {
            return Err(Unchanged::DuplicateConnection(existing));
        }
        let kind = match spec.kind {
            Some(kind) => {
                if !matches!(
                    self.catalog.building(kind).map(|b| &b.kind),
                    Some(BuildingKind::Logistics)
                ) {
                    return Err(Unchanged::NotLogistics(kind));
                }
                Some(kind)
            }
            None => self.default_link,
        };
        let rate = spec.rate.unwrap_or(self.tuning.default_connection_rate);
        if rate <= Fixed64::ZERO {
            return Err(Unchanged::InvalidRate);
        }

        let connection = Connection {
            source,
            dest,
            rate,
            kind,
        };
        self.state
            .connections
            .insert(connection)
            .map_err(Unchanged::DuplicateConnection)
    }

    /// Remove a connection. Returns whether one was removed; repeating the
    /// call is harmless.
    pub fn disconnect(&mut self, connection: ConnectionId) -> bool {
        let removed = self.state.connections.remove(connection);
        tracing::debug!(?connection, removed, "disconnect");
        removed
    }

    /// Move an entity's whole buffer into the global inventory.
    pub fn collect_to_player_inventory(&mut self, entity: EntityId) -> Result<(), Unchanged> {
        let record = self
            .state
            .entities
            .get_mut(entity)
            .ok_or(Unchanged::UnknownEntity(entity))?;
        let buffer = record
            .entity
            .buffer_mut()
            .ok_or(Unchanged::NoBuffer(entity))?;
        let taken = buffer.take_all();
        self.state.inventory.absorb(&taken);
        tracing::debug!(?entity, total = %taken.total(), "collected to inventory");
        Ok(())
    }

    /// Run one command to completion.
    pub fn execute(&mut self, command: Command) -> Result<CommandOutcome, CommandError> {
        Ok(match command {
            Command::Place { building, position } => {
                CommandOutcome::Placed(self.place_entity(building, position)?)
            }
            Command::Connect { source, dest, spec } => {
                CommandOutcome::Connected(self.connect_with(source, dest, spec)?)
            }
            Command::Disconnect { connection } => {
                CommandOutcome::Disconnected(self.disconnect(connection))
            }
            Command::SetRecipe { entity, recipe } => {
                self.set_recipe(entity, recipe)?;
                CommandOutcome::RecipeSet
            }
            Command::Collect { entity } => {
                self.collect_to_player_inventory(entity)?;
                CommandOutcome::Collected
            }
        })
    }

    /// Drain `queue` in submission order, executing each command, then tick.
    pub fn step_with_commands(&mut self, queue: &mut CommandQueue) -> StepResult {
        let commands = queue.drain(self.state.turn);
        let outcomes = commands.into_iter().map(|c| self.execute(c)).collect();
        let report = self.tick();
        StepResult { outcomes, report }
    }

    // -----------------------------------------------------------------------
    // Tick pipeline
    // -----------------------------------------------------------------------

    /// Advance the simulation by one tick.
    pub fn tick(&mut self) -> TickReport {
        let _span = tracing::trace_span!("tick", turn = self.state.turn).entered();
        let mut report = TickReport::default();

        // Phase 1: Extraction, then extractor overflow.
        self.phase_extraction(&mut report);
        // Phase 2: Processing, then processing overflow.
        self.phase_processing(&mut report);
        // Phase 3: Connection transport.
        self.phase_transport(&mut report);
        // Phase 4: Population upkeep and win check.
        self.phase_population(&mut report);
        // Phase 5: Turn counter and state hash.
        self.phase_bookkeeping(&mut report);

        tracing::trace!(
            turn = report.turn,
            extracted = %report.extracted,
            transported = %report.transported,
            population = self.state.population,
            "tick complete"
        );
        report
    }

    // -----------------------------------------------------------------------
    // Phase 1: Extraction
    // -----------------------------------------------------------------------

    fn phase_extraction(&mut self, report: &mut TickReport) {
        for id in self.state.entities.ids() {
            let Some(record) = self.state.entities.get_mut(id) else {
                continue;
            };
            let Entity::Extractor { buffer, deposit } = &mut record.entity else {
                continue;
            };
            match extraction::extract(
                *deposit,
                buffer,
                &self.state.inventory,
                self.tuning.water_ceiling,
            ) {
                ExtractionOutcome::Credited(amount) => report.extracted += amount,
                ExtractionOutcome::BufferFull => report.extractors_blocked += 1,
                ExtractionOutcome::WaterCeiling | ExtractionOutcome::NoDeposit => {}
            }
            if overflow::triggered(buffer, self.tuning.extractor_overflow_threshold) {
                self.drain_overflow(id, &ResourceType::ALL, report);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Phase 2: Processing
    // -----------------------------------------------------------------------

    fn phase_processing(&mut self, report: &mut TickReport) {
        for id in self.state.entities.ids() {
            let Some(record) = self.state.entities.get_mut(id) else {
                continue;
            };
            let Entity::Processing { buffer, processing } = &mut record.entity else {
                continue;
            };
            let result = processor::advance(processing, buffer, &self.catalog);
            report.cycles_started += result.started as u32;
            report.cycles_completed += result.completed as u32;
            report.consumed += result.consumed.iter().map(|e| e.quantity).sum::<Fixed64>();
            report.produced += result.produced.iter().map(|e| e.quantity).sum::<Fixed64>();

            if !overflow::triggered(buffer, self.tuning.processing_overflow_threshold) {
                continue;
            }
            let mut eligible: Vec<ResourceType> = processing
                .recipe
                .and_then(|r| self.catalog.recipe(r))
                .map(|r| r.overflow_outputs().collect())
                .unwrap_or_default();
            eligible.sort();
            eligible.dedup();
            if !eligible.is_empty() {
                self.drain_overflow(id, &eligible, report);
            }
        }
    }

    fn drain_overflow(&mut self, id: EntityId, eligible: &[ResourceType], report: &mut TickReport) {
        if let Some(drain) = overflow::drain(
            &self.state.grid,
            &mut self.state.entities,
            id,
            eligible,
            self.tuning.min_storage_spare,
        ) {
            report.overflow_drains += 1;
            tracing::trace!(source = ?id, target = ?drain.target, moved = %drain.moved.total(), "overflow drained");
        }
    }

    // -----------------------------------------------------------------------
    // Phase 3: Transport
    // -----------------------------------------------------------------------

    fn phase_transport(&mut self, report: &mut TickReport) {
        for (_, connection) in self.state.connections.iter() {
            report.transported += transport::transfer(&mut self.state.entities, connection);
        }
    }

    // -----------------------------------------------------------------------
    // Phase 4: Population
    // -----------------------------------------------------------------------

    fn phase_population(&mut self, report: &mut TickReport) {
        report.population_change = population::consume(
            &mut self.state.population,
            &mut self.state.inventory,
            &self.tuning,
        );
        if report.population_change != 0 {
            tracing::debug!(
                population = self.state.population,
                change = report.population_change,
                "population changed"
            );
        }
        if !self.state.won
            && population::has_won(self.state.population, &self.state.inventory, &self.tuning)
        {
            self.state.won = true;
            report.won_this_tick = true;
            tracing::info!(turn = self.state.turn, population = self.state.population, "settlement won");
        }
    }

    // -----------------------------------------------------------------------
    // Phase 5: Bookkeeping
    // -----------------------------------------------------------------------

    fn phase_bookkeeping(&mut self, report: &mut TickReport) {
        self.state.turn += 1;
        self.state.state_hash = self.state.compute_hash();
        report.turn = self.state.turn;
        report.state_hash = self.state.state_hash;
    }
}
