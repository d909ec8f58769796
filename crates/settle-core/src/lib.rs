//! Settle Core -- the production-simulation engine for a tile-based
//! settlement builder.
//!
//! Players place extractors on resource nodes, processing buildings and
//! storage on a grid, link them with directed connections, and the engine
//! advances production, transformation and consumption once per tick using
//! deterministic fixed-point arithmetic.
//!
//! # Five-Phase Tick Pipeline
//!
//! Each call to [`engine::Engine::tick`] runs, in order:
//!
//! 1. **Extraction** -- Extractors credit their node's yield, all or nothing,
//!    then drain into adjacent storage when 80% full.
//! 2. **Processing** -- Processing buildings start, advance or complete their
//!    recipe cycle, then drain outputs into adjacent storage when 70% full.
//! 3. **Transport** -- Each connection moves up to its rate, in creation order.
//! 4. **Population** -- Food and water upkeep, population change, win check.
//! 5. **Bookkeeping** -- Increment the turn counter and compute the state hash.
//!
//! Mutations (place, connect, set recipe, collect) happen between ticks,
//! either by direct calls or through a [`command::CommandQueue`] drained by
//! [`engine::Engine::step_with_commands`].
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- Owns the state and runs the pipeline.
//! - [`catalog::Catalog`] -- Immutable building and recipe definitions.
//! - [`map::MapConfig`] -- Grid size and resource node layout.
//! - [`config::EngineConfig`] -- Every tunable constant, serde-friendly.
//! - [`state::SimulationState`] -- Grid, entities, connections, inventory.
//! - [`query::SimulationSnapshot`] -- Owned read-only view for UI layers.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic math.

pub mod catalog;
pub mod command;
pub mod config;
pub mod engine;
pub mod entity;
pub mod extraction;
pub mod fixed;
pub mod grid;
pub mod id;
pub mod map;
pub mod overflow;
pub mod population;
pub mod processor;
pub mod query;
pub mod resource;
pub mod rng;
pub mod sim;
pub mod state;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
