//! Directed connections and per-tick transfer between buffers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::entity::EntityRegistry;
use crate::fixed::Fixed64;
use crate::id::{BuildingTypeId, ConnectionId, EntityId};
use crate::resource::{ResourceAmounts, ResourceType};

/// A directed edge that moves up to `rate` units per tick from `source` to
/// `dest`, summed across all resource kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub source: EntityId,
    pub dest: EntityId,
    pub rate: Fixed64,
    /// Logistics building that provides this link, if the catalog has one.
    pub kind: Option<BuildingTypeId>,
}

/// All connections, iterated in creation order. At most one per ordered pair.
#[derive(Debug, Clone, Default)]
pub struct ConnectionList {
    connections: SlotMap<ConnectionId, Connection>,
    order: Vec<ConnectionId>,
    pairs: HashMap<(EntityId, EntityId), ConnectionId>,
}

impl ConnectionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the ordered pair already has an edge, in which case the
    /// existing edge's id is returned as the error.
    pub fn insert(&mut self, connection: Connection) -> Result<ConnectionId, ConnectionId> {
        let pair = (connection.source, connection.dest);
        if let Some(existing) = self.pairs.get(&pair) {
            return Err(*existing);
        }
        let id = self.connections.insert(connection);
        self.order.push(id);
        self.pairs.insert(pair, id);
        Ok(id)
    }

    /// Remove an edge. Returns false if it was already gone.
    pub fn remove(&mut self, id: ConnectionId) -> bool {
        let Some(connection) = self.connections.remove(id) else {
            return false;
        };
        self.pairs.remove(&(connection.source, connection.dest));
        self.order.retain(|c| *c != id);
        true
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub fn between(&self, source: EntityId, dest: EntityId) -> Option<ConnectionId> {
        self.pairs.get(&(source, dest)).copied()
    }

    /// Connections in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (ConnectionId, &Connection)> {
        self.order
            .iter()
            .filter_map(|id| self.connections.get(*id).map(|c| (*id, c)))
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

/// Move one tick's worth of resources along `connection`. Returns the amount
/// moved; zero when either end has no buffer or the destination is full.
pub fn transfer(entities: &mut EntityRegistry, connection: &Connection) -> Fixed64 {
    let (Some(source), Some(dest)) = (
        entities.buffer(connection.source),
        entities.buffer(connection.dest),
    ) else {
        return Fixed64::ZERO;
    };

    let mut spare = dest.spare();
    let mut budget = connection.rate;
    let mut plan = ResourceAmounts::new();
    for resource in ResourceType::ALL {
        if spare <= Fixed64::ZERO || budget <= Fixed64::ZERO {
            break;
        }
        let quantity = source.amount(resource).min(budget).min(spare);
        if quantity > Fixed64::ZERO {
            plan.add(resource, quantity);
            budget -= quantity;
            spare -= quantity;
        }
    }

    let moved = plan.total();
    if moved == Fixed64::ZERO {
        return moved;
    }
    if let Some(source) = entities.buffer_mut(connection.source) {
        for (resource, quantity) in plan.nonzero() {
            source.remove(resource, quantity);
        }
    }
    if let Some(dest) = entities.buffer_mut(connection.dest) {
        for (resource, quantity) in plan.nonzero() {
            dest.add(resource, quantity);
        }
    }
    moved
}
