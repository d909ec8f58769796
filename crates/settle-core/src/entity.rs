//! Placed entities and the id-keyed registry that owns them.

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::grid::Position;
use crate::id::{BuildingTypeId, EntityId};
use crate::processor::ProcessingState;
use crate::resource::{ResourceNodeKind, StorageBuffer, Tier};

/// The resource node an extractor was placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub kind: ResourceNodeKind,
    pub tier: Tier,
}

/// A placed entity. Each variant carries only the state its behavior needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entity {
    ResourceNode {
        kind: ResourceNodeKind,
        tier: Tier,
    },
    Extractor {
        buffer: StorageBuffer,
        /// `None` when built on a bare tile; such an extractor never produces.
        deposit: Option<Deposit>,
    },
    Processing {
        buffer: StorageBuffer,
        processing: ProcessingState,
    },
    Storage {
        buffer: StorageBuffer,
    },
    Logistics,
}

impl Entity {
    pub fn buffer(&self) -> Option<&StorageBuffer> {
        match self {
            Entity::Extractor { buffer, .. }
            | Entity::Processing { buffer, .. }
            | Entity::Storage { buffer } => Some(buffer),
            Entity::ResourceNode { .. } | Entity::Logistics => None,
        }
    }

    pub fn buffer_mut(&mut self) -> Option<&mut StorageBuffer> {
        match self {
            Entity::Extractor { buffer, .. }
            | Entity::Processing { buffer, .. }
            | Entity::Storage { buffer } => Some(buffer),
            Entity::ResourceNode { .. } | Entity::Logistics => None,
        }
    }

    pub fn is_resource_node(&self) -> bool {
        matches!(self, Entity::ResourceNode { .. })
    }
}

/// An entity plus where it stands and which definition it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Building definition. `None` for resource nodes, which are not buildable.
    pub building: Option<BuildingTypeId>,
    pub position: Position,
    pub entity: Entity,
}

/// Owns every entity. Iteration follows insertion order since entities are
/// never removed.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    records: SlotMap<EntityId, EntityRecord>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: EntityRecord) -> EntityId {
        self.records.insert(record)
    }

    pub fn get(&self, id: EntityId) -> Option<&EntityRecord> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut EntityRecord> {
        self.records.get_mut(id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.records.contains_key(id)
    }

    pub fn buffer(&self, id: EntityId) -> Option<&StorageBuffer> {
        self.records.get(id).and_then(|r| r.entity.buffer())
    }

    pub fn buffer_mut(&mut self, id: EntityId) -> Option<&mut StorageBuffer> {
        self.records.get_mut(id).and_then(|r| r.entity.buffer_mut())
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &EntityRecord)> {
        self.records.iter()
    }

    /// Snapshot of all ids, for loops that mutate while walking the registry.
    pub fn ids(&self) -> Vec<EntityId> {
        self.records.keys().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
