//! Storage-overflow drain from a busy building into adjacent storage.
//!
//! When a building's fill ratio reaches its threshold, its orthogonal
//! neighbors are scanned in [`Direction::SCAN_ORDER`](crate::grid::Direction).
//! The first storage building with enough spare room takes as much of each
//! eligible resource as fits, in resource-enumeration order. At most one
//! destination receives a drain per building per tick.

use crate::entity::{Entity, EntityRegistry};
use crate::fixed::Fixed64;
use crate::grid::Grid;
use crate::id::EntityId;
use crate::resource::{ResourceAmounts, ResourceType, StorageBuffer};

/// Whether `buffer` is full enough to drain.
pub fn triggered(buffer: &StorageBuffer, threshold: Fixed64) -> bool {
    buffer.capacity() > Fixed64::ZERO && buffer.total() >= buffer.capacity() * threshold
}

/// A completed drain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drain {
    pub target: EntityId,
    pub moved: ResourceAmounts,
}

/// First storage neighbor of `source` with spare room above `min_spare`.
pub fn find_target(
    grid: &Grid,
    entities: &EntityRegistry,
    source: EntityId,
    min_spare: Fixed64,
) -> Option<EntityId> {
    let position = entities.get(source)?.position;
    grid.neighbors(position).find_map(|(_, neighbor)| {
        grid.entities_at(neighbor).iter().copied().find(|id| {
            matches!(
                entities.get(*id).map(|r| &r.entity),
                Some(Entity::Storage { buffer }) if buffer.spare() > min_spare
            )
        })
    })
}

/// Move eligible resources from `source` into its first qualifying storage
/// neighbor. `eligible` must be in enumeration order. Returns `None` when no
/// neighbor qualifies or nothing moved.
pub fn drain(
    grid: &Grid,
    entities: &mut EntityRegistry,
    source: EntityId,
    eligible: &[ResourceType],
    min_spare: Fixed64,
) -> Option<Drain> {
    let target = find_target(grid, entities, source, min_spare)?;
    let mut spare = entities.buffer(target)?.spare();

    let mut moved = ResourceAmounts::new();
    let source_buffer = entities.buffer_mut(source)?;
    for &resource in eligible {
        if spare <= Fixed64::ZERO {
            break;
        }
        let quantity = source_buffer.amount(resource).min(spare);
        if quantity > Fixed64::ZERO {
            source_buffer.remove(resource, quantity);
            moved.add(resource, quantity);
            spare -= quantity;
        }
    }
    if moved.is_empty() {
        return None;
    }

    let target_buffer = entities.buffer_mut(target)?;
    for (resource, quantity) in moved.nonzero() {
        target_buffer.add(resource, quantity);
    }
    Some(Drain { target, moved })
}
