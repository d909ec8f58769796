//! Resource extraction from nodes into extractor buffers.

use crate::entity::Deposit;
use crate::fixed::Fixed64;
use crate::resource::{GlobalInventory, ResourceType, StorageBuffer};

/// Units produced per tick per tier level.
pub const BASE_RATE: Fixed64 = Fixed64::ONE;

/// Stone credited alongside ore and coal, as a fraction of production.
pub fn byproduct_ratio() -> Fixed64 {
    Fixed64::from_num(0.2)
}

/// What one extraction tick would credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Yield {
    pub primary: (ResourceType, Fixed64),
    pub byproduct: Option<(ResourceType, Fixed64)>,
}

impl Yield {
    pub fn total(&self) -> Fixed64 {
        self.primary.1 + self.byproduct.map_or(Fixed64::ZERO, |(_, q)| q)
    }
}

/// Per-tick yield of a deposit: `tier` units of the primary resource plus
/// the stone byproduct where the node kind has one.
pub fn yield_for(deposit: Deposit) -> Yield {
    let production = BASE_RATE * Fixed64::from_num(deposit.tier.get());
    Yield {
        primary: (deposit.kind.primary(), production),
        byproduct: deposit
            .kind
            .byproduct()
            .map(|r| (r, production * byproduct_ratio())),
    }
}

/// Outcome of one extractor's tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// The full yield was credited.
    Credited(Fixed64),
    /// The buffer could not take the full yield, so nothing was credited.
    BufferFull,
    /// Global water is at or above the ceiling.
    WaterCeiling,
    /// The extractor is not on a resource node.
    NoDeposit,
}

/// Credit one tick of production into `buffer`, all or nothing.
pub fn extract(
    deposit: Option<Deposit>,
    buffer: &mut StorageBuffer,
    inventory: &GlobalInventory,
    water_ceiling: Fixed64,
) -> ExtractionOutcome {
    let Some(deposit) = deposit else {
        return ExtractionOutcome::NoDeposit;
    };
    let y = yield_for(deposit);
    if y.primary.0 == ResourceType::Water && inventory.amount(ResourceType::Water) >= water_ceiling {
        return ExtractionOutcome::WaterCeiling;
    }
    let credit = y.total();
    if buffer.total() + credit > buffer.capacity() {
        return ExtractionOutcome::BufferFull;
    }
    buffer.add(y.primary.0, y.primary.1);
    if let Some((resource, quantity)) = y.byproduct {
        buffer.add(resource, quantity);
    }
    ExtractionOutcome::Credited(credit)
}
