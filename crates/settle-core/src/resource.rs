//! Resource kinds, resource nodes and the per-building storage buffers.
//!
//! Quantities are dense `Fixed64` arrays indexed by [`ResourceType`], so
//! iteration order is always the declaration order below. Overflow draining
//! and connection transport both depend on that order.

use serde::{Deserialize, Serialize};

use crate::fixed::Fixed64;

// ---------------------------------------------------------------------------
// Resource types
// ---------------------------------------------------------------------------

/// Every resource the simulation tracks, in enumeration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Water,
    Food,
    Wood,
    Stone,
    Coal,
    IronOre,
    IronBar,
    AdvancedMetal,
    Component,
    Slag,
    Power,
}

impl ResourceType {
    pub const COUNT: usize = 11;

    pub const ALL: [ResourceType; Self::COUNT] = [
        ResourceType::Water,
        ResourceType::Food,
        ResourceType::Wood,
        ResourceType::Stone,
        ResourceType::Coal,
        ResourceType::IronOre,
        ResourceType::IronBar,
        ResourceType::AdvancedMetal,
        ResourceType::Component,
        ResourceType::Slag,
        ResourceType::Power,
    ];

    /// Position of this kind in [`ResourceType::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The snake_case name used in data files.
    pub fn name(self) -> &'static str {
        match self {
            ResourceType::Water => "water",
            ResourceType::Food => "food",
            ResourceType::Wood => "wood",
            ResourceType::Stone => "stone",
            ResourceType::Coal => "coal",
            ResourceType::IronOre => "iron_ore",
            ResourceType::IronBar => "iron_bar",
            ResourceType::AdvancedMetal => "advanced_metal",
            ResourceType::Component => "component",
            ResourceType::Slag => "slag",
            ResourceType::Power => "power",
        }
    }

    /// Look up a resource kind by its data-file name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Resource nodes
// ---------------------------------------------------------------------------

/// Kind of stationary deposit an extractor can sit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceNodeKind {
    WaterSource,
    IronOreDeposit,
    CoalDeposit,
    StoneQuarry,
}

impl ResourceNodeKind {
    pub const ALL: [ResourceNodeKind; 4] = [
        ResourceNodeKind::WaterSource,
        ResourceNodeKind::IronOreDeposit,
        ResourceNodeKind::CoalDeposit,
        ResourceNodeKind::StoneQuarry,
    ];

    /// The resource credited at the full production rate.
    pub fn primary(self) -> ResourceType {
        match self {
            ResourceNodeKind::WaterSource => ResourceType::Water,
            ResourceNodeKind::IronOreDeposit => ResourceType::IronOre,
            ResourceNodeKind::CoalDeposit => ResourceType::Coal,
            ResourceNodeKind::StoneQuarry => ResourceType::Stone,
        }
    }

    /// Secondary resource credited at a fraction of the production rate.
    pub fn byproduct(self) -> Option<ResourceType> {
        match self {
            ResourceNodeKind::IronOreDeposit | ResourceNodeKind::CoalDeposit => {
                Some(ResourceType::Stone)
            }
            ResourceNodeKind::WaterSource | ResourceNodeKind::StoneQuarry => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ResourceNodeKind::WaterSource => "water_source",
            ResourceNodeKind::IronOreDeposit => "iron_ore_deposit",
            ResourceNodeKind::CoalDeposit => "coal_deposit",
            ResourceNodeKind::StoneQuarry => "stone_quarry",
        }
    }
}

/// Richness of a resource node, 1 through 3. Production per tick scales with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Tier(u8);

impl Tier {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 3;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Tier::new(value).ok_or_else(|| format!("tier {value} outside 1..=3"))
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> u8 {
        tier.0
    }
}

// ---------------------------------------------------------------------------
// Dense quantity array
// ---------------------------------------------------------------------------

/// One `Fixed64` quantity per [`ResourceType`], zero-filled by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceAmounts([Fixed64; ResourceType::COUNT]);

impl ResourceAmounts {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, resource: ResourceType) -> Fixed64 {
        self.0[resource.index()]
    }

    #[inline]
    pub fn set(&mut self, resource: ResourceType, quantity: Fixed64) {
        self.0[resource.index()] = quantity;
    }

    #[inline]
    pub fn add(&mut self, resource: ResourceType, quantity: Fixed64) {
        self.0[resource.index()] += quantity;
    }

    /// Sum over all kinds.
    pub fn total(&self) -> Fixed64 {
        self.0.iter().copied().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|q| *q == Fixed64::ZERO)
    }

    /// All kinds with their quantity, in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceType, Fixed64)> + '_ {
        ResourceType::ALL.iter().map(|&r| (r, self.get(r)))
    }

    /// Only kinds holding a non-zero quantity, in enumeration order.
    pub fn nonzero(&self) -> impl Iterator<Item = (ResourceType, Fixed64)> + '_ {
        self.iter().filter(|(_, q)| *q != Fixed64::ZERO)
    }
}

impl FromIterator<(ResourceType, Fixed64)> for ResourceAmounts {
    fn from_iter<I: IntoIterator<Item = (ResourceType, Fixed64)>>(iter: I) -> Self {
        let mut amounts = ResourceAmounts::new();
        for (resource, quantity) in iter {
            amounts.add(resource, quantity);
        }
        amounts
    }
}

// ---------------------------------------------------------------------------
// Storage buffer
// ---------------------------------------------------------------------------

/// Per-building store of resources bounded by a scalar capacity.
///
/// `add` does not enforce the capacity; callers gate on [`StorageBuffer::spare`]
/// first. The one place that deliberately skips the gate is recipe output
/// completion, which may leave the buffer transiently above capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageBuffer {
    amounts: ResourceAmounts,
    capacity: Fixed64,
}

impl StorageBuffer {
    /// An empty buffer with the given capacity.
    pub fn new(capacity: Fixed64) -> Self {
        Self {
            amounts: ResourceAmounts::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> Fixed64 {
        self.capacity
    }

    pub fn amount(&self, resource: ResourceType) -> Fixed64 {
        self.amounts.get(resource)
    }

    pub fn amounts(&self) -> &ResourceAmounts {
        &self.amounts
    }

    pub fn total(&self) -> Fixed64 {
        self.amounts.total()
    }

    /// Remaining room, never negative.
    pub fn spare(&self) -> Fixed64 {
        (self.capacity - self.total()).max(Fixed64::ZERO)
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    /// Whether at least `quantity` of `resource` is held.
    pub fn has(&self, resource: ResourceType, quantity: Fixed64) -> bool {
        self.amount(resource) >= quantity
    }

    pub fn add(&mut self, resource: ResourceType, quantity: Fixed64) {
        self.amounts.add(resource, quantity);
    }

    /// Remove up to `quantity`, clamped at zero. Returns the amount removed.
    pub fn remove(&mut self, resource: ResourceType, quantity: Fixed64) -> Fixed64 {
        let held = self.amount(resource);
        let taken = held.min(quantity.max(Fixed64::ZERO));
        self.amounts.set(resource, held - taken);
        taken
    }

    /// Empty the buffer, returning everything it held.
    pub fn take_all(&mut self) -> ResourceAmounts {
        std::mem::take(&mut self.amounts)
    }
}

// ---------------------------------------------------------------------------
// Global inventory
// ---------------------------------------------------------------------------

/// Resources held by the player outside any building.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GlobalInventory {
    amounts: ResourceAmounts,
}

impl GlobalInventory {
    pub fn new(starting: ResourceAmounts) -> Self {
        Self { amounts: starting }
    }

    pub fn amount(&self, resource: ResourceType) -> Fixed64 {
        self.amounts.get(resource)
    }

    pub fn amounts(&self) -> &ResourceAmounts {
        &self.amounts
    }

    pub fn add(&mut self, resource: ResourceType, quantity: Fixed64) {
        self.amounts.add(resource, quantity);
    }

    /// Add every quantity in `amounts`.
    pub fn absorb(&mut self, amounts: &ResourceAmounts) {
        for (resource, quantity) in amounts.nonzero() {
            self.amounts.add(resource, quantity);
        }
    }

    /// Subtract `quantity`, flooring at zero. Returns the new amount.
    pub fn consume(&mut self, resource: ResourceType, quantity: Fixed64) -> Fixed64 {
        let remaining = (self.amount(resource) - quantity).max(Fixed64::ZERO);
        self.amounts.set(resource, remaining);
        remaining
    }
}
