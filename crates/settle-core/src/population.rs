//! Population upkeep and the win condition.

use crate::config::Tuning;
use crate::fixed::Fixed64;
use crate::resource::{GlobalInventory, ResourceType};

/// Apply one tick of food and water upkeep. Returns the population delta.
///
/// Upkeep is `population x per-capita` for each of food and water, floored
/// at zero. If either stock ends at exactly zero the population shrinks by
/// one, never below one. Otherwise, when a growth surplus is configured and
/// both stocks are at or above it, the population grows by one up to the
/// configured maximum.
pub fn consume(population: &mut u32, inventory: &mut GlobalInventory, tuning: &Tuning) -> i32 {
    let head_count = Fixed64::from_num(*population);
    let food = inventory.consume(ResourceType::Food, head_count * tuning.food_per_capita);
    let water = inventory.consume(ResourceType::Water, head_count * tuning.water_per_capita);

    if food == Fixed64::ZERO || water == Fixed64::ZERO {
        if *population > 1 {
            *population -= 1;
            return -1;
        }
        return 0;
    }

    if let Some(surplus) = tuning.growth_surplus
        && food >= surplus
        && water >= surplus
        && *population < tuning.max_population
    {
        *population += 1;
        return 1;
    }
    0
}

/// Whether the settlement has met the win condition.
pub fn has_won(population: u32, inventory: &GlobalInventory, tuning: &Tuning) -> bool {
    population >= tuning.win_population
        && inventory.amount(ResourceType::Component) >= tuning.win_components
}
