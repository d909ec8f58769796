//! Recipe processing state machine for processing buildings.
//!
//! A building is either Idle or Processing. Starting a cycle consumes every
//! input at once; the cycle then gains a fixed progress step per tick and
//! releases all outputs when progress reaches 100.

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, FULL_PROGRESS, RecipeDefinition, RecipeEntry};
use crate::fixed::Fixed64;
use crate::id::RecipeId;
use crate::resource::StorageBuffer;

/// Coarse phase derived from [`ProcessingState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingPhase {
    Idle,
    Processing,
}

/// Runtime recipe state attached to a processing building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingState {
    pub recipe: Option<RecipeId>,
    /// 0 to 100.
    pub progress: Fixed64,
    pub is_processing: bool,
}

impl ProcessingState {
    pub fn new(recipe: Option<RecipeId>) -> Self {
        Self {
            recipe,
            progress: Fixed64::ZERO,
            is_processing: false,
        }
    }

    /// Bind a new recipe. Any cycle in flight is abandoned along with the
    /// inputs it already consumed.
    pub fn bind(&mut self, recipe: RecipeId) {
        self.recipe = Some(recipe);
        self.progress = Fixed64::ZERO;
        self.is_processing = false;
    }

    pub fn phase(&self) -> ProcessingPhase {
        if self.is_processing {
            ProcessingPhase::Processing
        } else {
            ProcessingPhase::Idle
        }
    }
}

// ---------------------------------------------------------------------------
// Tick result
// ---------------------------------------------------------------------------

/// The outcome of a single tick for a processing building.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingResult {
    /// Inputs deducted from the buffer this tick.
    pub consumed: Vec<RecipeEntry>,
    /// Outputs added to the buffer this tick.
    pub produced: Vec<RecipeEntry>,
    /// A cycle began this tick (Idle->Processing).
    pub started: bool,
    /// A cycle finished this tick (Processing->Idle).
    pub completed: bool,
}

// ---------------------------------------------------------------------------
// Advance
// ---------------------------------------------------------------------------

/// Advance one building by one tick.
///
/// A missing or unknown recipe leaves the building idle forever.
pub fn advance(
    state: &mut ProcessingState,
    buffer: &mut StorageBuffer,
    catalog: &Catalog,
) -> ProcessingResult {
    let mut result = ProcessingResult::default();
    let Some(recipe) = state.recipe.and_then(|id| catalog.recipe(id)) else {
        return result;
    };

    if !state.is_processing {
        if !inputs_available(recipe, buffer) {
            return result;
        }
        for input in &recipe.inputs {
            buffer.remove(input.resource, input.quantity);
        }
        result.consumed = recipe.inputs.clone();
        state.is_processing = true;
        state.progress = Fixed64::ZERO;
        result.started = true;
    }

    state.progress = state.progress.saturating_add(recipe.progress_step());

    if state.progress >= FULL_PROGRESS {
        // Outputs are released without a capacity check; overflow and
        // transport bring the buffer back under capacity.
        for output in &recipe.outputs {
            buffer.add(output.resource, output.quantity);
        }
        result.produced = recipe.outputs.clone();
        state.is_processing = false;
        state.progress = Fixed64::ZERO;
        result.completed = true;
    }

    result
}

fn inputs_available(recipe: &RecipeDefinition, buffer: &StorageBuffer) -> bool {
    recipe
        .inputs
        .iter()
        .all(|input| buffer.has(input.resource, input.quantity))
}
