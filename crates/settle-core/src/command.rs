//! Input command queue for externally-submitted engine mutations.
//!
//! Commands are queued by any producer (UI, scripting, tests) and executed
//! in submission order by [`Engine::step_with_commands`](crate::engine::Engine::step_with_commands)
//! right before the tick, so every mutation lands between two ticks.

use crate::engine::{ConnectionSpec, PlacementRejected, Unchanged};
use crate::grid::Position;
use crate::id::{BuildingTypeId, ConnectionId, EntityId, RecipeId};
use crate::sim::TickReport;

// ---------------------------------------------------------------------------
// Command enum
// ---------------------------------------------------------------------------

/// A single command that can be submitted to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Place a building at a grid position.
    Place {
        building: BuildingTypeId,
        position: Position,
    },
    /// Connect two entities with a new directed edge.
    Connect {
        source: EntityId,
        dest: EntityId,
        spec: ConnectionSpec,
    },
    /// Remove an existing edge.
    Disconnect { connection: ConnectionId },
    /// Rebind a processing building's recipe.
    SetRecipe { entity: EntityId, recipe: RecipeId },
    /// Empty an entity's buffer into the global inventory.
    Collect { entity: EntityId },
}

/// What a successful command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Placed(EntityId),
    Connected(ConnectionId),
    /// Whether an edge was actually removed.
    Disconnected(bool),
    RecipeSet,
    Collected,
}

/// Why a command left the state unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Placement(#[from] PlacementRejected),
    #[error(transparent)]
    Unchanged(#[from] Unchanged),
}

/// Result of one `Engine::step_with_commands` call.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// One entry per drained command, in submission order.
    pub outcomes: Vec<Result<CommandOutcome, CommandError>>,
    pub report: TickReport,
}

// ---------------------------------------------------------------------------
// CommandQueue
// ---------------------------------------------------------------------------

/// A queue of commands waiting to be executed at the next tick boundary.
///
/// Supports optional history tracking for debugging.
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: Vec<Command>,
    /// Executed commands with the turn they ran before.
    history: Vec<(u64, Command)>,
    /// 0 = no history.
    max_history: usize,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue that retains up to `max_history` executed commands.
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            max_history,
            ..Self::default()
        }
    }

    pub fn push(&mut self, command: Command) {
        self.pending.push(command);
    }

    pub fn push_batch(&mut self, commands: impl IntoIterator<Item = Command>) {
        self.pending.extend(commands);
    }

    /// Drain all pending commands in submission order, recording them in
    /// history under `turn`.
    pub fn drain(&mut self, turn: u64) -> Vec<Command> {
        let commands: Vec<Command> = self.pending.drain(..).collect();

        if self.max_history > 0 {
            self.history
                .extend(commands.iter().cloned().map(|c| (turn, c)));
            let excess = self.history.len().saturating_sub(self.max_history);
            self.history.drain(..excess);
        }

        commands
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn history(&self) -> &[(u64, Command)] {
        &self.history
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::resource::ResourceType;
    use crate::test_utils::*;

    fn collect(entity: EntityId) -> Command {
        Command::Collect { entity }
    }

    #[test]
    fn drain_preserves_submission_order() {
        let mut q = CommandQueue::new();
        let cmds = vec![
            Command::Disconnect {
                connection: ConnectionId::default(),
            },
            collect(EntityId::default()),
        ];
        q.push_batch(cmds.clone());
        assert_eq!(q.pending_count(), 2);
        assert_eq!(q.drain(0), cmds);
        assert!(q.is_empty());
        assert!(q.history().is_empty());
    }

    #[test]
    fn history_is_bounded() {
        let mut q = CommandQueue::with_max_history(2);
        for turn in 0..3 {
            q.push(collect(EntityId::default()));
            q.drain(turn);
        }
        let turns: Vec<u64> = q.history().iter().map(|(t, _)| *t).collect();
        assert_eq!(turns, vec![1, 2]);
    }

    #[test]
    fn clear_drops_pending() {
        let mut q = CommandQueue::new();
        q.push(collect(EntityId::default()));
        q.clear();
        assert!(q.drain(0).is_empty());
    }

    #[test]
    fn step_runs_commands_before_tick() {
        let mut engine: Engine = engine_with_nodes(
            4,
            4,
            &[(crate::resource::ResourceNodeKind::StoneQuarry, 0, 0, 1)],
        );
        let miner = building(&engine, "miner");
        let mut q = CommandQueue::new();
        q.push(Command::Place {
            building: miner,
            position: crate::grid::Position::new(0, 0),
        });
        let step = engine.step_with_commands(&mut q);
        let Ok(CommandOutcome::Placed(id)) = step.outcomes[0].clone() else {
            panic!("placement failed: {:?}", step.outcomes[0]);
        };
        // Placed before the tick, so it already extracted once.
        assert_eq!(buffer(&engine, id).amount(ResourceType::Stone), fixed(1.0));
        assert_eq!(step.report.turn, 1);
    }
}
