//! Minimal settlement on the built-in map: a water pump, an ore miner with
//! a chest beside it, and a smelter fed by a conveyor.
//!
//! Run with: `RUST_LOG=settle_core=debug cargo run -p settle-data --example minimal_settlement`

use settle_core::command::{Command, CommandOutcome, CommandQueue};
use settle_core::engine::ConnectionSpec;
use settle_core::fixed::{Fixed64, fixed64_to_f64};
use settle_core::grid::Position;
use settle_core::resource::ResourceType;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let data = settle_data::builtin_game_data()?;
    let mut engine = data.engine()?;
    let catalog = engine.catalog().clone();
    let building = |name: &str| {
        catalog
            .building_id(name)
            .ok_or_else(|| format!("no building named {name}"))
    };

    // --- Build the layout ---

    let mut queue = CommandQueue::new();
    queue.push_batch([
        Command::Place {
            building: building("extractor")?,
            position: Position::new(15, 3),
        },
        Command::Place {
            building: building("miner")?,
            position: Position::new(12, 8),
        },
        Command::Place {
            building: building("storage_small")?,
            position: Position::new(12, 9),
        },
        Command::Place {
            building: building("smelter")?,
            position: Position::new(11, 8),
        },
    ]);
    let step = engine.step_with_commands(&mut queue);
    let placed: Vec<_> = step
        .outcomes
        .iter()
        .filter_map(|o| match o {
            Ok(CommandOutcome::Placed(id)) => Some(*id),
            _ => None,
        })
        .collect();
    let [pump, miner, chest, smelter] = placed[..] else {
        return Err("layout placement failed".into());
    };

    engine.connect_with(
        miner,
        smelter,
        ConnectionSpec {
            rate: Some(Fixed64::from_num(2)),
            kind: None,
        },
    )?;

    // --- Run ---

    println!("=== 30 ticks on fantasy_world ===\n");
    for _ in 0..30 {
        let report = engine.tick();
        println!(
            "Turn {:>2}: extracted={:.1} transported={:.1} cycles={} drains={} pop={} hash={:016x}",
            report.turn,
            fixed64_to_f64(report.extracted),
            fixed64_to_f64(report.transported),
            report.cycles_completed,
            report.overflow_drains,
            engine.state().population(),
            report.state_hash,
        );
    }

    let snapshot = engine.snapshot();
    println!();
    for (label, id) in [("pump", pump), ("miner", miner), ("chest", chest), ("smelter", smelter)] {
        if let Some(entity) = snapshot.entity(id) {
            let contents: Vec<String> = entity
                .contents
                .iter()
                .map(|(r, q)| format!("{r}={:.1}", fixed64_to_f64(*q)))
                .collect();
            println!("{label:>8}: {}", contents.join(" "));
        }
    }

    engine.collect_to_player_inventory(smelter)?;
    println!(
        "\nIron bars in inventory after collecting the smelter: {:.1}",
        fixed64_to_f64(engine.state().inventory().amount(ResourceType::IronBar))
    );
    Ok(())
}
