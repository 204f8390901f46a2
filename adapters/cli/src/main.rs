#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs scripted Riverguard scenarios.
//!
//! Plays the built-in campaign headlessly: an automatic builder spends the
//! starting balance, every remaining wave is either stepped locally or
//! delegated to an external simulator, and the terminal outcome is printed.
//! Layouts can be imported and exported as single-line transfer strings.

mod loadout;

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use riverguard_core::{BuildError, Phase, WaveError};
use riverguard_offload::OffloadClient;
use riverguard_world::{query, Game};

use crate::loadout::LoadoutSnapshot;

/// Tick granularity used when stepping waves locally.
const TICK_SECONDS: f64 = 0.1;

/// Ceiling on ticks per wave, against configs that can never resolve.
const MAX_TICKS_PER_WAVE: u64 = 1_000_000;

#[derive(Debug, Parser)]
#[command(name = "riverguard", about = "Scripted wave-defense scenario runner")]
struct Args {
    /// Map id to play; defaults to the campaign's first map.
    #[arg(long)]
    map: Option<String>,

    /// Simulation speed multiplier.
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Accelerated wave simulator; whole waves are delegated to it.
    #[arg(long)]
    offload_bin: Option<PathBuf>,

    /// Loadout transfer string applied before the first wave.
    #[arg(long)]
    loadout: Option<String>,

    /// Print the final layout as a loadout transfer string.
    #[arg(long)]
    export_loadout: bool,

    /// Stop after this many waves even if more remain.
    #[arg(long)]
    waves: Option<usize>,

    /// Coins the automatic builder keeps in reserve.
    #[arg(long, default_value_t = 1500)]
    reserve: i64,

    /// Disable the automatic builder and rely on the loadout alone.
    #[arg(long)]
    no_auto_build: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut game = Game::new(riverguard_campaign::ruleset(), riverguard_campaign::maps())
        .context("campaign data rejected")?;
    if let Some(map) = &args.map {
        game.set_map(map)
            .with_context(|| format!("selecting map `{map}`"))?;
    }
    game.set_speed(args.speed);
    if let Some(binary) = &args.offload_bin {
        log::info!("delegating waves to {}", binary.display());
        game.set_offload(Box::new(OffloadClient::new(binary)));
    }
    if let Some(line) = &args.loadout {
        apply_loadout(&mut game, line)?;
    }

    run(&mut game, &args)?;

    let snapshot = query::snapshot(&game);
    println!(
        "map {}: coins {}, xp {}, spawned {}, killed {}, leaked {}",
        snapshot.map_id,
        snapshot.coins,
        snapshot.xp,
        snapshot.stats.spawned,
        snapshot.stats.killed,
        snapshot.stats.leaked,
    );
    if let Some(outcome) = &snapshot.outcome {
        println!(
            "outcome: {}",
            if outcome.victory { "victory" } else { "defeat" }
        );
    }
    if args.export_loadout {
        let layout = LoadoutSnapshot::capture(&snapshot.map_id, &query::towers(&game));
        println!("loadout: {}", layout.encode());
    }
    Ok(())
}

/// Plays waves until the map resolves or the requested count is reached.
fn run(game: &mut Game, args: &Args) -> anyhow::Result<()> {
    let mut played = 0usize;
    loop {
        if args.waves.is_some_and(|limit| played >= limit) {
            break;
        }
        if !args.no_auto_build {
            auto_build(game, args.reserve);
        }
        let wave = match game.start_next_wave() {
            Ok(wave) => wave,
            Err(WaveError::NoWavesRemaining | WaveError::InvalidPhase) => break,
        };

        let mut ticks = 0u64;
        while query::snapshot(game).phase == Phase::WaveRunning {
            game.tick(TICK_SECONDS);
            ticks += 1;
            if ticks > MAX_TICKS_PER_WAVE {
                bail!("wave {} did not terminate", wave + 1);
            }
        }
        played += 1;

        let snapshot = query::snapshot(game);
        log::info!(
            "wave {} done: coins {}, killed {}, leaked {}",
            wave + 1,
            snapshot.coins,
            snapshot.stats.killed,
            snapshot.stats.leaked,
        );
        if snapshot.phase == Phase::MapResult {
            break;
        }
    }
    Ok(())
}

/// Greedy builder: fill empty slots in rotation, then spend surplus on
/// upgrades, always leaving `reserve` coins untouched.
fn auto_build(game: &mut Game, reserve: i64) {
    const ROTATION: [&str; 5] = ["arrow", "bomb", "fire", "wind", "lightning"];

    let mut built = query::towers(game).len();
    for slot in query::slots(game) {
        if query::snapshot(game).coins <= reserve {
            return;
        }
        if slot.occupied {
            continue;
        }
        if !slot.active && game.activate_slot(&slot.id).is_err() {
            continue;
        }
        let tower = ROTATION[built % ROTATION.len()];
        if game.build_tower(&slot.id, tower).is_ok() {
            log::debug!("built {tower} on {}", slot.id);
            built += 1;
        }
    }

    let mut progressed = true;
    while progressed && query::snapshot(game).coins > reserve {
        progressed = false;
        for tower in query::towers(game) {
            if query::snapshot(game).coins <= reserve {
                break;
            }
            if game.upgrade_tower(&tower.slot_id).is_ok() {
                progressed = true;
            }
        }
    }
}

/// Rebuilds a previously captured layout on the freshly loaded map.
fn apply_loadout(game: &mut Game, line: &str) -> anyhow::Result<()> {
    let selected = query::snapshot(game).map_id;
    let layout = LoadoutSnapshot::decode(line).context("decoding loadout")?;
    if layout.map != selected {
        bail!(
            "loadout was captured on `{}` but `{selected}` is selected",
            layout.map
        );
    }
    for entry in &layout.towers {
        match game.activate_slot(&entry.slot) {
            Ok(_) | Err(BuildError::AlreadyActivated(_)) => {}
            Err(err) => bail!("activating slot `{}`: {err}", entry.slot),
        }
        let _ = game
            .build_tower(&entry.slot, &entry.tower)
            .with_context(|| format!("building `{}` on `{}`", entry.tower, entry.slot))?;
        for _ in 1..entry.level {
            let _ = game
                .upgrade_tower(&entry.slot)
                .with_context(|| format!("upgrading `{}`", entry.slot))?;
        }
    }
    log::info!("applied loadout with {} towers", layout.towers.len());
    Ok(())
}
