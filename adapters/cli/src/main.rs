#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line runner for the Sidewinder spawn scheduler.
//!
//! Assembles a simulation from command-line parameters, drives it with a
//! fixed timestep and a scripted kill cadence so death and respawn traffic
//! is visible, and prints the resulting event transcript. Identical
//! arguments always produce identical transcripts.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use sidewinder_core::config::{KindEntry, RegistryConfig, SimulationConfig, SpawnerConfig};
use sidewinder_core::{
    Enemy, EnemyFactory, EnemyId, EnemyKindId, Facing, NullActivityToggle, Position,
    SpawnPlacement, SpawnerId,
};
use sidewinder_registry::query;
use sidewinder_system_bootstrap::Simulation;

/// Demo kind catalog: (kind, weight, respawns after death).
const KIND_CATALOG: [(u32, u32, bool); 3] = [(0, 5, true), (1, 3, true), (2, 2, false)];

/// Spacing between spawn points along the horizontal axis, in world units.
const SPAWN_POINT_SPACING: f32 = 320.0;

#[derive(Debug, Parser)]
#[command(name = "sidewinder", about = "Headless spawn scheduler demo")]
struct Args {
    /// Number of simulation steps to run.
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Fixed timestep in milliseconds.
    #[arg(long, default_value_t = 16)]
    dt_ms: u64,

    /// Master seed; per-spawner seeds are derived from it.
    #[arg(long, default_value_t = 0x51de_cafe)]
    seed: u64,

    /// Global population cap.
    #[arg(long, default_value_t = 6)]
    cap: usize,

    /// Number of spawn points.
    #[arg(long, default_value_t = 2)]
    spawners: usize,

    /// Kill the oldest live enemy every this many ticks (0 disables).
    #[arg(long, default_value_t = 90)]
    kill_every: u32,
}

/// Spawn points laid out along the scroll axis.
struct LinePlacement;

impl SpawnPlacement for LinePlacement {
    fn position_of(&self, spawner: SpawnerId) -> Position {
        Position::new(spawner.get() as f32 * SPAWN_POINT_SPACING, 0.0)
    }
}

/// Factory backed by the demo kind catalog.
struct CatalogFactory;

impl EnemyFactory for CatalogFactory {
    fn instantiate(&mut self, kind: EnemyKindId, id: EnemyId) -> Enemy {
        let respawns = KIND_CATALOG
            .iter()
            .find(|(catalog_kind, _, _)| *catalog_kind == kind.get())
            .map_or(false, |(_, _, respawns)| *respawns);
        Enemy::new(id, kind, respawns)
    }
}

fn kind_table() -> anyhow::Result<Vec<KindEntry>> {
    KIND_CATALOG
        .iter()
        .map(|(kind, weight, _)| {
            let weight = NonZeroU32::new(*weight).context("catalog weight must be positive")?;
            Ok(KindEntry::new(EnemyKindId::new(*kind), weight))
        })
        .collect()
}

fn build_config(args: &Args) -> anyhow::Result<SimulationConfig> {
    let mut seeds = ChaCha8Rng::seed_from_u64(args.seed);
    let mut spawners = Vec::with_capacity(args.spawners);
    for index in 0..args.spawners {
        let base_facing = if index % 2 == 0 {
            Facing::Right
        } else {
            Facing::Left
        };
        let spawner = SpawnerConfig::new(
            Duration::from_secs(2),
            Duration::from_secs(3),
            Duration::from_secs(4),
            base_facing,
            0.25,
            kind_table()?,
            seeds.gen::<u64>(),
        )
        .context("spawner configuration rejected")?;
        spawners.push(spawner);
    }

    Ok(SimulationConfig {
        registry: RegistryConfig::new(args.cap, Duration::from_secs(5))
            .context("registry configuration rejected")?,
        spawners,
        pool_prewarm: args.cap + args.spawners * 4,
    })
}

fn oldest_live_enemy(simulation: &Simulation) -> Option<EnemyId> {
    query::active_view(simulation.registry(), simulation.enemy_arena())
        .first()
        .map(|snapshot| snapshot.id)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut simulation = Simulation::new(build_config(&args)?).context("simulation assembly")?;

    let placement = LinePlacement;
    let mut factory = CatalogFactory;
    let mut toggle = NullActivityToggle;
    let dt = Duration::from_millis(args.dt_ms);

    let mut events = Vec::new();
    for tick in 0..args.ticks {
        if args.kill_every > 0 && tick > 0 && tick % args.kill_every == 0 {
            if let Some(victim) = oldest_live_enemy(&simulation) {
                let _ = simulation.kill(victim, &mut events);
            }
        }

        simulation.tick(dt, &placement, &mut factory, &mut toggle, &mut events);
        for event in events.drain(..) {
            println!("[{tick:>5}] {event:?}");
        }
    }

    println!(
        "done: {} live, {} waiting to respawn",
        simulation.registry().live_count(),
        simulation.registry().waiting_count()
    );
    Ok(())
}
