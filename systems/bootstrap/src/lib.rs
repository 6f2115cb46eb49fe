#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Assembly of the complete spawn scheduling simulation.
//!
//! The hosting environment hands a validated [`SimulationConfig`] to
//! [`Simulation::new`]; no component discovers collaborators on its own.
//! [`Simulation::tick`] fixes the per-step ordering the determinism of
//! respawn eligibility depends on: registry countdowns are decremented
//! before any spawner can receive a now-eligible respawn, and spawners run
//! last, in registration order.

use std::time::Duration;

use sidewinder_core::config::{ConfigError, SimulationConfig};
use sidewinder_core::list::NodeArena;
use sidewinder_core::{
    ActivityToggle, Enemy, EnemyFactory, EnemyId, Event, SpawnPlacement, SpawnerId,
};
use sidewinder_registry::EnemyRegistry;
use sidewinder_system_spawning::{route_due_respawns, SpawnRequest, Spawner};

/// Owns the registry, the spawners, and the shared node arenas.
#[derive(Debug)]
pub struct Simulation {
    registry: EnemyRegistry,
    spawners: Vec<Spawner>,
    enemy_arena: NodeArena<Enemy>,
    queue_arena: NodeArena<SpawnRequest>,
}

impl Simulation {
    /// Assembles a simulation from configuration.
    ///
    /// Spawner identifiers are assigned in the order the configurations
    /// appear, which is also the respawn routing tie-break order. Both node
    /// arenas are pre-warmed with the configured free node count.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        if config.spawners.is_empty() {
            return Err(ConfigError::NoSpawners);
        }
        let registry = EnemyRegistry::new(config.registry);
        let spawners = config
            .spawners
            .into_iter()
            .enumerate()
            .map(|(index, spawner)| Spawner::new(SpawnerId::new(index as u32), spawner))
            .collect();
        Ok(Self {
            registry,
            spawners,
            enemy_arena: NodeArena::with_capacity(config.pool_prewarm),
            queue_arena: NodeArena::with_capacity(config.pool_prewarm),
        })
    }

    /// Advances the whole simulation by one step.
    pub fn tick(
        &mut self,
        dt: Duration,
        placement: &dyn SpawnPlacement,
        factory: &mut dyn EnemyFactory,
        toggle: &mut dyn ActivityToggle,
        out: &mut Vec<Event>,
    ) {
        self.registry.tick(&mut self.enemy_arena, dt, out);
        route_due_respawns(
            &mut self.registry,
            &mut self.spawners,
            &mut self.enemy_arena,
            &mut self.queue_arena,
            out,
        );
        for spawner in &mut self.spawners {
            spawner.tick(
                dt,
                &mut self.queue_arena,
                &mut self.enemy_arena,
                &mut self.registry,
                placement,
                factory,
                toggle,
                out,
            );
        }
    }

    /// Drives a live enemy into its death window, as the collision layer
    /// would on a lethal hit.
    pub fn kill(&mut self, enemy: EnemyId, out: &mut Vec<Event>) -> bool {
        self.registry.kill(&mut self.enemy_arena, enemy, out)
    }

    /// Read-only access to the registry.
    #[must_use]
    pub const fn registry(&self) -> &EnemyRegistry {
        &self.registry
    }

    /// Read-only access to the spawners in registration order.
    #[must_use]
    pub fn spawners(&self) -> &[Spawner] {
        &self.spawners
    }

    /// Shared arena backing the registry's enemy lists.
    #[must_use]
    pub const fn enemy_arena(&self) -> &NodeArena<Enemy> {
        &self.enemy_arena
    }
}
