#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative registry of live enemies.
//!
//! The registry owns the active set and the respawn-wait set, enforces the
//! global population cap, and hands out enemy identifiers. Spawner systems
//! submit enemies through [`EnemyRegistry::admit`], which is the sole
//! authority over the cap; the cached [`EnemyRegistry::spawning_enabled`]
//! flag is advisory and may go stale within a tick.

use std::cmp::Ordering;
use std::time::Duration;

use sidewinder_core::config::RegistryConfig;
use sidewinder_core::list::{NodeArena, PooledList, SortedPooledList};
use sidewinder_core::{Enemy, EnemyId, Event};

fn by_countdown(left: &Enemy, right: &Enemy) -> Ordering {
    left.respawn_countdown().cmp(&right.respawn_countdown())
}

/// Tracks every live enemy and the dead ones waiting to respawn.
#[derive(Debug)]
pub struct EnemyRegistry {
    active: PooledList<Enemy>,
    respawn_wait: SortedPooledList<Enemy>,
    population_cap: usize,
    respawn_delay: Duration,
    next_id: u32,
    spawning_enabled: bool,
}

impl EnemyRegistry {
    /// Creates an empty registry from validated configuration.
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            active: PooledList::new(),
            respawn_wait: SortedPooledList::new(by_countdown),
            population_cap: config.population_cap(),
            respawn_delay: config.respawn_delay(),
            next_id: 1,
            spawning_enabled: true,
        }
    }

    /// Returns the next enemy identifier and advances the counter.
    ///
    /// Called once per enemy at first initialization; identifiers are never
    /// reused, even across death and respawn of the same instance.
    pub fn next_id(&mut self) -> EnemyId {
        let id = EnemyId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Number of enemies currently counted against the population cap.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.active.len()
    }

    /// Number of dead enemies waiting in the respawn-wait set.
    #[must_use]
    pub fn waiting_count(&self) -> usize {
        self.respawn_wait.len()
    }

    /// Cached advisory flag derived from the cap check.
    ///
    /// A scheduler may observe a stale value within a tick; [`Self::admit`]
    /// re-checks authoritatively.
    #[must_use]
    pub const fn spawning_enabled(&self) -> bool {
        self.spawning_enabled
    }

    /// Adds the enemy to the active set, subject to the population cap.
    ///
    /// Refusal hands the enemy back to the caller without mutating any
    /// registry state.
    pub fn admit(&mut self, arena: &mut NodeArena<Enemy>, enemy: Enemy) -> Result<(), Enemy> {
        if self.active.len() >= self.population_cap {
            return Err(enemy);
        }
        self.active.push_back(arena, enemy);
        self.spawning_enabled = self.active.len() < self.population_cap;
        Ok(())
    }

    /// Drives an active enemy into its death window.
    ///
    /// Stand-in entry point for the collision layer; returns false when the
    /// enemy is not live or not in a killable state.
    pub fn kill(&mut self, arena: &mut NodeArena<Enemy>, id: EnemyId, out: &mut Vec<Event>) -> bool {
        let mut killed = false;
        self.active.for_each_mut(arena, |enemy| {
            if !killed && enemy.id() == id && enemy.kill().is_ok() {
                killed = true;
            }
        });
        if killed {
            out.push(Event::EnemyKilled { enemy: id });
        }
        killed
    }

    /// Removes an enemy from the active set, forces it to Dead, and routes
    /// it onward.
    ///
    /// Respawn-enabled enemies enter the respawn-wait set with their
    /// countdown reset to the configured delay; the rest are handed back to
    /// the caller for destruction. A report for an unknown identifier is a
    /// non-fatal diagnostic and mutates nothing.
    pub fn report_death(
        &mut self,
        arena: &mut NodeArena<Enemy>,
        id: EnemyId,
        out: &mut Vec<Event>,
    ) -> Option<Enemy> {
        let Some(mut enemy) = self.active.remove_first_match(arena, |enemy| enemy.id() == id)
        else {
            out.push(Event::DeathReportIgnored { enemy: id });
            return None;
        };
        self.spawning_enabled = self.active.len() < self.population_cap;
        // Reports from the host can arrive while the enemy is still Active
        // (out-of-bounds, level reset); it must leave here spawnable.
        enemy.mark_dead();

        if enemy.respawns() {
            enemy.reset_respawn_countdown(self.respawn_delay);
            out.push(Event::RespawnQueued {
                enemy: id,
                delay: self.respawn_delay,
            });
            self.respawn_wait.insert_sorted(arena, enemy);
            None
        } else {
            out.push(Event::EnemyDiscarded { enemy: id });
            Some(enemy)
        }
    }

    /// Advances the registry by one simulation step.
    ///
    /// Respawn countdowns are decremented first, so an enemy queued by a
    /// death in this same step keeps its full delay until the next one.
    /// Dying enemies then accumulate time; each one whose death window
    /// elapses is removed from the active set and routed through the death
    /// path. The registry never dequeues respawns itself.
    pub fn tick(&mut self, arena: &mut NodeArena<Enemy>, dt: Duration, out: &mut Vec<Event>) {
        self.respawn_wait
            .for_each_mut(arena, |enemy| enemy.tick_respawn_countdown(dt));

        let mut finished: Vec<EnemyId> = Vec::new();
        self.active.for_each_mut(arena, |enemy| {
            if enemy.tick_dying(dt) {
                finished.push(enemy.id());
            }
        });
        for id in finished {
            out.push(Event::EnemyDied { enemy: id });
            drop(self.report_death(arena, id, out));
        }
    }

    /// Detaches the front of the respawn-wait set once its countdown has
    /// fully elapsed.
    pub fn take_due_respawn(&mut self, arena: &mut NodeArena<Enemy>) -> Option<Enemy> {
        if self.respawn_wait.front(arena)?.respawn_due() {
            self.respawn_wait.pop_front(arena)
        } else {
            None
        }
    }

    /// Restores an undeliverable respawn to the front of the wait set.
    ///
    /// Used by routing when every candidate queue is full; the zero
    /// countdown keeps the enemy first in line for the next tick.
    pub fn restore_due_respawn(&mut self, arena: &mut NodeArena<Enemy>, mut enemy: Enemy) {
        enemy.reset_respawn_countdown(Duration::ZERO);
        self.respawn_wait.insert_sorted(arena, enemy);
    }
}

/// Query functions that provide read-only access to the registry state.
pub mod query {
    use sidewinder_core::list::NodeArena;
    use sidewinder_core::{Enemy, EnemyId, EnemyKindId, EnemyState, Facing, Position};
    use std::time::Duration;

    use super::EnemyRegistry;

    /// Immutable representation of a single enemy used for queries.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct EnemySnapshot {
        /// Unique identifier assigned to the enemy.
        pub id: EnemyId,
        /// Kind template the enemy was drawn from.
        pub kind: EnemyKindId,
        /// Current lifecycle state.
        pub state: EnemyState,
        /// World position assigned at the most recent spawn.
        pub position: Position,
        /// Horizontal direction assigned at the most recent spawn.
        pub facing: Facing,
        /// Seconds remaining until respawn eligibility.
        pub respawn_countdown: Duration,
    }

    fn snapshot(enemy: &Enemy) -> EnemySnapshot {
        EnemySnapshot {
            id: enemy.id(),
            kind: enemy.kind(),
            state: enemy.state(),
            position: enemy.position(),
            facing: enemy.facing(),
            respawn_countdown: enemy.respawn_countdown(),
        }
    }

    /// Captures the active set in deterministic id-sorted order.
    #[must_use]
    pub fn active_view(registry: &EnemyRegistry, arena: &NodeArena<Enemy>) -> Vec<EnemySnapshot> {
        let mut snapshots: Vec<EnemySnapshot> =
            registry.active.iter(arena).map(snapshot).collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        snapshots
    }

    /// Captures the respawn-wait set in countdown order.
    #[must_use]
    pub fn respawn_wait_view(
        registry: &EnemyRegistry,
        arena: &NodeArena<Enemy>,
    ) -> Vec<EnemySnapshot> {
        registry.respawn_wait.iter(arena).map(snapshot).collect()
    }
}
