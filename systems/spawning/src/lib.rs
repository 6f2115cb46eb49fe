#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-spawner admission scheduling.
//!
//! Each [`Spawner`] runs a small state machine over polled accumulator
//! timers: a first-spawn delay, a cadence for drawing new enemy kinds into
//! its local queue, and a cadence for materializing the queue head into the
//! world. Admission is subject to the registry's population cap; a refused
//! request is restored to the queue front and retried next cycle.

use std::time::Duration;

use sidewinder_core::config::SpawnerConfig;
use sidewinder_core::list::{NodeArena, PooledList};
use sidewinder_core::rng::{RandomSource, SplitMix64};
use sidewinder_core::{
    ActivityToggle, Enemy, EnemyFactory, EnemyKindId, Event, Facing, SpawnPlacement, SpawnRefusal,
    SpawnerId,
};
use sidewinder_registry::EnemyRegistry;

/// Upper bound on every spawner's local pending-spawn queue.
pub const MAX_QUEUE_SIZE: usize = 4;

/// Where a queued spawn request draws its enemy from.
#[derive(Debug)]
pub enum SpawnOrigin {
    /// A brand-new draw; materialization instantiates from the template.
    Template(EnemyKindId),
    /// A respawn of an existing instance.
    Instance(Enemy),
}

/// A queued intent to place an enemy, consumed exactly once when dequeued.
#[derive(Debug)]
pub struct SpawnRequest {
    origin: SpawnOrigin,
}

impl SpawnRequest {
    /// Creates a request that instantiates a fresh enemy from a template.
    #[must_use]
    pub fn from_template(kind: EnemyKindId) -> Self {
        Self {
            origin: SpawnOrigin::Template(kind),
        }
    }

    /// Creates a request that re-places an existing enemy instance.
    #[must_use]
    pub fn from_instance(enemy: Enemy) -> Self {
        Self {
            origin: SpawnOrigin::Instance(enemy),
        }
    }

    /// Whether materializing this request requires fresh instantiation.
    #[must_use]
    pub fn requires_instantiation(&self) -> bool {
        matches!(self.origin, SpawnOrigin::Template(_))
    }

    fn into_origin(self) -> SpawnOrigin {
        self.origin
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    WaitingForFirst,
    Running,
}

/// Timed admission pipeline attached to one spawn point.
#[derive(Debug)]
pub struct Spawner {
    id: SpawnerId,
    config: SpawnerConfig,
    rng: SplitMix64,
    phase: Phase,
    time_since_spawning: Duration,
    time_since_new_draw: Duration,
    queue: PooledList<SpawnRequest>,
}

impl Spawner {
    /// Creates a new spawner from validated configuration.
    #[must_use]
    pub fn new(id: SpawnerId, config: SpawnerConfig) -> Self {
        let rng = SplitMix64::new(config.rng_seed());
        Self {
            id,
            config,
            rng,
            phase: Phase::WaitingForFirst,
            time_since_spawning: Duration::ZERO,
            time_since_new_draw: Duration::ZERO,
            queue: PooledList::new(),
        }
    }

    /// Identifier assigned at registration.
    #[must_use]
    pub const fn id(&self) -> SpawnerId {
        self.id
    }

    /// Number of requests currently waiting in the local queue.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Advances the spawner by one simulation step.
    #[allow(clippy::too_many_arguments)]
    pub fn tick(
        &mut self,
        dt: Duration,
        queue_arena: &mut NodeArena<SpawnRequest>,
        enemy_arena: &mut NodeArena<Enemy>,
        registry: &mut EnemyRegistry,
        placement: &dyn SpawnPlacement,
        factory: &mut dyn EnemyFactory,
        toggle: &mut dyn ActivityToggle,
        out: &mut Vec<Event>,
    ) {
        self.time_since_spawning = self.time_since_spawning.saturating_add(dt);
        self.time_since_new_draw = self.time_since_new_draw.saturating_add(dt);

        match self.phase {
            Phase::WaitingForFirst => {
                if self.time_since_spawning < self.config.first_spawn_delay() {
                    return;
                }
                if self.queue.is_empty() {
                    self.draw_new_kind(queue_arena);
                }
                if self.materialize_next(
                    queue_arena,
                    enemy_arena,
                    registry,
                    placement,
                    factory,
                    toggle,
                    out,
                ) {
                    self.phase = Phase::Running;
                    self.time_since_spawning = Duration::ZERO;
                }
            }
            Phase::Running => {
                if self.time_since_new_draw >= self.config.new_draw_interval()
                    && self.queue.len() < MAX_QUEUE_SIZE
                {
                    self.draw_new_kind(queue_arena);
                    self.time_since_new_draw = Duration::ZERO;
                }
                if self.time_since_spawning >= self.config.spawn_interval()
                    && !self.queue.is_empty()
                    && self.materialize_next(
                        queue_arena,
                        enemy_arena,
                        registry,
                        placement,
                        factory,
                        toggle,
                        out,
                    )
                {
                    self.time_since_spawning = Duration::ZERO;
                }
            }
        }
    }

    /// Time until the current queue head would be placed into the world.
    ///
    /// Zero when the queue is empty; otherwise the remainder of the current
    /// spawn interval plus one full interval per queued request. The
    /// registry uses this estimate to route respawns to the least-loaded
    /// spawner.
    #[must_use]
    pub fn queue_wait_estimate(&self) -> Duration {
        if self.queue.is_empty() {
            return Duration::ZERO;
        }
        let interval = self.config.spawn_interval();
        let elapsed = self.time_since_spawning.min(interval);
        interval - elapsed + interval * (self.queue.len() as u32)
    }

    /// Appends a respawn request to the local queue.
    ///
    /// Refuses at [`MAX_QUEUE_SIZE`], handing the enemy back to the caller.
    pub fn enqueue_respawn(
        &mut self,
        queue_arena: &mut NodeArena<SpawnRequest>,
        enemy: Enemy,
    ) -> Result<(), Enemy> {
        if self.queue.len() >= MAX_QUEUE_SIZE {
            return Err(enemy);
        }
        self.queue
            .push_back(queue_arena, SpawnRequest::from_instance(enemy));
        Ok(())
    }

    fn draw_new_kind(&mut self, queue_arena: &mut NodeArena<SpawnRequest>) {
        let kind = self.choose_kind();
        self.queue
            .push_back(queue_arena, SpawnRequest::from_template(kind));
    }

    /// Weighted draw over the configured kind table.
    ///
    /// The draw is uniform in [1, total_weight] and the scan returns the
    /// first kind whose running weight sum reaches the draw. The final
    /// entry's running sum equals the cached total, so every legal draw
    /// matches before the loop ends; the trailing return only exists to
    /// keep the function total under a corrupted weight table.
    fn choose_kind(&mut self) -> EnemyKindId {
        let entries = self.config.kinds();
        let draw = self.rng.next_in_range(1, self.config.total_weight());
        let mut accumulated = 0u32;
        for entry in entries {
            accumulated = accumulated.saturating_add(entry.weight().get());
            if accumulated >= draw {
                return entry.kind();
            }
        }
        debug_assert!(false, "weighted draw exceeded the cached total");
        entries[entries.len() - 1].kind()
    }

    fn choose_facing(&mut self) -> Facing {
        let base = self.config.base_facing();
        if self.rng.next_unit() < self.config.reverse_chance() {
            base.flipped()
        } else {
            base
        }
    }

    /// Pops the queue head and attempts to place it into the world.
    ///
    /// On admission refusal the enemy is deactivated and the request is
    /// restored at the queue front with its instantiation flag intact, so
    /// it is retried first next cycle.
    #[allow(clippy::too_many_arguments)]
    fn materialize_next(
        &mut self,
        queue_arena: &mut NodeArena<SpawnRequest>,
        enemy_arena: &mut NodeArena<Enemy>,
        registry: &mut EnemyRegistry,
        placement: &dyn SpawnPlacement,
        factory: &mut dyn EnemyFactory,
        toggle: &mut dyn ActivityToggle,
        out: &mut Vec<Event>,
    ) -> bool {
        let Some(request) = self.queue.pop_front(queue_arena) else {
            return false;
        };
        let from_template = request.requires_instantiation();
        let mut enemy = match request.into_origin() {
            SpawnOrigin::Template(kind) => {
                let id = registry.next_id();
                factory.instantiate(kind, id)
            }
            SpawnOrigin::Instance(enemy) => enemy,
        };

        let facing = self.choose_facing();
        let position = placement.position_of(self.id);
        if enemy.spawn(position, facing).is_err() {
            // Queued enemies are always inactive or dead; hitting this
            // means the host mutated the enemy behind the scheduler.
            debug_assert!(false, "queued enemy was not in a spawnable state");
            self.restore_front(queue_arena, from_template, enemy);
            return false;
        }

        let id = enemy.id();
        let kind = enemy.kind();
        toggle.set_active(id, true);

        match registry.admit(enemy_arena, enemy) {
            Ok(()) => {
                out.push(Event::EnemySpawned {
                    enemy: id,
                    kind,
                    spawner: self.id,
                    position,
                    facing,
                });
                true
            }
            Err(mut refused) => {
                refused.deactivate();
                toggle.set_active(id, false);
                self.restore_front(queue_arena, from_template, refused);
                out.push(Event::SpawnRefused {
                    spawner: self.id,
                    enemy: id,
                    reason: SpawnRefusal::CapacityReached,
                });
                false
            }
        }
    }

    /// Restores a refused request at the queue front.
    ///
    /// A template-origin request goes back as a template, so the retry
    /// instantiates afresh and the provisional instance is dropped here;
    /// an instance-origin request keeps its enemy.
    fn restore_front(
        &mut self,
        queue_arena: &mut NodeArena<SpawnRequest>,
        from_template: bool,
        enemy: Enemy,
    ) {
        let request = if from_template {
            SpawnRequest::from_template(enemy.kind())
        } else {
            SpawnRequest::from_instance(enemy)
        };
        self.queue.push_front(queue_arena, request);
    }
}

/// Forwards every due respawn to the spawner with the smallest queue wait.
///
/// Run once per tick after the registry decremented its countdowns, so an
/// enemy whose countdown reached zero this tick is routable this tick. Ties
/// on the wait estimate resolve to the first spawner in registration order.
/// When the selected queue is full the enemy returns to the front of the
/// respawn-wait set and routing stops until the next tick.
pub fn route_due_respawns(
    registry: &mut EnemyRegistry,
    spawners: &mut [Spawner],
    enemy_arena: &mut NodeArena<Enemy>,
    queue_arena: &mut NodeArena<SpawnRequest>,
    out: &mut Vec<Event>,
) {
    while let Some(enemy) = registry.take_due_respawn(enemy_arena) {
        let Some(target) = spawners.iter_mut().min_by(|left, right| {
            left.queue_wait_estimate()
                .cmp(&right.queue_wait_estimate())
                .then_with(|| left.id().cmp(&right.id()))
        }) else {
            registry.restore_due_respawn(enemy_arena, enemy);
            return;
        };

        let id = enemy.id();
        match target.enqueue_respawn(queue_arena, enemy) {
            Ok(()) => out.push(Event::RespawnRouted {
                enemy: id,
                spawner: target.id(),
            }),
            Err(enemy) => {
                out.push(Event::SpawnRefused {
                    spawner: target.id(),
                    enemy: id,
                    reason: SpawnRefusal::QueueFull,
                });
                registry.restore_due_respawn(enemy_arena, enemy);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Spawner, MAX_QUEUE_SIZE};
    use sidewinder_core::config::{KindEntry, SpawnerConfig};
    use sidewinder_core::list::NodeArena;
    use sidewinder_core::{Enemy, EnemyId, EnemyKindId, Facing};
    use std::num::NonZeroU32;
    use std::time::Duration;

    fn weight(value: u32) -> NonZeroU32 {
        NonZeroU32::new(value).expect("weight")
    }

    fn spawner_with_kinds(kinds: Vec<KindEntry>, seed: u64) -> Spawner {
        let config = SpawnerConfig::new(
            Duration::from_secs(1),
            Duration::from_secs(3),
            Duration::from_secs(2),
            Facing::Left,
            0.0,
            kinds,
            seed,
        )
        .expect("valid config");
        Spawner::new(sidewinder_core::SpawnerId::new(0), config)
    }

    #[test]
    fn weighted_draw_frequencies_track_the_weights() {
        let kinds = vec![
            KindEntry::new(EnemyKindId::new(0), weight(5)),
            KindEntry::new(EnemyKindId::new(1), weight(3)),
            KindEntry::new(EnemyKindId::new(2), weight(2)),
        ];
        let mut spawner = spawner_with_kinds(kinds, 0x5eed);

        const DRAWS: usize = 20_000;
        let mut counts = [0usize; 3];
        for _ in 0..DRAWS {
            counts[spawner.choose_kind().get() as usize] += 1;
        }

        let expected = [0.5, 0.3, 0.2];
        for (count, expected) in counts.iter().zip(expected) {
            let observed = *count as f64 / DRAWS as f64;
            assert!(
                (observed - expected).abs() < 0.02,
                "observed {observed}, expected {expected}"
            );
        }
    }

    #[test]
    fn weighted_draw_never_escapes_the_kind_table() {
        let kinds = vec![
            KindEntry::new(EnemyKindId::new(0), weight(1)),
            KindEntry::new(EnemyKindId::new(1), weight(1)),
        ];
        let mut spawner = spawner_with_kinds(kinds, 99);
        for _ in 0..10_000 {
            let kind = spawner.choose_kind();
            assert!(kind.get() <= 1);
        }
    }

    #[test]
    fn queue_wait_estimate_matches_the_formula() {
        let kinds = vec![KindEntry::new(EnemyKindId::new(0), weight(1))];
        let mut spawner = spawner_with_kinds(kinds, 7);
        let mut queue_arena = NodeArena::new();

        assert_eq!(spawner.queue_wait_estimate(), Duration::ZERO);

        for id in [10, 11] {
            spawner
                .enqueue_respawn(
                    &mut queue_arena,
                    Enemy::new(EnemyId::new(id), EnemyKindId::new(0), true),
                )
                .expect("queue has room");
        }
        spawner.time_since_spawning = Duration::from_secs(1);

        // interval 3, two queued, one second elapsed: 3 - 1 + 2 * 3 = 8.
        assert_eq!(spawner.queue_wait_estimate(), Duration::from_secs(8));
    }

    #[test]
    fn elapsed_time_beyond_the_interval_is_clamped() {
        let kinds = vec![KindEntry::new(EnemyKindId::new(0), weight(1))];
        let mut spawner = spawner_with_kinds(kinds, 7);
        let mut queue_arena = NodeArena::new();

        spawner
            .enqueue_respawn(
                &mut queue_arena,
                Enemy::new(EnemyId::new(1), EnemyKindId::new(0), true),
            )
            .expect("queue has room");
        spawner.time_since_spawning = Duration::from_secs(30);
        assert_eq!(spawner.queue_wait_estimate(), Duration::from_secs(3));
    }

    #[test]
    fn respawn_enqueue_refuses_past_the_bound() {
        let kinds = vec![KindEntry::new(EnemyKindId::new(0), weight(1))];
        let mut spawner = spawner_with_kinds(kinds, 3);
        let mut queue_arena = NodeArena::new();

        for id in 0..MAX_QUEUE_SIZE as u32 {
            spawner
                .enqueue_respawn(
                    &mut queue_arena,
                    Enemy::new(EnemyId::new(id + 1), EnemyKindId::new(0), true),
                )
                .expect("below the bound");
        }
        let overflow = Enemy::new(EnemyId::new(50), EnemyKindId::new(0), true);
        let refused = spawner
            .enqueue_respawn(&mut queue_arena, overflow)
            .expect_err("queue is full");
        assert_eq!(refused.id(), EnemyId::new(50));
        assert_eq!(spawner.queue_len(), MAX_QUEUE_SIZE);
    }
}
