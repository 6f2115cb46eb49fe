use std::num::NonZeroU32;
use std::time::Duration;

use sidewinder_core::config::{KindEntry, RegistryConfig, SpawnerConfig};
use sidewinder_core::list::NodeArena;
use sidewinder_core::{
    ActivityToggle, Enemy, EnemyFactory, EnemyId, EnemyKindId, Event, Facing, Position,
    SpawnPlacement, SpawnRefusal, SpawnerId,
};
use sidewinder_registry::EnemyRegistry;
use sidewinder_system_spawning::{route_due_respawns, SpawnRequest, Spawner};

struct FixedPlacement;

impl SpawnPlacement for FixedPlacement {
    fn position_of(&self, spawner: SpawnerId) -> Position {
        Position::new(spawner.get() as f32 * 100.0, 50.0)
    }
}

/// Factory whose enemies all carry the same respawn flag.
struct FlatFactory {
    respawns: bool,
}

impl EnemyFactory for FlatFactory {
    fn instantiate(&mut self, kind: EnemyKindId, id: EnemyId) -> Enemy {
        Enemy::new(id, kind, self.respawns)
    }
}

/// Records every activity notification for assertions.
#[derive(Default)]
struct RecordingToggle {
    calls: Vec<(EnemyId, bool)>,
}

impl ActivityToggle for RecordingToggle {
    fn set_active(&mut self, enemy: EnemyId, active: bool) {
        self.calls.push((enemy, active));
    }
}

fn single_kind_config(first_spawn_delay: Duration, seed: u64) -> SpawnerConfig {
    SpawnerConfig::new(
        first_spawn_delay,
        Duration::from_secs(1),
        Duration::from_secs(1),
        Facing::Right,
        0.0,
        vec![KindEntry::new(
            EnemyKindId::new(0),
            NonZeroU32::new(1).expect("weight"),
        )],
        seed,
    )
    .expect("valid config")
}

struct Harness {
    registry: EnemyRegistry,
    spawner: Spawner,
    enemy_arena: NodeArena<Enemy>,
    queue_arena: NodeArena<SpawnRequest>,
    factory: FlatFactory,
    toggle: RecordingToggle,
    events: Vec<Event>,
}

impl Harness {
    fn new(cap: usize, config: SpawnerConfig) -> Self {
        Self {
            registry: EnemyRegistry::new(
                RegistryConfig::new(cap, Duration::from_secs(2)).expect("valid config"),
            ),
            spawner: Spawner::new(SpawnerId::new(0), config),
            enemy_arena: NodeArena::with_capacity(8),
            queue_arena: NodeArena::with_capacity(8),
            factory: FlatFactory { respawns: false },
            toggle: RecordingToggle::default(),
            events: Vec::new(),
        }
    }

    fn tick(&mut self, dt: Duration) {
        self.spawner.tick(
            dt,
            &mut self.queue_arena,
            &mut self.enemy_arena,
            &mut self.registry,
            &FixedPlacement,
            &mut self.factory,
            &mut self.toggle,
            &mut self.events,
        );
    }

    fn spawned(&self) -> Vec<EnemyId> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::EnemySpawned { enemy, .. } => Some(*enemy),
                _ => None,
            })
            .collect()
    }
}

#[test]
fn nothing_spawns_before_the_first_spawn_delay() {
    let mut harness = Harness::new(4, single_kind_config(Duration::from_secs(2), 1));

    harness.tick(Duration::from_millis(900));
    harness.tick(Duration::from_millis(900));
    assert!(harness.events.is_empty(), "delay not yet elapsed");

    harness.tick(Duration::from_millis(300));
    assert_eq!(harness.spawned().len(), 1, "first spawn after the delay");
}

#[test]
fn running_phase_spawns_on_the_configured_cadence() {
    let mut harness = Harness::new(8, single_kind_config(Duration::ZERO, 2));

    // First tick materializes the initial draw and enters the running phase.
    harness.tick(Duration::from_secs(1));
    assert_eq!(harness.spawned().len(), 1);

    // Each further full interval draws one kind and places it.
    for _ in 0..3 {
        harness.tick(Duration::from_secs(1));
    }
    assert_eq!(harness.spawned().len(), 4);
}

#[test]
fn capacity_refusal_restores_the_request_at_the_queue_front() {
    let mut harness = Harness::new(1, single_kind_config(Duration::ZERO, 3));

    harness.tick(Duration::from_secs(1));
    let first = harness.spawned();
    assert_eq!(first.len(), 1, "enemy A admitted");
    assert_eq!(harness.registry.live_count(), 1);

    let queue_before = harness.spawner.queue_len();
    harness.tick(Duration::from_secs(1));

    let refusal = harness
        .events
        .iter()
        .find(|event| matches!(event, Event::SpawnRefused { .. }))
        .expect("second attempt refused at the cap");
    assert!(matches!(
        refusal,
        Event::SpawnRefused {
            reason: SpawnRefusal::CapacityReached,
            ..
        }
    ));
    assert_eq!(harness.registry.live_count(), 1, "cap held");
    assert_eq!(
        harness.spawner.queue_len(),
        queue_before + 1,
        "the drawn request was restored to the queue, nothing lost"
    );
    assert_eq!(harness.spawned().len(), 1, "no second admission");

    let last_toggle = harness.toggle.calls.last().expect("toggle notified");
    assert!(!last_toggle.1, "refused enemy was deactivated");
}

#[test]
fn respawns_route_to_the_spawner_with_the_smallest_wait() {
    let mut registry = EnemyRegistry::new(
        RegistryConfig::new(8, Duration::from_secs(2)).expect("valid config"),
    );
    let mut enemy_arena = NodeArena::new();
    let mut queue_arena = NodeArena::new();
    let mut events = Vec::new();

    let mut spawners = vec![
        Spawner::new(SpawnerId::new(0), single_kind_config(Duration::ZERO, 10)),
        Spawner::new(SpawnerId::new(1), single_kind_config(Duration::ZERO, 11)),
    ];

    // Load the first spawner's queue so the second reports a smaller wait.
    spawners[0]
        .enqueue_respawn(
            &mut queue_arena,
            Enemy::new(EnemyId::new(7), EnemyKindId::new(0), true),
        )
        .expect("room in queue");

    let waiting = Enemy::new(EnemyId::new(8), EnemyKindId::new(0), true);
    registry.restore_due_respawn(&mut enemy_arena, waiting);

    route_due_respawns(
        &mut registry,
        &mut spawners,
        &mut enemy_arena,
        &mut queue_arena,
        &mut events,
    );

    assert_eq!(
        events,
        vec![Event::RespawnRouted {
            enemy: EnemyId::new(8),
            spawner: SpawnerId::new(1),
        }]
    );
    assert_eq!(spawners[1].queue_len(), 1);
}

#[test]
fn ties_route_to_the_first_registered_spawner() {
    let mut registry = EnemyRegistry::new(
        RegistryConfig::new(8, Duration::from_secs(2)).expect("valid config"),
    );
    let mut enemy_arena = NodeArena::new();
    let mut queue_arena = NodeArena::new();
    let mut events = Vec::new();

    let mut spawners = vec![
        Spawner::new(SpawnerId::new(0), single_kind_config(Duration::ZERO, 10)),
        Spawner::new(SpawnerId::new(1), single_kind_config(Duration::ZERO, 11)),
    ];

    registry.restore_due_respawn(
        &mut enemy_arena,
        Enemy::new(EnemyId::new(5), EnemyKindId::new(0), true),
    );
    route_due_respawns(
        &mut registry,
        &mut spawners,
        &mut enemy_arena,
        &mut queue_arena,
        &mut events,
    );

    assert_eq!(
        events,
        vec![Event::RespawnRouted {
            enemy: EnemyId::new(5),
            spawner: SpawnerId::new(0),
        }]
    );
}

#[test]
fn an_externally_reported_death_flows_back_through_spawning() {
    let mut harness = Harness::new(4, single_kind_config(Duration::ZERO, 5));
    harness.factory.respawns = true;

    harness.tick(Duration::from_secs(1));
    let id = *harness.spawned().first().expect("initial spawn");

    // The host reports the death directly, without a dying window.
    assert!(harness
        .registry
        .report_death(&mut harness.enemy_arena, id, &mut harness.events)
        .is_none());
    assert_eq!(harness.registry.waiting_count(), 1);

    // Wait out the 2s respawn delay, then route and place the enemy.
    for _ in 0..2 {
        harness
            .registry
            .tick(&mut harness.enemy_arena, Duration::from_secs(1), &mut harness.events);
    }
    let mut spawners = vec![harness.spawner];
    route_due_respawns(
        &mut harness.registry,
        &mut spawners,
        &mut harness.enemy_arena,
        &mut harness.queue_arena,
        &mut harness.events,
    );
    harness.spawner = spawners.remove(0);
    assert!(harness
        .events
        .contains(&Event::RespawnRouted { enemy: id, spawner: SpawnerId::new(0) }));

    harness.tick(Duration::from_secs(1));
    assert_eq!(
        harness.spawned(),
        vec![id, id],
        "the reported enemy respawned under its original id"
    );
    assert_eq!(harness.registry.live_count(), 1);
}

#[test]
fn routing_into_full_queues_stalls_without_losing_the_enemy() {
    let mut registry = EnemyRegistry::new(
        RegistryConfig::new(8, Duration::from_secs(2)).expect("valid config"),
    );
    let mut enemy_arena = NodeArena::new();
    let mut queue_arena = NodeArena::new();
    let mut events = Vec::new();

    let mut spawners = vec![Spawner::new(
        SpawnerId::new(0),
        single_kind_config(Duration::ZERO, 10),
    )];
    for id in 0..4u32 {
        spawners[0]
            .enqueue_respawn(
                &mut queue_arena,
                Enemy::new(EnemyId::new(id + 1), EnemyKindId::new(0), true),
            )
            .expect("filling the queue");
    }

    registry.restore_due_respawn(
        &mut enemy_arena,
        Enemy::new(EnemyId::new(9), EnemyKindId::new(0), true),
    );
    route_due_respawns(
        &mut registry,
        &mut spawners,
        &mut enemy_arena,
        &mut queue_arena,
        &mut events,
    );

    assert_eq!(
        events,
        vec![Event::SpawnRefused {
            spawner: SpawnerId::new(0),
            enemy: EnemyId::new(9),
            reason: SpawnRefusal::QueueFull,
        }]
    );
    assert_eq!(registry.waiting_count(), 1, "enemy returned to the wait set");
}
