#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Sidewinder spawn scheduling engine.
//!
//! This crate defines the vocabulary that connects the authoritative enemy
//! registry, the pure spawner systems, and the hosting adapter: identifiers,
//! the enemy entity and its state machine, the arena-pooled list containers,
//! the deterministic random source, and the collaborator traits behind which
//! the engine-side presentation layers live. Systems mutate state through
//! explicit parameters and report every observable outcome as an [`Event`]
//! pushed into a caller-supplied buffer.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod config;
pub mod enemy;
pub mod list;
pub mod rng;

pub use enemy::{Enemy, EnemyState, TransitionError, DYING_DURATION};

/// Unique identifier assigned to an enemy instance.
///
/// Identifiers are handed out by the registry's monotonically increasing
/// counter, start at 1, and are never reused; a respawned enemy keeps the id
/// it was first initialized with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a spawnable enemy kind template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyKindId(u32);

impl EnemyKindId {
    /// Creates a new kind identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the kind identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a spawner scheduler instance.
///
/// Registration order is the ascending order of these identifiers, which is
/// also the tie-break rule when routing respawns between equally loaded
/// spawners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpawnerId(u32);

impl SpawnerId {
    /// Creates a new spawner identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the spawner identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Horizontal travel direction assigned to an enemy at spawn time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// Movement toward decreasing x coordinates.
    Left,
    /// Movement toward increasing x coordinates.
    Right,
}

impl Facing {
    /// Returns the opposite facing.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// World-unit placement produced by the placement collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal world coordinate.
    pub x: f32,
    /// Vertical world coordinate.
    pub y: f32,
}

impl Position {
    /// Creates a new position from world-unit coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Reasons a spawn attempt can be refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnRefusal {
    /// The global population cap is saturated; the request was restored to
    /// the front of its local queue for retry.
    CapacityReached,
    /// The routing target's local queue is full; the respawn stays at the
    /// front of the respawn-wait set.
    QueueFull,
}

/// Events broadcast by the registry and spawner systems after each step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    /// Confirms that an enemy was materialized and admitted into the world.
    EnemySpawned {
        /// Identifier of the admitted enemy.
        enemy: EnemyId,
        /// Kind template the enemy was drawn from.
        kind: EnemyKindId,
        /// Spawner that materialized the enemy.
        spawner: SpawnerId,
        /// World position the enemy was placed at.
        position: Position,
        /// Horizontal direction the enemy faces after spawning.
        facing: Facing,
    },
    /// Reports that a spawn attempt was refused and recovered locally.
    SpawnRefused {
        /// Spawner whose attempt was refused.
        spawner: SpawnerId,
        /// Enemy the refused request referred to.
        enemy: EnemyId,
        /// Specific reason the attempt failed.
        reason: SpawnRefusal,
    },
    /// Confirms that a live enemy started dying.
    EnemyKilled {
        /// Identifier of the enemy transitioning out of the active state.
        enemy: EnemyId,
    },
    /// Confirms that a dying enemy finished its death animation window.
    EnemyDied {
        /// Identifier of the enemy that reached the dead state.
        enemy: EnemyId,
    },
    /// Confirms that a dead enemy entered the respawn-wait set.
    RespawnQueued {
        /// Identifier of the waiting enemy.
        enemy: EnemyId,
        /// Countdown the enemy must wait out before re-eligibility.
        delay: Duration,
    },
    /// Confirms that an eligible respawn was forwarded to a spawner queue.
    RespawnRouted {
        /// Identifier of the routed enemy.
        enemy: EnemyId,
        /// Spawner selected as the least-loaded routing target.
        spawner: SpawnerId,
    },
    /// Confirms that a dead enemy was released for destruction.
    EnemyDiscarded {
        /// Identifier of the discarded enemy.
        enemy: EnemyId,
    },
    /// Reports a death notification for an enemy absent from the active set.
    DeathReportIgnored {
        /// Identifier the stale report referred to.
        enemy: EnemyId,
    },
}

/// Placement collaborator reporting where spawn points currently sit.
///
/// Spawn points can ride on movable terrain, so the position is queried at
/// materialization time rather than cached.
pub trait SpawnPlacement {
    /// Current world position of the identified spawner's spawn point.
    fn position_of(&self, spawner: SpawnerId) -> Position;
}

/// Instantiation collaborator producing fresh enemy instances from templates.
pub trait EnemyFactory {
    /// Creates a new inactive enemy of the given kind carrying the given id.
    fn instantiate(&mut self, kind: EnemyKindId, id: EnemyId) -> Enemy;
}

/// Presentation collaborator toggling an enemy's engine-side representation.
pub trait ActivityToggle {
    /// Enables or disables the presentation of the identified enemy.
    fn set_active(&mut self, enemy: EnemyId, active: bool);
}

/// Activity toggle that ignores every notification, for headless hosts.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullActivityToggle;

impl ActivityToggle for NullActivityToggle {
    fn set_active(&mut self, _enemy: EnemyId, _active: bool) {}
}
