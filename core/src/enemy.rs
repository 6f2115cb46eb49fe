//! Enemy entity and the state transitions the scheduler depends on.
//!
//! Movement, rendering, and collision response live behind the collaborator
//! traits in the crate root; this module only models the lifecycle the
//! registry and spawners observe.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{EnemyId, EnemyKindId, Facing, Position};

/// Fixed window an enemy spends in the dying state before it is dead.
///
/// The presentation layer flashes the sprite during this window; the
/// scheduler only cares about the elapsed-time threshold.
pub const DYING_DURATION: Duration = Duration::from_millis(800);

/// Lifecycle states an enemy moves through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyState {
    /// Pre-spawn or post-despawn resting state; no collision, no presence.
    Inactive,
    /// Live in the world and counted against the population cap.
    Active,
    /// Killed and playing out the death window; collision disabled.
    Dying,
    /// Death window elapsed; awaiting destruction or re-queue.
    Dead,
}

/// Error produced when a lifecycle transition is requested from a state
/// that does not permit it. The enemy is left unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// `spawn` was requested outside the Inactive and Dead states.
    #[error("cannot spawn an enemy that is {state:?}")]
    NotSpawnable {
        /// State the enemy was in when the transition was rejected.
        state: EnemyState,
    },
    /// `kill` was requested outside the Active state.
    #[error("cannot kill an enemy that is {state:?}")]
    NotKillable {
        /// State the enemy was in when the transition was rejected.
        state: EnemyState,
    },
}

/// The entity being scheduled: identity, lifecycle, and respawn bookkeeping.
#[derive(Clone, Debug)]
pub struct Enemy {
    id: EnemyId,
    kind: EnemyKindId,
    state: EnemyState,
    position: Position,
    facing: Facing,
    dying_elapsed: Duration,
    respawn_countdown: Duration,
    respawns: bool,
}

impl Enemy {
    /// Creates a new inactive enemy carrying an already-assigned identifier.
    #[must_use]
    pub fn new(id: EnemyId, kind: EnemyKindId, respawns: bool) -> Self {
        Self {
            id,
            kind,
            state: EnemyState::Inactive,
            position: Position::new(0.0, 0.0),
            facing: Facing::Right,
            dying_elapsed: Duration::ZERO,
            respawn_countdown: Duration::ZERO,
            respawns,
        }
    }

    /// Immutable identifier assigned at first initialization.
    #[must_use]
    pub const fn id(&self) -> EnemyId {
        self.id
    }

    /// Kind template the enemy was drawn from.
    #[must_use]
    pub const fn kind(&self) -> EnemyKindId {
        self.kind
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> EnemyState {
        self.state
    }

    /// World position assigned at the most recent spawn.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Horizontal direction assigned at the most recent spawn.
    #[must_use]
    pub const fn facing(&self) -> Facing {
        self.facing
    }

    /// Whether the enemy re-enters the respawn-wait set after death.
    #[must_use]
    pub const fn respawns(&self) -> bool {
        self.respawns
    }

    /// Seconds remaining until the enemy is eligible for re-spawn.
    #[must_use]
    pub const fn respawn_countdown(&self) -> Duration {
        self.respawn_countdown
    }

    /// Places the enemy into the world, transitioning to Active.
    ///
    /// Valid only from Inactive or Dead; collision is re-enabled by the
    /// hosting presentation layer in response.
    pub fn spawn(&mut self, position: Position, facing: Facing) -> Result<(), TransitionError> {
        match self.state {
            EnemyState::Inactive | EnemyState::Dead => {
                self.state = EnemyState::Active;
                self.position = position;
                self.facing = facing;
                self.dying_elapsed = Duration::ZERO;
                Ok(())
            }
            state => Err(TransitionError::NotSpawnable { state }),
        }
    }

    /// Starts the death window, transitioning Active to Dying.
    pub fn kill(&mut self) -> Result<(), TransitionError> {
        match self.state {
            EnemyState::Active => {
                self.state = EnemyState::Dying;
                self.dying_elapsed = Duration::ZERO;
                Ok(())
            }
            state => Err(TransitionError::NotKillable { state }),
        }
    }

    /// Accumulates time while Dying; returns true exactly once, on the tick
    /// the death window elapses and the enemy becomes Dead.
    pub fn tick_dying(&mut self, dt: Duration) -> bool {
        if self.state != EnemyState::Dying {
            return false;
        }
        self.dying_elapsed = self.dying_elapsed.saturating_add(dt);
        if self.dying_elapsed >= DYING_DURATION {
            self.state = EnemyState::Dead;
            return true;
        }
        false
    }

    /// Forces the enemy to Dead from any state.
    ///
    /// Externally reported deaths (out-of-bounds, level reset) skip the
    /// dying window, and the enemy must still be spawnable afterwards.
    pub fn mark_dead(&mut self) {
        self.state = EnemyState::Dead;
        self.dying_elapsed = Duration::ZERO;
    }

    /// Forces the enemy back to Inactive, used when admission is refused.
    pub fn deactivate(&mut self) {
        self.state = EnemyState::Inactive;
        self.dying_elapsed = Duration::ZERO;
    }

    /// Resets the respawn countdown to the configured delay.
    pub fn reset_respawn_countdown(&mut self, delay: Duration) {
        self.respawn_countdown = delay;
    }

    /// Decrements the respawn countdown, saturating at zero.
    pub fn tick_respawn_countdown(&mut self, dt: Duration) {
        self.respawn_countdown = self.respawn_countdown.saturating_sub(dt);
    }

    /// Whether the respawn countdown has fully elapsed.
    #[must_use]
    pub const fn respawn_due(&self) -> bool {
        self.respawn_countdown.is_zero()
    }
}
