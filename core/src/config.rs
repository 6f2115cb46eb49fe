//! Validated configuration for the registry and the spawner schedulers.
//!
//! Configuration defects are logic errors in the hosting setup and are
//! fatal at startup: constructors return [`ConfigError`] instead of
//! accepting a table that could later violate a scheduling invariant.

use std::num::NonZeroU32;
use std::time::Duration;

use thiserror::Error;

use crate::{EnemyKindId, Facing};

/// One weighted entry in a spawner's kind table.
///
/// Whether instances of a kind re-queue after death is a property of the
/// template itself, owned by the instantiation collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KindEntry {
    kind: EnemyKindId,
    weight: NonZeroU32,
}

impl KindEntry {
    /// Creates a new weighted kind entry.
    #[must_use]
    pub const fn new(kind: EnemyKindId, weight: NonZeroU32) -> Self {
        Self { kind, weight }
    }

    /// Kind template this entry draws.
    #[must_use]
    pub const fn kind(&self) -> EnemyKindId {
        self.kind
    }

    /// Positive selection weight of the kind.
    #[must_use]
    pub const fn weight(&self) -> NonZeroU32 {
        self.weight
    }
}

/// Reasons a configuration is rejected at startup.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A spawner was configured without any spawnable kinds.
    #[error("spawner kind table is empty")]
    EmptyKindTable,
    /// A spawner was configured with a zero spawn interval.
    #[error("spawn interval must be positive")]
    ZeroSpawnInterval,
    /// The direction-reversal chance falls outside [0, 1].
    #[error("reverse chance {chance} is outside [0, 1]")]
    ReverseChanceOutOfRange {
        /// The rejected probability value.
        chance: f64,
    },
    /// The registry was configured with a zero population cap.
    #[error("population cap must be positive")]
    ZeroPopulationCap,
    /// The simulation was assembled without any spawners.
    #[error("at least one spawner is required")]
    NoSpawners,
}

/// Configuration parameters for a single spawner scheduler.
#[derive(Clone, Debug)]
pub struct SpawnerConfig {
    first_spawn_delay: Duration,
    spawn_interval: Duration,
    new_draw_interval: Duration,
    base_facing: Facing,
    reverse_chance: f64,
    kinds: Vec<KindEntry>,
    total_weight: u32,
    rng_seed: u64,
}

impl SpawnerConfig {
    /// Validates and creates a spawner configuration.
    ///
    /// The sum of kind weights is cached here as the upper bound of the
    /// weighted draw range.
    pub fn new(
        first_spawn_delay: Duration,
        spawn_interval: Duration,
        new_draw_interval: Duration,
        base_facing: Facing,
        reverse_chance: f64,
        kinds: Vec<KindEntry>,
        rng_seed: u64,
    ) -> Result<Self, ConfigError> {
        if kinds.is_empty() {
            return Err(ConfigError::EmptyKindTable);
        }
        if spawn_interval.is_zero() {
            return Err(ConfigError::ZeroSpawnInterval);
        }
        if !(0.0..=1.0).contains(&reverse_chance) {
            return Err(ConfigError::ReverseChanceOutOfRange {
                chance: reverse_chance,
            });
        }
        let total_weight = kinds
            .iter()
            .fold(0u32, |sum, entry| sum.saturating_add(entry.weight().get()));
        Ok(Self {
            first_spawn_delay,
            spawn_interval,
            new_draw_interval,
            base_facing,
            reverse_chance,
            kinds,
            total_weight,
            rng_seed,
        })
    }

    /// Delay before the very first spawn attempt.
    #[must_use]
    pub const fn first_spawn_delay(&self) -> Duration {
        self.first_spawn_delay
    }

    /// Minimum simulated time between successive materializations.
    #[must_use]
    pub const fn spawn_interval(&self) -> Duration {
        self.spawn_interval
    }

    /// Minimum simulated time between successive new-kind draws.
    #[must_use]
    pub const fn new_draw_interval(&self) -> Duration {
        self.new_draw_interval
    }

    /// Facing assigned to spawned enemies before any reversal.
    #[must_use]
    pub const fn base_facing(&self) -> Facing {
        self.base_facing
    }

    /// Probability that a spawned enemy faces opposite the base facing.
    #[must_use]
    pub const fn reverse_chance(&self) -> f64 {
        self.reverse_chance
    }

    /// Weighted kind table drawn from by this spawner.
    #[must_use]
    pub fn kinds(&self) -> &[KindEntry] {
        &self.kinds
    }

    /// Cached sum of all kind weights.
    #[must_use]
    pub const fn total_weight(&self) -> u32 {
        self.total_weight
    }

    /// Seed for the spawner's deterministic random source.
    #[must_use]
    pub const fn rng_seed(&self) -> u64 {
        self.rng_seed
    }
}

/// Configuration parameters for the enemy registry.
#[derive(Clone, Copy, Debug)]
pub struct RegistryConfig {
    population_cap: usize,
    respawn_delay: Duration,
}

impl RegistryConfig {
    /// Validates and creates a registry configuration.
    pub fn new(population_cap: usize, respawn_delay: Duration) -> Result<Self, ConfigError> {
        if population_cap == 0 {
            return Err(ConfigError::ZeroPopulationCap);
        }
        Ok(Self {
            population_cap,
            respawn_delay,
        })
    }

    /// Maximum number of simultaneously live enemies.
    #[must_use]
    pub const fn population_cap(&self) -> usize {
        self.population_cap
    }

    /// Countdown assigned to a dead enemy entering the respawn-wait set.
    #[must_use]
    pub const fn respawn_delay(&self) -> Duration {
        self.respawn_delay
    }
}

/// Complete configuration of a simulation instance.
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// Registry parameters.
    pub registry: RegistryConfig,
    /// One configuration per spawner, in registration order.
    pub spawners: Vec<SpawnerConfig>,
    /// Number of link nodes pre-warmed into each arena.
    pub pool_prewarm: usize,
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, KindEntry, RegistryConfig, SpawnerConfig};
    use crate::{EnemyKindId, Facing};
    use std::num::NonZeroU32;
    use std::time::Duration;

    fn kinds() -> Vec<KindEntry> {
        vec![KindEntry::new(
            EnemyKindId::new(0),
            NonZeroU32::new(1).expect("weight"),
        )]
    }

    #[test]
    fn empty_kind_table_is_rejected() {
        let result = SpawnerConfig::new(
            Duration::ZERO,
            Duration::from_secs(1),
            Duration::from_secs(1),
            Facing::Left,
            0.0,
            Vec::new(),
            1,
        );
        assert_eq!(result.err(), Some(ConfigError::EmptyKindTable));
    }

    #[test]
    fn out_of_range_reverse_chance_is_rejected() {
        let result = SpawnerConfig::new(
            Duration::ZERO,
            Duration::from_secs(1),
            Duration::from_secs(1),
            Facing::Left,
            1.5,
            kinds(),
            1,
        );
        assert!(matches!(
            result.err(),
            Some(ConfigError::ReverseChanceOutOfRange { .. })
        ));
    }

    #[test]
    fn zero_spawn_interval_is_rejected() {
        let result = SpawnerConfig::new(
            Duration::ZERO,
            Duration::ZERO,
            Duration::from_secs(1),
            Facing::Left,
            0.0,
            kinds(),
            1,
        );
        assert_eq!(result.err(), Some(ConfigError::ZeroSpawnInterval));
    }

    #[test]
    fn total_weight_caches_the_sum() {
        let kinds = vec![
            KindEntry::new(EnemyKindId::new(0), NonZeroU32::new(5).expect("w")),
            KindEntry::new(EnemyKindId::new(1), NonZeroU32::new(3).expect("w")),
            KindEntry::new(EnemyKindId::new(2), NonZeroU32::new(2).expect("w")),
        ];
        let config = SpawnerConfig::new(
            Duration::ZERO,
            Duration::from_secs(1),
            Duration::from_secs(1),
            Facing::Right,
            0.25,
            kinds,
            7,
        )
        .expect("valid config");
        assert_eq!(config.total_weight(), 10);
    }

    #[test]
    fn zero_population_cap_is_rejected() {
        let result = RegistryConfig::new(0, Duration::from_secs(2));
        assert_eq!(result.err(), Some(ConfigError::ZeroPopulationCap));
    }
}
