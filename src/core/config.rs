//! Engine configuration.
//!
//! Every knob has a default matching the bot's shipped behaviour, so an empty
//! (or missing) config file is valid. Values can be overridden from a TOML file
//! and from `ARCADE__`-prefixed environment variables, e.g.
//! `ARCADE__SNAKE__FIELD_SIZE=12` or `ARCADE__RUNNER__MIN_INTERVAL_MS=150`.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;

/// Largest snake board side; a board is one chat message.
pub const MAX_FIELD_SIZE: usize = 64;

/// Top-level configuration for all arcade games.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcadeConfig {
    pub snake: SnakeConfig,
    pub runner: RunnerConfig,
}

/// Grid snake settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnakeConfig {
    /// Side length of the square board.
    pub field_size: usize,
    pub tick_interval_ms: u64,
    /// Points awarded per eaten food.
    pub food_points: u32,
    /// Random placement attempts before food respawn gives up.
    pub food_spawn_attempts: u32,
}

impl Default for SnakeConfig {
    fn default() -> Self {
        Self {
            field_size: 10,
            tick_interval_ms: 800,
            food_points: 5,
            food_spawn_attempts: 1000,
        }
    }
}

impl SnakeConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Obstacle runner settings. The lane grid itself is fixed at 3x10.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub initial_interval_ms: u64,
    /// Floor for the accelerating tick interval.
    pub min_interval_ms: u64,
    pub acceleration_step_ms: u64,
    /// Speed up every N score points.
    pub acceleration_every: u32,
    pub acceleration_enabled: bool,
    /// Chance per tick of trying to spawn an obstacle.
    pub spawn_probability: f64,
    /// Share of spawned obstacles that are ground obstacles (the rest fly).
    pub ground_share: f64,
    /// No spawn while any obstacle is this close to the right edge.
    pub min_obstacle_gap: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: 500,
            min_interval_ms: 200,
            acceleration_step_ms: 20,
            acceleration_every: 5,
            acceleration_enabled: true,
            spawn_probability: 0.2,
            ground_share: 0.6,
            min_obstacle_gap: 3,
        }
    }
}

impl RunnerConfig {
    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.initial_interval_ms)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn acceleration_step(&self) -> Duration {
        Duration::from_millis(self.acceleration_step_ms)
    }
}

impl ArcadeConfig {
    /// Load from an optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let cfg: ArcadeConfig = builder
            .add_source(config::Environment::with_prefix("ARCADE").separator("__"))
            .build()?
            .try_deserialize()?;

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let snake = &self.snake;
        if !(2..=MAX_FIELD_SIZE).contains(&snake.field_size) {
            return Err(invalid(
                "snake.field_size",
                format!("board side must be within 2..={MAX_FIELD_SIZE}"),
            ));
        }
        if snake.tick_interval_ms == 0 {
            return Err(invalid("snake.tick_interval_ms", "must be positive"));
        }
        if snake.food_spawn_attempts == 0 {
            return Err(invalid("snake.food_spawn_attempts", "must be positive"));
        }

        let runner = &self.runner;
        if runner.min_interval_ms == 0 {
            return Err(invalid("runner.min_interval_ms", "must be positive"));
        }
        if runner.min_interval_ms > runner.initial_interval_ms {
            return Err(invalid(
                "runner.min_interval_ms",
                format!(
                    "floor {}ms is above the initial interval {}ms",
                    runner.min_interval_ms, runner.initial_interval_ms
                ),
            ));
        }
        if runner.acceleration_every == 0 {
            return Err(invalid("runner.acceleration_every", "must be positive"));
        }
        if !(0.0..=1.0).contains(&runner.spawn_probability) {
            return Err(invalid("runner.spawn_probability", "must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&runner.ground_share) {
            return Err(invalid("runner.ground_share", "must be within [0, 1]"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.into() }
}
