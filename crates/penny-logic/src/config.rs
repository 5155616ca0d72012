//! Game configuration: durations, capacities, starting balances, world size.
//!
//! Every field has a default matching the shipped game, so an empty JSON
//! object is a valid configuration. [`GameConfig::validate`] rejects values
//! that would break an invariant (zero-length months, empty logs).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generation::Difficulty;
use crate::ledger::DEFAULT_LEDGER_CAPACITY;
use crate::money::Cents;
use crate::month::{DEFAULT_MONTH_DURATION_MS, DEFAULT_SUMMARY_CAPACITY};
use crate::tasks::DEFAULT_TASK_CAPACITY;
use crate::time::{Millis, SECOND_MS};
use crate::world::WorldConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub month_duration_ms: Millis,
    pub starting_checking_cents: Cents,
    pub starting_savings_cents: Cents,
    pub ledger_capacity: usize,
    pub task_capacity: usize,
    pub summary_capacity: usize,
    /// Upper bound on tasks taken from one generator response.
    pub max_generated_tasks: usize,
    /// Generation calls older than this are treated as failed.
    pub generation_timeout_ms: Millis,
    /// Period of the low-frequency wall-clock trigger.
    pub clock_tick_ms: Millis,
    pub difficulty: Difficulty,
    pub coin_count: usize,
    pub world: WorldConfig,
    /// Seed for pickup placement; `None` seeds from entropy.
    pub seed: Option<u64>,
    pub narration_enabled: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            month_duration_ms: DEFAULT_MONTH_DURATION_MS,
            starting_checking_cents: 5000,
            starting_savings_cents: 2000,
            ledger_capacity: DEFAULT_LEDGER_CAPACITY,
            task_capacity: DEFAULT_TASK_CAPACITY,
            summary_capacity: DEFAULT_SUMMARY_CAPACITY,
            max_generated_tasks: 8,
            generation_timeout_ms: 8 * SECOND_MS,
            clock_tick_ms: SECOND_MS,
            difficulty: Difficulty::Easy,
            coin_count: 220,
            world: WorldConfig::default(),
            seed: None,
            narration_enabled: true,
        }
    }
}

impl GameConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.month_duration_ms <= 0 {
            return Err(ConfigError::Invalid("monthDurationMs must be positive".into()));
        }
        if self.starting_checking_cents < 0 || self.starting_savings_cents < 0 {
            return Err(ConfigError::Invalid("starting balances must not be negative".into()));
        }
        if self.ledger_capacity == 0 || self.task_capacity == 0 || self.summary_capacity == 0 {
            return Err(ConfigError::Invalid("capacities must be at least 1".into()));
        }
        if self.max_generated_tasks == 0 {
            return Err(ConfigError::Invalid("maxGeneratedTasks must be at least 1".into()));
        }
        if self.generation_timeout_ms <= 0 || self.clock_tick_ms <= 0 {
            return Err(ConfigError::Invalid("timeouts and tick periods must be positive".into()));
        }
        let w = &self.world;
        if w.width < w.viewport_width || w.height < w.viewport_height {
            return Err(ConfigError::Invalid("world must be at least as large as the viewport".into()));
        }
        if w.pickup_margin * 2.0 >= w.width.min(w.height) {
            return Err(ConfigError::Invalid("pickupMargin leaves no room for pickups".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = GameConfig::from_json_str("{}").unwrap();
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn test_partial_json_overrides() {
        let config =
            GameConfig::from_json_str(r#"{"monthDurationMs": 60000, "difficulty": "hard", "seed": 7}"#)
                .unwrap();
        assert_eq!(config.month_duration_ms, 60_000);
        assert_eq!(config.difficulty, Difficulty::Hard);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.starting_checking_cents, 5000);
    }

    #[test]
    fn test_rejects_zero_month() {
        let err = GameConfig::from_json_str(r#"{"monthDurationMs": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_bad_json() {
        assert!(matches!(
            GameConfig::from_json_str("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
