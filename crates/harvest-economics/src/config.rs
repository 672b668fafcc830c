// crates/harvest-economics/src/config.rs
//
// Protocol parameters for the reward distributor and the pool allocator.
// Loaded from a TOML file or populated with defaults.
//
// Example:
//
//   [distributor]
//   reward_duration_secs = 604800
//   lock_epochs = 13
//
//   [allocator]
//   reserved_pool_share_bps = 2000
//   max_mintable_tokens = "1000000000000000000000000000"
//   schedule = [
//       { start_offset = 1000, rewards_per_second = 10000000000000 },
//       { start_offset = 2000, rewards_per_second = 5000000000000 },
//       { start_offset = 3000, rewards_per_second = 0 },
//   ]

use serde::{Deserialize, Deserializer};
use std::fs;

use harvest_core::{HarvestError, BPS_DENOMINATOR, EPOCH_SECONDS};

use crate::emission::{EmissionPoint, EmissionSchedule};
use crate::vesting::DEFAULT_LOCK_EPOCHS;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HarvestConfig {
    #[serde(default)]
    pub distributor: DistributorConfig,

    #[serde(default)]
    pub allocator: AllocatorConfig,
}

/// Reward distributor parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct DistributorConfig {
    /// Seconds over which each reward notification is streamed.
    #[serde(default = "default_reward_duration_secs")]
    pub reward_duration_secs: u64,

    /// Epochs a lock or vesting grant runs before it matures.
    #[serde(default = "default_lock_epochs")]
    pub lock_epochs: u64,
}

/// Pool allocator parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AllocatorConfig {
    /// Share of every second's emission routed to the reserved pool 0, in bps.
    #[serde(default = "default_reserved_pool_share_bps")]
    pub reserved_pool_share_bps: u64,

    /// Decimals of oracle answers; a pool's deposits are scaled by
    /// `answer / 10^oracle_decimals`.
    #[serde(default = "default_oracle_decimals")]
    pub oracle_decimals: u32,

    /// Upper bound on everything the allocator will ever mint. Accepts an
    /// integer or a decimal string for values beyond 64 bits.
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub max_mintable_tokens: Option<u128>,

    /// Emission schedule, offsets in seconds after `start`.
    #[serde(default = "default_schedule")]
    pub schedule: Vec<ScheduleStep>,
}

/// One `[allocator] schedule` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ScheduleStep {
    pub start_offset: u64,
    pub rewards_per_second: u64,
}

fn default_reward_duration_secs() -> u64 {
    EPOCH_SECONDS
}

fn default_lock_epochs() -> u64 {
    DEFAULT_LOCK_EPOCHS
}

fn default_reserved_pool_share_bps() -> u64 {
    2_000
}

fn default_oracle_decimals() -> u32 {
    8
}

fn default_schedule() -> Vec<ScheduleStep> {
    vec![ScheduleStep {
        start_offset: 0,
        rewards_per_second: 0,
    }]
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Int(u64),
    Text(String),
}

fn deserialize_optional_amount<'de, D>(deserializer: D) -> Result<Option<u128>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawAmount>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawAmount::Int(value)) => Ok(Some(value as u128)),
        Some(RawAmount::Text(text)) => text
            .replace('_', "")
            .parse::<u128>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

impl Default for DistributorConfig {
    fn default() -> Self {
        Self {
            reward_duration_secs: default_reward_duration_secs(),
            lock_epochs: default_lock_epochs(),
        }
    }
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            reserved_pool_share_bps: default_reserved_pool_share_bps(),
            oracle_decimals: default_oracle_decimals(),
            max_mintable_tokens: None,
            schedule: default_schedule(),
        }
    }
}

impl AllocatorConfig {
    /// Validated emission schedule built from `schedule`.
    pub fn emission_schedule(&self) -> Result<EmissionSchedule, HarvestError> {
        let points = self
            .schedule
            .iter()
            .map(|step| EmissionPoint {
                start_offset: step.start_offset,
                rewards_per_second: step.rewards_per_second as u128,
            })
            .collect();
        EmissionSchedule::new(points).map_err(|e| HarvestError::Config(e.to_string()))
    }

    /// `10^oracle_decimals`.
    pub fn oracle_denominator(&self) -> Result<u128, HarvestError> {
        10u128
            .checked_pow(self.oracle_decimals)
            .ok_or_else(|| HarvestError::Config(format!("oracle_decimals {} is too large", self.oracle_decimals)))
    }
}

impl HarvestConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &str) -> Result<Self, HarvestError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| HarvestError::Config(format!("cannot read {}: {}", path, e)))?;
        let config = Self::from_toml_str(&contents)?;
        tracing::info!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, HarvestError> {
        let config: HarvestConfig =
            toml::from_str(contents).map_err(|e| HarvestError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), HarvestError> {
        if self.distributor.reward_duration_secs == 0 {
            return Err(HarvestError::Config(
                "reward_duration_secs must be positive".to_string(),
            ));
        }
        if self.distributor.lock_epochs == 0 {
            return Err(HarvestError::Config("lock_epochs must be positive".to_string()));
        }
        if self.allocator.reserved_pool_share_bps as u128 > BPS_DENOMINATOR {
            return Err(HarvestError::Config(format!(
                "reserved_pool_share_bps {} exceeds {}",
                self.allocator.reserved_pool_share_bps, BPS_DENOMINATOR
            )));
        }
        self.allocator.oracle_denominator()?;
        self.allocator.emission_schedule()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HarvestConfig::default();
        assert_eq!(config.distributor.reward_duration_secs, 604_800);
        assert_eq!(config.distributor.lock_epochs, 13);
        assert_eq!(config.allocator.reserved_pool_share_bps, 2_000);
        assert_eq!(config.allocator.oracle_decimals, 8);
        assert!(config.allocator.max_mintable_tokens.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = HarvestConfig::from_toml_str("").unwrap();
        assert_eq!(config.distributor.lock_epochs, 13);
    }

    #[test]
    fn test_parse_full_config() {
        let config = HarvestConfig::from_toml_str(
            r#"
            [distributor]
            reward_duration_secs = 86400
            lock_epochs = 4

            [allocator]
            reserved_pool_share_bps = 0
            max_mintable_tokens = "1_000_000_000_000_000_000_000_000_000"
            schedule = [
                { start_offset = 1000, rewards_per_second = 10000000000000 },
                { start_offset = 2000, rewards_per_second = 5000000000000 },
                { start_offset = 3000, rewards_per_second = 0 },
            ]
            "#,
        )
        .unwrap();
        assert_eq!(config.distributor.reward_duration_secs, 86_400);
        assert_eq!(config.allocator.reserved_pool_share_bps, 0);
        assert_eq!(config.allocator.max_mintable_tokens, Some(10u128.pow(27)));
        let schedule = config.allocator.emission_schedule().unwrap();
        assert_eq!(schedule.rate_at(1_500), 10_000_000_000_000);
    }

    #[test]
    fn test_integer_cap() {
        let config = HarvestConfig::from_toml_str("[allocator]\nmax_mintable_tokens = 500\n").unwrap();
        assert_eq!(config.allocator.max_mintable_tokens, Some(500));
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            HarvestConfig::from_toml_str("[distributor]\nreward_duration_secs = 0\n"),
            Err(HarvestError::Config(_))
        ));
        assert!(matches!(
            HarvestConfig::from_toml_str("[allocator]\nreserved_pool_share_bps = 10001\n"),
            Err(HarvestError::Config(_))
        ));
        assert!(matches!(
            HarvestConfig::from_toml_str(
                "[allocator]\nschedule = [{ start_offset = 0, rewards_per_second = 5 }]\n"
            ),
            Err(HarvestError::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            HarvestConfig::load("/nonexistent/harvest.toml"),
            Err(HarvestError::Config(_))
        ));
    }
}
