//! Simulator configuration
//!
//! Values come from, in order of preference: an explicit TOML document,
//! `STATESIM_*` environment variables, or the defaults below.

use std::env;
use std::path::Path;

use anyhow::Context;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{SimError, SimResult};

/// Upper bound on block size; larger blocks make rejection sampling slow
pub const MAX_UPDATES_PER_BLOCK_LIMIT: usize = 10_000;

/// Upper bound on generated string and byte lengths
pub const MAX_GENERATED_LENGTH: usize = 4096;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Blocks hold between 1 and this many updates
    pub max_updates_per_block: usize,
    /// Seed for the deterministic random source
    pub seed: u64,
    /// Announced to listeners in the initialization packet
    pub event_aligned_writes: bool,
    /// Chance that an update deletes an existing object
    pub delete_probability: f64,
    /// Chance that an update rewrites an existing object instead of a new key
    pub update_existing_probability: f64,
    pub max_string_length: usize,
    pub max_bytes_length: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            max_updates_per_block: 100,
            seed: 0x5EED,
            event_aligned_writes: false,
            delete_probability: 0.1,
            update_existing_probability: 0.3,
            max_string_length: 64,
            max_bytes_length: 64,
        }
    }
}

impl SimulatorConfig {
    /// Defaults overridden by any `STATESIM_*` variables that parse
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_updates_per_block: env_or("STATESIM_MAX_UPDATES_PER_BLOCK", defaults.max_updates_per_block),
            seed: env_or("STATESIM_SEED", defaults.seed),
            event_aligned_writes: env_or("STATESIM_EVENT_ALIGNED_WRITES", defaults.event_aligned_writes),
            delete_probability: env_or("STATESIM_DELETE_PROBABILITY", defaults.delete_probability),
            update_existing_probability: env_or(
                "STATESIM_UPDATE_EXISTING_PROBABILITY",
                defaults.update_existing_probability,
            ),
            max_string_length: env_or("STATESIM_MAX_STRING_LENGTH", defaults.max_string_length),
            max_bytes_length: env_or("STATESIM_MAX_BYTES_LENGTH", defaults.max_bytes_length),
        }
    }

    /// Parse and validate a TOML document; missing keys take defaults
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text).context("parsing simulator config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading simulator config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("loading {}", path.display()))
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_updates_per_block(mut self, max: usize) -> Self {
        self.max_updates_per_block = max;
        self
    }

    pub fn validate(&self) -> SimResult<()> {
        let invalid = |msg: String| Err(SimError::InvalidConfig(msg));

        if self.max_updates_per_block == 0 {
            return invalid("max_updates_per_block must be greater than 0".into());
        }
        if self.max_updates_per_block > MAX_UPDATES_PER_BLOCK_LIMIT {
            return invalid(format!(
                "max_updates_per_block cannot exceed {MAX_UPDATES_PER_BLOCK_LIMIT}"
            ));
        }
        for (name, p) in [
            ("delete_probability", self.delete_probability),
            ("update_existing_probability", self.update_existing_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return invalid(format!("{name} must be within [0, 1], got {p}"));
            }
        }
        for (name, len) in [
            ("max_string_length", self.max_string_length),
            ("max_bytes_length", self.max_bytes_length),
        ] {
            if len > MAX_GENERATED_LENGTH {
                return invalid(format!("{name} cannot exceed {MAX_GENERATED_LENGTH}"));
            }
        }
        Ok(())
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Environment configuration, built once; invalid settings fall back to defaults
pub static DEFAULT_CONFIG: Lazy<SimulatorConfig> = Lazy::new(|| {
    let config = SimulatorConfig::from_env();
    match config.validate() {
        Ok(()) => config,
        Err(e) => {
            warn!(error = %e, "Invalid simulator configuration in environment, using defaults");
            SimulatorConfig::default()
        }
    }
});
