//! # Hub Configuration
//!
//! TOML-backed configuration, loaded once at startup.
//!
//! Every section and field is optional; missing values fall back to the
//! defaults in [`crate::constants`].
//!
//! ```toml
//! [session]
//! origin = "https://party.example"
//!
//! [racer]
//! seed = 7
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    CHANNEL_CAPACITY, DEFAULT_ORIGIN, ENCODER_ACK_WINDOW_MS, ENCODER_MIN_GAP_MS, MATCH_DELAY_MS,
    MISMATCH_DELAY_MS, PLATFORMER_TICK_RATE, RACER_TICK_INTERVAL_MS, RELAY_BIND,
    RELAY_RECENT_INTERACTIONS,
};

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    /// The values parse but make no sense.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Session and join-URL settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Origin the join URL is built from.
    pub origin: String,
    /// Capacity of each store watch channel.
    pub channel_capacity: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_owned(),
            channel_capacity: CHANNEL_CAPACITY,
        }
    }
}

/// Memory game timing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySettings {
    /// Delay before a matching pair locks in (ms).
    pub match_delay_ms: u64,
    /// Delay before a mismatching pair flips back (ms).
    pub mismatch_delay_ms: u64,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            match_delay_ms: MATCH_DELAY_MS,
            mismatch_delay_ms: MISMATCH_DELAY_MS,
        }
    }
}

/// Platformer simulation settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformerSettings {
    /// Physics steps per second.
    pub tick_rate: u32,
    /// Platform layout seed; random when absent.
    pub seed: Option<u64>,
}

impl Default for PlatformerSettings {
    fn default() -> Self {
        Self {
            tick_rate: PLATFORMER_TICK_RATE,
            seed: None,
        }
    }
}

/// Racer settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RacerSettings {
    /// Collision/finish check interval (ms).
    pub tick_interval_ms: u64,
    /// Obstacle seed; random when absent.
    pub seed: Option<u64>,
    /// Pre-spawn obstacle sets ahead of the start line.
    pub seed_initial_obstacles: bool,
}

impl Default for RacerSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: RACER_TICK_INTERVAL_MS,
            seed: None,
            seed_initial_obstacles: true,
        }
    }
}

/// Controller encoder throttling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    /// Minimum gap between two emissions (ms).
    pub min_gap_ms: u64,
    /// Re-entry suppression window after an emission (ms).
    pub ack_window_ms: u64,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            min_gap_ms: ENCODER_MIN_GAP_MS,
            ack_window_ms: ENCODER_ACK_WINDOW_MS,
        }
    }
}

/// Alternate relay transport settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaySettings {
    /// Address the relay binds to.
    pub bind_address: String,
    /// Interactions included in a `session-state` reply.
    pub recent_interactions: usize,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            bind_address: RELAY_BIND.to_owned(),
            recent_interactions: RELAY_RECENT_INTERACTIONS,
        }
    }
}

/// Complete hub configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// `[session]`
    pub session: SessionSettings,
    /// `[memory]`
    pub memory: MemorySettings,
    /// `[platformer]`
    pub platformer: PlatformerSettings,
    /// `[racer]`
    pub racer: RacerSettings,
    /// `[encoders]`
    pub encoders: EncoderSettings,
    /// `[relay]`
    pub relay: RelaySettings,
}

impl HubConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on bad syntax and
    /// [`ConfigError::Invalid`] on nonsensical values.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`HubConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks values that parse but cannot run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.session.origin.trim().is_empty() {
            return Err(ConfigError::Invalid("session.origin is empty".into()));
        }
        if self.session.channel_capacity == 0 {
            return Err(ConfigError::Invalid("session.channel_capacity must be > 0".into()));
        }
        if self.platformer.tick_rate == 0 {
            return Err(ConfigError::Invalid("platformer.tick_rate must be > 0".into()));
        }
        if self.racer.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("racer.tick_interval_ms must be > 0".into()));
        }
        Ok(())
    }
}
