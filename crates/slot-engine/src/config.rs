//! Engine configuration.
//!
//! Defaults reproduce the production booking backend: Asia/Kolkata business
//! time, a 20-minute candidate grid, a 20-minute buffer around every busy
//! block and 20-minute sessions unless the caller asks otherwise.
//!
//! ```toml
//! timezone = "Europe/Berlin"
//! step_minutes = 15
//! buffer_minutes = 10
//! timestamp_policy = "midnight"
//! ```

use std::path::Path;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::classifier::TimestampPolicy;
use crate::error::{EngineError, Result};
use crate::slots::SlotGrid;
use crate::time;

pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// IANA name of the business timezone used for day boundaries and display.
    pub timezone: String,
    /// Distance between consecutive candidate start times.
    pub step_minutes: u32,
    /// Gap enforced on both sides of every busy block.
    pub buffer_minutes: u32,
    /// Session length used when a caller does not name one.
    pub default_duration_minutes: u32,
    /// What to do with events whose timestamps cannot be parsed.
    pub timestamp_policy: TimestampPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            step_minutes: 20,
            buffer_minutes: 20,
            default_duration_minutes: 20,
            timestamp_policy: TimestampPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?;
        tracing::debug!("Loading engine config from {}", path.display());
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string. Missing keys take defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.step_minutes == 0 {
            return Err(EngineError::Config("step_minutes must be > 0".to_string()));
        }
        if self.default_duration_minutes == 0 {
            return Err(EngineError::Config(
                "default_duration_minutes must be > 0".to_string(),
            ));
        }
        self.tz()?;
        Ok(())
    }

    /// The parsed business timezone.
    pub fn tz(&self) -> Result<Tz> {
        time::parse_timezone(&self.timezone)
    }

    pub fn grid(&self) -> SlotGrid {
        SlotGrid {
            step_minutes: self.step_minutes,
            buffer_minutes: self.buffer_minutes,
        }
    }
}
