//! # Room configuration
//!
//! Every tunable of the bot in one serde document, loaded from YAML.
//! Missing sections fall back to their defaults, so an empty file is a
//! valid configuration.
//!
//! ```rust
//! use room_core::config::RoomConfig;
//!
//! let config = RoomConfig::default();
//! let arcade = RoomConfig::arcade();
//! assert!(arcade.power_shot.enabled && !config.power_shot.enabled);
//! ```

mod rules;

pub use rules::{
    IdleConfig, MultiTouchPolicy, OffsideConfig, PowerShotConfig, RecordingConfig, TouchConfig,
};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, RoomError};
use crate::users::RegisteredUser;

/// Host-side room settings applied at bootstrap.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomSettings {
    pub name: String,
    pub max_players: u32,
    pub public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub score_limit: u32,
    /// Minutes
    pub time_limit: u32,
    pub default_stadium: String,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            name: "Fish 🐠".to_string(),
            max_players: 16,
            public: true,
            password: None,
            score_limit: 3,
            time_limit: 5,
            default_stadium: "Classic".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// JSON stats file; in-memory store when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    pub room: RoomSettings,
    pub touch: TouchConfig,
    pub power_shot: PowerShotConfig,
    pub idle: IdleConfig,
    pub offside: OffsideConfig,
    pub recording: RecordingConfig,
    pub stats: StatsConfig,
    /// Registered-user roster; the embedded roster when omitted
    pub users: Vec<RegisteredUser>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            room: RoomSettings::default(),
            touch: TouchConfig::default(),
            power_shot: PowerShotConfig::default(),
            idle: IdleConfig::default(),
            offside: OffsideConfig::default(),
            recording: RecordingConfig::default(),
            stats: StatsConfig::default(),
            users: crate::data::default_users(),
        }
    }
}

impl RoomConfig {
    /// Casual rules (default)
    pub fn casual() -> Self {
        Self::default()
    }

    /// Power shot and offside on from the start
    pub fn arcade() -> Self {
        let mut cfg = Self::default();
        cfg.power_shot.enabled = true;
        cfg.offside.enabled = true;
        cfg
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let cfg: Self = if yaml.trim().is_empty() { Self::default() } else { serde_yaml::from_str(yaml)? };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| RoomError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.touch.distance_sensitivity <= 0.0 {
            return Err(RoomError::Config("touch.distance_sensitivity must be positive".into()));
        }
        if self.power_shot.timeout_ticks == 0 {
            return Err(RoomError::Config("power_shot.timeout_ticks must be at least 1".into()));
        }
        if self.power_shot.power_coefficient <= 0.0 {
            return Err(RoomError::Config("power_shot.power_coefficient must be positive".into()));
        }
        let mut ids: Vec<&str> = self.users.iter().map(|u| u.id.as_str()).collect();
        ids.sort_unstable();
        if let Some(dup) = ids.windows(2).find(|w| w[0] == w[1]) {
            return Err(RoomError::Config(format!("duplicate registered user id: {}", dup[0])));
        }
        Ok(())
    }
}

// ========== Tests ==========
