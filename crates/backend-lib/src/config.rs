// ============================
// campus-backend/src/config.rs
// ============================
//! Configuration management.
//!
//! Layering: built-in defaults, then a TOML file, then `CAMPUS_`-prefixed
//! environment variables (nested keys separated by `__`, e.g.
//! `CAMPUS_MEETINGS__STARTING_SOON_MINUTES=10`).
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::validation::MAX_PARTICIPANTS_LIMIT;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "campus.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "CAMPUS_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Data directory path
    pub data_dir: PathBuf,
    /// Log level
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Base URL that join links are built from
    pub link_base_url: String,
    /// Meeting scheduling rules
    pub meetings: MeetingSettings,
    /// Rate limiting for the HTTP surface
    pub rate_limit: RateLimitSettings,
}

/// Meeting scheduling rules
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MeetingSettings {
    /// Lead time before the scheduled start during which a meeting is joinable
    pub starting_soon_minutes: u32,
    /// Shortest allowed meeting
    pub min_duration_minutes: u32,
    /// Longest allowed meeting
    pub max_duration_minutes: u32,
    /// Roster capacity when the host does not pick one
    pub default_max_participants: u32,
    /// Longest allowed title, in characters
    pub max_title_len: usize,
    /// How far ahead a meeting may be scheduled
    pub max_lead_days: u32,
    /// Seconds a meeting's writer task waits for work before shutting down
    pub writer_idle_secs: u64,
}

/// Fixed-window rate limit settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Maximum requests per window
    pub max_requests: u32,
    /// Window length in seconds
    pub window_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            log_json: false,
            link_base_url: "http://localhost:3000".to_string(),
            meetings: MeetingSettings::default(),
            rate_limit: RateLimitSettings::default(),
        }
    }
}

impl Default for MeetingSettings {
    fn default() -> Self {
        Self {
            starting_soon_minutes: 15,
            min_duration_minutes: 15,
            max_duration_minutes: 480, // 8 hours
            default_max_participants: 50,
            max_title_len: 200,
            max_lead_days: 365,
            writer_idle_secs: 300,
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 60,
        }
    }
}

impl MeetingSettings {
    /// The starting-soon window as a duration
    pub fn starting_soon_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.starting_soon_minutes))
    }

    /// Idle period after which a meeting's writer task stops
    pub fn writer_idle_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.writer_idle_secs)
    }
}

impl Settings {
    /// Load settings from `campus.toml` and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load settings from an explicit TOML file and the environment.
    /// A missing file is not an error; defaults fill the gaps.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            bail!("invalid log level `{}`", self.log_level);
        }
        if self.link_base_url.trim().is_empty() {
            bail!("link_base_url must not be empty");
        }

        let m = &self.meetings;
        if m.min_duration_minutes == 0 || m.min_duration_minutes > m.max_duration_minutes {
            bail!(
                "meeting duration bounds are invalid ({}..={})",
                m.min_duration_minutes,
                m.max_duration_minutes
            );
        }
        if m.default_max_participants == 0 || m.default_max_participants > MAX_PARTICIPANTS_LIMIT {
            bail!(
                "default_max_participants must be between 1 and {MAX_PARTICIPANTS_LIMIT}"
            );
        }
        if m.max_title_len == 0 {
            bail!("max_title_len must be positive");
        }
        if m.max_lead_days == 0 || m.writer_idle_secs == 0 {
            bail!("max_lead_days and writer_idle_secs must be positive");
        }

        if self.rate_limit.max_requests == 0 || self.rate_limit.window_secs == 0 {
            bail!("rate limit settings must be positive");
        }
        Ok(())
    }
}
