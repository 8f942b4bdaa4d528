//! Dashboard configuration.
//!
//! Loaded once at process start: TOML file (`DASHBOARD_CONFIG`, else
//! `config/dashboard.toml`, else defaults), then environment overrides,
//! then [`validate`](DashboardConfig::validate).  Invalid values are
//! rejected, never clamped.

use core::fmt;
use core::str::FromStr;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::control::ControlThresholds;
use crate::error::{ConfigError, ParseError};

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/dashboard.toml";

/// Where readings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Local simulator on a fixed tick.
    #[default]
    Demo,
    /// Remote realtime database.
    #[serde(alias = "firebase")]
    Live,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Demo => "demo",
            Self::Live => "live",
        })
    }
}

impl FromStr for DataSource {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "demo" => Ok(Self::Demo),
            "live" | "firebase" => Ok(Self::Live),
            _ => Err(ParseError::UnknownSource),
        }
    }
}

/// Live backend connection settings.  Opaque to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Base URL of the realtime database, e.g. `https://x.firebaseio.com`.
    pub database_url: Option<String>,
    /// Database secret or ID token appended as `?auth=`.
    pub auth_token: Option<String>,
    /// How often each watched path is re-read.
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            auth_token: None,
            poll_interval_ms: 1000,
            request_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub source: DataSource,

    // --- Demo ---
    /// Real-world interval between simulated ticks.
    pub tick_interval_ms: u64,
    /// Fixed RNG seed; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Offset from UTC for the diurnal light curve; `None` uses local time.
    pub utc_offset_minutes: Option<i32>,

    // --- Auto control ---
    pub thresholds: ControlThresholds,
    /// 0 disables hysteresis.
    pub hysteresis_band: f64,

    // --- Session ---
    /// Stop on its own after this many seconds.
    pub run_for_secs: Option<u64>,
    /// Log every n-th telemetry tick; state changes are always logged.
    pub telemetry_log_every: u64,
    pub preferences_path: PathBuf,

    pub live: LiveConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source: DataSource::Demo,
            tick_interval_ms: 5000,
            seed: None,
            utc_offset_minutes: None,
            thresholds: ControlThresholds::default(),
            hysteresis_band: 0.0,
            run_for_secs: None,
            telemetry_log_every: 1,
            preferences_path: PathBuf::from("growdash-prefs.toml"),
            live: LiveConfig::default(),
        }
    }
}

impl DashboardConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Load `explicit` if given (errors are fatal), else the default path
    /// if it exists, else defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            let config = Self::load(path)?;
            info!("Config loaded from {}", path.display());
            return Ok(config);
        }
        let fallback = Path::new(DEFAULT_CONFIG_PATH);
        if fallback.exists() {
            match Self::load(fallback) {
                Ok(config) => {
                    info!("Config loaded from {}", fallback.display());
                    return Ok(config);
                }
                Err(e) => warn!("Ignoring {}: {}", fallback.display(), e),
            }
        }
        info!("No config file, using defaults");
        Ok(Self::default())
    }

    /// Apply `DASHBOARD_*` overrides.  `lookup` is usually
    /// `|k| std::env::var(k).ok()`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(v) = lookup("DASHBOARD_MODE") {
            self.source = v
                .parse()
                .map_err(|_| ConfigError::Invalid("DASHBOARD_MODE must be demo or live"))?;
        }
        if let Some(v) = lookup("DASHBOARD_DATABASE_URL") {
            self.live.database_url = Some(v);
        }
        if let Some(v) = lookup("DASHBOARD_AUTH_TOKEN") {
            self.live.auth_token = Some(v);
        }
        if let Some(v) = lookup("DASHBOARD_SEED") {
            self.seed = Some(
                v.trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid("DASHBOARD_SEED must be an unsigned integer"))?,
            );
        }
        if let Some(v) = lookup("DASHBOARD_TICK_MS") {
            self.tick_interval_ms = v
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("DASHBOARD_TICK_MS must be an unsigned integer"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be > 0"));
        }
        if self.telemetry_log_every == 0 {
            return Err(ConfigError::Invalid("telemetry_log_every must be > 0"));
        }
        if !self.hysteresis_band.is_finite() || self.hysteresis_band < 0.0 {
            return Err(ConfigError::Invalid("hysteresis_band must be >= 0"));
        }
        if let Some(m) = self.utc_offset_minutes {
            if !(-14 * 60..=14 * 60).contains(&m) {
                return Err(ConfigError::Invalid("utc_offset_minutes must be within +/-14h"));
            }
        }
        let t = &self.thresholds;
        let all = [
            t.lamp_below_light,
            t.fan_above_temp,
            t.fan_above_humidity,
            t.pump_below_soil,
        ];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::Invalid("thresholds must be finite"));
        }
        if self.source == DataSource::Live {
            let url = self.live.database_url.as_deref().unwrap_or("");
            if url.trim().is_empty() {
                return Err(ConfigError::Invalid("live source needs live.database_url"));
            }
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid("live.database_url must be http(s)"));
            }
            if self.live.poll_interval_ms == 0 || self.live.request_timeout_ms == 0 {
                return Err(ConfigError::Invalid("live intervals must be > 0"));
            }
        }
        Ok(())
    }

    /// One log line per setting group.  The auth token is never logged.
    pub fn log_summary(&self) {
        info!(
            "Config | source={} tick={}ms telemetry_log_every={}",
            self.source, self.tick_interval_ms, self.telemetry_log_every
        );
        info!(
            "Config | seed={:?} utc_offset_min={:?} run_for={:?}s",
            self.seed, self.utc_offset_minutes, self.run_for_secs
        );
        let t = &self.thresholds;
        info!(
            "Config | lamp<{} fan>{}\u{00b0}C|>{}% pump<{} band={}",
            t.lamp_below_light,
            t.fan_above_temp,
            t.fan_above_humidity,
            t.pump_below_soil,
            self.hysteresis_band
        );
        if self.source == DataSource::Live {
            info!(
                "Config | db={} auth={} poll={}ms",
                self.live.database_url.as_deref().unwrap_or("-"),
                if self.live.auth_token.is_some() { "set" } else { "none" },
                self.live.poll_interval_ms
            );
        }
    }
}
