//! Configuration loading for the console.
//!
//! Every section has defaults, so an empty or missing `console.toml` yields a
//! working setup driving the simulated robot.

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "ROBOT_CONSOLE_CONFIG";
/// Configuration file looked up in the working directory when the variable is unset.
pub const DEFAULT_CONFIG_FILE: &str = "console.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConsoleConfig {
    pub console: WindowConfig,
    pub robot: RobotConfig,
    /// When present, distance queries go to this HTTP service instead of the robot link.
    pub remote_distance: Option<RemoteDistanceConfig>,
}

/// Window and control-loop settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct WindowConfig {
    pub window_title: String,
    /// Upper bound on loop iterations per second.
    pub frame_rate_hz: u32,
    /// Distance query timeout in milliseconds; 0 waits as long as the backend allows.
    pub distance_timeout_ms: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_title: "Robot Teleoperation".to_string(),
            frame_rate_hz: 50,
            distance_timeout_ms: 2000,
        }
    }
}

impl WindowConfig {
    pub fn distance_timeout(&self) -> Option<Duration> {
        match self.distance_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

/// Parameters of the simulated robot on the other end of the link.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RobotConfig {
    pub status_period_ms: u64,
    pub odometry_period_ms: u64,
    /// Standard deviation (m) of the noise added to each odometry step.
    pub odometry_noise_std: f64,
    /// When false the distance service never answers, so queries time out.
    pub respond_to_distance: bool,
    pub description: String,
    pub serial_number: String,
    pub ip_address: String,
    pub firmware_version: String,
    pub maximum_payload: String,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            status_period_ms: 1000,
            odometry_period_ms: 20,
            odometry_noise_std: 0.0,
            respond_to_distance: true,
            description: "Mir100".to_string(),
            serial_number: "567A359".to_string(),
            ip_address: "169.254.5.180".to_string(),
            firmware_version: "3.5.8".to_string(),
            maximum_payload: "100 Kg".to_string(),
        }
    }
}

/// Remote distance tracker reached over HTTP.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RemoteDistanceConfig {
    /// Full URL of the trigger endpoint, e.g. `http://robot.local:8080/get_distance`.
    pub url: String,
    /// Optional key sent as `X-Api-Key`.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl ConsoleConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(config_path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(config_path).with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
        let config = Self::parse(&content).with_context(|| format!("Invalid config file: {}", config_path.display()))?;
        Ok(config)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: ConsoleConfig = toml::from_str(content).context("Invalid TOML format")?;
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }

    /// Path from `ROBOT_CONSOLE_CONFIG`, else `console.toml` if it exists.
    pub fn locate() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        let default = PathBuf::from(DEFAULT_CONFIG_FILE);
        default.exists().then_some(default)
    }

    /// Reject values the control loop or the robot link cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.console.frame_rate_hz == 0 {
            return Err("frame-rate-hz must be positive".to_string());
        }
        if self.robot.status_period_ms == 0 {
            return Err("status-period-ms must be positive".to_string());
        }
        if self.robot.odometry_period_ms == 0 {
            return Err("odometry-period-ms must be positive".to_string());
        }
        if self.robot.odometry_noise_std.is_nan() || self.robot.odometry_noise_std < 0.0 {
            return Err(format!("odometry-noise-std must be non-negative, got {}", self.robot.odometry_noise_std));
        }
        if let Some(remote) = &self.remote_distance {
            if remote.url.trim().is_empty() {
                return Err("remote-distance url must not be empty".to_string());
            }
        }
        Ok(())
    }
}
