//! # Configuration Management Module
//!
//! Loads, validates and writes the `boardlink` TOML configuration.
//!
//! ## Configuration Structure
//!
//! - [`LinkConfig`] - header, terminator and receive timeout of the host link
//! - [`SerialConfig`] - host serial port
//! - [`SbusConfig`] - optional SBUS receiver port
//! - [`ControlConfig`] - control-law gain and loop period
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use boardlink::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Config::create_default("config.toml").await?;
//!     let config = Config::load("config.toml").await?;
//!     println!("Serial Port: {}", config.serial.port);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [link]
//! header = 0xAABBCCDD   # 0 disables
//! terminator = 0
//! timeout_us = 500
//!
//! [serial]
//! port = "/dev/ttyACM0"
//! baud_rate = 115200
//!
//! [control]
//! gain = 2.0
//! cycle_ms = 10
//!
//! [logging]
//! level = "info"
//! file = "boardlink.log"
//! ```
//!
//! Both ends of the link must use the same header and terminator. Values are
//! validated on load; CLI arguments override the file.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::control::{ModelParams, DEFAULT_GAIN};
pub use crate::link::LinkConfig;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("link.timeout_us must be greater than zero")]
    ZeroTimeout,

    #[error("link.timeout_us ({timeout_us} us) exceeds the control cycle ({cycle_ms} ms)")]
    TimeoutExceedsCycle { timeout_us: u64, cycle_ms: u64 },

    #[error("{section}.port must not be empty")]
    EmptyPort { section: &'static str },

    #[error("serial.baud_rate must be greater than zero")]
    ZeroBaudRate,

    #[error("control.cycle_ms must be greater than zero")]
    ZeroCycle,

    #[error("control.gain must be a finite number (got {0})")]
    InvalidGain(f32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub link: LinkConfig,
    pub serial: SerialConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sbus: Option<SbusConfig>,
    #[serde(default)]
    pub control: ControlConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

fn default_baud_rate() -> u32 {
    115200
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SbusConfig {
    pub port: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    #[serde(default = "default_gain")]
    pub gain: f32,
    /// Control loop period in milliseconds
    #[serde(default = "default_cycle_ms")]
    pub cycle_ms: u64,
}

fn default_gain() -> f32 {
    DEFAULT_GAIN
}

fn default_cycle_ms() -> u64 {
    10
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            gain: default_gain(),
            cycle_ms: default_cycle_ms(),
        }
    }
}

impl ControlConfig {
    pub fn params(&self) -> ModelParams {
        ModelParams { gain: self.gain }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Config {
    /// Load and validate a configuration file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        Self::parse(&content).map_err(|e| anyhow!("Invalid config file {}: {}", path, e))
    }

    /// Parse and validate TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.link.timeout_us == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.serial.port.trim().is_empty() {
            return Err(ConfigError::EmptyPort { section: "serial" });
        }
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::ZeroBaudRate);
        }
        if let Some(sbus) = &self.sbus {
            if sbus.port.trim().is_empty() {
                return Err(ConfigError::EmptyPort { section: "sbus" });
            }
        }
        if self.control.cycle_ms == 0 {
            return Err(ConfigError::ZeroCycle);
        }
        if self.link.timeout_us > self.control.cycle_ms.saturating_mul(1000) {
            return Err(ConfigError::TimeoutExceedsCycle {
                timeout_us: self.link.timeout_us,
                cycle_ms: self.control.cycle_ms,
            });
        }
        if !self.control.gain.is_finite() {
            return Err(ConfigError::InvalidGain(self.control.gain));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            link: LinkConfig::default(),
            serial: SerialConfig {
                port: "/dev/ttyACM0".to_string(),
                baud_rate: default_baud_rate(),
            },
            sbus: None,
            control: ControlConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("boardlink.log".to_string()),
            },
        }
    }
}
