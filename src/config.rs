// Global configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

use crate::engine::{
    DEFAULT_PREVIEW_SECONDS, DEFAULT_TRANSCODER, EncoderProfile, FrameRate, JobSettings,
    QualityTier, ThreadCount,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub transcoder: TranscoderConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// Transcoder executable name or path
    #[serde(default = "default_program")]
    pub program: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Playback speed for newly added videos
    #[serde(default = "default_speed")]
    pub speed: f64,

    #[serde(default)]
    pub frame_rate: FrameRate,

    #[serde(default)]
    pub quality: QualityTier,

    #[serde(default)]
    pub threads: ThreadCount,

    /// Encoder to use instead of the best detected one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoder: Option<EncoderProfile>,

    /// Output folder used when `--output` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    #[serde(default = "default_preview_seconds")]
    pub preview_seconds: u32,
}

fn default_program() -> String {
    DEFAULT_TRANSCODER.to_string()
}

fn default_speed() -> f64 {
    JobSettings::default().speed
}

fn default_preview_seconds() -> u32 {
    DEFAULT_PREVIEW_SECONDS
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            frame_rate: FrameRate::default(),
            quality: QualityTier::default(),
            threads: ThreadCount::Auto,
            encoder: None, // Use the probed choice
            output_dir: None,
            preview_seconds: default_preview_seconds(),
        }
    }
}

impl DefaultsConfig {
    /// Settings applied to videos added without explicit flags
    pub fn job_settings(&self) -> JobSettings {
        JobSettings {
            speed: self.speed,
            frame_rate: self.frame_rate,
            quality: self.quality,
        }
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "macos") {
            dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".config")
                .join("ffspeed")
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("ffspeed")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Parse config from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse config")
    }

    /// Load config from disk, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path).with_context(|| {
                format!("Failed to read config file: {}", config_path.display())
            })?;

            Self::from_toml(&contents)
                .with_context(|| format!("Invalid config file: {}", config_path.display()))
        } else {
            let config = Config::default();

            // Missing write access is not fatal; built-in defaults still apply
            if let Err(e) = config.save() {
                warn!("Could not create default config file: {:#}", e);
                warn!("Using built-in defaults. Run 'ffspeed init-config' to create a config file.");
            }

            Ok(config)
        }
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Check if config file exists
    pub fn exists() -> bool {
        Self::config_path().map(|p| p.exists()).unwrap_or(false)
    }

    /// Create a default config file if it doesn't exist
    pub fn ensure_default() -> Result<()> {
        if !Self::exists() {
            Config::default().save()?;
        }
        Ok(())
    }
}
