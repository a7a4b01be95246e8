use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::str::FromStr;

use super::error::Error;

/// Encoding quality preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum QualityTier {
    Low,
    Medium,
    #[default]
    High,
    VeryHigh,
}

impl QualityTier {
    pub const ALL: [QualityTier; 4] = [Self::Low, Self::Medium, Self::High, Self::VeryHigh];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QualityTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "veryhigh" => Ok(Self::VeryHigh),
            _ => Err(Error::InvalidSpec(format!(
                "unknown quality tier '{}' (expected Low, Medium, High or Very High)",
                s
            ))),
        }
    }
}

impl TryFrom<String> for QualityTier {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<QualityTier> for String {
    fn from(tier: QualityTier) -> Self {
        tier.label().to_string()
    }
}

/// Output frame rate: a fixed value or whatever the source uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FrameRate {
    KeepOriginal,
    Fps(u32),
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::Fps(30)
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeepOriginal => f.write_str("Keep Original"),
            Self::Fps(fps) => write!(f, "{}", fps),
        }
    }
}

impl FromStr for FrameRate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "keep" | "keep original" | "original" => return Ok(Self::KeepOriginal),
            _ => {}
        }

        match trimmed.parse::<u32>() {
            Ok(fps) if fps > 0 => Ok(Self::Fps(fps)),
            _ => Err(Error::InvalidSpec(format!(
                "frame rate must be a positive integer or 'keep', got '{}'",
                s
            ))),
        }
    }
}

impl TryFrom<String> for FrameRate {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FrameRate> for String {
    fn from(rate: FrameRate) -> Self {
        match rate {
            FrameRate::KeepOriginal => "keep".to_string(),
            FrameRate::Fps(fps) => fps.to_string(),
        }
    }
}

/// Encoder thread preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ThreadCount {
    #[default]
    Auto,
    Fixed(NonZeroU32),
}

impl fmt::Display for ThreadCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Fixed(n) => write!(f, "{}", n),
        }
    }
}

impl FromStr for ThreadCount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }

        trimmed
            .parse::<NonZeroU32>()
            .map(Self::Fixed)
            .map_err(|_| {
                Error::InvalidSpec(format!(
                    "thread count must be 'auto' or a positive integer, got '{}'",
                    s
                ))
            })
    }
}

impl TryFrom<String> for ThreadCount {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ThreadCount> for String {
    fn from(threads: ThreadCount) -> Self {
        threads.to_string()
    }
}

/// Per-video settings applied to newly added files or to the whole queue
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JobSettings {
    pub speed: f64,
    #[serde(default)]
    pub frame_rate: FrameRate,
    #[serde(default)]
    pub quality: QualityTier,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            speed: 2.0,
            frame_rate: FrameRate::default(),
            quality: QualityTier::default(),
        }
    }
}

impl JobSettings {
    /// Create a job for `source` using these settings
    pub fn job_for(&self, source: impl Into<PathBuf>) -> JobSpec {
        JobSpec::new(source, self.speed, self.frame_rate, self.quality)
    }
}

/// Settings for one queued video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub source: PathBuf,
    /// Playback speed multiplier (2.0 = twice as fast)
    pub speed: f64,
    #[serde(default)]
    pub frame_rate: FrameRate,
    #[serde(default)]
    pub quality: QualityTier,
}

impl JobSpec {
    pub fn new(
        source: impl Into<PathBuf>,
        speed: f64,
        frame_rate: FrameRate,
        quality: QualityTier,
    ) -> Self {
        Self {
            source: source.into(),
            speed,
            frame_rate,
            quality,
        }
    }

    /// Replace speed, frame rate and quality, keeping the source
    pub fn apply(&mut self, settings: &JobSettings) {
        self.speed = settings.speed;
        self.frame_rate = settings.frame_rate;
        self.quality = settings.quality;
    }

    /// File name shown in progress and error messages
    pub fn display_name(&self) -> String {
        self.source
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.source.display().to_string())
    }

    /// Check the invariants required before a command can be built
    pub fn validate(&self) -> Result<(), Error> {
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(Error::InvalidSpec(format!(
                "speed must be a positive number, got {}",
                self.speed
            )));
        }
        if self.frame_rate == FrameRate::Fps(0) {
            return Err(Error::InvalidSpec(
                "frame rate must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
