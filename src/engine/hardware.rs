//! Hardware encoder detection and per-encoder FFmpeg settings

use serde::{Deserialize, Serialize};
use std::fmt;
use std::process::Command;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::engine::core::{Error, QualityTier};

/// Device node used for VAAPI decode
pub const VAAPI_DEVICE: &str = "/dev/dri/renderD128";

// ============================================================================
// Encoder Profiles
// ============================================================================

/// Encoding path: software x264 or one of the hardware H.264 encoders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderProfile {
    #[default]
    Software,
    Nvenc,        // NVIDIA
    Amf,          // AMD
    Qsv,          // Intel Quick Sync
    VideoToolbox, // Apple
    Vaapi,        // Linux VA-API
}

impl EncoderProfile {
    /// Hardware encoders in detection priority order
    pub const HARDWARE: [EncoderProfile; 5] = [
        Self::Nvenc,
        Self::Amf,
        Self::Qsv,
        Self::VideoToolbox,
        Self::Vaapi,
    ];

    /// Identifier used in config files and on the command line
    pub fn id(&self) -> &'static str {
        match self {
            Self::Software => "software",
            Self::Nvenc => "nvenc",
            Self::Amf => "amf",
            Self::Qsv => "qsv",
            Self::VideoToolbox => "videotoolbox",
            Self::Vaapi => "vaapi",
        }
    }

    /// Get the FFmpeg encoder name
    pub fn encoder_name(&self) -> &'static str {
        match self {
            Self::Software => "libx264",
            Self::Nvenc => "h264_nvenc",
            Self::Amf => "h264_amf",
            Self::Qsv => "h264_qsv",
            Self::VideoToolbox => "h264_videotoolbox",
            Self::Vaapi => "h264_vaapi",
        }
    }

    /// Check if this is a hardware encoder
    pub fn is_hardware(&self) -> bool {
        !matches!(self, Self::Software)
    }

    /// Get user-friendly display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Software => "libx264 (Software)",
            Self::Nvenc => "NVENC (NVIDIA)",
            Self::Amf => "AMF (AMD)",
            Self::Qsv => "Quick Sync (Intel)",
            Self::VideoToolbox => "VideoToolbox (Apple)",
            Self::Vaapi => "VAAPI (Linux)",
        }
    }

    /// Hardware decode flags placed right after the input
    pub fn decode_flags(&self) -> &'static [&'static str] {
        match self {
            Self::Nvenc => &["-hwaccel", "cuda", "-hwaccel_output_format", "cuda"],
            Self::Qsv => &["-hwaccel", "qsv", "-hwaccel_output_format", "qsv"],
            Self::Vaapi => &["-hwaccel", "vaapi", "-vaapi_device", VAAPI_DEVICE],
            Self::VideoToolbox => &["-hwaccel", "videotoolbox"],
            // AMF has no decode path in FFmpeg; decode stays on the CPU
            Self::Amf | Self::Software => &[],
        }
    }

    /// Encoder-specific rate control arguments for a quality tier
    pub fn quality_args(&self, tier: QualityTier) -> &'static [&'static str] {
        use QualityTier::*;

        match (self, tier) {
            (Self::Software, Low) => &["-crf", "28", "-preset", "ultrafast"],
            (Self::Software, Medium) => &["-crf", "23", "-preset", "fast"],
            (Self::Software, High) => &["-crf", "18", "-preset", "medium"],
            (Self::Software, VeryHigh) => &["-crf", "15", "-preset", "slow"],

            (Self::Nvenc, Low) => &["-preset", "fast", "-cq", "30"],
            (Self::Nvenc, Medium) => &["-preset", "medium", "-cq", "25"],
            (Self::Nvenc, High) => &["-preset", "slow", "-cq", "20"],
            (Self::Nvenc, VeryHigh) => &["-preset", "slow", "-cq", "18"],

            (Self::Amf, Low) => &["-quality", "speed", "-qp_i", "30"],
            (Self::Amf, Medium) => &["-quality", "balanced", "-qp_i", "25"],
            (Self::Amf, High) => &["-quality", "quality", "-qp_i", "20"],
            (Self::Amf, VeryHigh) => &["-quality", "quality", "-qp_i", "18"],

            (Self::Qsv, Low) => &["-preset", "veryfast", "-global_quality", "30", "-look_ahead", "0"],
            (Self::Qsv, Medium) => &["-preset", "medium", "-global_quality", "25", "-look_ahead", "1"],
            (Self::Qsv, High) => &["-preset", "slow", "-global_quality", "20", "-look_ahead", "1"],
            (Self::Qsv, VeryHigh) => &["-preset", "slower", "-global_quality", "18", "-look_ahead", "1"],

            (Self::VideoToolbox, Low) => &["-q:v", "60"],
            (Self::VideoToolbox, Medium) => &["-q:v", "50"],
            (Self::VideoToolbox, High) => &["-q:v", "40"],
            (Self::VideoToolbox, VeryHigh) => &["-q:v", "30"],

            (Self::Vaapi, Low) => &["-qp", "30"],
            (Self::Vaapi, Medium) => &["-qp", "25"],
            (Self::Vaapi, High) => &["-qp", "20"],
            (Self::Vaapi, VeryHigh) => &["-qp", "18"],
        }
    }
}

impl fmt::Display for EncoderProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for EncoderProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "software" | "cpu" | "libx264" => Ok(Self::Software),
            "nvenc" => Ok(Self::Nvenc),
            "amf" => Ok(Self::Amf),
            "qsv" => Ok(Self::Qsv),
            "videotoolbox" => Ok(Self::VideoToolbox),
            "vaapi" => Ok(Self::Vaapi),
            other => Err(Error::InvalidSpec(format!("unknown encoder '{}'", other))),
        }
    }
}

// ============================================================================
// Detection
// ============================================================================

/// Hardware encoders found at startup plus the one currently selected
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct HardwareProfile {
    /// Detected hardware encoders, in priority order (empty = software only)
    pub available: Vec<EncoderProfile>,
    pub selected: EncoderProfile,
}

impl HardwareProfile {
    /// Software-only profile used when the transcoder cannot be queried
    pub fn software_only() -> Self {
        Self::default()
    }

    /// Build a profile from detected encoders; the first one becomes the default
    pub fn from_available(available: Vec<EncoderProfile>) -> Self {
        let selected = available.first().copied().unwrap_or_default();
        Self {
            available,
            selected,
        }
    }

    /// Every encoder the caller may pick: software first, then detected hardware
    pub fn choices(&self) -> Vec<EncoderProfile> {
        std::iter::once(EncoderProfile::Software)
            .chain(self.available.iter().copied())
            .collect()
    }

    pub fn supports(&self, encoder: EncoderProfile) -> bool {
        !encoder.is_hardware() || self.available.contains(&encoder)
    }

    /// Return a copy with a different selection, rejecting undetected hardware
    pub fn select(&self, encoder: EncoderProfile) -> Result<Self, Error> {
        if !self.supports(encoder) {
            return Err(Error::UnavailableEncoder(encoder));
        }
        Ok(Self {
            available: self.available.clone(),
            selected: encoder,
        })
    }
}

/// Parse the output of `ffmpeg -encoders` into a hardware profile
pub fn parse_encoder_listing(listing: &str) -> HardwareProfile {
    let available = EncoderProfile::HARDWARE
        .into_iter()
        .filter(|encoder| listing.contains(encoder.encoder_name()))
        .collect();

    HardwareProfile::from_available(available)
}

/// Run the transcoder's encoder listing and return the raw text
pub fn encoder_listing(program: &str) -> Result<String, Error> {
    let output = Command::new(program)
        .args(["-hide_banner", "-encoders"])
        .output()
        .map_err(|e| Error::ProbeUnavailable {
            program: program.to_string(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::ProbeUnavailable {
            program: program.to_string(),
            message: format!("encoder listing exited with {}", output.status),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Detect hardware encoders supported by the installed transcoder
///
/// Never fails: if the binary is missing or the listing cannot be read the
/// result is a software-only profile.
pub fn probe_hardware(program: &str) -> HardwareProfile {
    match encoder_listing(program) {
        Ok(listing) => {
            let profile = parse_encoder_listing(&listing);
            info!(
                available = ?profile.available,
                selected = %profile.selected,
                "Hardware encoder probe finished"
            );
            profile
        }
        Err(e) => {
            warn!("{}; falling back to software encoding", e);
            debug!(program, "Hardware probe degraded to software-only");
            HardwareProfile::software_only()
        }
    }
}
