use clap::{Args, Parser, Subcommand};
use ffspeed::engine::{EncoderProfile, FrameRate, QualityTier, ThreadCount};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ffspeed")]
#[command(about = "Batch video speed-up with FFmpeg", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log engine activity at debug level (overridden by FFSPEED_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check if the transcoder is installed
    CheckFfmpeg,

    /// List hardware encoders the transcoder supports
    Probe {
        /// Print the detected profile as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show transcoder commands without executing (dry run)
    DryRun {
        #[command(flatten)]
        job: JobArgs,

        /// Output folder used to name the files
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Speed up every input, one file at a time
    Run {
        #[command(flatten)]
        job: JobArgs,

        /// Output folder (defaults to the configured folder)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a short sped-up clip of one file
    Preview {
        /// Video to preview
        file: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Clip length in seconds (defaults to the configured length)
        #[arg(long)]
        seconds: Option<u32>,

        /// Folder for the preview clip (defaults to ~/temp_video_preview)
        #[arg(long)]
        preview_dir: Option<PathBuf>,

        /// Open the finished clip in the system video player
        #[arg(long)]
        open: bool,
    },

    /// Show config status and location, or create default config if missing
    InitConfig,
}

/// Inputs plus per-video settings
#[derive(Args)]
pub struct JobArgs {
    /// Video files or folders (folders are scanned recursively)
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    #[command(flatten)]
    pub settings: SettingsArgs,
}

/// Flags that override configured defaults
#[derive(Args, Default)]
pub struct SettingsArgs {
    /// Playback speed multiplier, e.g. 2 or 1.5
    #[arg(short, long)]
    pub speed: Option<f64>,

    /// Output frame rate, or "keep" to use the source rate
    #[arg(long)]
    pub fps: Option<FrameRate>,

    /// Low, Medium, High or "Very High"
    #[arg(short, long)]
    pub quality: Option<QualityTier>,

    /// software, nvenc, amf, qsv, videotoolbox or vaapi
    #[arg(short, long)]
    pub encoder: Option<EncoderProfile>,

    /// Encoder threads: "auto" or a positive number
    #[arg(long)]
    pub threads: Option<ThreadCount>,
}

pub fn parse() -> Cli {
    Cli::parse()
}
