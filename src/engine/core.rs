mod error;
mod ffmpeg_cmd;
mod ffmpeg_info;
mod filters;
mod output;
mod scan;
mod types;

pub use error::{Error, Result};
pub use ffmpeg_cmd::{AUDIO_ARGS, CommandPlan, FASTSTART_ARGS, build_command_plan};
pub use ffmpeg_info::{DEFAULT_TRANSCODER, ffmpeg_available, ffmpeg_version};
pub use filters::{
    FilterPlan, MAX_TEMPO_STAGE, MIN_TEMPO_STAGE, format_number, plan_filters, tempo_stages,
    video_filter,
};
pub use output::{PREVIEW_DIR_NAME, default_preview_dir, output_path_for, preview_path_for};
pub use scan::{VIDEO_EXTENSIONS, is_video_file, scan, scan_streaming};
pub use types::{FrameRate, JobSettings, JobSpec, QualityTier, ThreadCount};
