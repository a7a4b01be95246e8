use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use super::filters::format_number;

/// Name of the folder (under the home directory) that receives previews
pub const PREVIEW_DIR_NAME: &str = "temp_video_preview";

/// File stem of the input, kept as raw OS bytes
fn stem_of(input_path: &Path) -> OsString {
    input_path
        .file_stem()
        .map(OsStr::to_os_string)
        .unwrap_or_else(|| OsString::from("output"))
}

/// `{stem}_{speed}x{suffix}{.ext}`
fn output_name(stem: &OsStr, speed: &str, suffix: &str, extension: Option<&OsStr>) -> OsString {
    let mut name = stem.to_os_string();
    name.push("_");
    name.push(speed);
    name.push("x");
    name.push(suffix);
    if let Some(ext) = extension {
        name.push(".");
        name.push(ext);
    }
    name
}

/// Pick a destination for a sped-up copy that does not overwrite anything
///
/// `clip.mp4` at 2x becomes `clip_2.0x.mp4`, then `clip_2.0x_1.mp4`,
/// `clip_2.0x_2.mp4`, ... when earlier names are taken. The filesystem is
/// checked on every call, so call this right before the file is written.
pub fn output_path_for(input_path: &Path, speed: f64, output_dir: &Path) -> PathBuf {
    let stem = stem_of(input_path);
    let extension = input_path.extension();
    let speed = format_number(speed);

    let candidate = output_dir.join(output_name(&stem, &speed, "", extension));
    if !candidate.exists() {
        return candidate;
    }

    (1u64..)
        .map(|n| output_dir.join(output_name(&stem, &speed, &format!("_{}", n), extension)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

/// Default preview folder: `~/temp_video_preview`
pub fn default_preview_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(PREVIEW_DIR_NAME)
}

/// Preview clips are always MP4 and are replaced on every preview
pub fn preview_path_for(input_path: &Path, preview_dir: &Path) -> PathBuf {
    let mut name = OsString::from("preview_");
    name.push(stem_of(input_path));
    name.push(".mp4");
    preview_dir.join(name)
}
