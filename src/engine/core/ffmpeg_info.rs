use std::process::Command;

use super::error::{Error, Result};

/// Default transcoder executable, resolved through PATH
pub const DEFAULT_TRANSCODER: &str = "ffmpeg";

/// Check if the transcoder is available and return its version line
pub fn ffmpeg_version(program: &str) -> Result<String> {
    let output = Command::new(program)
        .arg("-version")
        .output()
        .map_err(|e| Error::ProbeUnavailable {
            program: program.to_string(),
            message: format!("{} (is it installed and in PATH?)", e),
        })?;

    if !output.status.success() {
        return Err(Error::ProbeUnavailable {
            program: program.to_string(),
            message: format!("-version exited with {}", output.status),
        });
    }

    let version_output = String::from_utf8_lossy(&output.stdout);
    let first_line = version_output.lines().next().unwrap_or("Unknown version");

    Ok(first_line.to_string())
}

/// Whether the transcoder can be started at all
pub fn ffmpeg_available(program: &str) -> bool {
    ffmpeg_version(program).is_ok()
}
