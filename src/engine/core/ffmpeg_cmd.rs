use std::ffi::{OsStr, OsString};
use std::fmt::Write as _;
use std::path::Path;
use std::process::Command;

use super::error::{Error, Result};
use super::filters::plan_filters;
use super::types::{FrameRate, JobSpec, ThreadCount};
use crate::engine::hardware::EncoderProfile;

/// Fixed audio settings: AAC at 128 kbps
pub const AUDIO_ARGS: [&str; 4] = ["-c:a", "aac", "-b:a", "128k"];

/// Move the moov atom to the front so output can play while downloading
pub const FASTSTART_ARGS: [&str; 2] = ["-movflags", "+faststart"];

/// Fully resolved transcoder arguments for one job (program name excluded)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandPlan {
    args: Vec<OsString>,
}

impl CommandPlan {
    fn push(&mut self, arg: impl AsRef<OsStr>) {
        self.args.push(arg.as_ref().to_os_string());
    }

    fn extend<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Arguments as lossy UTF-8 strings, for assertions and logging
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect()
    }

    /// Build a `Command` running `program` with these arguments
    pub fn to_command(&self, program: impl AsRef<OsStr>) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(&self.args);
        cmd
    }

    /// Shell-safe command line for display (dry runs, logs)
    pub fn display(&self, program: &str) -> String {
        let args = self.args_lossy();
        let words = std::iter::once(program).chain(args.iter().map(String::as_str));
        shlex::try_join(words).unwrap_or_else(|_| {
            // Arguments containing NUL cannot be quoted; fall back to plain joining
            let mut line = program.to_string();
            for arg in &args {
                let _ = write!(line, " {}", arg);
            }
            line
        })
    }
}

/// Build the transcoder arguments for one job
///
/// Argument order is significant and always:
/// input, decode flags, threads, preview limit, filters, frame rate,
/// video encoder and quality, audio encoder, faststart, overwrite + output.
pub fn build_command_plan(
    job: &JobSpec,
    encoder: EncoderProfile,
    threads: ThreadCount,
    output_path: &Path,
    preview_seconds: Option<u32>,
) -> Result<CommandPlan> {
    job.validate()?;

    let filters = plan_filters(job.speed);
    let mut plan = CommandPlan::default();

    // Input
    plan.push("-i");
    plan.push(&job.source);

    // Hardware decode
    plan.extend(encoder.decode_flags());

    if let ThreadCount::Fixed(n) = threads {
        plan.push("-threads");
        plan.push(n.to_string());
    }

    if let Some(seconds) = preview_seconds {
        if seconds == 0 {
            return Err(Error::InvalidSpec(
                "preview length must be at least one second".to_string(),
            ));
        }
        plan.push("-t");
        plan.push(seconds.to_string());
    }

    plan.push("-filter:v");
    plan.push(&filters.video);
    plan.push("-filter:a");
    plan.push(filters.audio_filter());

    if let FrameRate::Fps(fps) = job.frame_rate {
        plan.push("-r");
        plan.push(fps.to_string());
    }

    // Video encoder and quality
    plan.push("-c:v");
    plan.push(encoder.encoder_name());
    plan.extend(encoder.quality_args(job.quality));

    plan.extend(AUDIO_ARGS);
    plan.extend(FASTSTART_ARGS);

    plan.push("-y");
    plan.push(output_path);

    Ok(plan)
}
