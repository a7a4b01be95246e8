//! Caller-facing queue and batch control

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info};

use super::core::{
    DEFAULT_TRANSCODER, Error, JobSettings, JobSpec, Result, ThreadCount, build_command_plan,
    preview_path_for, scan,
};
use super::hardware::{self, EncoderProfile, HardwareProfile};
use super::runner::{
    BatchHandle, BatchRunner, FfmpegTranscoder, RunState, RunningGuard, Transcoder,
};

/// Default length of a preview clip, in seconds
pub const DEFAULT_PREVIEW_SECONDS: u32 = 10;

/// Job queue, detected hardware and the running flag shared with batches
#[derive(Debug)]
pub struct Session {
    program: String,
    hardware: HardwareProfile,
    jobs: Vec<JobSpec>,
    running: Arc<AtomicBool>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSCODER)
    }
}

impl Session {
    /// Empty session; hardware stays software-only until probed
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            hardware: HardwareProfile::software_only(),
            jobs: Vec::new(),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Use an already known hardware profile instead of probing
    pub fn with_hardware(mut self, hardware: HardwareProfile) -> Self {
        self.hardware = hardware;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Query the transcoder for hardware encoders and remember the result
    pub fn probe_hardware(&mut self) -> &HardwareProfile {
        self.hardware = hardware::probe_hardware(&self.program);
        &self.hardware
    }

    pub fn hardware(&self) -> &HardwareProfile {
        &self.hardware
    }

    pub fn jobs(&self) -> &[JobSpec] {
        &self.jobs
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// `Running` while a batch thread holds the flag, `Idle` otherwise.
    /// How the last batch ended comes from `BatchOutcome::state`.
    pub fn run_state(&self) -> RunState {
        if self.is_running() {
            RunState::Running
        } else {
            RunState::Idle
        }
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.is_running() {
            return Err(Error::BatchRunning);
        }
        Ok(())
    }

    /// Queue a job; returns false if its source is already queued
    pub fn add_job(&mut self, spec: JobSpec) -> Result<bool> {
        self.ensure_idle()?;

        if self.jobs.iter().any(|job| job.source == spec.source) {
            debug!("Skipping duplicate {}", spec.source.display());
            return Ok(false);
        }
        self.jobs.push(spec);
        Ok(true)
    }

    /// Queue every video under `dir` with the given settings
    ///
    /// Returns how many new jobs were added.
    pub fn add_folder(&mut self, dir: &Path, settings: &JobSettings) -> Result<usize> {
        self.ensure_idle()?;

        let mut added = 0;
        for path in scan(dir) {
            if self.add_job(settings.job_for(path))? {
                added += 1;
            }
        }
        info!("Added {} video(s) from {}", added, dir.display());
        Ok(added)
    }

    pub fn update_job(&mut self, index: usize, spec: JobSpec) -> Result<()> {
        self.ensure_idle()?;

        let len = self.jobs.len();
        let slot = self
            .jobs
            .get_mut(index)
            .ok_or(Error::JobIndexOutOfRange { index, len })?;
        *slot = spec;
        Ok(())
    }

    pub fn remove_all_jobs(&mut self) -> Result<()> {
        self.ensure_idle()?;
        self.jobs.clear();
        Ok(())
    }

    /// Overwrite speed, frame rate and quality on every queued job
    pub fn apply_to_all(&mut self, settings: &JobSettings) -> Result<()> {
        self.ensure_idle()?;
        for job in &mut self.jobs {
            job.apply(settings);
        }
        Ok(())
    }

    /// Start the queue on a background thread using the configured transcoder
    pub fn start_batch(
        &self,
        output_dir: impl Into<PathBuf>,
        encoder: EncoderProfile,
        threads: ThreadCount,
    ) -> Result<BatchHandle> {
        let transcoder = FfmpegTranscoder::new(self.program.clone());
        self.start_batch_with(output_dir, encoder, threads, transcoder)
    }

    /// Start the queue with an explicit transcoder
    ///
    /// The queue is snapshotted; edits are rejected until the batch thread
    /// finishes and releases the running flag.
    pub fn start_batch_with<T>(
        &self,
        output_dir: impl Into<PathBuf>,
        encoder: EncoderProfile,
        threads: ThreadCount,
        transcoder: T,
    ) -> Result<BatchHandle>
    where
        T: Transcoder + Send + 'static,
    {
        let hardware = self.hardware.select(encoder)?;
        let guard = RunningGuard::acquire(&self.running)?;

        BatchRunner::new(output_dir, hardware.selected, threads, transcoder)
            .with_running_guard(guard)
            .spawn(self.jobs.clone())
    }

    /// Ask a running batch to stop before its next job
    pub fn cancel(&self, handle: &BatchHandle) {
        info!("Cancellation requested");
        handle.cancel();
    }

    /// Render the first `seconds` of one queued job into `preview_dir`
    ///
    /// Runs on its own thread and is not tracked by the session; the handle
    /// yields the preview path once the transcoder exits.
    pub fn preview(
        &self,
        index: usize,
        encoder: EncoderProfile,
        threads: ThreadCount,
        seconds: u32,
        preview_dir: &Path,
    ) -> Result<JoinHandle<Result<PathBuf>>> {
        let transcoder = FfmpegTranscoder::new(self.program.clone());
        self.preview_with(index, encoder, threads, seconds, preview_dir, transcoder)
    }

    pub fn preview_with<T>(
        &self,
        index: usize,
        encoder: EncoderProfile,
        threads: ThreadCount,
        seconds: u32,
        preview_dir: &Path,
        transcoder: T,
    ) -> Result<JoinHandle<Result<PathBuf>>>
    where
        T: Transcoder + Send + 'static,
    {
        let job = self
            .jobs
            .get(index)
            .cloned()
            .ok_or(Error::JobIndexOutOfRange {
                index,
                len: self.jobs.len(),
            })?;
        let encoder = self.hardware.select(encoder)?.selected;

        fs::create_dir_all(preview_dir).map_err(|source| Error::OutputDir {
            path: preview_dir.to_path_buf(),
            source,
        })?;

        let output = preview_path_for(&job.source, preview_dir);
        let plan = build_command_plan(&job, encoder, threads, &output, Some(seconds))?;
        info!("Rendering {}s preview of {}", seconds, job.display_name());

        Ok(thread::spawn(move || {
            transcoder.transcode(&plan, &job)?;
            Ok(output)
        }))
    }
}
