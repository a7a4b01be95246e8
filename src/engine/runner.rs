// Sequential batch runner for speed-up jobs

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

use super::core::{
    CommandPlan, DEFAULT_TRANSCODER, Error, JobSpec, Result, ThreadCount, build_command_plan,
    output_path_for,
};
use super::hardware::EncoderProfile;

/// Message from the batch thread to the caller
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    /// A job is about to start
    Progress {
        index: usize,
        total: usize,
        percent: f64,
        message: String,
    },

    /// Job finished and wrote its output
    JobCompleted { index: usize, output: PathBuf },

    /// Job failed; the batch moves on to the next one
    JobFailed {
        index: usize,
        file: String,
        message: String,
    },

    /// Batch reached a terminal state
    Finished {
        status: BatchStatus,
        attempted: usize,
        total: usize,
        percent: f64,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Completed,
    Cancelled,
}

/// Lifecycle of a batch as seen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
    /// Ran to the end, but at least one job failed
    FailedPartial,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub index: usize,
    pub file: String,
    pub message: String,
}

/// Result of a batch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub status: BatchStatus,
    /// Jobs started, including the ones that failed
    pub attempted: usize,
    pub total: usize,
    pub failures: Vec<JobFailure>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failures.len()
    }

    pub fn state(&self) -> RunState {
        match self.status {
            BatchStatus::Cancelled => RunState::Cancelled,
            BatchStatus::Completed if self.failures.is_empty() => RunState::Completed,
            BatchStatus::Completed => RunState::FailedPartial,
        }
    }
}

/// Cooperative cancellation flag shared between caller and batch thread
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop; observed before the next job starts
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Marks a batch as running until dropped
#[derive(Debug)]
pub struct RunningGuard(Arc<AtomicBool>);

impl RunningGuard {
    /// Claim the flag, failing if another batch already holds it
    pub fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        if flag.swap(true, Ordering::SeqCst) {
            return Err(Error::BatchRunning);
        }
        Ok(Self(Arc::clone(flag)))
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

// ============================================================================
// Transcoder
// ============================================================================

/// Executes one command plan to completion
pub trait Transcoder {
    fn transcode(&self, plan: &CommandPlan, job: &JobSpec) -> Result<()>;
}

impl<F> Transcoder for F
where
    F: Fn(&CommandPlan, &JobSpec) -> Result<()>,
{
    fn transcode(&self, plan: &CommandPlan, job: &JobSpec) -> Result<()> {
        self(plan, job)
    }
}

/// Runs the external FFmpeg binary
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: String,
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSCODER)
    }
}

impl FfmpegTranscoder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

/// Start the child in its own process group
///
/// Ctrl-C in a terminal signals the whole foreground group; the transcode in
/// flight must finish while the batch stops before the next job.
fn detach_from_terminal_signals(cmd: &mut Command) {
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }
}

impl Transcoder for FfmpegTranscoder {
    fn transcode(&self, plan: &CommandPlan, job: &JobSpec) -> Result<()> {
        debug!("Running: {}", plan.display(&self.program));

        let mut cmd = plan.to_command(&self.program);
        detach_from_terminal_signals(&mut cmd);

        // output() waits for exit and closes every pipe, on success or failure
        let output = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Error::ProcessFailure {
                file: job.display_name(),
                message: format!("could not start {}: {}", self.program, e),
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let last_line = stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty());

        let message = match last_line {
            Some(line) => format!("{} exited with {}: {}", self.program, output.status, line),
            None => format!("{} exited with {}", self.program, output.status),
        };

        Err(Error::ProcessFailure {
            file: job.display_name(),
            message,
        })
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Reject an empty queue or missing output folder, then create the folder
pub fn prepare_batch(jobs: &[JobSpec], output_dir: &Path) -> Result<()> {
    if jobs.is_empty() {
        return Err(Error::EmptyQueue);
    }
    if output_dir.as_os_str().is_empty() {
        return Err(Error::MissingOutputDir);
    }

    fs::create_dir_all(output_dir).map_err(|source| Error::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })
}

/// Runs a job queue one job at a time
pub struct BatchRunner<T = FfmpegTranscoder> {
    output_dir: PathBuf,
    encoder: EncoderProfile,
    threads: ThreadCount,
    transcoder: T,
    cancel: CancelToken,
    // Released when the runner is dropped at the end of the batch thread
    _running: Option<RunningGuard>,
}

impl<T: Transcoder> BatchRunner<T> {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        encoder: EncoderProfile,
        threads: ThreadCount,
        transcoder: T,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            encoder,
            threads,
            transcoder,
            cancel: CancelToken::new(),
            _running: None,
        }
    }

    /// Use an externally owned cancellation token
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Hold a running flag for as long as this runner lives
    pub fn with_running_guard(mut self, guard: RunningGuard) -> Self {
        self._running = Some(guard);
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn run_job(&self, job: &JobSpec) -> Result<PathBuf> {
        // Named at start time so files written by earlier jobs are avoided
        let output = output_path_for(&job.source, job.speed, &self.output_dir);
        let plan = build_command_plan(job, self.encoder, self.threads, &output, None)?;
        self.transcoder.transcode(&plan, job)?;
        Ok(output)
    }

    /// Process every job in order, reporting through `on_event`
    ///
    /// Per-job failures are reported and recorded, never fatal. The cancel
    /// token is checked before each job; a running transcode is not
    /// interrupted.
    pub fn run<F>(&self, jobs: &[JobSpec], mut on_event: F) -> Result<BatchOutcome>
    where
        F: FnMut(BatchEvent),
    {
        prepare_batch(jobs, &self.output_dir)?;

        let total = jobs.len();
        let mut attempted = 0;
        let mut failures = Vec::new();

        info!(
            "Starting batch of {} job(s) with {} into {}",
            total,
            self.encoder,
            self.output_dir.display()
        );

        for (index, job) in jobs.iter().enumerate() {
            if self.cancel.is_cancelled() {
                warn!("Batch cancelled after {} of {} job(s)", attempted, total);
                on_event(BatchEvent::Finished {
                    status: BatchStatus::Cancelled,
                    attempted,
                    total,
                    percent: 0.0,
                    message: "Processing stopped by user".to_string(),
                });
                return Ok(BatchOutcome {
                    status: BatchStatus::Cancelled,
                    attempted,
                    total,
                    failures,
                });
            }

            let file = job.display_name();
            on_event(BatchEvent::Progress {
                index,
                total,
                percent: index as f64 / total as f64 * 100.0,
                message: format!("Processing {} ({}/{})", file, index + 1, total),
            });
            attempted += 1;

            match self.run_job(job) {
                Ok(output) => {
                    info!("Finished {} -> {}", file, output.display());
                    on_event(BatchEvent::JobCompleted { index, output });
                }
                Err(e) => {
                    warn!("Job {} ({}) failed: {}", index + 1, file, e);
                    let message = e.to_string();
                    on_event(BatchEvent::JobFailed {
                        index,
                        file: file.clone(),
                        message: message.clone(),
                    });
                    failures.push(JobFailure {
                        index,
                        file,
                        message,
                    });
                }
            }
        }

        info!(
            "Batch complete: {} attempted, {} failed",
            attempted,
            failures.len()
        );
        on_event(BatchEvent::Finished {
            status: BatchStatus::Completed,
            attempted,
            total,
            percent: 100.0,
            message: "Processing complete!".to_string(),
        });

        Ok(BatchOutcome {
            status: BatchStatus::Completed,
            attempted,
            total,
            failures,
        })
    }
}

impl<T: Transcoder + Send + 'static> BatchRunner<T> {
    /// Run the batch on a background thread
    ///
    /// Queue and output folder are validated before the thread starts, so
    /// those errors are returned here rather than through the handle.
    pub fn spawn(self, jobs: Vec<JobSpec>) -> Result<BatchHandle> {
        prepare_batch(&jobs, &self.output_dir)?;

        let (tx, rx) = mpsc::channel();
        let cancel = self.cancel_token();

        let thread = thread::spawn(move || {
            self.run(&jobs, |event| {
                // Caller may have dropped the receiver; keep going regardless
                let _ = tx.send(event);
            })
        });

        Ok(BatchHandle {
            cancel,
            events: rx,
            thread,
        })
    }
}

/// Caller's view of a batch running in the background
pub struct BatchHandle {
    cancel: CancelToken,
    events: Receiver<BatchEvent>,
    thread: JoinHandle<Result<BatchOutcome>>,
}

impl BatchHandle {
    /// Stop before the next job starts
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Receiver for progress and failure events
    pub fn events(&self) -> &Receiver<BatchEvent> {
        &self.events
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the batch thread and return its outcome
    pub fn wait(self) -> Result<BatchOutcome> {
        self.thread.join().map_err(|_| Error::WorkerPanicked)?
    }
}
