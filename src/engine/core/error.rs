use std::path::PathBuf;
use thiserror::Error;

use crate::engine::hardware::EncoderProfile;

/// Errors raised by the speed-up engine
#[derive(Error, Debug)]
pub enum Error {
    /// The transcoder could not be run to list its encoders
    #[error("Transcoder '{program}' unavailable: {message}")]
    ProbeUnavailable { program: String, message: String },

    /// A job carries a speed, quality, frame rate or thread count that cannot be encoded
    #[error("Invalid job settings: {0}")]
    InvalidSpec(String),

    /// The transcoder failed to start or exited with a non-zero status
    #[error("Failed to process {file}: {message}")]
    ProcessFailure { file: String, message: String },

    #[error("No videos queued")]
    EmptyQueue,

    #[error("No output folder selected")]
    MissingOutputDir,

    #[error("A batch is already running")]
    BatchRunning,

    #[error("Job index {index} out of range (queue has {len} jobs)")]
    JobIndexOutOfRange { index: usize, len: usize },

    #[error("Encoder '{0}' was not detected on this system")]
    UnavailableEncoder(EncoderProfile),

    #[error("Could not create output folder {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Batch worker thread panicked")]
    WorkerPanicked,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
