// Speed-up engine - independent of the command line

pub mod core;
pub mod hardware;
pub mod runner;
pub mod session;

pub use core::*;
pub use hardware::{EncoderProfile, HardwareProfile, probe_hardware};
pub use runner::{
    BatchEvent, BatchHandle, BatchOutcome, BatchRunner, BatchStatus, CancelToken,
    FfmpegTranscoder, JobFailure, RunState, Transcoder,
};
pub use session::{DEFAULT_PREVIEW_SECONDS, Session};
