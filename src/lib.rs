//! Batch video speed-up engine driving an external FFmpeg binary

pub mod config;
pub mod engine;
