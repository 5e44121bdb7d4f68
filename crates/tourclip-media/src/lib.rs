//! FFmpeg CLI wrapper for the assembly step.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multiple inputs
//! - A runner with optional timeout
//! - Audio duration lookup via FFprobe
//! - The concat + narration mux plan for a run's clips

pub mod assembly;
pub mod command;
pub mod error;
pub mod duration;

pub use assembly::{AssemblyPlan, MERGED_FILE_NAME, FINAL_FILE_NAME};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use duration::media_duration;
