//! Media synthesis clients.
//!
//! This crate provides:
//! - [`VideoSynthClient`]: prediction-style image-to-video synthesis
//! - [`SpeechSynthClient`]: text-to-speech synthesis

pub mod error;
pub mod speech;
pub mod video;

pub use error::{SynthError, SynthResult};
pub use speech::{SpeechRequest, SpeechSynthClient, SpeechSynthConfig};
pub use video::{Prediction, PredictionStatus, VideoRequest, VideoSynthClient, VideoSynthConfig};
