//! Local artifact storage.
//!
//! This crate provides:
//! - The [`ArtifactStore`] trait used by the pipeline
//! - A filesystem implementation writing one directory per run
//! - Run checkpoint records (`run.json`) for resuming failed runs

pub mod error;
pub mod local;

pub use error::{StorageError, StorageResult};
pub use local::{ArtifactStore, LocalStore, RUN_RECORD_FILE_NAME};
