//! Filesystem artifact store.
//!
//! Layout under the root directory:
//!
//! ```text
//! {root}/{run_id}/output_{i}.mp4
//! {root}/{run_id}/audio.mp3
//! {root}/{run_id}/video_plan.json
//! {root}/{run_id}/run.json
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use tourclip_models::{
    GeneratedAudio, GeneratedClip, RunId, RunRecord, VideoPlan, AUDIO_FILE_NAME, PLAN_FILE_NAME,
};

use crate::error::{StorageError, StorageResult};

/// Checkpoint file name inside a run directory.
pub const RUN_RECORD_FILE_NAME: &str = "run.json";

/// Persistence for generated media and run checkpoints.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Directory holding the artifacts of `run_id`.
    fn run_dir(&self, run_id: &RunId) -> StorageResult<PathBuf>;

    /// Persist one clip under its sequence index.
    async fn write_clip(&self, run_id: &RunId, clip: &GeneratedClip) -> StorageResult<PathBuf>;

    /// Persist the narration audio.
    async fn write_audio(&self, run_id: &RunId, audio: &GeneratedAudio) -> StorageResult<PathBuf>;

    /// Persist the video plan manifest.
    async fn write_plan(&self, run_id: &RunId, plan: &VideoPlan) -> StorageResult<PathBuf>;

    /// Save (overwrite) the checkpoint record of a run.
    async fn save_record(&self, record: &RunRecord) -> StorageResult<()>;

    /// Load the checkpoint record of a run, if one exists.
    async fn load_record(&self, run_id: &RunId) -> StorageResult<Option<RunRecord>>;
}

/// Artifact store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if needed and verify it accepts writes.
    pub async fn check_writable(&self) -> StorageResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        let check_file = self.root.join(".write_check");
        tokio::fs::write(&check_file, b"ok")
            .await
            .map_err(|e| StorageError::write_failed(&check_file, e))?;
        tokio::fs::remove_file(&check_file).await?;
        Ok(())
    }

    async fn write_file(&self, run_id: &RunId, name: &str, data: &[u8]) -> StorageResult<PathBuf> {
        let dir = self.run_dir(run_id)?;
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(name);
        write_atomic(&path, data).await?;
        debug!(run_id = %run_id, "Wrote {} ({} bytes)", path.display(), data.len());
        Ok(path)
    }
}

#[async_trait]
impl ArtifactStore for LocalStore {
    fn run_dir(&self, run_id: &RunId) -> StorageResult<PathBuf> {
        if !run_id.is_path_safe() {
            return Err(StorageError::invalid_run_id(run_id.as_str()));
        }
        Ok(self.root.join(run_id.as_str()))
    }

    async fn write_clip(&self, run_id: &RunId, clip: &GeneratedClip) -> StorageResult<PathBuf> {
        self.write_file(run_id, &clip.file_name(), &clip.data).await
    }

    async fn write_audio(&self, run_id: &RunId, audio: &GeneratedAudio) -> StorageResult<PathBuf> {
        self.write_file(run_id, AUDIO_FILE_NAME, &audio.data).await
    }

    async fn write_plan(&self, run_id: &RunId, plan: &VideoPlan) -> StorageResult<PathBuf> {
        let json = serde_json::to_vec_pretty(plan)?;
        self.write_file(run_id, PLAN_FILE_NAME, &json).await
    }

    async fn save_record(&self, record: &RunRecord) -> StorageResult<()> {
        let json = serde_json::to_vec_pretty(record)?;
        self.write_file(&record.run_id, RUN_RECORD_FILE_NAME, &json)
            .await?;
        info!(
            run_id = %record.run_id,
            stage = record.stage.as_str(),
            "Saved run checkpoint"
        );
        Ok(())
    }

    async fn load_record(&self, run_id: &RunId) -> StorageResult<Option<RunRecord>> {
        let path = self.run_dir(run_id)?.join(RUN_RECORD_FILE_NAME);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StorageError::CorruptRecord { path, source })
    }
}

/// Write to a sibling temp file, then rename over the target.
async fn write_atomic(path: &Path, data: &[u8]) -> StorageResult<()> {
    let tmp = path.with_extension("tmp");

    let mut file = tokio::fs::File::create(&tmp)
        .await
        .map_err(|e| StorageError::write_failed(&tmp, e))?;
    file.write_all(data)
        .await
        .map_err(|e| StorageError::write_failed(&tmp, e))?;
    file.sync_all()
        .await
        .map_err(|e| StorageError::write_failed(&tmp, e))?;
    drop(file);

    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| StorageError::write_failed(path, e))?;
    Ok(())
}
