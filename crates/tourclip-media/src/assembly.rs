//! Concatenation of generated clips and narration muxing.
//!
//! The plan always yields the equivalent shell commands so an operator can
//! run the step by hand; [`AssemblyPlan::execute`] runs them directly.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::duration::media_duration;

/// Concatenated clips without audio.
pub const MERGED_FILE_NAME: &str = "merged_output.mp4";

/// Final video with narration.
pub const FINAL_FILE_NAME: &str = "final_output.mp4";

/// Seconds the last frame is held so the narration can finish.
const TAIL_PAD_SECONDS: u32 = 4;

const DURATION_PLACEHOLDER: &str = "__AUDIO_DURATION__";

/// Inputs and outputs of the assembly step for one run.
#[derive(Debug, Clone)]
pub struct AssemblyPlan {
    clips: Vec<PathBuf>,
    audio: PathBuf,
    merged: PathBuf,
    output: PathBuf,
}

impl AssemblyPlan {
    /// Plan assembly of `clips` (in sequence order) with `audio` inside `dir`.
    pub fn new(dir: impl AsRef<Path>, clips: Vec<PathBuf>, audio: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            clips,
            audio: audio.as_ref().to_path_buf(),
            merged: dir.join(MERGED_FILE_NAME),
            output: dir.join(FINAL_FILE_NAME),
        }
    }

    fn concat_filter(&self) -> String {
        let labels: String = (0..self.clips.len()).map(|i| format!("[{}:v]", i)).collect();
        format!("{}concat=n={}:v=1:a=0[outv]", labels, self.clips.len())
    }

    /// Command concatenating every clip's video stream.
    pub fn concat_command(&self) -> FfmpegCommand {
        FfmpegCommand::new(&self.merged)
            .inputs(&self.clips)
            .filter_complex(self.concat_filter())
            .map("[outv]")
    }

    fn mux_base(&self) -> FfmpegCommand {
        FfmpegCommand::new(&self.output)
            .input(&self.merged)
            .input(&self.audio)
            .filter_complex(format!(
                "[0:v]tpad=stop_mode=clone:stop_duration={}[v]",
                TAIL_PAD_SECONDS
            ))
            .map("[v]")
            .map("1:a")
    }

    /// Command laying the narration over the merged video, cut to the audio length.
    pub fn mux_command(&self, audio_duration: f64) -> FfmpegCommand {
        self.mux_base().duration(audio_duration)
    }

    /// Shell lines equivalent to [`execute`](Self::execute).
    pub fn shell_commands(&self) -> Vec<String> {
        let duration = format!(
            "export AUDIO_DURATION=$(ffprobe -v quiet -show_entries format=duration -of csv=p=0 '{}')",
            self.audio.to_string_lossy().replace('\'', r"'\''")
        );
        let mux = self
            .mux_base()
            .output_arg("-t")
            .output_arg(DURATION_PLACEHOLDER)
            .to_shell()
            .replace(DURATION_PLACEHOLDER, "\"$AUDIO_DURATION\"");

        vec![self.concat_command().to_shell(), duration, mux]
    }

    /// Run concat, read the narration length, then mux.
    pub async fn execute(&self, runner: &FfmpegRunner) -> MediaResult<PathBuf> {
        if self.clips.is_empty() {
            return Err(MediaError::EmptyInput("no clips to concatenate".to_string()));
        }
        for path in self.clips.iter().chain(std::iter::once(&self.audio)) {
            if !path.exists() {
                return Err(MediaError::FileNotFound(path.clone()));
            }
        }

        info!("Concatenating {} clips into {}", self.clips.len(), self.merged.display());
        runner.run(&self.concat_command()).await?;

        let audio_duration = media_duration(&self.audio).await?;
        info!(
            "Muxing narration ({:.1}s) into {}",
            audio_duration,
            self.output.display()
        );
        runner.run(&self.mux_command(audio_duration)).await?;

        Ok(self.output.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(n: usize) -> AssemblyPlan {
        let clips = (0..n).map(|i| PathBuf::from(format!("/w/output_{}.mp4", i))).collect();
        AssemblyPlan::new("/w", clips, "/w/audio.mp3")
    }

    #[test]
    fn test_concat_filter_lists_every_clip() {
        assert_eq!(
            plan(3).concat_filter(),
            "[0:v][1:v][2:v]concat=n=3:v=1:a=0[outv]"
        );
    }

    #[test]
    fn test_mux_command_args() {
        let args = plan(2).mux_command(41.25).build_args();
        assert!(args.contains(&"[0:v]tpad=stop_mode=clone:stop_duration=4[v]".to_string()));
        assert!(args.contains(&"1:a".to_string()));
        assert!(args.contains(&"41.250".to_string()));
        assert_eq!(args.last().unwrap(), "/w/final_output.mp4");
    }

    #[test]
    fn test_shell_commands() {
        let lines = plan(2).shell_commands();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("-i /w/output_0.mp4 -i /w/output_1.mp4"));
        assert!(lines[0].ends_with("/w/merged_output.mp4"));
        assert!(lines[1].contains("ffprobe"));
        assert!(lines[2].contains("-t \"$AUDIO_DURATION\""));
    }

    #[tokio::test]
    async fn test_execute_rejects_empty_and_missing() {
        let runner = FfmpegRunner::new();
        let empty = AssemblyPlan::new("/w", vec![], "/w/audio.mp3");
        assert!(matches!(
            empty.execute(&runner).await,
            Err(MediaError::EmptyInput(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        let missing = AssemblyPlan::new(
            dir.path(),
            vec![dir.path().join("output_0.mp4")],
            dir.path().join("audio.mp3"),
        );
        assert!(matches!(
            missing.execute(&runner).await,
            Err(MediaError::FileNotFound(_))
        ));
    }
}
