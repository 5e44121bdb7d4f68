//! Generated media payloads.

/// Video clip returned by the synthesis service for one scene.
#[derive(Clone, PartialEq, Eq)]
pub struct GeneratedClip {
    /// 0-based position in the final sequence
    pub index: usize,
    pub data: Vec<u8>,
}

impl GeneratedClip {
    pub fn new(index: usize, data: Vec<u8>) -> Self {
        Self { index, data }
    }

    /// Artifact file name for this clip.
    pub fn file_name(&self) -> String {
        clip_file_name(self.index)
    }
}

impl std::fmt::Debug for GeneratedClip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedClip")
            .field("index", &self.index)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Narration audio returned by the text-to-speech service.
#[derive(Clone, PartialEq, Eq)]
pub struct GeneratedAudio {
    pub data: Vec<u8>,
}

impl GeneratedAudio {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl std::fmt::Debug for GeneratedAudio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedAudio")
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// File name used for the clip at `index`.
pub fn clip_file_name(index: usize) -> String {
    format!("output_{}.mp4", index)
}

/// File name used for the narration audio.
pub const AUDIO_FILE_NAME: &str = "audio.mp3";

/// File name used for the exported video plan.
pub const PLAN_FILE_NAME: &str = "video_plan.json";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_file_name() {
        let clip = GeneratedClip::new(7, vec![1, 2, 3]);
        assert_eq!(clip.file_name(), "output_7.mp4");
        assert_eq!(format!("{:?}", clip), "GeneratedClip { index: 7, bytes: 3 }");
    }
}
