use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use super::{has_extension, AudioExtractor, AUDIO_EXTENSIONS};
use crate::config::AudioConfig;
use crate::{ReelscribeError, Result};

/// Audio extractor backed by ffprobe and ffmpeg
pub struct FfmpegAudioExtractor {
    ffmpeg_path: String,
    ffprobe_path: String,
    sample_rate: u32,
}

impl FfmpegAudioExtractor {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            ffprobe_path: config.ffprobe_path.clone(),
            sample_rate: config.sample_rate,
        }
    }

    /// Check that the file carries at least one audio stream
    async fn ensure_audio_stream(&self, path: &Path) -> Result<()> {
        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_streams",
                &path.to_string_lossy(),
            ])
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(ReelscribeError::AudioExtractionFailed(format!(
                "ffprobe could not analyze {}: {}",
                path.display(),
                error.trim()
            )));
        }

        let info: serde_json::Value = serde_json::from_slice(&output.stdout)?;
        if !has_audio_stream(&info) {
            anyhow::bail!(ReelscribeError::NoAudioTrack(path.display().to_string()));
        }

        Ok(())
    }

    /// Convert to mono PCM WAV using ffmpeg
    async fn convert_to_wav(&self, source_path: &Path, target_path: &Path) -> Result<()> {
        tracing::debug!("Converting {} to WAV", source_path.display());

        let sample_rate = self.sample_rate.to_string();
        let output = Command::new(&self.ffmpeg_path)
            .args([
                "-i",
                &source_path.to_string_lossy(),
                "-vn",
                "-acodec",
                "pcm_s16le",
                "-ar",
                &sample_rate,
                "-ac",
                "1",
                "-y",
                &target_path.to_string_lossy(),
            ])
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(ReelscribeError::AudioExtractionFailed(error.trim().to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl AudioExtractor for FfmpegAudioExtractor {
    async fn extract_audio(&self, media: &Path, dest_dir: &Path) -> Result<PathBuf> {
        if has_extension(media, AUDIO_EXTENSIONS) {
            tracing::info!("File is already audio format, using directly");
            return Ok(media.to_path_buf());
        }

        tracing::info!("Extracting audio...");
        self.ensure_audio_stream(media).await?;

        let target = wav_target(media, dest_dir);
        self.convert_to_wav(media, &target).await?;

        tracing::info!("Audio extracted successfully");
        Ok(target)
    }
}

/// Where the WAV for a media file goes
fn wav_target(media: &Path, dest_dir: &Path) -> PathBuf {
    let stem = media
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");
    dest_dir.join(format!("{}.wav", stem))
}

fn has_audio_stream(probe: &serde_json::Value) -> bool {
    probe["streams"]
        .as_array()
        .map(|streams| {
            streams
                .iter()
                .any(|stream| stream["codec_type"].as_str() == Some("audio"))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_has_audio_stream() {
        let with_audio = json!({"streams": [{"codec_type": "video"}, {"codec_type": "audio"}]});
        let video_only = json!({"streams": [{"codec_type": "video"}]});

        assert!(has_audio_stream(&with_audio));
        assert!(!has_audio_stream(&video_only));
        assert!(!has_audio_stream(&json!({})));
    }

    #[test]
    fn test_wav_target() {
        assert_eq!(
            wav_target(Path::new("/tmp/post-1/ABC.mp4"), Path::new("/tmp/post-1")),
            PathBuf::from("/tmp/post-1/ABC.wav")
        );
    }

    #[tokio::test]
    async fn test_audio_files_are_passed_through() {
        let dir = TempDir::new().unwrap();
        let media = dir.path().join("clip.m4a");
        fs_err::write(&media, b"audio").unwrap();

        let extractor = FfmpegAudioExtractor::new(&AudioConfig {
            ffmpeg_path: "reelscribe-no-such-ffmpeg".to_string(),
            ffprobe_path: "reelscribe-no-such-ffprobe".to_string(),
            ..Default::default()
        });

        let audio = extractor.extract_audio(&media, dir.path()).await.unwrap();
        assert_eq!(audio, media);
    }

    #[tokio::test]
    async fn test_missing_ffprobe_is_an_error() {
        let dir = TempDir::new().unwrap();
        let media = dir.path().join("clip.mp4");
        fs_err::write(&media, b"video").unwrap();

        let extractor = FfmpegAudioExtractor::new(&AudioConfig {
            ffprobe_path: "reelscribe-no-such-ffprobe".to_string(),
            ..Default::default()
        });

        assert!(extractor.extract_audio(&media, dir.path()).await.is_err());
    }
}
