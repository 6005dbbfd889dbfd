use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::{Config, TranscriptionEngine};
use crate::input::PostRecord;
use crate::media::{
    is_supported_url, AudioExtractor, FfmpegAudioExtractor, VideoDownloader, YtDlpDownloader,
};
use crate::utils::ScratchDir;
use crate::{ReelscribeError, Result};

pub mod openai;
pub mod whisper;

pub use openai::OpenAiTranscriber;
pub use whisper::WhisperCliTranscriber;

/// Turns an audio file into text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe `audio`. `work_dir` is a scratch directory the engine may
    /// write intermediate files into.
    async fn transcribe(&self, audio: &Path, work_dir: &Path) -> Result<String>;

    /// Short engine name for logs
    fn engine_name(&self) -> &'static str;
}

/// One successfully transcribed post, waiting to be put into a report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    /// 1-based position of the post in the selection
    pub post_number: usize,

    /// Source URL
    pub url: String,

    /// Transcribed text (may be empty)
    pub transcription: String,

    /// The post as it came out of normalization
    pub record: PostRecord,

    /// Name of the individual transcript file in the output directory,
    /// removed once the report is written
    pub artifact_file: Option<String>,
}

/// Download, extract and transcribe, one post at a time.
///
/// Every post runs inside its own scratch directory below a per-run root;
/// both are removed on every exit path.
pub struct TranscriptionPipeline {
    downloader: Box<dyn VideoDownloader>,
    extractor: Box<dyn AudioExtractor>,
    transcriber: Box<dyn Transcriber>,
    scratch_root: ScratchDir,
}

impl TranscriptionPipeline {
    /// Create a pipeline from configuration
    pub fn new(config: &Config) -> Result<Self> {
        let transcriber: Box<dyn Transcriber> = match config.transcription.engine {
            TranscriptionEngine::WhisperCli => {
                Box::new(WhisperCliTranscriber::new(&config.transcription))
            }
            TranscriptionEngine::OpenAi => Box::new(OpenAiTranscriber::new(&config.transcription)?),
        };

        Self::with_stages(
            Box::new(YtDlpDownloader::new(&config.downloader)),
            Box::new(FfmpegAudioExtractor::new(&config.audio)),
            transcriber,
            config.app.temp_dir.as_deref(),
        )
    }

    /// Create a pipeline from explicit stages
    pub fn with_stages(
        downloader: Box<dyn VideoDownloader>,
        extractor: Box<dyn AudioExtractor>,
        transcriber: Box<dyn Transcriber>,
        temp_root: Option<&Path>,
    ) -> Result<Self> {
        let scratch_root = ScratchDir::new(temp_root, "reelscribe-")?;

        Ok(Self {
            downloader,
            extractor,
            transcriber,
            scratch_root,
        })
    }

    /// Directory holding per-post scratch directories for this run
    pub fn scratch_root(&self) -> &Path {
        self.scratch_root.path()
    }

    /// Run one post URL through the media pipeline and return its text
    pub async fn transcribe_url(&self, url: &str) -> Result<String> {
        if !is_supported_url(url) {
            anyhow::bail!(ReelscribeError::UnsupportedUrl(url.to_string()));
        }

        let scratch = ScratchDir::new(Some(self.scratch_root.path()), "post-")?;

        let media = match self.downloader.download(url, scratch.path()).await {
            Ok(media) => media,
            Err(e) => {
                tracing::warn!("Error downloading video: {:#}", e);
                self.downloader.diagnose(url).await;
                return Err(e);
            }
        };

        let audio = self.extractor.extract_audio(&media, scratch.path()).await?;

        tracing::debug!(
            "Transcribing {} with {}",
            audio.display(),
            self.transcriber.engine_name()
        );
        let text = self.transcriber.transcribe(&audio, scratch.path()).await?;

        if text.is_empty() {
            tracing::warn!("Transcription for {} is empty", url);
        }

        Ok(text)
    }

    /// Remove the run's scratch root now
    pub fn close(self) {
        self.scratch_root.close();
    }
}
