use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::Transcriber;
use crate::config::TranscriptionConfig;
use crate::{ReelscribeError, Result};

/// Speech-to-text using the local `whisper` command line tool
pub struct WhisperCliTranscriber {
    whisper_path: String,
    model: String,
    language: Option<String>,
}

impl WhisperCliTranscriber {
    pub fn new(config: &TranscriptionConfig) -> Self {
        Self {
            whisper_path: config.whisper_path.clone(),
            model: config.model.clone(),
            language: config.language.clone(),
        }
    }

    fn build_args(&self, audio: &Path, work_dir: &Path) -> Vec<String> {
        let mut args = vec![
            audio.to_string_lossy().into_owned(),
            "--model".to_string(),
            self.model.clone(),
            "--output_format".to_string(),
            "txt".to_string(),
            "--output_dir".to_string(),
            work_dir.to_string_lossy().into_owned(),
            "--verbose".to_string(),
            "False".to_string(),
            "--fp16".to_string(),
            "False".to_string(),
        ];

        if let Some(lang) = &self.language {
            args.push("--language".to_string());
            args.push(lang.clone());
        }

        args
    }
}

#[async_trait]
impl Transcriber for WhisperCliTranscriber {
    async fn transcribe(&self, audio: &Path, work_dir: &Path) -> Result<String> {
        tracing::info!("Transcribing audio with whisper ({})...", self.model);

        let output = Command::new(&self.whisper_path)
            .args(self.build_args(audio, work_dir))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(ReelscribeError::TranscriptionFailed(error.trim().to_string()));
        }

        let stem = audio
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("audio");
        let transcript_path = work_dir.join(format!("{}.txt", stem));

        let text = fs_err::read_to_string(&transcript_path).map_err(|e| {
            ReelscribeError::TranscriptionFailed(format!("whisper produced no transcript: {}", e))
        })?;

        tracing::info!("Transcription completed");
        Ok(text.trim().to_string())
    }

    fn engine_name(&self) -> &'static str {
        "whisper"
    }
}
