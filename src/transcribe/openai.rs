use anyhow::Context;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;

use super::Transcriber;
use crate::config::TranscriptionConfig;
use crate::{ReelscribeError, Result};

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Speech-to-text through an OpenAI-compatible HTTP endpoint
pub struct OpenAiTranscriber {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    language: Option<String>,
}

impl OpenAiTranscriber {
    /// Build from config, reading the API key from the configured
    /// environment variable
    pub fn new(config: &TranscriptionConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .with_context(|| format!("{} is not set", config.api_key_env))?;
        Ok(Self::with_api_key(config, api_key))
    }

    pub fn with_api_key(config: &TranscriptionConfig, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/audio/transcriptions", config.api_base.trim_end_matches('/')),
            api_key,
            model: config.api_model.clone(),
            language: config.language.clone(),
        }
    }
}

#[async_trait]
impl Transcriber for OpenAiTranscriber {
    async fn transcribe(&self, audio: &Path, _work_dir: &Path) -> Result<String> {
        tracing::info!("Uploading audio to {}", self.endpoint);

        let bytes = tokio::fs::read(audio)
            .await
            .with_context(|| format!("Failed to read {}", audio.display()))?;
        let file_name = audio
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        let mut form = Form::new()
            .text("model", self.model.clone())
            .text("response_format", "json")
            .part("file", Part::bytes(bytes).file_name(file_name));
        if let Some(lang) = &self.language {
            form = form.text("language", lang.clone());
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .context("Transcription request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(ReelscribeError::TranscriptionFailed(format!(
                "HTTP {}: {}",
                status,
                body.trim()
            )));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .context("Failed to parse transcription response")?;

        tracing::info!("Transcription completed");
        Ok(parsed.text.trim().to_string())
    }

    fn engine_name(&self) -> &'static str {
        "openai"
    }
}
