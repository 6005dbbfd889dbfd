//! Structured request entry point.
//!
//! A request carries the posts inline instead of pointing at a file. It is
//! written out as a temporary CSV in the canonical export layout and run
//! through the regular batch flow.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::Instrument;

use crate::batch::{ProfileTranscriber, RunOptions};
use crate::input::CountField;
use crate::output::safe_profile;
use crate::selection::SelectionOptions;
use crate::{ReelscribeError, Result};

/// Header row of the materialized CSV
const CSV_HEADER: [&str; 5] = ["Profile", "Reel", "Views", "Likes", "Comments"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestPost {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptionRequest {
    #[serde(default = "default_profile_name")]
    pub profile_name: String,

    #[serde(default)]
    pub posts: Vec<RequestPost>,

    #[serde(default = "default_top_count")]
    pub top_count: usize,

    #[serde(default)]
    pub sort_by: CountField,

    #[serde(default)]
    pub quick_transcribe: bool,
}

/// Requests may arrive bare or wrapped in `{"input": ...}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RequestEnvelope {
    Wrapped { input: TranscriptionRequest },
    Bare(TranscriptionRequest),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TranscriptionResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TranscriptionResponse {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

fn default_profile_name() -> String {
    "unknown".to_string()
}

fn default_top_count() -> usize {
    5
}

impl TranscriptionRequest {
    /// Parse a request body, accepting the `{"input": ...}` wrapper
    pub fn from_json(body: &str) -> Result<Self> {
        let envelope: RequestEnvelope = serde_json::from_str(body)
            .map_err(|e| ReelscribeError::InvalidRequest(e.to_string()))?;
        Ok(match envelope {
            RequestEnvelope::Wrapped { input } => input,
            RequestEnvelope::Bare(request) => request,
        })
    }

    /// Write the posts as a temporary CSV that is deleted when dropped
    pub fn materialize(&self, dir: Option<&Path>) -> Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("request-").suffix(".csv");
        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .context("Failed to create temporary CSV")?;

        {
            let mut writer = csv::Writer::from_writer(file.as_file_mut());
            writer.write_record(CSV_HEADER)?;
            for post in &self.posts {
                writer.write_record([
                    self.profile_name.clone(),
                    post.url.clone(),
                    post.views.to_string(),
                    post.likes.to_string(),
                    post.comments.to_string(),
                ])?;
            }
            writer.flush()?;
        }
        file.as_file_mut().flush()?;

        tracing::debug!("Materialized request as {}", file.path().display());
        Ok(file)
    }
}

/// Run a request against an already-built transcriber
pub async fn run_request(
    request: &TranscriptionRequest,
    transcriber: &ProfileTranscriber,
) -> Result<TranscriptionResponse> {
    if request.posts.is_empty() {
        anyhow::bail!(ReelscribeError::InvalidRequest("No posts provided".to_string()));
    }

    let csv_file = request.materialize(None)?;
    let options = RunOptions {
        csv_file: csv_file.path().to_path_buf(),
        selection: SelectionOptions {
            top_count: request.top_count,
            sort_by: request.sort_by,
            filter_pinned: false,
        },
        profile_name: Some(request.profile_name.clone()),
        quick: request.quick_transcribe,
    };

    let result = transcriber.process_csv_file(&options).await?;

    if let Err(e) = csv_file.close() {
        tracing::warn!("Could not remove temporary CSV: {}", e);
    }

    let response = match result {
        Some(path) => {
            let output_text = fs_err::read_to_string(&path)?;
            TranscriptionResponse {
                success: true,
                filename: path.file_name().and_then(|n| n.to_str()).map(str::to_string),
                output_file: Some(path.display().to_string()),
                output_text: Some(output_text),
                profile_name: Some(request.profile_name.clone()),
                message: Some("Transcription completed successfully".to_string()),
                error: None,
            }
        }
        None => TranscriptionResponse {
            success: true,
            filename: Some(format!(
                "{}_transcription.txt",
                safe_profile(&request.profile_name)
            )),
            profile_name: Some(request.profile_name.clone()),
            message: Some("No transcriptions were created".to_string()),
            ..Default::default()
        },
    };

    Ok(response)
}

/// Handle a request end to end; failures come back as an error response
/// instead of an `Err`
pub async fn handle_request(
    request: &TranscriptionRequest,
    build: impl FnOnce() -> Result<ProfileTranscriber>,
) -> TranscriptionResponse {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("request", id = %request_id, profile = %request.profile_name);

    async {
        if request.posts.is_empty() {
            return TranscriptionResponse::failure("No posts provided");
        }

        let outcome = match build() {
            Ok(transcriber) => run_request(request, &transcriber).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Request failed: {:#}", e);
                TranscriptionResponse::failure(format!("{:#}", e))
            }
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::load_posts;
    use crate::input::CellValue;

    #[test]
    fn test_parse_bare_and_wrapped_requests() {
        let bare = r#"{"profile_name":"alice","posts":[{"url":"https://www.instagram.com/reel/A/","views":10}]}"#;
        let wrapped = r#"{"input":{"profile_name":"alice","posts":[{"url":"https://www.instagram.com/reel/A/","views":10}]}}"#;

        let a = TranscriptionRequest::from_json(bare).unwrap();
        let b = TranscriptionRequest::from_json(wrapped).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.top_count, 5);
        assert_eq!(a.sort_by, CountField::ViewCount);
        assert!(!a.quick_transcribe);
        assert_eq!(a.posts[0].likes, 0);
    }

    #[test]
    fn test_defaults_and_sort_field() {
        let request =
            TranscriptionRequest::from_json(r#"{"posts":[],"sort_by":"like_count","quick_transcribe":true}"#)
                .unwrap();
        assert_eq!(request.profile_name, "unknown");
        assert_eq!(request.sort_by, CountField::LikeCount);
        assert!(request.quick_transcribe);
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        let err = TranscriptionRequest::from_json("{not json").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReelscribeError>(),
            Some(ReelscribeError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_materialize_writes_canonical_csv() {
        let request = TranscriptionRequest {
            profile_name: "alice".to_string(),
            posts: vec![
                RequestPost {
                    url: "https://www.instagram.com/reel/A/".to_string(),
                    views: 1500,
                    likes: 20,
                    comments: 3,
                },
                RequestPost {
                    url: "https://www.instagram.com/reel/B/".to_string(),
                    views: 0,
                    likes: 0,
                    comments: 0,
                },
            ],
            top_count: 5,
            sort_by: CountField::ViewCount,
            quick_transcribe: false,
        };

        let file = request.materialize(None).unwrap();
        let content = fs_err::read_to_string(file.path()).unwrap();
        assert!(content.starts_with("Profile,Reel,Views,Likes,Comments\n"));
        assert!(content.contains("alice,https://www.instagram.com/reel/A/,1500,20,3\n"));

        let posts = load_posts(file.path());
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].profile_name.as_deref(), Some("alice"));
        assert_eq!(posts[0].view_count, Some(CellValue::Integer(1500)));

        let path = file.path().to_path_buf();
        drop(file);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_empty_posts_is_an_error_response() {
        let request = TranscriptionRequest::from_json(r#"{"profile_name":"alice","posts":[]}"#).unwrap();
        let response = handle_request(&request, || anyhow::bail!("should not be built")).await;

        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("No posts provided"));
    }

    #[tokio::test]
    async fn test_build_failure_is_an_error_response() {
        let request = TranscriptionRequest::from_json(
            r#"{"profile_name":"bob","posts":[{"url":"https://www.instagram.com/reel/Q/"}],"quick_transcribe":true}"#,
        )
        .unwrap();
        let response = handle_request(&request, || anyhow::bail!("OPENAI_API_KEY is not set")).await;

        assert!(!response.success);
        assert!(response.error.unwrap().contains("OPENAI_API_KEY"));
    }
}
