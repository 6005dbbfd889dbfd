//! Reelscribe - rank Instagram/TikTok posts from a CSV export and transcribe the top videos
//!
//! The library reads a profile export, normalizes its columns, keeps the video
//! posts, ranks them by an engagement counter, and runs the selected posts
//! through yt-dlp, ffmpeg and a speech-to-text engine before writing a single
//! combined report.

pub mod batch;
pub mod cli;
pub mod config;
pub mod input;
pub mod media;
pub mod output;
pub mod request;
pub mod selection;
pub mod transcribe;
pub mod utils;

pub use batch::{ProfileTranscriber, RunOptions};
pub use cli::{Cli, Commands};
pub use config::Config;
pub use input::{CellValue, CountField, PostRecord};
pub use request::{TranscriptionRequest, TranscriptionResponse};
pub use selection::SelectionOptions;
pub use transcribe::{TranscriptionPipeline, TranscriptionResult};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to reelscribe
#[derive(thiserror::Error, Debug)]
pub enum ReelscribeError {
    #[error("Invalid URL or unsupported platform: {0}")]
    UnsupportedUrl(String),

    #[error("Video download failed: {0}")]
    DownloadFailed(String),

    #[error("Media has no audio track: {0}")]
    NoAudioTrack(String),

    #[error("Audio extraction failed: {0}")]
    AudioExtractionFailed(String),

    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Could not write report: {0}")]
    ReportWriteFailed(String),
}
