use async_trait::async_trait;
use std::path::{Path, PathBuf};
use url::Url;

pub mod ffmpeg;
pub mod ytdlp;

pub use ffmpeg::FfmpegAudioExtractor;
pub use ytdlp::YtDlpDownloader;

use crate::Result;

/// Extensions a finished download can have
pub const MEDIA_EXTENSIONS: &[&str] = &["mp4", "webm", "mkv", "avi", "m4a", "mp3"];

/// Extensions that are already audio and can skip extraction
pub const AUDIO_EXTENSIONS: &[&str] = &["m4a", "mp3", "wav", "aac"];

/// Domains whose posts the downloader is expected to handle. Any subdomain
/// matches (`www.`, `m.`, `vm.`, `vt.`).
const SUPPORTED_DOMAINS: &[&str] = &["instagram.com", "tiktok.com"];

/// Downloads the video behind a post URL
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoDownloader: Send + Sync {
    /// Download `url` into `dest_dir` and return the media file
    async fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf>;

    /// Log whatever can be learned about why `url` failed to download
    async fn diagnose(&self, _url: &str) {}
}

/// Pulls the audio track out of a downloaded media file
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    /// Write an audio file for `media` into `dest_dir` and return its path
    async fn extract_audio(&self, media: &Path, dest_dir: &Path) -> Result<PathBuf>;
}

/// Check whether a URL is well formed and points at a supported platform
pub fn is_supported_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return false;
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }

    let Some(host) = parsed.host_str().map(str::to_lowercase) else {
        return false;
    };

    SUPPORTED_DOMAINS.iter().any(|domain| {
        host == *domain
            || host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// Platform names shown by `reelscribe platforms`
pub fn supported_platforms() -> &'static [&'static str] {
    &[
        "Instagram Reels and video posts (instagram.com)",
        "TikTok videos (tiktok.com, vm.tiktok.com, vt.tiktok.com)",
    ]
}

/// Whether a file has one of the given extensions (case-insensitive)
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// First file in `dir` with a media extension, in name order
pub fn find_media_file(dir: &Path) -> Result<Option<PathBuf>> {
    let mut candidates: Vec<PathBuf> = fs_err::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_extension(path, MEDIA_EXTENSIONS))
        .collect();

    candidates.sort();
    Ok(candidates.into_iter().next())
}
