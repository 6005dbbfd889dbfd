use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::{find_media_file, VideoDownloader};
use crate::config::DownloaderConfig;
use crate::utils::{extract_domain, format_duration};
use crate::{ReelscribeError, Result};

/// Post downloader using yt-dlp
pub struct YtDlpDownloader {
    yt_dlp_path: String,
    format: String,
    fallback_format: String,
}

impl YtDlpDownloader {
    pub fn new(config: &DownloaderConfig) -> Self {
        Self {
            yt_dlp_path: config.yt_dlp_path.clone(),
            format: config.format.clone(),
            fallback_format: config.fallback_format.clone(),
        }
    }

    /// Run one download attempt with the given format selector
    async fn download_with_format(&self, url: &str, dest_dir: &Path, format: &str) -> Result<PathBuf> {
        let template = dest_dir.join("%(id)s.%(ext)s");

        let output = Command::new(&self.yt_dlp_path)
            .args([
                "--output",
                &template.to_string_lossy(),
                "--format",
                format,
                "--no-playlist",
                "--no-warnings",
                "--quiet",
                url,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(ReelscribeError::DownloadFailed(error.trim().to_string()));
        }

        find_media_file(dest_dir)?.ok_or_else(|| {
            ReelscribeError::DownloadFailed(format!(
                "yt-dlp finished but no media file was written for {}",
                url
            ))
            .into()
        })
    }

    /// Get post information using yt-dlp without downloading
    async fn get_video_info(&self, url: &str) -> Result<Value> {
        tracing::debug!("Extracting video info for: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args(["--dump-json", "--no-playlist", "--no-warnings", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp failed: {}", error.trim());
        }

        let info: Value = serde_json::from_slice(&output.stdout)?;
        Ok(info)
    }
}

#[async_trait]
impl VideoDownloader for YtDlpDownloader {
    async fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf> {
        tracing::info!("Downloading video from: {}", url);

        let first_error = match self.download_with_format(url, dest_dir, &self.format).await {
            Ok(path) => {
                tracing::info!("Downloaded: {}", path.display());
                return Ok(path);
            }
            Err(e) => e,
        };

        if self.fallback_format.is_empty() || self.fallback_format == self.format {
            return Err(first_error);
        }

        tracing::warn!("Retrying with alternative format ({:#})", first_error);
        let path = self
            .download_with_format(url, dest_dir, &self.fallback_format)
            .await
            .map_err(|e| e.context(first_error.to_string()))?;

        tracing::info!("Downloaded: {} (fallback quality)", path.display());
        Ok(path)
    }

    async fn diagnose(&self, url: &str) {
        tracing::info!("Troubleshooting URL: {}", url);

        match self.get_video_info(url).await {
            Ok(info) => {
                let title = info["title"].as_str().unwrap_or("Unknown");
                let duration = info["duration"]
                    .as_f64()
                    .map(format_duration)
                    .unwrap_or_else(|| "Unknown".to_string());
                tracing::info!("URL is accessible - title: {}, duration: {}", title, duration);
            }
            Err(e) => {
                tracing::warn!("Error accessing URL: {:#}", e);
                for tip in troubleshooting_tips(url) {
                    tracing::warn!("  • {}", tip);
                }
            }
        }
    }
}

/// Platform-specific hints for a URL that could not be fetched
pub fn troubleshooting_tips(url: &str) -> &'static [&'static str] {
    let domain = extract_domain(url).unwrap_or_default().to_lowercase();
    if domain.ends_with("instagram.com") {
        &[
            "Make sure the post/reel is public",
            "Try copying the URL directly from the browser",
            "Some Instagram content may require login",
            "Stories are only available for 24 hours",
        ]
    } else if domain.ends_with("tiktok.com") {
        &[
            "Make sure the video is public",
            "Try using the full URL instead of short links",
            "Some regions may have restrictions",
        ]
    } else {
        &[]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn downloader(path: &str) -> YtDlpDownloader {
        YtDlpDownloader::new(&DownloaderConfig {
            yt_dlp_path: path.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_troubleshooting_tips_per_platform() {
        assert_eq!(troubleshooting_tips("https://www.instagram.com/reel/1/").len(), 4);
        assert_eq!(troubleshooting_tips("https://vm.tiktok.com/x/").len(), 3);
        assert!(troubleshooting_tips("https://example.com").is_empty());
    }

    #[tokio::test]
    async fn test_missing_binary_fails_closed() {
        let dir = TempDir::new().unwrap();
        let result = downloader("reelscribe-no-such-yt-dlp")
            .download("https://www.instagram.com/reel/ABC/", dir.path())
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_diagnose_never_fails() {
        downloader("reelscribe-no-such-yt-dlp")
            .diagnose("https://www.instagram.com/reel/ABC/")
            .await;
    }
}
