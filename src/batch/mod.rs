//! Batch flow: CSV export in, combined transcript report out

use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::input::{normalize_rows, read_rows, PostRecord};
use crate::output::ReportAssembler;
use crate::selection::{select_posts, SelectionOptions};
use crate::transcribe::{TranscriptionPipeline, TranscriptionResult};
use crate::Result;

/// Parameters for one run over a CSV file
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub csv_file: PathBuf,
    pub selection: SelectionOptions,

    /// Overrides the profile name found in the data
    pub profile_name: Option<String>,

    /// Use the single-post file naming when exactly one post succeeds
    pub quick: bool,
}

/// Read a CSV export and normalize its columns
pub fn load_posts(csv_file: &Path) -> Vec<PostRecord> {
    normalize_rows(&read_rows(csv_file))
}

/// Profile name for a run: the override, else the first record's profile
/// column, else the file stem
pub fn resolve_profile_name(
    override_name: Option<&str>,
    posts: &[PostRecord],
    csv_file: &Path,
) -> String {
    if let Some(name) = override_name.map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }

    if let Some(name) = posts
        .first()
        .and_then(|p| p.profile_name.as_deref())
        .map(str::trim)
        .filter(|n| !n.is_empty())
    {
        return name.to_string();
    }

    csv_file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Run selection only, without touching the media pipeline
pub fn preview(csv_file: &Path, selection: &SelectionOptions) -> Vec<PostRecord> {
    let posts = load_posts(csv_file);
    if posts.is_empty() {
        return posts;
    }
    select_posts(posts, selection)
}

/// Drives selected posts through the media pipeline and assembles the report
pub struct ProfileTranscriber {
    pipeline: TranscriptionPipeline,
    assembler: ReportAssembler,
    show_progress: bool,
}

impl ProfileTranscriber {
    /// Build with the configured external tools, writing into `output_dir`
    pub fn new(config: &Config, output_dir: &Path, show_progress: bool) -> Result<Self> {
        Ok(Self {
            pipeline: TranscriptionPipeline::new(config)?,
            assembler: ReportAssembler::new(output_dir)?,
            show_progress,
        })
    }

    /// Build from an existing pipeline and assembler
    pub fn with_parts(pipeline: TranscriptionPipeline, assembler: ReportAssembler) -> Self {
        Self {
            pipeline,
            assembler,
            show_progress: false,
        }
    }

    pub fn output_dir(&self) -> &Path {
        self.assembler.output_dir()
    }

    /// Read, select and transcribe. `Ok(None)` means nothing was produced:
    /// empty input, no video posts, or every post failed.
    pub async fn process_csv_file(&self, options: &RunOptions) -> Result<Option<PathBuf>> {
        tracing::info!(
            "CSV File: {} | Top Posts: {} | Sort By: {} | Filter Pinned: {}",
            options.csv_file.display(),
            options.selection.top_count,
            options.selection.sort_by,
            options.selection.filter_pinned
        );

        let posts = load_posts(&options.csv_file);
        if posts.is_empty() {
            tracing::warn!("No posts to process");
            return Ok(None);
        }

        let profile =
            resolve_profile_name(options.profile_name.as_deref(), &posts, &options.csv_file);

        let selected = select_posts(posts, &options.selection);
        if selected.is_empty() {
            return Ok(None);
        }

        self.transcribe_posts(&selected, &profile, options.quick).await
    }

    /// Transcribe one post URL in quick mode. Selection is skipped, so `/p/`
    /// posts and TikTok links reach the pipeline without view counts.
    pub async fn transcribe_single(&self, url: &str, profile: &str) -> Result<Option<PathBuf>> {
        let post = PostRecord {
            url: Some(url.trim().to_string()),
            profile_name: Some(profile.to_string()),
            ..Default::default()
        };
        self.transcribe_posts(&[post], profile, true).await
    }

    /// Transcribe posts in order, skipping any that fail, then write the
    /// combined report
    pub async fn transcribe_posts(
        &self,
        posts: &[PostRecord],
        profile: &str,
        quick: bool,
    ) -> Result<Option<PathBuf>> {
        if posts.is_empty() {
            tracing::warn!("No posts to transcribe");
            return Ok(None);
        }

        if quick && posts.len() == 1 {
            tracing::info!("Quick transcribe mode: single reel transcription");
        } else {
            tracing::info!("Starting transcription of {} posts...", posts.len());
        }

        let progress = self.progress_bar(posts.len());
        let mut transcriptions = Vec::new();

        for (idx, post) in posts.iter().enumerate() {
            let post_number = idx + 1;
            progress.set_position(idx as u64);

            let Some(url) = post.url() else {
                tracing::warn!("Post {}: No URL found, skipping", post_number);
                continue;
            };

            progress.set_message(url.to_string());
            tracing::info!("[{}/{}] Transcribing: {}", post_number, posts.len(), url);

            match self.pipeline.transcribe_url(url).await {
                Ok(text) => {
                    let artifact_file = match self.assembler.write_individual_transcript(url, &text) {
                        Ok(name) => Some(name),
                        Err(e) => {
                            tracing::warn!("Post {}: could not save transcript file: {:#}", post_number, e);
                            None
                        }
                    };

                    transcriptions.push(TranscriptionResult {
                        post_number,
                        url: url.to_string(),
                        transcription: text,
                        record: post.clone(),
                        artifact_file,
                    });
                    tracing::info!("Post {} transcribed successfully", post_number);
                }
                Err(e) => {
                    tracing::warn!("Post {} error: {:#}", post_number, e);
                }
            }
        }

        progress.finish_and_clear();

        if transcriptions.is_empty() {
            tracing::warn!("No posts were successfully transcribed");
            return Ok(None);
        }

        tracing::info!(
            "Successfully transcribed {}/{} posts",
            transcriptions.len(),
            posts.len()
        );

        let path = self.assembler.assemble(&transcriptions, profile, quick)?;
        Ok(Some(path))
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            progress.set_style(style);
        }
        progress
    }
}
