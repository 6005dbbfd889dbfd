use anyhow::Context;
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::input::CountField;
use crate::transcribe::TranscriptionResult;
use crate::utils::display_timestamp;
use crate::{ReelscribeError, Result};

pub mod naming;

pub use naming::{
    extract_reel_id, individual_transcript_name, report_stem, safe_profile, unique_file_name,
    unique_report_path,
};

const TITLE_RULE: usize = 80;
const TOC_RULE: usize = 40;
const POST_RULE: usize = 60;
const TRANSCRIPTION_RULE: usize = 20;
const INDIVIDUAL_RULE: usize = 50;

/// Writes combined reports and the per-post transcript files that feed them
pub struct ReportAssembler {
    output_dir: PathBuf,
}

impl ReportAssembler {
    /// Create an assembler writing into `output_dir`, creating it if needed
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs_err::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Save one post's transcript next to the report; returns the file name
    pub fn write_individual_transcript(&self, url: &str, transcription: &str) -> Result<String> {
        let now = Local::now();
        let filename = unique_file_name(&self.output_dir, &individual_transcript_name(url, now));
        let path = self.output_dir.join(&filename);

        let mut content = String::new();
        let _ = writeln!(content, "Transcription from: {}", url);
        let _ = writeln!(content, "Generated on: {}", display_timestamp(now));
        let _ = writeln!(content, "{}", "-".repeat(INDIVIDUAL_RULE));
        content.push('\n');
        content.push_str(transcription);

        fs_err::write(&path, content)?;
        tracing::debug!("Transcription saved to: {}", path.display());
        Ok(filename)
    }

    /// Write the combined report and then remove the individual transcript
    /// files it was built from. Returns the report path.
    pub fn assemble(
        &self,
        results: &[TranscriptionResult],
        profile: &str,
        quick: bool,
    ) -> Result<PathBuf> {
        let now = Local::now();
        let stem = report_stem(
            profile,
            results.len(),
            results.first().map(|r| r.url.as_str()),
            quick,
            now,
        );
        let path = unique_report_path(&self.output_dir, &stem, now);

        let content = render_report(results, profile, now);
        if let Err(e) = fs_err::write(&path, content) {
            self.cleanup_individual_files(results);
            anyhow::bail!(ReelscribeError::ReportWriteFailed(e.to_string()));
        }

        tracing::info!(
            "Combined document created: {}",
            path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
        );

        self.cleanup_individual_files(results);
        Ok(path)
    }

    /// Best-effort removal of per-post transcript files. Returns how many
    /// were removed.
    pub fn cleanup_individual_files(&self, results: &[TranscriptionResult]) -> usize {
        tracing::info!("Cleaning up individual transcription files...");

        let mut cleaned = 0;
        for name in results.iter().filter_map(|r| r.artifact_file.as_deref()) {
            let path = self.output_dir.join(name);
            if !path.exists() {
                continue;
            }
            match fs_err::remove_file(&path) {
                Ok(()) => {
                    cleaned += 1;
                    tracing::debug!("Removed: {}", name);
                }
                Err(e) => tracing::warn!("Could not remove {}: {}", name, e),
            }
        }

        if cleaned > 0 {
            tracing::info!("Cleaned up {} individual transcription files", cleaned);
        }
        cleaned
    }
}

/// Render the combined report text
pub fn render_report(
    results: &[TranscriptionResult],
    profile: &str,
    generated_at: DateTime<Local>,
) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = write_report(&mut out, results, profile, generated_at);
    out
}

fn write_report(
    out: &mut String,
    results: &[TranscriptionResult],
    profile: &str,
    generated_at: DateTime<Local>,
) -> std::fmt::Result {
    writeln!(out, "# Instagram Profile Transcription Report (CSV-Based)")?;
    writeln!(out, "{}\n", "=".repeat(TITLE_RULE))?;

    writeln!(out, "Profile: @{}", profile)?;
    writeln!(out, "Generated: {}", display_timestamp(generated_at))?;
    writeln!(out, "Total Posts Transcribed: {}", results.len())?;
    writeln!(out, "Source: CSV data import\n")?;

    writeln!(out, "## Table of Contents")?;
    writeln!(out, "{}\n", "-".repeat(TOC_RULE))?;

    for result in results {
        let record = &result.record;
        writeln!(out, "{:2}. Post {}", result.post_number, result.post_number)?;
        writeln!(out, "    URL: {}", result.url)?;
        writeln!(out, "    Views: {}", record.display_count(CountField::ViewCount))?;
        writeln!(out, "    Likes: {}", record.display_count(CountField::LikeCount))?;
        writeln!(out, "    Comments: {}\n", record.display_count(CountField::CommentCount))?;
    }

    writeln!(out, "{}\n", "=".repeat(TITLE_RULE))?;

    for result in results {
        let record = &result.record;
        writeln!(out, "## POST #{}", result.post_number)?;
        writeln!(out, "{}\n", "-".repeat(POST_RULE))?;

        writeln!(out, "**URL:** {}", result.url)?;
        writeln!(out, "**Views:** {}", record.display_count(CountField::ViewCount))?;
        writeln!(out, "**Likes:** {}", record.display_count(CountField::LikeCount))?;
        writeln!(out, "**Comments:** {}", record.display_count(CountField::CommentCount))?;

        if let Some(file) = &result.artifact_file {
            writeln!(out, "**Individual File:** {}", file)?;
        }

        writeln!(out, "\n**TRANSCRIPTION:**")?;
        writeln!(out, "{}", "-".repeat(TRANSCRIPTION_RULE))?;
        writeln!(out, "{}\n", result.transcription)?;

        writeln!(out, "{}\n", "=".repeat(TITLE_RULE))?;
    }

    Ok(())
}
