use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

use crate::utils::{file_timestamp, sanitize_filename};

/// Short identifier for a reel URL: up to 10 characters of the segment after
/// `/reel/`, without query string. `unknown` if the URL is not a reel link.
pub fn extract_reel_id(url: &str) -> String {
    url.split_once("/reel/")
        .map(|(_, rest)| {
            let segment = rest.split('/').next().unwrap_or("");
            let segment = segment.split('?').next().unwrap_or("");
            segment.chars().take(10).collect::<String>()
        })
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Stem of the report file name, without extension
pub fn report_stem(
    profile: &str,
    result_count: usize,
    first_url: Option<&str>,
    quick: bool,
    now: DateTime<Local>,
) -> String {
    let profile = safe_profile(profile);
    match first_url {
        Some(url) if quick && result_count == 1 => format!(
            "quick_{}_{}_{}",
            profile,
            extract_reel_id(url),
            file_timestamp(now)
        ),
        _ => format!("{}top{}transcripts", profile, result_count),
    }
}

/// Pick a path for the report that does not clobber an existing file.
///
/// If `<stem>.txt` exists a timestamp is appended; if that is taken too a
/// counter is added after it.
pub fn unique_report_path(dir: &Path, stem: &str, now: DateTime<Local>) -> PathBuf {
    let candidate = dir.join(format!("{}.txt", stem));
    if !candidate.exists() {
        return candidate;
    }

    let stamped = format!("{}_{}", stem, file_timestamp(now));
    let candidate = dir.join(format!("{}.txt", stamped));
    if !candidate.exists() {
        return candidate;
    }

    (2..)
        .map(|n| dir.join(format!("{}_{}.txt", stamped, n)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

/// `name` if it is free in `dir`, else `<stem>_<n>.<ext>` with the first
/// free `n` starting at 2
pub fn unique_file_name(dir: &Path, name: &str) -> String {
    if !dir.join(name).exists() {
        return name.to_string();
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem, format!(".{}", ext)),
        None => (name, String::new()),
    };

    (2..)
        .map(|n| format!("{}_{}{}", stem, n, ext))
        .find(|candidate| !dir.join(candidate).exists())
        .unwrap_or_else(|| name.to_string())
}

/// Name of the per-post transcript file
pub fn individual_transcript_name(url: &str, now: DateTime<Local>) -> String {
    format!(
        "transcription_{}_{}.txt",
        file_timestamp(now),
        crate::utils::safe_url_fragment(url, 50)
    )
}

/// Profile name as it appears in file names; `unknown` if nothing survives
/// sanitizing
pub fn safe_profile(profile: &str) -> String {
    let cleaned = sanitize_filename(profile);
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}
