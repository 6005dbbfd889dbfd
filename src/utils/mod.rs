use chrono::{DateTime, Local};
use url::Url;

pub mod logger;
pub mod scratch;

pub use scratch::ScratchDir;

/// Timestamp used in generated file names
pub fn file_timestamp(now: DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// Timestamp used inside report headers
pub fn display_timestamp(now: DateTime<Local>) -> String {
    now.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Turn a URL into a short, filesystem-safe fragment
pub fn safe_url_fragment(url: &str, max_len: usize) -> String {
    url.trim_start_matches("https://")
        .trim_start_matches("http://")
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .take(max_len)
        .collect()
}

/// Sanitize a profile name for use in file names
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            match c {
                // Keep alphanumeric characters, hyphens, underscores, and dots
                c if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' => c,
                // Replace everything else with underscore
                _ => '_',
            }
        })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Extract domain from URL for display purposes
pub fn extract_domain(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .map(|host| host.strip_prefix("www.").unwrap_or(host).to_string())
}

/// Check if the current environment has the external tools the media
/// pipeline shells out to
pub async fn check_dependencies(tools: &[(&str, &str)]) -> Vec<String> {
    let mut missing = Vec::new();

    for (command, purpose) in tools {
        if !check_command_available(command).await {
            missing.push(format!("{} - {}", command, purpose));
        }
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str) -> bool {
    use tokio::process::Command;

    // ffmpeg only understands -version, whisper only --help
    let probe = match command.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(command) {
        "ffmpeg" | "ffprobe" => "-version",
        "whisper" => "--help",
        _ => "--version",
    };

    Command::new(command)
        .arg(probe)
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}
