use clap::{Parser, Subcommand};
use console::Style;
use std::path::PathBuf;

use crate::input::{CountField, PostRecord};

#[derive(Parser)]
#[command(
    name = "reelscribe",
    about = "Reelscribe - Rank Instagram/TikTok posts from a CSV export and transcribe the top videos",
    version,
    long_about = "Reads a profile's post export, keeps the video posts, ranks them by views, likes or comments, and transcribes the top ones with yt-dlp, ffmpeg and Whisper into a single combined report."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators and colours
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to ./config.yaml, then the user config directory)
    #[arg(long, global = true, value_name = "FILE", env = "REELSCRIBE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transcribe the top posts of a CSV export
    Transcribe {
        /// CSV export of a profile's posts
        #[arg(value_name = "CSV_FILE")]
        csv_file: PathBuf,

        /// Number of top posts to transcribe (config default if not specified)
        #[arg(short, long, value_name = "N")]
        top: Option<usize>,

        /// Counter used for ranking
        #[arg(short, long, value_enum, default_value_t = CountField::ViewCount)]
        sort: CountField,

        /// Profile name for the report (taken from the data if not specified)
        #[arg(short, long, value_name = "NAME")]
        profile: Option<String>,

        /// Output directory for the report
        #[arg(short, long, value_name = "DIR", env = "REELSCRIBE_OUTPUT_DIR")]
        output: Option<PathBuf>,

        /// Keep the first three posts instead of treating them as pinned
        #[arg(long)]
        no_filter_pinned: bool,

        /// Only show which posts would be transcribed
        #[arg(long)]
        preview: bool,
    },

    /// Transcribe a single post URL
    Quick {
        /// Instagram or TikTok post URL
        #[arg(value_name = "URL")]
        url: String,

        /// Profile name for the report
        #[arg(short, long, value_name = "NAME", default_value = "unknown")]
        profile: String,
    },

    /// Handle a JSON transcription request and print the JSON response
    Handle {
        /// Request file (reads stdin if not specified)
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,
    },

    /// Show or create the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },

    /// List supported platforms
    Platforms,
}

impl Commands {
    /// Whether the command runs external tools and needs the startup check
    pub fn uses_media_tools(&self) -> bool {
        match self {
            Commands::Transcribe { preview, .. } => !preview,
            Commands::Quick { .. } | Commands::Handle { .. } => true,
            Commands::Config { .. } | Commands::Platforms => false,
        }
    }
}

/// Console styles for user-facing output. Colour is decided by the caller.
#[derive(Debug, Clone)]
pub struct Palette {
    pub heading: Style,
    pub accent: Style,
    pub success: Style,
    pub warning: Style,
}

impl Palette {
    pub fn new(colored: bool) -> Self {
        Self {
            heading: Style::new().bold().force_styling(colored),
            accent: Style::new().cyan().force_styling(colored),
            success: Style::new().green().force_styling(colored),
            warning: Style::new().yellow().force_styling(colored),
        }
    }

    /// Colour when not quiet and stdout is a terminal
    pub fn detect(quiet: bool) -> Self {
        Self::new(!quiet && console::Term::stdout().features().colors_supported())
    }
}

/// Render the preview table of selected posts
pub fn render_preview(posts: &[PostRecord], sort_by: CountField, palette: &Palette) -> String {
    let mut out = format!(
        "{}\n",
        palette
            .heading
            .apply_to(format!("Top {} posts by {}:", posts.len(), sort_by))
    );

    for (idx, post) in posts.iter().enumerate() {
        out.push_str(&format!(
            "{:2}. {}\n",
            idx + 1,
            palette.accent.apply_to(post.url().unwrap_or("N/A"))
        ));
        out.push_str(&format!(
            "    Views: {}\n",
            post.display_count(CountField::ViewCount)
        ));
        out.push_str(&format!(
            "    Likes: {}\n",
            post.display_count(CountField::LikeCount)
        ));
        out.push_str(&format!(
            "    Comments: {}\n",
            post.display_count(CountField::CommentCount)
        ));
    }

    out
}
