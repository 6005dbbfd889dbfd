use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Video downloader settings
    pub downloader: DownloaderConfig,

    /// Audio extraction settings
    pub audio: AudioConfig,

    /// Speech-to-text settings
    pub transcription: TranscriptionConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DownloaderConfig {
    /// yt-dlp executable
    pub yt_dlp_path: String,

    /// Format selector for the first download attempt
    pub format: String,

    /// Format selector for the single retry
    pub fallback_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,

    /// Sample rate of extracted WAV audio
    pub sample_rate: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptionEngine {
    /// Local `whisper` command line tool
    #[default]
    WhisperCli,
    /// OpenAI-compatible `/audio/transcriptions` endpoint
    OpenAi,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub engine: TranscriptionEngine,

    /// whisper executable
    pub whisper_path: String,

    /// Whisper model name
    pub model: String,

    /// Language hint (auto-detect if not specified)
    pub language: Option<String>,

    /// Base URL of the HTTP engine
    pub api_base: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Model name sent to the HTTP engine
    pub api_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Where reports are written
    pub output_dir: PathBuf,

    /// Where reports for structured requests are written
    pub request_output_dir: PathBuf,

    /// Root for per-run scratch directories (system temp if unset)
    pub temp_dir: Option<PathBuf>,

    /// Posts to transcribe when no count is given
    pub default_top_count: usize,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
            format: "best[height<=720]/best/worst".to_string(),
            fallback_format: "worst".to_string(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            sample_rate: 16000,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            engine: TranscriptionEngine::WhisperCli,
            whisper_path: "whisper".to_string(),
            model: "base".to_string(),
            language: None,
            api_base: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_model: "whisper-1".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("csv_profile_transcriptions"),
            request_output_dir: PathBuf::from("extension_transcriptions"),
            temp_dir: None,
            default_top_count: 5,
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `./config.yaml` is used if
    /// present, otherwise the user config file, which is created with
    /// defaults on first run.
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            tracing::debug!("Wrote default config to {}", config_path.display());
            Ok(config)
        }
    }

    /// Read and validate a config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("reelscribe").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let executables = [
            ("downloader.yt_dlp_path", &self.downloader.yt_dlp_path),
            ("audio.ffmpeg_path", &self.audio.ffmpeg_path),
            ("audio.ffprobe_path", &self.audio.ffprobe_path),
            ("transcription.whisper_path", &self.transcription.whisper_path),
        ];
        for (key, value) in executables {
            if value.trim().is_empty() {
                anyhow::bail!("{} must not be empty", key);
            }
        }

        if self.downloader.format.trim().is_empty() {
            anyhow::bail!("downloader.format must not be empty");
        }

        if self.audio.sample_rate == 0 {
            anyhow::bail!("audio.sample_rate must be greater than zero");
        }

        match self.transcription.engine {
            TranscriptionEngine::WhisperCli if self.transcription.model.trim().is_empty() => {
                anyhow::bail!("transcription.model must be configured");
            }
            TranscriptionEngine::OpenAi if self.transcription.api_base.trim().is_empty() => {
                anyhow::bail!("transcription.api_base must be configured");
            }
            _ => {}
        }

        Ok(())
    }

    /// External tools the configured pipeline needs, with what they are for
    pub fn required_tools(&self) -> Vec<(&str, &str)> {
        let mut tools = vec![
            (
                self.downloader.yt_dlp_path.as_str(),
                "required for downloading posts",
            ),
            (self.audio.ffmpeg_path.as_str(), "required for audio extraction"),
        ];
        if self.transcription.engine == TranscriptionEngine::WhisperCli {
            tools.push((
                self.transcription.whisper_path.as_str(),
                "required for local transcription",
            ));
        }
        tools
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  yt-dlp: {}", self.downloader.yt_dlp_path);
        println!("  Download Format: {}", self.downloader.format);
        println!("  Fallback Format: {}", self.downloader.fallback_format);
        println!("  ffmpeg: {}", self.audio.ffmpeg_path);
        println!("  Sample Rate: {} Hz", self.audio.sample_rate);
        match self.transcription.engine {
            TranscriptionEngine::WhisperCli => {
                println!("  Engine: whisper ({})", self.transcription.whisper_path);
                println!("  Model: {}", self.transcription.model);
            }
            TranscriptionEngine::OpenAi => {
                println!("  Engine: HTTP ({})", self.transcription.api_base);
                println!("  Model: {}", self.transcription.api_model);
                println!("  API Key Variable: {}", self.transcription.api_key_env);
            }
        }
        if let Some(lang) = &self.transcription.language {
            println!("  Language: {}", lang);
        }
        println!("  Output Directory: {}", self.app.output_dir.display());
        println!("  Request Output Directory: {}", self.app.request_output_dir.display());
        println!("  Default Top Count: {}", self.app.default_top_count);
    }
}
