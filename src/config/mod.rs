use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::batch::RetryPolicy;
use crate::transcribe::default_languages;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Transcript retrieval settings
    #[serde(default)]
    pub transcripts: TranscriptConfig,

    /// Retry settings for each video
    #[serde(default)]
    pub retry: RetryConfig,

    /// Playlist listing settings
    #[serde(default)]
    pub playlist: PlaylistConfig,

    /// Application settings
    #[serde(default)]
    pub app: AppConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    /// Language codes tried in order before falling back to the first available transcript
    pub preferred_languages: Vec<String>,

    /// Endpoint queried when transcripts cannot be listed
    pub direct_endpoint: String,

    /// Language requested from the direct endpoint
    pub direct_language: String,

    /// HTTP request timeout in seconds
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per video
    pub max_attempts: u32,

    /// Fixed wait between attempts
    pub delay_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistConfig {
    /// Maximum number of playlist entries to list
    pub max_entries: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Path to the yt-dlp binary
    pub yt_dlp_path: String,

    /// Output directory used when none is given on the command line
    pub default_output_dir: Option<PathBuf>,

    /// How long the finished progress bar stays visible
    pub progress_reset_delay_ms: u64,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            preferred_languages: default_languages(),
            direct_endpoint: "https://www.youtube.com/api/timedtext".to_string(),
            direct_language: "en".to_string(),
            http_timeout_secs: 30,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_secs: 2,
        }
    }
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self { max_entries: 1000 }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
            default_output_dir: None,
            progress_reset_delay_ms: 3000,
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config = Self::from_yaml(&content)?;
            Ok(config)
        } else {
            let config = Self::default();
            if let Err(e) = config.save().await {
                tracing::warn!("Could not write default config: {:#}", e);
            }
            Ok(config)
        }
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)
            .context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("tubescribe").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.transcripts.preferred_languages.iter().all(|l| l.trim().is_empty()) {
            anyhow::bail!("At least one preferred transcript language must be configured");
        }

        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }

        if self.playlist.max_entries == 0 {
            anyhow::bail!("playlist.max_entries must be at least 1");
        }

        Ok(())
    }

    /// Replace the preferred language chain, ignoring blank codes
    pub fn with_languages(mut self, languages: &[String]) -> Result<Self> {
        let languages: Vec<String> = languages
            .iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        if languages.is_empty() {
            anyhow::bail!("At least one language code must be given");
        }
        self.transcripts.preferred_languages = languages;
        Ok(self)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            delay: Duration::from_secs(self.retry.delay_secs),
        }
    }

    pub fn progress_reset_delay(&self) -> Duration {
        Duration::from_millis(self.app.progress_reset_delay_ms)
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Preferred Languages: {}", self.transcripts.preferred_languages.join(", "));
        println!("  Direct Endpoint: {}", self.transcripts.direct_endpoint);
        println!("  Direct Language: {}", self.transcripts.direct_language);
        println!("  Retry Attempts: {}", self.retry.max_attempts);
        println!("  Retry Delay: {}s", self.retry.delay_secs);
        println!("  Max Playlist Entries: {}", self.playlist.max_entries);
        println!("  yt-dlp: {}", self.app.yt_dlp_path);
        if let Some(dir) = &self.app.default_output_dir {
            println!("  Default Output Directory: {}", dir.display());
        }
        if let Ok(path) = Self::config_path() {
            println!("  Config File: {}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.transcripts.preferred_languages, vec!["hi", "en"]);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.playlist.max_entries, 1000);
        assert_eq!(config.retry_policy().delay, Duration::from_secs(2));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml(
            "transcripts:\n  preferred_languages: [en, es]\nretry:\n  delay_secs: 5\n",
        )
        .unwrap();

        assert_eq!(config.transcripts.preferred_languages, vec!["en", "es"]);
        assert_eq!(config.transcripts.direct_language, "en");
        assert_eq!(config.retry.delay_secs, 5);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.app.yt_dlp_path, "yt-dlp");
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert_eq!(Config::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(Config::from_yaml("retry:\n  max_attempts: 0\n").is_err());
        assert!(Config::from_yaml("transcripts:\n  preferred_languages: []\n").is_err());
        assert!(Config::from_yaml("playlist:\n  max_entries: 0\n").is_err());
    }

    #[test]
    fn test_with_languages() {
        let config = Config::default()
            .with_languages(&["en".to_string(), " ".to_string(), "ja".to_string()])
            .unwrap();
        assert_eq!(config.transcripts.preferred_languages, vec!["en", "ja"]);
        assert!(Config::default().with_languages(&[]).is_err());
    }
}
