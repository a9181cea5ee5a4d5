use anyhow::Context;
use serde_json::Value;
use std::process::Stdio;
use tokio::process::Command;

use crate::Result;

/// Canonical watch URL for a video id
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Canonical playlist page URL for a playlist id
pub fn playlist_url(playlist_id: &str) -> String {
    format!(
        "https://www.youtube.com/playlist?list={}",
        urlencoding::encode(playlist_id)
    )
}

/// Thin wrapper around the yt-dlp binary
#[derive(Debug, Clone)]
pub struct YtDlp {
    path: String,
}

impl YtDlp {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Check if yt-dlp is available
    pub async fn check_availability(&self) -> bool {
        Command::new(&self.path)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Flat listing of a playlist, without per-video detail fetches
    pub async fn dump_playlist(&self, playlist_id: &str, max_entries: usize) -> Result<Value> {
        let url = playlist_url(playlist_id);
        let items = format!("1-{}", max_entries.max(1));

        tracing::debug!("Listing playlist entries for: {}", url);

        self.dump_json(&[
            "--flat-playlist",
            "--dump-single-json",
            "--playlist-items",
            &items,
            "--quiet",
            "--no-warnings",
            &url,
        ])
        .await
    }

    /// Video metadata including the `subtitles` and `automatic_captions` maps
    pub async fn dump_video(&self, video_id: &str) -> Result<Value> {
        let url = watch_url(video_id);

        tracing::debug!("Extracting video info for: {}", url);

        self.dump_json(&[
            "--dump-single-json",
            "--skip-download",
            "--no-playlist",
            "--quiet",
            "--no-warnings",
            &url,
        ])
        .await
    }

    async fn dump_json(&self, args: &[&str]) -> Result<Value> {
        let output = Command::new(&self.path)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.path))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp failed: {}", error.trim());
        }

        let json_str = String::from_utf8(output.stdout)
            .context("yt-dlp output was not valid UTF-8")?;
        let info: Value = serde_json::from_str(&json_str)
            .context("Failed to parse yt-dlp JSON output")?;

        Ok(info)
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}
