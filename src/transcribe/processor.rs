use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use super::{CaptionEntry, TranscriptHandle, TranscriptList, TranscriptSource};
use crate::config::TranscriptConfig;
use crate::extractors::youtube::YtDlp;
use crate::Result;

const CAPTION_FORMAT: &str = "json3";
const ORIGINAL_SUFFIX: &str = "-orig";

/// Caption maps from a `yt-dlp --dump-single-json` payload
#[derive(Debug, Default, Deserialize)]
struct VideoCaptions {
    #[serde(default)]
    subtitles: Option<BTreeMap<String, Vec<SubtitleFormat>>>,
    #[serde(default)]
    automatic_captions: Option<BTreeMap<String, Vec<SubtitleFormat>>>,
}

#[derive(Debug, Deserialize)]
struct SubtitleFormat {
    ext: Option<String>,
    url: Option<String>,
    name: Option<String>,
}

/// Caption payload shapes accepted from upstream
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CaptionPayload {
    /// YouTube timedtext `json3` document
    Json3 { events: Vec<Json3Event> },
    /// Plain list of `{start, duration, text}` records
    Entries(Vec<PlainCaption>),
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs", default)]
    start_ms: f64,
    #[serde(rename = "dDurationMs", default)]
    duration_ms: f64,
    #[serde(default)]
    segs: Option<Vec<Json3Segment>>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

#[derive(Debug, Deserialize)]
struct PlainCaption {
    start: f64,
    #[serde(default)]
    duration: f64,
    text: String,
}

impl Json3Event {
    /// Window and line-break events carry no text and yield `None`
    fn into_caption(self) -> Option<CaptionEntry> {
        let text: String = self.segs?.into_iter().map(|s| s.utf8).collect();
        let text = text.trim().to_string();
        if text.is_empty() {
            return None;
        }
        Some(CaptionEntry {
            start: self.start_ms / 1000.0,
            duration: self.duration_ms / 1000.0,
            text,
        })
    }
}

/// Normalize a caption payload into chronological caption entries
pub fn parse_caption_payload(body: &str) -> Result<Vec<CaptionEntry>> {
    let payload: CaptionPayload =
        serde_json::from_str(body).context("Failed to parse caption payload")?;

    let mut entries: Vec<CaptionEntry> = match payload {
        CaptionPayload::Json3 { events } => events
            .into_iter()
            .filter_map(Json3Event::into_caption)
            .collect(),
        CaptionPayload::Entries(records) => records
            .into_iter()
            .map(|r| CaptionEntry {
                start: r.start,
                duration: r.duration,
                text: r.text,
            })
            .collect(),
    };

    entries.sort_by(|a, b| a.start.total_cmp(&b.start));
    Ok(entries)
}

fn json3_url(formats: &[SubtitleFormat]) -> Option<&str> {
    formats
        .iter()
        .find(|f| f.ext.as_deref() == Some(CAPTION_FORMAT))
        .and_then(|f| f.url.as_deref())
}

fn track_name(formats: &[SubtitleFormat], code: &str) -> String {
    formats
        .iter()
        .find_map(|f| f.name.clone())
        .unwrap_or_else(|| code.to_string())
}

/// Build the transcript list from yt-dlp video metadata
pub fn transcript_list_from_info(video_id: &str, info: Value) -> Result<TranscriptList> {
    let captions: VideoCaptions =
        serde_json::from_value(info).context("Failed to read caption metadata")?;
    let manual = captions.subtitles.unwrap_or_default();
    let automatic = captions.automatic_captions.unwrap_or_default();

    // Without `-orig` keys, automatic captions of a video with manual
    // subtitles are machine translations of those subtitles
    let has_originals = automatic.keys().any(|k| k.ends_with(ORIGINAL_SUFFIX));
    let only_translations = !has_originals && !manual.is_empty();
    let translation_languages: Vec<String> = if has_originals || only_translations {
        automatic
            .keys()
            .filter(|k| !k.ends_with(ORIGINAL_SUFFIX))
            .cloned()
            .collect()
    } else {
        Vec::new()
    };
    let is_translatable = !translation_languages.is_empty();

    let mut tracks = Vec::new();

    for (code, formats) in &manual {
        if code == "live_chat" {
            continue;
        }
        if let Some(url) = json3_url(formats) {
            tracks.push(TranscriptHandle {
                language: track_name(formats, code),
                language_code: code.clone(),
                is_generated: false,
                is_translatable,
                translation_languages: translation_languages.clone(),
                url: url.to_string(),
            });
        }
    }

    for (key, formats) in &automatic {
        let code = match key.strip_suffix(ORIGINAL_SUFFIX) {
            Some(code) => code,
            None if has_originals || only_translations => continue,
            None => key.as_str(),
        };
        if let Some(url) = json3_url(formats) {
            tracks.push(TranscriptHandle {
                language: track_name(formats, code),
                language_code: code.to_string(),
                is_generated: true,
                is_translatable,
                translation_languages: translation_languages.clone(),
                url: url.to_string(),
            });
        }
    }

    Ok(TranscriptList {
        video_id: video_id.to_string(),
        tracks,
    })
}

/// YouTube transcripts listed through yt-dlp and fetched over HTTP
pub struct YoutubeTranscriptSource {
    ytdlp: YtDlp,
    client: Client,
    direct_endpoint: String,
    direct_language: String,
}

impl YoutubeTranscriptSource {
    pub fn new(ytdlp: YtDlp, config: &TranscriptConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(concat!("tubescribe/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            ytdlp,
            client,
            direct_endpoint: config.direct_endpoint.clone(),
            direct_language: config.direct_language.clone(),
        })
    }

    /// Download caption payload text; `None` for a missing track
    async fn download_captions(&self, request: reqwest::RequestBuilder) -> Result<Option<String>> {
        let response = request.send().await.context("Failed to download transcript")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            anyhow::bail!("Failed to download transcript: HTTP {}", response.status());
        }

        let content = response
            .text()
            .await
            .context("Failed to read transcript content")?;

        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(content))
    }
}

#[async_trait]
impl TranscriptSource for YoutubeTranscriptSource {
    async fn list_transcripts(&self, video_id: &str) -> Result<TranscriptList> {
        let info = self.ytdlp.dump_video(video_id).await?;
        transcript_list_from_info(video_id, info)
    }

    async fn fetch(&self, handle: &TranscriptHandle) -> Result<Vec<CaptionEntry>> {
        tracing::debug!("Fetching '{}' captions from {}", handle.language_code, handle.url);

        match self.download_captions(self.client.get(&handle.url)).await? {
            Some(body) => parse_caption_payload(&body),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_direct(&self, video_id: &str) -> Result<Option<(Vec<CaptionEntry>, String)>> {
        tracing::debug!(video_id, "Fetching transcript directly from {}", self.direct_endpoint);

        let request = self.client.get(&self.direct_endpoint).query(&[
            ("v", video_id),
            ("lang", self.direct_language.as_str()),
            ("fmt", CAPTION_FORMAT),
        ]);

        let Some(body) = self.download_captions(request).await? else {
            return Ok(None);
        };

        let entries = parse_caption_payload(&body)?;
        if entries.is_empty() {
            return Ok(None);
        }
        Ok(Some((entries, self.direct_language.clone())))
    }
}
