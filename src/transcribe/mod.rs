use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod processor;

use crate::Result;

/// One timed transcript line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionEntry {
    /// Start time in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,

    /// Caption text, passed through verbatim
    pub text: String,
}

/// A transcript track the service can fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptHandle {
    /// Human readable language name
    pub language: String,

    /// Language code such as `hi` or `en`
    pub language_code: String,

    /// Whether the track was generated by speech recognition
    pub is_generated: bool,

    /// Whether the service can translate this track
    pub is_translatable: bool,

    /// Language codes the track can be translated to
    pub translation_languages: Vec<String>,

    /// Location of the caption payload
    pub url: String,
}

/// All transcripts listed for a video, manually created tracks first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptList {
    pub video_id: String,
    pub tracks: Vec<TranscriptHandle>,
}

impl TranscriptList {
    /// Find a track with exactly this language code, manual tracks before generated ones
    pub fn find(&self, language_code: &str) -> Option<&TranscriptHandle> {
        self.tracks
            .iter()
            .find(|t| !t.is_generated && t.language_code == language_code)
            .or_else(|| {
                self.tracks
                    .iter()
                    .find(|t| t.is_generated && t.language_code == language_code)
            })
    }

    pub fn first(&self) -> Option<&TranscriptHandle> {
        self.tracks.first()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// Result of a single fetch through the fallback chain
#[derive(Debug)]
pub enum FetchOutcome {
    Success {
        entries: Vec<CaptionEntry>,
        language_code: String,
    },
    NotFound,
    TransientError(anyhow::Error),
}

/// Service that lists and fetches transcripts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// List every transcript available for a video
    async fn list_transcripts(&self, video_id: &str) -> Result<TranscriptList>;

    /// Fetch the caption entries of a listed track
    async fn fetch(&self, handle: &TranscriptHandle) -> Result<Vec<CaptionEntry>>;

    /// Fetch a transcript for a video without listing first, in the service's default language
    async fn fetch_direct(&self, video_id: &str) -> Result<Option<(Vec<CaptionEntry>, String)>>;
}

/// Default preferred language chain
pub fn default_languages() -> Vec<String> {
    vec!["hi".to_string(), "en".to_string()]
}

/// Fetches transcripts through the preferred language chain
///
/// Every call lists and fetches from scratch; nothing is cached between
/// videos or between retries of the same video.
#[derive(Clone)]
pub struct TranscriptFetcher {
    source: Arc<dyn TranscriptSource>,
    languages: Vec<String>,
}

impl TranscriptFetcher {
    pub fn new(source: Arc<dyn TranscriptSource>, languages: Vec<String>) -> Self {
        Self { source, languages }
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Fetch a transcript for a video
    ///
    /// Tries the preferred languages in order, then the first listed track. If
    /// listing itself fails, falls back to a single direct fetch.
    pub async fn fetch(&self, video_id: &str) -> FetchOutcome {
        match self.source.list_transcripts(video_id).await {
            Ok(list) => {
                log_available(&list);
                self.fetch_from_list(&list).await
            }
            Err(e) => {
                tracing::warn!(video_id, "Error listing transcripts: {:#}", e);
                self.fetch_direct(video_id).await
            }
        }
    }

    async fn fetch_from_list(&self, list: &TranscriptList) -> FetchOutcome {
        let mut candidates: Vec<&TranscriptHandle> = Vec::new();
        for lang in &self.languages {
            match list.find(lang) {
                Some(handle) => candidates.push(handle),
                None => tracing::info!(
                    video_id = %list.video_id,
                    "No '{}' transcript found. Trying next preferred.",
                    lang
                ),
            }
        }
        if let Some(first) = list.first() {
            if !candidates.iter().any(|c| *c == first) {
                candidates.push(first);
            }
        }

        if candidates.is_empty() {
            tracing::warn!(video_id = %list.video_id, "No transcripts listed");
            return FetchOutcome::NotFound;
        }

        for handle in candidates {
            match self.source.fetch(handle).await {
                Ok(entries) if !entries.is_empty() => {
                    tracing::info!(
                        video_id = %list.video_id,
                        "Fetched '{}' transcript",
                        handle.language_code
                    );
                    return FetchOutcome::Success {
                        entries,
                        language_code: handle.language_code.clone(),
                    };
                }
                Ok(_) => tracing::warn!(
                    video_id = %list.video_id,
                    "Transcript '{}' was empty",
                    handle.language_code
                ),
                Err(e) => return FetchOutcome::TransientError(e),
            }
        }

        FetchOutcome::NotFound
    }

    async fn fetch_direct(&self, video_id: &str) -> FetchOutcome {
        match self.source.fetch_direct(video_id).await {
            Ok(Some((entries, language_code))) if !entries.is_empty() => {
                tracing::info!(video_id, "Fetched '{}' transcript directly", language_code);
                FetchOutcome::Success { entries, language_code }
            }
            Ok(_) => FetchOutcome::NotFound,
            Err(e) => FetchOutcome::TransientError(e),
        }
    }
}

fn log_available(list: &TranscriptList) {
    if list.is_empty() {
        tracing::debug!(video_id = %list.video_id, "None found by transcript listing");
        return;
    }
    for track in &list.tracks {
        tracing::debug!(
            video_id = %list.video_id,
            language = %track.language,
            code = %track.language_code,
            generated = track.is_generated,
            translatable = track.is_translatable,
            "Available transcript"
        );
        if track.is_translatable && !track.translation_languages.is_empty() {
            tracing::debug!("  Can be translated to: {:?}", track.translation_languages);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn handle(code: &str, generated: bool) -> TranscriptHandle {
        TranscriptHandle {
            language: code.to_uppercase(),
            language_code: code.to_string(),
            is_generated: generated,
            is_translatable: false,
            translation_languages: Vec::new(),
            url: format!("https://captions.test/{}", code),
        }
    }

    fn entries(text: &str) -> Vec<CaptionEntry> {
        vec![CaptionEntry {
            start: 0.0,
            duration: 1.5,
            text: text.to_string(),
        }]
    }

    fn list(tracks: Vec<TranscriptHandle>) -> TranscriptList {
        TranscriptList {
            video_id: "vid".to_string(),
            tracks,
        }
    }

    fn fetcher(source: MockTranscriptSource) -> TranscriptFetcher {
        TranscriptFetcher::new(Arc::new(source), default_languages())
    }

    #[test]
    fn test_find_prefers_manual_track() {
        let list = list(vec![handle("en", true), handle("fr", false), handle("en", false)]);
        let found = list.find("en").unwrap();
        assert!(!found.is_generated);
        assert!(list.find("de").is_none());
    }

    #[tokio::test]
    async fn test_hindi_only_uses_first_listing() {
        let mut source = MockTranscriptSource::new();
        source
            .expect_list_transcripts()
            .with(eq("vid"))
            .times(1)
            .returning(|_| Ok(list(vec![handle("hi", true)])));
        source
            .expect_fetch()
            .times(1)
            .returning(|h| Ok(entries(&format!("{} line", h.language_code))));
        source.expect_fetch_direct().times(0);

        match fetcher(source).fetch("vid").await {
            FetchOutcome::Success { entries, language_code } => {
                assert_eq!(language_code, "hi");
                assert_eq!(entries[0].text, "hi line");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_falls_back_to_second_preferred_language() {
        let mut source = MockTranscriptSource::new();
        source
            .expect_list_transcripts()
            .returning(|_| Ok(list(vec![handle("de", false), handle("en", true)])));
        source
            .expect_fetch()
            .times(1)
            .returning(|h| Ok(entries(&h.language_code)));

        match fetcher(source).fetch("vid").await {
            FetchOutcome::Success { language_code, .. } => assert_eq!(language_code, "en"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_falls_back_to_first_available() {
        let mut source = MockTranscriptSource::new();
        source
            .expect_list_transcripts()
            .returning(|_| Ok(list(vec![handle("ja", false), handle("de", true)])));
        source
            .expect_fetch()
            .times(1)
            .returning(|h| Ok(entries(&h.language_code)));

        match fetcher(source).fetch("vid").await {
            FetchOutcome::Success { language_code, .. } => assert_eq!(language_code, "ja"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_listing_is_not_found() {
        let mut source = MockTranscriptSource::new();
        source.expect_list_transcripts().returning(|_| Ok(list(Vec::new())));
        source.expect_fetch().times(0);
        source.expect_fetch_direct().times(0);

        assert!(matches!(fetcher(source).fetch("vid").await, FetchOutcome::NotFound));
    }

    #[tokio::test]
    async fn test_listing_failure_uses_direct_fetch() {
        let mut source = MockTranscriptSource::new();
        source
            .expect_list_transcripts()
            .returning(|_| Err(anyhow::anyhow!("Transcripts are disabled")));
        source
            .expect_fetch_direct()
            .with(eq("vid"))
            .times(1)
            .returning(|_| Ok(Some((entries("direct"), "en".to_string()))));

        match fetcher(source).fetch("vid").await {
            FetchOutcome::Success { entries, language_code } => {
                assert_eq!(language_code, "en");
                assert_eq!(entries[0].text, "direct");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_direct_fetch_without_transcript_is_not_found() {
        let mut source = MockTranscriptSource::new();
        source
            .expect_list_transcripts()
            .returning(|_| Err(anyhow::anyhow!("network unreachable")));
        source.expect_fetch_direct().returning(|_| Ok(None));

        assert!(matches!(fetcher(source).fetch("vid").await, FetchOutcome::NotFound));
    }

    #[tokio::test]
    async fn test_fetch_error_is_transient() {
        let mut source = MockTranscriptSource::new();
        source
            .expect_list_transcripts()
            .returning(|_| Ok(list(vec![handle("hi", false)])));
        source
            .expect_fetch()
            .returning(|_| Err(anyhow::anyhow!("HTTP 429")));

        assert!(matches!(
            fetcher(source).fetch("vid").await,
            FetchOutcome::TransientError(_)
        ));
    }

    #[tokio::test]
    async fn test_empty_preferred_track_moves_on() {
        let mut source = MockTranscriptSource::new();
        source
            .expect_list_transcripts()
            .returning(|_| Ok(list(vec![handle("fr", false), handle("hi", false)])));
        source.expect_fetch().times(2).returning(|h| {
            if h.language_code == "hi" {
                Ok(Vec::new())
            } else {
                Ok(entries("bonjour"))
            }
        });

        match fetcher(source).fetch("vid").await {
            FetchOutcome::Success { language_code, .. } => assert_eq!(language_code, "fr"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
