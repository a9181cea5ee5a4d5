use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

pub mod youtube;

use crate::{Result, ScribeError};
use youtube::YtDlp;

/// Placeholder used when the listing service has no title for an entry
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// A single video from a resolved playlist
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub url: String,
}

/// Flattened playlist listing as returned by the listing service
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistListing {
    /// Missing when the service found nothing; items are null for deleted or private videos
    #[serde(default)]
    pub entries: Option<Vec<Option<PlaylistEntry>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl PlaylistEntry {
    fn into_video(self) -> Video {
        let id = self.id.unwrap_or_default();
        let url = self.url.unwrap_or_else(|| youtube::watch_url(&id));
        Video {
            title: self.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            id,
            url,
        }
    }
}

/// Service that lists the entries of a playlist
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaylistSource: Send + Sync {
    /// List up to `max_entries` entries of the playlist, flattened
    async fn list_entries(&self, playlist_id: &str, max_entries: usize) -> Result<PlaylistListing>;
}

/// Playlist listing backed by `yt-dlp --flat-playlist`
pub struct YtDlpPlaylistSource {
    ytdlp: YtDlp,
}

impl YtDlpPlaylistSource {
    pub fn new(ytdlp: YtDlp) -> Self {
        Self { ytdlp }
    }
}

#[async_trait]
impl PlaylistSource for YtDlpPlaylistSource {
    async fn list_entries(&self, playlist_id: &str, max_entries: usize) -> Result<PlaylistListing> {
        let info = self.ytdlp.dump_playlist(playlist_id, max_entries).await?;
        Ok(serde_json::from_value(info)?)
    }
}

/// Extract the playlist id from a youtube.com or youtu.be URL carrying a `list` parameter
pub fn extract_playlist_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.to_lowercase();

    let recognized = host == "youtube.com"
        || host.ends_with(".youtube.com")
        || host == "youtu.be"
        || host == "www.youtu.be";
    if !recognized {
        return None;
    }

    let playlist_id = parsed
        .query_pairs()
        .find(|(key, value)| key == "list" && !value.is_empty())
        .map(|(_, value)| value.into_owned());

    tracing::debug!(url, ?playlist_id, "Extracted playlist id");
    playlist_id
}

/// Turn a listing into videos, skipping null entries and keeping playlist order
pub fn videos_from_listing(listing: PlaylistListing) -> Vec<Video> {
    listing
        .entries
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .map(PlaylistEntry::into_video)
        .collect()
}

/// Resolves playlist URLs into ordered video lists
pub struct PlaylistResolver {
    source: Arc<dyn PlaylistSource>,
    max_entries: usize,
}

impl PlaylistResolver {
    pub fn new(source: Arc<dyn PlaylistSource>, max_entries: usize) -> Self {
        Self { source, max_entries }
    }

    /// Resolve a playlist URL into its videos
    ///
    /// A listing failure and an empty listing are both reported as
    /// [`ScribeError::NoVideosFound`]; the listing error is only logged.
    pub async fn resolve(&self, url: &str) -> Result<Vec<Video>> {
        let playlist_id = extract_playlist_id(url)
            .ok_or_else(|| ScribeError::InvalidPlaylistUrl(url.to_string()))?;

        tracing::info!("Loading playlist {}", playlist_id);

        let listing = match self.source.list_entries(&playlist_id, self.max_entries).await {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!("Error loading playlist {}: {:#}", playlist_id, e);
                return Err(ScribeError::NoVideosFound.into());
            }
        };

        let videos = videos_from_listing(listing);
        if videos.is_empty() {
            return Err(ScribeError::NoVideosFound.into());
        }

        tracing::info!("Loaded {} videos from playlist", videos.len());
        Ok(videos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn listing(json: &str) -> PlaylistListing {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_extract_playlist_id_long_form() {
        assert_eq!(
            extract_playlist_id(
                "https://www.youtube.com/playlist?list=PLx0sYbCqOb8TBPRdmBHs5Iftvv9TPboYG"
            ),
            Some("PLx0sYbCqOb8TBPRdmBHs5Iftvv9TPboYG".to_string())
        );
        assert_eq!(
            extract_playlist_id("https://youtube.com/watch?v=abc&list=PL123&index=2"),
            Some("PL123".to_string())
        );
        assert_eq!(
            extract_playlist_id("https://m.youtube.com/playlist?list=PL123"),
            Some("PL123".to_string())
        );
        assert_eq!(
            extract_playlist_id("https://music.youtube.com/playlist?list=OLAK5uy"),
            Some("OLAK5uy".to_string())
        );
    }

    #[test]
    fn test_extract_playlist_id_short_link() {
        assert_eq!(
            extract_playlist_id("https://youtu.be/dQw4w9WgXcQ?list=PL456"),
            Some("PL456".to_string())
        );
    }

    #[test]
    fn test_extract_playlist_id_decodes_value() {
        assert_eq!(
            extract_playlist_id("https://www.youtube.com/playlist?list=PL%2Dabc%20def"),
            Some("PL-abc def".to_string())
        );
    }

    #[test]
    fn test_extract_playlist_id_rejects_other_urls() {
        assert_eq!(extract_playlist_id("https://vimeo.com/playlist?list=PL123"), None);
        assert_eq!(extract_playlist_id("https://www.youtube.com/watch?v=abc"), None);
        assert_eq!(extract_playlist_id("https://www.youtube.com/playlist?list="), None);
        assert_eq!(extract_playlist_id("youtube.com/playlist?list=PL123"), None);
        assert_eq!(extract_playlist_id("not a url"), None);
        assert_eq!(extract_playlist_id(""), None);
    }

    #[test]
    fn test_videos_from_listing_skips_null_entries() {
        let videos = videos_from_listing(listing(
            r#"{"entries": [
                {"id": "a1", "title": "First", "url": "https://www.youtube.com/watch?v=a1"},
                null,
                {"id": "c3", "title": "Third"}
            ]}"#,
        ));

        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].id, "a1");
        assert_eq!(videos[1].id, "c3");
        assert_eq!(videos[1].url, "https://www.youtube.com/watch?v=c3");
    }

    #[test]
    fn test_videos_from_listing_placeholder_title() {
        let videos = videos_from_listing(listing(r#"{"entries": [{"id": "x"}]}"#));
        assert_eq!(videos[0].title, UNKNOWN_TITLE);
    }

    #[tokio::test]
    async fn test_resolve_returns_videos_in_order() {
        let mut source = MockPlaylistSource::new();
        source
            .expect_list_entries()
            .with(eq("PL123"), eq(1000))
            .times(1)
            .returning(|_, _| {
                Ok(serde_json::from_str(
                    r#"{"entries": [{"id": "b", "title": "B"}, null, {"id": "a", "title": "A"}]}"#,
                )?)
            });

        let resolver = PlaylistResolver::new(Arc::new(source), 1000);
        let videos = resolver
            .resolve("https://www.youtube.com/playlist?list=PL123")
            .await
            .unwrap();

        let titles: Vec<_> = videos.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A"]);
    }

    #[tokio::test]
    async fn test_resolve_invalid_url_never_queries_service() {
        let mut source = MockPlaylistSource::new();
        source.expect_list_entries().times(0);

        let resolver = PlaylistResolver::new(Arc::new(source), 1000);
        let err = resolver.resolve("https://example.com/?list=PL1").await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ScribeError>(),
            Some(ScribeError::InvalidPlaylistUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_missing_entries_is_no_videos_found() {
        let mut source = MockPlaylistSource::new();
        source
            .expect_list_entries()
            .returning(|_, _| Ok(PlaylistListing::default()));

        let resolver = PlaylistResolver::new(Arc::new(source), 1000);
        let err = resolver
            .resolve("https://www.youtube.com/playlist?list=PL1")
            .await
            .unwrap_err();

        assert!(matches!(err.downcast_ref::<ScribeError>(), Some(ScribeError::NoVideosFound)));
    }

    #[tokio::test]
    async fn test_resolve_listing_failure_is_no_videos_found() {
        let mut source = MockPlaylistSource::new();
        source
            .expect_list_entries()
            .returning(|_, _| Err(anyhow::anyhow!("yt-dlp failed: HTTP Error 404")));

        let resolver = PlaylistResolver::new(Arc::new(source), 1000);
        let err = resolver
            .resolve("https://youtu.be/abc?list=PL1")
            .await
            .unwrap_err();

        assert!(matches!(err.downcast_ref::<ScribeError>(), Some(ScribeError::NoVideosFound)));
    }
}
