//! TubeScribe - download YouTube playlist transcripts as timestamped markdown
//!
//! This library resolves a playlist URL into its videos, fetches a transcript for each
//! selected video through an ordered language fallback chain, retries failed videos and
//! writes one markdown document per video.

pub mod batch;
pub mod cli;
pub mod config;
pub mod extractors;
pub mod output;
pub mod transcribe;
pub mod utils;

pub use batch::{BatchEvent, BatchOrchestrator, BatchResult, ProgressSink, RetryPolicy, Selection};
pub use cli::{Cli, Commands};
pub use config::Config;
pub use extractors::{extract_playlist_id, PlaylistResolver, PlaylistSource, Video};
pub use transcribe::{CaptionEntry, FetchOutcome, TranscriptFetcher, TranscriptSource};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to transcript extraction
#[derive(thiserror::Error, Debug)]
pub enum ScribeError {
    #[error("Invalid playlist URL: {0}")]
    InvalidPlaylistUrl(String),

    #[error("No videos found in playlist")]
    NoVideosFound,

    #[error("No transcript available for video {0}")]
    TranscriptUnavailable(String),

    #[error("Transient fetch error: {0}")]
    TransientFetch(String),

    #[error("Output directory is invalid: {0}")]
    OutputDirectoryInvalid(String),

    #[error("No videos selected. Please select at least one video.")]
    EmptySelection,

    #[error("Already fetching transcripts. Please wait.")]
    BatchAlreadyRunning,

    #[error("Video number {index} is out of range (playlist has {len} videos)")]
    SelectionOutOfRange { index: usize, len: usize },
}
