use chrono::Local;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{BatchEvent, ProgressSink};
use crate::extractors::Video;
use crate::output::{format_as_markdown, TranscriptWriter};
use crate::transcribe::{FetchOutcome, TranscriptFetcher};
use crate::{Result, ScribeError};

/// Bounded retry with a fixed delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Wait before each retry
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// One video of a running batch
#[derive(Debug)]
pub struct VideoJob<'a> {
    /// 1-based position within the batch
    pub position: usize,
    pub total: usize,
    pub video: &'a Video,
    pub path: &'a Path,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VideoOutcome {
    Saved {
        path: PathBuf,
        language_code: String,
        attempts: u32,
    },
    Failed {
        attempts: u32,
        last_error: String,
    },
}

impl VideoOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, VideoOutcome::Saved { .. })
    }
}

/// Fetch, format and save one video, retrying any failure
pub async fn process_video(
    fetcher: &TranscriptFetcher,
    writer: &TranscriptWriter,
    job: &VideoJob<'_>,
    policy: &RetryPolicy,
    sink: &dyn ProgressSink,
) -> VideoOutcome {
    let max_attempts = policy.max_attempts.max(1);
    let title = &job.video.title;
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        sink.report(&BatchEvent::Attempt {
            position: job.position,
            total: job.total,
            attempt,
            title: title.clone(),
        });

        tracing::debug!(video_id = %job.video.id, attempt, "Processing '{}'", title);

        let result = attempt_once(fetcher, writer, job).await;
        sink.report(&BatchEvent::AttemptFinished {
            position: job.position,
            total: job.total,
            attempt,
            succeeded: result.is_ok(),
        });

        match result {
            Ok(language_code) => {
                return VideoOutcome::Saved {
                    path: job.path.to_path_buf(),
                    language_code,
                    attempts: attempt,
                };
            }
            Err(e) => {
                tracing::warn!(
                    video_id = %job.video.id,
                    "Attempt {} failed for '{}': {:#}",
                    attempt,
                    title,
                    e
                );
                last_error = format!("{:#}", e);

                if attempt < max_attempts {
                    sink.report(&BatchEvent::Retrying {
                        position: job.position,
                        next_attempt: attempt + 1,
                        title: title.clone(),
                    });
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }

    VideoOutcome::Failed {
        attempts: max_attempts,
        last_error,
    }
}

async fn attempt_once(
    fetcher: &TranscriptFetcher,
    writer: &TranscriptWriter,
    job: &VideoJob<'_>,
) -> Result<String> {
    let (entries, language_code) = match fetcher.fetch(&job.video.id).await {
        FetchOutcome::Success { entries, language_code } => (entries, language_code),
        FetchOutcome::NotFound => {
            return Err(ScribeError::TranscriptUnavailable(job.video.id.clone()).into());
        }
        FetchOutcome::TransientError(e) => {
            return Err(ScribeError::TransientFetch(format!("{:#}", e)).into());
        }
    };

    let markdown = format_as_markdown(&entries, &job.video.title, Local::now());
    writer.write(job.path, &markdown)?;

    Ok(language_code)
}
