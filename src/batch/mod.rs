use anyhow::Context;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

pub mod progress;
pub mod retry;
pub mod selection;

pub use progress::{BatchEvent, ConsoleProgress, NoopSink, ProgressSink};
pub use retry::{process_video, RetryPolicy, VideoJob, VideoOutcome};
pub use selection::Selection;

use crate::extractors::Video;
use crate::output::{validate_output_dir, TranscriptWriter};
use crate::transcribe::TranscriptFetcher;
use crate::{Result, ScribeError};

/// A video that could not be saved after all attempts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedVideo {
    /// 1-based position within the batch
    pub serial: usize,
    pub title: String,
}

/// Aggregate outcome of one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<FailedVideo>,
    pub output_dir: PathBuf,
}

impl BatchResult {
    /// One-line status after the run
    pub fn status_line(&self) -> String {
        if self.failed == 0 {
            format!("Successfully downloaded {} transcripts!", self.succeeded)
        } else {
            format!("Downloaded {}, {} failed.", self.succeeded, self.failed)
        }
    }

    /// Completion report listing failed videos by serial number and title
    pub fn summary(&self) -> String {
        let mut message = String::from("Transcript extraction completed!\n");
        message.push_str(&format!("Successful: {}\n", self.succeeded));
        message.push_str(&format!("Failed: {}\n", self.failed));
        message.push_str(&format!("Files saved to: {}\n", self.output_dir.display()));

        if !self.failures.is_empty() {
            message.push_str("\nFailed Videos:\n");
            for failure in &self.failures {
                message.push_str(&format!("  {}. {}\n", failure.serial, failure.title));
            }
        }

        message
    }
}

/// Whether a batch is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

/// Holds the `Running` state; dropping it returns the orchestrator to `Idle`
#[derive(Debug)]
struct RunGuard {
    state: Arc<Mutex<RunState>>,
}

impl RunGuard {
    fn acquire(state: &Arc<Mutex<RunState>>) -> std::result::Result<Self, ScribeError> {
        let mut current = state.lock().unwrap_or_else(|e| e.into_inner());
        if *current == RunState::Running {
            return Err(ScribeError::BatchAlreadyRunning);
        }
        *current = RunState::Running;
        Ok(Self {
            state: Arc::clone(state),
        })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = RunState::Idle;
    }
}

/// Runs batches of transcript downloads, one at a time
pub struct BatchOrchestrator {
    fetcher: TranscriptFetcher,
    policy: RetryPolicy,
    reset_delay: Duration,
    state: Arc<Mutex<RunState>>,
}

impl BatchOrchestrator {
    pub fn new(fetcher: TranscriptFetcher, policy: RetryPolicy) -> Self {
        Self {
            fetcher,
            policy,
            reset_delay: Duration::from_secs(3),
            state: Arc::new(Mutex::new(RunState::Idle)),
        }
    }

    /// How long the final progress stays up before the reset event
    pub fn with_reset_delay(mut self, delay: Duration) -> Self {
        self.reset_delay = delay;
        self
    }

    pub fn state(&self) -> RunState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Validate and start a batch on a background task
    ///
    /// Empty selections, a batch already in flight and an invalid output
    /// directory are rejected before anything is spawned.
    pub fn start(
        &self,
        videos: Vec<Video>,
        output_dir: &Path,
        sink: Arc<dyn ProgressSink>,
    ) -> std::result::Result<JoinHandle<BatchResult>, ScribeError> {
        if videos.is_empty() {
            return Err(ScribeError::EmptySelection);
        }

        let guard = RunGuard::acquire(&self.state)?;
        validate_output_dir(output_dir)?;

        let fetcher = self.fetcher.clone();
        let policy = self.policy;
        let reset_delay = self.reset_delay;
        let output_dir = output_dir.to_path_buf();

        Ok(tokio::spawn(async move {
            let result = run_batch(&fetcher, &policy, videos, output_dir, sink.as_ref()).await;
            drop(guard);
            schedule_reset(sink, reset_delay);
            result
        }))
    }

    /// Start a batch and wait for its result
    pub async fn run(
        &self,
        videos: Vec<Video>,
        output_dir: &Path,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<BatchResult> {
        let handle = self.start(videos, output_dir, sink)?;
        handle.await.context("Batch worker failed")
    }
}

async fn run_batch(
    fetcher: &TranscriptFetcher,
    policy: &RetryPolicy,
    videos: Vec<Video>,
    output_dir: PathBuf,
    sink: &dyn ProgressSink,
) -> BatchResult {
    let total = videos.len();
    let mut writer = TranscriptWriter::new(&output_dir);
    let mut result = BatchResult {
        attempted: total,
        output_dir,
        ..BatchResult::default()
    };

    tracing::info!("Fetching transcripts for {} videos", total);
    sink.report(&BatchEvent::Started { total });

    for (index, video) in videos.iter().enumerate() {
        let position = index + 1;
        let path = writer.reserve_path(&video.title);
        let job = VideoJob {
            position,
            total,
            video,
            path: &path,
        };

        let outcome = process_video(fetcher, &writer, &job, policy, sink).await;
        let succeeded = outcome.is_saved();
        match outcome {
            VideoOutcome::Saved {
                path,
                language_code,
                attempts,
            } => {
                tracing::info!(
                    "Saved '{}' transcript for '{}' to {} (attempt {})",
                    language_code,
                    video.title,
                    path.display(),
                    attempts
                );
                result.succeeded += 1;
            }
            VideoOutcome::Failed {
                attempts,
                last_error,
            } => {
                tracing::error!(
                    video_id = %video.id,
                    "All {} attempts failed for '{}': {}",
                    attempts,
                    video.title,
                    last_error
                );
                result.failed += 1;
                result.failures.push(FailedVideo {
                    serial: position,
                    title: video.title.clone(),
                });
            }
        }

        sink.report(&BatchEvent::VideoFinished {
            position,
            total,
            percent: position as f64 / total as f64 * 100.0,
            succeeded,
        });
    }

    tracing::info!("{}", result.status_line());
    sink.report(&BatchEvent::Finished(result.clone()));

    result
}

/// Clear the final progress after `delay` without holding up the result
fn schedule_reset(sink: Arc<dyn ProgressSink>, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        sink.report(&BatchEvent::ProgressReset);
    });
}
