use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

use super::BatchResult;
use crate::utils::truncate_title;

/// Progress notifications emitted while a batch runs
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Started {
        total: usize,
    },
    Attempt {
        position: usize,
        total: usize,
        attempt: u32,
        title: String,
    },
    AttemptFinished {
        position: usize,
        total: usize,
        attempt: u32,
        succeeded: bool,
    },
    Retrying {
        position: usize,
        next_attempt: u32,
        title: String,
    },
    VideoFinished {
        position: usize,
        total: usize,
        percent: f64,
        succeeded: bool,
    },
    Finished(BatchResult),
    ProgressReset,
}

/// Receiver of batch progress
pub trait ProgressSink: Send + Sync {
    fn report(&self, event: &BatchEvent);
}

/// Sink that drops every event
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn report(&self, _event: &BatchEvent) {}
}

impl ProgressSink for tokio::sync::mpsc::UnboundedSender<BatchEvent> {
    fn report(&self, event: &BatchEvent) {
        let _ = self.send(event.clone());
    }
}

/// Terminal progress bar on a 0-100 scale
pub struct ConsoleProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        let guard = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(bar) = guard.as_ref() {
            f(bar);
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn report(&self, event: &BatchEvent) {
        match event {
            BatchEvent::Started { total } => {
                let bar = ProgressBar::new(100);
                let style = ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-");
                bar.set_style(style);
                bar.set_message(format!("Fetching transcripts for {} videos...", total));
                *self.bar.lock().unwrap_or_else(|e| e.into_inner()) = Some(bar);
            }
            BatchEvent::Attempt {
                position,
                total,
                attempt,
                title,
            } => self.with_bar(|bar| {
                let mut message = format!(
                    "Processing ({}/{}): {}",
                    position,
                    total,
                    truncate_title(title, 40)
                );
                if *attempt > 1 {
                    message.push_str(&format!(" (Attempt {})", attempt));
                }
                bar.set_message(message);
            }),
            BatchEvent::AttemptFinished {
                position,
                total,
                attempt,
                succeeded: false,
            } => self.with_bar(|bar| {
                bar.set_message(format!("Attempt {} failed ({}/{})", attempt, position, total));
            }),
            BatchEvent::AttemptFinished { .. } => {}
            BatchEvent::Retrying {
                next_attempt,
                title,
                ..
            } => self.with_bar(|bar| {
                bar.set_message(format!(
                    "Retrying {} (Attempt {})",
                    truncate_title(title, 40),
                    next_attempt
                ));
            }),
            BatchEvent::VideoFinished { percent, .. } => {
                self.with_bar(|bar| bar.set_position(percent.round() as u64));
            }
            BatchEvent::Finished(result) => self.with_bar(|bar| {
                bar.set_position(100);
                bar.finish_with_message(result.status_line());
            }),
            BatchEvent::ProgressReset => {
                if let Some(bar) = self.bar.lock().unwrap_or_else(|e| e.into_inner()).take() {
                    bar.finish_and_clear();
                }
            }
        }
    }
}
