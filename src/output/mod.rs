use anyhow::{Context, Result};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::ScribeError;

pub mod formatters;

pub use formatters::*;

/// Check that the output directory is given and exists
pub fn validate_output_dir(dir: &Path) -> std::result::Result<(), ScribeError> {
    if dir.as_os_str().is_empty() || dir.to_string_lossy().trim().is_empty() {
        return Err(ScribeError::OutputDirectoryInvalid(
            "Please select an output directory".to_string(),
        ));
    }

    if !dir.exists() {
        return Err(ScribeError::OutputDirectoryInvalid(format!(
            "Selected output directory does not exist: {}",
            dir.display()
        )));
    }

    if !dir.is_dir() {
        return Err(ScribeError::OutputDirectoryInvalid(format!(
            "Not a directory: {}",
            dir.display()
        )));
    }

    Ok(())
}

/// Writes transcript documents into one output directory for a single batch
///
/// Distinct titles that sanitize to the same filename get a numbered suffix
/// instead of overwriting each other.
#[derive(Debug)]
pub struct TranscriptWriter {
    output_dir: PathBuf,
    reserved: HashSet<String>,
}

impl TranscriptWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            reserved: HashSet::new(),
        }
    }

    /// Pick the file path for a video title, unique within this writer
    pub fn reserve_path(&mut self, title: &str) -> PathBuf {
        let stem = sanitize_filename(title);

        let mut candidate = stem.clone();
        let mut counter = 2;
        while !self.reserved.insert(candidate.to_lowercase()) {
            let suffix = format!(" ({})", counter);
            let room = MAX_FILENAME_CHARS.saturating_sub(suffix.chars().count());
            let base = truncate_chars(&stem, room);
            candidate = format!("{}{}", base, suffix);
            counter += 1;
        }

        if candidate != stem {
            tracing::info!(
                "Filename for '{}' already used in this run, saving as '{}.md'",
                title,
                candidate
            );
        }

        self.output_dir.join(format!("{}.md", candidate))
    }

    /// Write a document atomically: temp file in the target directory, then rename
    pub fn write(&self, path: &Path, content: &str) -> Result<()> {
        let dir = path.parent().unwrap_or(&self.output_dir);

        let mut file = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        file.write_all(content.as_bytes())
            .context("Failed to write transcript")?;
        file.persist(path)
            .with_context(|| format!("Failed to save {}", path.display()))?;

        tracing::debug!("Saved transcript to {}", path.display());
        Ok(())
    }
}
