use crate::extractors::Video;
use crate::utils::parse_index_ranges;
use crate::{Result, ScribeError};

/// Which videos of a loaded playlist are selected; every video starts selected
#[derive(Debug, Clone, Default)]
pub struct Selection {
    videos: Vec<Video>,
    selected: Vec<bool>,
}

impl Selection {
    pub fn new(videos: Vec<Video>) -> Self {
        let selected = vec![true; videos.len()];
        Self { videos, selected }
    }

    pub fn select_all(&mut self) {
        self.selected.iter_mut().for_each(|s| *s = true);
    }

    pub fn deselect_all(&mut self) {
        self.selected.iter_mut().for_each(|s| *s = false);
    }

    /// Set the selection state of the video at a 0-based index
    pub fn set(&mut self, index: usize, selected: bool) -> std::result::Result<(), ScribeError> {
        let len = self.videos.len();
        let slot = self
            .selected
            .get_mut(index)
            .ok_or(ScribeError::SelectionOutOfRange { index: index + 1, len })?;
        *slot = selected;
        Ok(())
    }

    /// Apply 1-based video numbers like `1,3,5-7`
    ///
    /// Without `select` every video is selected; with it only the listed
    /// ones are. `exclude` is applied last and wins over `select`.
    pub fn apply(&mut self, select: Option<&str>, exclude: Option<&str>) -> Result<()> {
        match select {
            Some(numbers) => {
                self.deselect_all();
                for index in parse_index_ranges(numbers)? {
                    self.set(index, true)?;
                }
            }
            None => self.select_all(),
        }

        if let Some(numbers) = exclude {
            for index in parse_index_ranges(numbers)? {
                self.set(index, false)?;
            }
        }

        Ok(())
    }

    pub fn selected_count(&self) -> usize {
        self.selected.iter().filter(|s| **s).count()
    }

    /// Selected videos in playlist order
    ///
    /// The returned list is owned; later selection changes do not affect it.
    pub fn snapshot(&self) -> Vec<Video> {
        self.videos
            .iter()
            .zip(&self.selected)
            .filter(|(_, selected)| **selected)
            .map(|(video, _)| video.clone())
            .collect()
    }
}
