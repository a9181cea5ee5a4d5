use chrono::{DateTime, Local};

use crate::transcribe::CaptionEntry;

/// Characters that are invalid in Windows filenames
const INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Maximum length of a sanitized filename stem, in characters
pub const MAX_FILENAME_CHARS: usize = 100;

/// Format a start time as `MM:SS`, truncating fractional seconds
pub fn format_timestamp(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Render a transcript as a markdown document
pub fn format_as_markdown(
    entries: &[CaptionEntry],
    title: &str,
    extracted_at: DateTime<Local>,
) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", title));
    output.push_str(&format!("**Video Title:** {}\n\n", title));
    output.push_str(&format!(
        "**Transcript extracted on:** {}\n\n",
        extracted_at.format("%Y-%m-%d %H:%M:%S")
    ));
    output.push_str("---\n\n");

    for entry in entries {
        output.push_str(&format!("**[{}]** {}\n\n", format_timestamp(entry.start), entry.text));
    }

    output
}

/// Turn a video title into a filename stem
///
/// Replaces `<>:"/\|?*` with underscores, collapses whitespace runs, trims and
/// truncates to [`MAX_FILENAME_CHARS`] characters.
pub fn sanitize_filename(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| if INVALID_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect();

    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");

    truncate_chars(&collapsed, MAX_FILENAME_CHARS)
}

/// Truncate to at most `max` characters and trim any trailing whitespace left behind
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].trim_end().to_string(),
        None => text.to_string(),
    }
}
