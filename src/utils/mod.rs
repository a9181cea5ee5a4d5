use anyhow::Result;

use crate::extractors::youtube::YtDlp;

/// Shorten a title for display, marking the cut with `...`
pub fn truncate_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() <= max_chars {
        return title.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let cut: String = title.chars().take(keep).collect();
    format!("{}...", cut)
}

/// Parse 1-based video numbers like `1,3,5-7` into 0-based indices
pub fn parse_index_ranges(numbers: &str) -> Result<Vec<usize>> {
    let mut indices = Vec::new();

    for part in numbers.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (start, end) = match part.split_once('-') {
            Some((start, end)) => (parse_number(start)?, parse_number(end)?),
            None => {
                let n = parse_number(part)?;
                (n, n)
            }
        };

        if start > end {
            anyhow::bail!("Invalid range: {}", part);
        }

        indices.extend((start..=end).map(|n| n - 1));
    }

    if indices.is_empty() {
        anyhow::bail!("No video numbers given");
    }

    indices.sort_unstable();
    indices.dedup();
    Ok(indices)
}

fn parse_number(text: &str) -> Result<usize> {
    let n: usize = text
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid video number: {}", text.trim()))?;
    if n == 0 {
        anyhow::bail!("Video numbers start at 1");
    }
    Ok(n)
}

/// Check if the current environment has required tools
pub async fn check_dependencies(ytdlp: &YtDlp) -> Vec<String> {
    let mut missing = Vec::new();

    if !ytdlp.check_availability().await {
        missing.push("yt-dlp - required for playlist and transcript listing".to_string());
    }

    missing
}
