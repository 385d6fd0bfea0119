//! Unit conversions and artifact naming

use std::path::{Path, PathBuf};

/// Longest description prefix kept in an artifact file name
const MAX_KEY_STEM: usize = 64;

/// Convert fractional seconds to whole milliseconds
///
/// Rounds to nearest, ties to even.
///
/// # Examples
///
/// ```
/// use pagepulse::utils::seconds_to_millis;
///
/// assert_eq!(seconds_to_millis(0.2504), 250);
/// assert_eq!(seconds_to_millis(1.0), 1000);
/// ```
pub fn seconds_to_millis(seconds: f64) -> i64 {
    (seconds * 1000.0).round_ties_even() as i64
}

/// Convert a 0-1 category score to an integer percentage (0-100)
///
/// Rounds to nearest, ties to even, and clamps out-of-range input.
pub fn score_to_percent(score: f64) -> i64 {
    ((score * 100.0).round_ties_even() as i64).clamp(0, 100)
}

/// Build the artifact key for one input row of one run
///
/// The description is reduced to `[A-Za-z0-9_-]` for use as a file stem, then
/// suffixed with the row index and the run id so that rows sharing a
/// description never share a report file.
///
/// # Examples
///
/// ```
/// use pagepulse::utils::artifact_key;
///
/// assert_eq!(artifact_key("Home page", 3, 1700000000000), "Home_page-3-1700000000000");
/// assert_eq!(artifact_key("", 0, 42), "audit-0-42");
/// ```
pub fn artifact_key(description: &str, index: usize, run_id: i64) -> String {
    let stem: String = description
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_KEY_STEM)
        .collect();

    let stem = if stem.chars().all(|c| c == '_') {
        "audit"
    } else {
        stem.as_str()
    };

    format!("{}-{}-{}", stem, index, run_id)
}

/// Path of the JSON report for `key` inside `output_dir`
pub fn artifact_path(output_dir: &Path, key: &str) -> PathBuf {
    output_dir.join(format!("{}.json", key))
}
