//! Best-effort `path:line - text` extraction from finding titles.
//!
//! Agent findings sometimes carry their location only inside the title,
//! e.g. `src/App.java:66 - Null check missing`. The parser is fail-closed:
//! anything that looks unsafe or ambiguous yields no location at all.

use regex::Regex;
use std::sync::LazyLock;

/// Titles longer than this are cut before matching.
const MAX_TITLE_CHARS: usize = 500;

static TITLE_LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_.\-/]+):([0-9]+)(?:-([0-9]+))?\s*-\s*(.+)$")
        .expect("title location pattern is valid")
});

/// Location recovered from a title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLocation {
    pub file_path: String,
    pub line_start: u32,
    pub line_end: Option<u32>,
    /// Title text after the `path:line - ` prefix
    pub remainder_title: String,
}

/// Extract a relative file location from the start of `title`.
///
/// Returns `None` for absolute paths, `..` segments, NUL bytes, and start
/// lines that are zero or do not fit a line number.
#[must_use]
pub fn parse_title_location(title: &str) -> Option<ParsedLocation> {
    let capped: String = title.chars().take(MAX_TITLE_CHARS).collect();
    let caps = TITLE_LOCATION.captures(&capped)?;

    let path = caps.get(1)?.as_str();
    if path.starts_with('/') || path.contains("..") || path.contains('\0') {
        return None;
    }

    let line_start = caps
        .get(2)?
        .as_str()
        .parse::<u32>()
        .ok()
        .filter(|line| *line > 0)?;
    let line_end = caps
        .get(3)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|line| *line > 0);

    Some(ParsedLocation {
        file_path: path.to_string(),
        line_start,
        line_end,
        remainder_title: caps.get(4)?.as_str().to_string(),
    })
}
