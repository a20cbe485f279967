//! Line classification for pasted or imported URL lists.

use url::Url;

/// Outcome of inspecting one input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineVerdict<'a> {
    /// Trimmed URL that may become a job.
    Url(&'a str),
    Blank,
    /// Line starting with `#`.
    Comment,
    /// Not an absolute http(s) URL with a host.
    NotAUrl,
}

/// Classifies a single line of input. Surrounding whitespace is ignored.
pub fn classify_line(line: &str) -> LineVerdict<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        LineVerdict::Blank
    } else if trimmed.starts_with('#') {
        LineVerdict::Comment
    } else if is_plausible_url(trimmed) {
        LineVerdict::Url(trimmed)
    } else {
        LineVerdict::NotAUrl
    }
}

/// Returns the trimmed URL when the line would be accepted, `None` otherwise.
pub fn accepted_url(line: &str) -> Option<&str> {
    match classify_line(line) {
        LineVerdict::Url(url) => Some(url),
        _ => None,
    }
}

/// True for absolute `http`/`https` URLs with a non-empty host.
pub fn is_plausible_url(s: &str) -> bool {
    let Ok(parsed) = Url::parse(s.trim()) else {
        return false;
    };
    matches!(parsed.scheme(), "http" | "https")
        && parsed.host_str().is_some_and(|h| !h.is_empty())
}
