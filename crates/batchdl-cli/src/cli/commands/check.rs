//! `batchdl check` – dry run of URL acceptance.

use batchdl_core::url_model::{classify_line, is_playlist_url, LineVerdict};
use std::collections::HashSet;

/// Label for one input line, or `None` for lines that are silently skipped.
pub(crate) fn verdict_label(line: &str, seen: &mut HashSet<String>) -> Option<&'static str> {
    match classify_line(line) {
        LineVerdict::Blank | LineVerdict::Comment => None,
        LineVerdict::NotAUrl => Some("rejected"),
        LineVerdict::Url(url) if !seen.insert(url.to_string()) => Some("duplicate"),
        LineVerdict::Url(url) if is_playlist_url(url) => Some("playlist"),
        LineVerdict::Url(_) => Some("ok"),
    }
}

pub fn run_check(lines: &[String]) {
    let mut seen = HashSet::new();
    let (mut accepted, mut duplicates, mut rejected) = (0usize, 0usize, 0usize);
    for line in lines {
        let Some(label) = verdict_label(line, &mut seen) else {
            continue;
        };
        match label {
            "duplicate" => duplicates += 1,
            "rejected" => rejected += 1,
            _ => accepted += 1,
        }
        println!("{:<10} {}", label, line.trim());
    }
    println!(
        "{} accepted, {} duplicate(s), {} rejected",
        accepted, duplicates, rejected
    );
}
