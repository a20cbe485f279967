//! yt-dlp `--newline` output parsing.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use crate::job::JobId;
use crate::progress::ProgressEvent;

fn playlist_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Downloading item (\d+) of (\d+)").expect("valid regex"))
}

fn progress_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[download\]\s+(\d+(?:\.\d+)?)%(?:.*?\bat\s+(\S+))?(?:.*?\bETA\s+(\S+))?")
            .expect("valid regex")
    })
}

/// Lines naming the output file. Audio extraction reports the final name only
/// on its own line, after the download's.
const DESTINATION_PREFIXES: [&str; 2] = [
    "[download] Destination:",
    "[ExtractAudio] Destination:",
];

fn destination(line: &str) -> Option<&str> {
    DESTINATION_PREFIXES
        .iter()
        .find_map(|prefix| line.strip_prefix(prefix))
        .map(str::trim)
}

/// Title and playlist position seen so far in one run's output.
#[derive(Debug, Default)]
pub struct OutputTracker {
    title: Option<String>,
    playlist_index: Option<u32>,
    playlist_total: Option<u32>,
}

impl OutputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one stdout line into the tracker. Returns a `downloading`
    /// notification when the line carries a progress percentage.
    pub fn observe(&mut self, id: JobId, line: &str) -> Option<ProgressEvent> {
        if let Some(caps) = playlist_item_re().captures(line) {
            self.playlist_index = caps[1].parse().ok();
            self.playlist_total = caps[2].parse().ok();
        }

        if let Some(path) = destination(line) {
            if let Some(stem) = Path::new(path).file_stem() {
                self.title = Some(stem.to_string_lossy().into_owned());
            }
            return None;
        }

        let caps = progress_re().captures(line)?;
        let percent: f64 = caps[1].parse().ok()?;
        let speed = caps.get(2).map_or("", |m| m.as_str());
        let eta = caps.get(3).map_or("", |m| m.as_str());
        Some(self.decorate(ProgressEvent::downloading(id, percent, speed, eta)))
    }

    /// Notification sent once the process exited successfully.
    pub fn finished(&self, id: JobId) -> ProgressEvent {
        self.decorate(ProgressEvent::finished(id))
    }

    fn decorate(&self, mut event: ProgressEvent) -> ProgressEvent {
        event.title = self.title.clone();
        event.playlist_index = self.playlist_index;
        event.playlist_total = self.playlist_total;
        event
    }
}

/// Text after `ERROR:` on a stderr line, if it is one.
pub fn error_message(line: &str) -> Option<&str> {
    line.trim_start()
        .strip_prefix("ERROR:")
        .map(str::trim)
        .filter(|m| !m.is_empty())
}
