//! Playlist heuristic.

use url::Url;

/// Query parameter that identifies a playlist (`?list=...`).
const PLAYLIST_PARAM: &str = "list";

/// True if the URL carries a non-empty playlist query parameter.
pub fn is_playlist_url(url: &str) -> bool {
    match Url::parse(url.trim()) {
        Ok(parsed) => parsed
            .query_pairs()
            .any(|(k, v)| k == PLAYLIST_PARAM && !v.is_empty()),
        Err(_) => false,
    }
}
