//! URL input modeling: which lines of user input become jobs, and which
//! URLs point at playlists.
//!
//! Source-specific URL formats are not validated here; a line only has to be an
//! absolute http(s) URL with a host to be accepted.

mod classify;
mod playlist;

pub use classify::{accepted_url, classify_line, is_plausible_url, LineVerdict};
pub use playlist::is_playlist_url;
