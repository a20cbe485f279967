//! Download engine seam.
//!
//! The orchestrator never fetches or transcodes media itself. It hands each job
//! to a [`DownloadEngine`], awaits the terminal result, and receives progress on
//! a separate channel (see [`crate::progress`]). [`ytdlp::YtDlpEngine`] drives an
//! external yt-dlp process.

pub mod ytdlp;

use async_trait::async_trait;
use std::path::PathBuf;

use crate::config::{AudioBitrate, Container, Quality, VideoCodec};
use crate::job::JobId;

/// Per-batch parameters passed to every engine invocation of that batch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DownloadParams {
    pub quality: Quality,
    pub format: Container,
    pub video_codec: VideoCodec,
    pub audio_bitrate: AudioBitrate,
    pub output_path: PathBuf,
    pub download_playlist: bool,
    pub playlist_limit: Option<u32>,
}

impl DownloadParams {
    /// Audio extraction instead of a video download.
    pub fn is_audio(&self) -> bool {
        self.quality == Quality::Audio || self.format.is_audio()
    }
}

/// Failure of one engine invocation. Its `Display` text becomes the job's error.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine ran and reported a failure.
    #[error("{0}")]
    Failed(String),
    /// The run was interrupted by [`DownloadEngine::cancel`].
    #[error("download cancelled")]
    Cancelled,
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("engine I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// External component that performs one download per call.
#[async_trait]
pub trait DownloadEngine: Send + Sync {
    /// Runs the download for `job_id` to completion or failure. Progress for
    /// the job is reported out of band, addressed by `job_id`.
    async fn run(
        &self,
        job_id: JobId,
        url: &str,
        params: &DownloadParams,
    ) -> Result<(), EngineError>;

    /// Best-effort abort of whatever this engine currently has running.
    fn cancel(&self);
}
