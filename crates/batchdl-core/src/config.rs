use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::engine::DownloadParams;

/// Target video quality. Serialized with the labels the settings UI uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Quality {
    #[default]
    #[serde(rename = "best")]
    Best,
    #[serde(rename = "4k")]
    Uhd2160,
    #[serde(rename = "2k")]
    Qhd1440,
    #[serde(rename = "1080")]
    Fhd1080,
    #[serde(rename = "720")]
    Hd720,
    #[serde(rename = "480")]
    Sd480,
    #[serde(rename = "360")]
    Sd360,
    /// Audio only, regardless of container.
    #[serde(rename = "audio")]
    Audio,
}

impl Quality {
    /// Maximum frame height for video qualities; `None` for best/audio.
    pub fn max_height(self) -> Option<u32> {
        match self {
            Quality::Uhd2160 => Some(2160),
            Quality::Qhd1440 => Some(1440),
            Quality::Fhd1080 => Some(1080),
            Quality::Hd720 => Some(720),
            Quality::Sd480 => Some(480),
            Quality::Sd360 => Some(360),
            Quality::Best | Quality::Audio => None,
        }
    }
}

/// Output container / audio format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    #[default]
    Mp4,
    Mkv,
    Webm,
    Mp3,
    M4a,
    Opus,
}

impl Container {
    pub fn as_str(self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::Mkv => "mkv",
            Container::Webm => "webm",
            Container::Mp3 => "mp3",
            Container::M4a => "m4a",
            Container::Opus => "opus",
        }
    }

    pub fn is_audio(self) -> bool {
        matches!(self, Container::Mp3 | Container::M4a | Container::Opus)
    }
}

/// Preferred video codec; `Auto` leaves the choice to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    #[default]
    Auto,
    H264,
    Vp9,
    Av1,
}

/// Audio bitrate for audio extraction; `Auto` means best available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AudioBitrate {
    #[default]
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "128")]
    Kbps128,
    #[serde(rename = "192")]
    Kbps192,
    #[serde(rename = "256")]
    Kbps256,
    #[serde(rename = "320")]
    Kbps320,
}

impl AudioBitrate {
    pub fn kbps(self) -> Option<u32> {
        match self {
            AudioBitrate::Auto => None,
            AudioBitrate::Kbps128 => Some(128),
            AudioBitrate::Kbps192 => Some(192),
            AudioBitrate::Kbps256 => Some(256),
            AudioBitrate::Kbps320 => Some(320),
        }
    }
}

/// Rejected value for a settings enum given on the command line.
#[derive(Debug, thiserror::Error)]
#[error("invalid {kind} {value:?} (expected one of: {expected})")]
pub struct ParseSettingError {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

impl FromStr for Quality {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().trim_end_matches('p') {
            "best" => Ok(Quality::Best),
            "4k" | "2160" => Ok(Quality::Uhd2160),
            "2k" | "1440" => Ok(Quality::Qhd1440),
            "1080" => Ok(Quality::Fhd1080),
            "720" => Ok(Quality::Hd720),
            "480" => Ok(Quality::Sd480),
            "360" => Ok(Quality::Sd360),
            "audio" => Ok(Quality::Audio),
            _ => Err(ParseSettingError {
                kind: "quality",
                value: s.to_string(),
                expected: "best, 4k, 2k, 1080, 720, 480, 360, audio",
            }),
        }
    }
}

impl FromStr for Container {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp4" => Ok(Container::Mp4),
            "mkv" => Ok(Container::Mkv),
            "webm" => Ok(Container::Webm),
            "mp3" => Ok(Container::Mp3),
            "m4a" => Ok(Container::M4a),
            "opus" => Ok(Container::Opus),
            _ => Err(ParseSettingError {
                kind: "format",
                value: s.to_string(),
                expected: "mp4, mkv, webm, mp3, m4a, opus",
            }),
        }
    }
}

fn default_concurrency_limit() -> usize {
    3
}

/// Active download settings. The batch controller snapshots these at every start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    pub quality: Quality,
    pub format: Container,
    pub video_codec: VideoCodec,
    pub audio_bitrate: AudioBitrate,
    /// Directory for finished files; empty means the working directory.
    pub output_path: PathBuf,
    /// Maximum number of jobs downloading at once (values below 1 act as 1).
    pub concurrency_limit: usize,
    /// Download whole playlists instead of the single linked item.
    pub download_playlist: bool,
    /// Stop after this many playlist items (None or 0 = no limit).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist_limit: Option<u32>,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            format: Container::default(),
            video_codec: VideoCodec::default(),
            audio_bitrate: AudioBitrate::default(),
            output_path: PathBuf::new(),
            concurrency_limit: default_concurrency_limit(),
            download_playlist: false,
            playlist_limit: None,
        }
    }
}

impl DownloadSettings {
    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit.max(1)
    }

    /// Engine parameters for one batch.
    pub fn params(&self) -> DownloadParams {
        DownloadParams {
            quality: self.quality,
            format: self.format,
            video_codec: self.video_codec,
            audio_bitrate: self.audio_bitrate,
            output_path: self.output_path.clone(),
            download_playlist: self.download_playlist,
            playlist_limit: self.playlist_limit.filter(|n| *n > 0),
        }
    }
}

/// External yt-dlp program settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Program name or path of the yt-dlp executable.
    pub program: PathBuf,
    /// Arguments placed before the generated ones, e.g. `["-m", "yt_dlp"]`
    /// when `program` is a Python interpreter.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub program_args: Vec<String>,
    /// Extra arguments passed before the URL on every invocation.
    pub extra_args: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("yt-dlp"),
            program_args: Vec::new(),
            extra_args: Vec::new(),
        }
    }
}

/// Global configuration loaded from `~/.config/batchdl/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchdlConfig {
    #[serde(default)]
    pub download: DownloadSettings,
    #[serde(default)]
    pub engine: EngineConfig,
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("batchdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<BatchdlConfig> {
    load_or_init_at(&config_path()?)
}

/// Same as [`load_or_init`] for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<BatchdlConfig> {
    if !path.exists() {
        let default_cfg = BatchdlConfig::default();
        let toml = render(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: BatchdlConfig = toml::from_str(&data)?;
    Ok(cfg)
}

/// TOML text for a configuration, as written to disk.
pub fn render(cfg: &BatchdlConfig) -> Result<String> {
    Ok(toml::to_string_pretty(cfg)?)
}
