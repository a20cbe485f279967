//! yt-dlp command line construction.

use crate::config::{AudioBitrate, Container, Quality, VideoCodec};
use crate::engine::DownloadParams;

/// `-f` selector for a quality/container pair.
pub fn format_selector(quality: Quality, container: Container) -> String {
    if quality == Quality::Audio || container.is_audio() {
        return match container {
            Container::Mp3 => "bestaudio/best".to_string(),
            Container::Opus => "bestaudio[ext=webm]/bestaudio/best".to_string(),
            _ => "bestaudio[ext=m4a]/bestaudio/best".to_string(),
        };
    }

    match (container, quality.max_height()) {
        (Container::Mp4, Some(h)) => format!(
            "bestvideo[height<={h}][ext=mp4]+bestaudio[ext=m4a]/bestvideo[height<={h}]+bestaudio/best[height<={h}]/best"
        ),
        (Container::Mp4, None) => {
            "bestvideo[ext=mp4]+bestaudio[ext=m4a]/bestvideo+bestaudio/best".to_string()
        }
        (_, Some(h)) => format!("bestvideo[height<={h}]+bestaudio/best[height<={h}]/best"),
        (_, None) => "bestvideo+bestaudio/best".to_string(),
    }
}

/// Audio format passed to `--audio-format`; video containers fall back to mp3.
fn audio_format(container: Container) -> &'static str {
    if container.is_audio() {
        container.as_str()
    } else {
        "mp3"
    }
}

/// `--audio-quality` value: `0` (best VBR) unless a bitrate is pinned.
fn audio_quality(bitrate: AudioBitrate) -> String {
    match bitrate.kbps() {
        Some(kbps) => format!("{kbps}K"),
        None => "0".to_string(),
    }
}

/// `-S vcodec:` sort key, if a codec is preferred.
fn codec_sort_key(codec: VideoCodec) -> Option<&'static str> {
    match codec {
        VideoCodec::Auto => None,
        VideoCodec::H264 => Some("vcodec:h264"),
        VideoCodec::Vp9 => Some("vcodec:vp9"),
        VideoCodec::Av1 => Some("vcodec:av01"),
    }
}

/// Full argument list for one download. `extra` goes before the URL.
pub fn build_args(url: &str, params: &DownloadParams, extra: &[String]) -> Vec<String> {
    let output_template = params.output_path.join("%(title)s.%(ext)s");
    let mut args = vec![
        "--newline".to_string(),
        "-f".to_string(),
        format_selector(params.quality, params.format),
        "-o".to_string(),
        output_template.to_string_lossy().into_owned(),
    ];

    if params.download_playlist {
        if let Some(limit) = params.playlist_limit {
            args.push("--playlist-end".to_string());
            args.push(limit.to_string());
        }
    } else {
        args.push("--no-playlist".to_string());
    }

    if params.is_audio() {
        args.extend([
            "-x".to_string(),
            "--audio-format".to_string(),
            audio_format(params.format).to_string(),
            "--audio-quality".to_string(),
            audio_quality(params.audio_bitrate),
        ]);
    } else {
        args.push("--merge-output-format".to_string());
        args.push(params.format.as_str().to_string());
        if let Some(key) = codec_sort_key(params.video_codec) {
            args.push("-S".to_string());
            args.push(key.to_string());
        }
    }

    args.extend(extra.iter().cloned());
    args.push("--".to_string());
    args.push(url.to_string());
    args
}
