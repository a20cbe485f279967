//! CLI for the batchdl download queue.

mod commands;

use anyhow::Result;
use batchdl_core::config::{self, Container, DownloadSettings, Quality};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use commands::{collect_lines, run_batch, run_check, run_show_config};

/// Top-level CLI for batchdl.
#[derive(Debug, Parser)]
#[command(name = "batchdl")]
#[command(about = "batchdl: run a queue of yt-dlp downloads with bounded concurrency", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Where the URL list comes from: positional arguments and/or a file.
#[derive(Debug, Args)]
pub struct UrlInput {
    /// URLs to download. Blank lines and `#` comments are ignored.
    pub urls: Vec<String>,

    /// Read additional URLs from a file, one per line.
    #[arg(long, short = 'f', value_name = "PATH")]
    pub file: Option<PathBuf>,
}

/// Per-run overrides of the `[download]` config section.
#[derive(Debug, Default, Args)]
pub struct SettingsOverrides {
    /// Run up to N downloads at once.
    #[arg(long, short = 'j', value_name = "N")]
    pub jobs: Option<usize>,

    /// Download whole playlists instead of only the linked item.
    #[arg(long)]
    pub playlist: bool,

    /// Stop each playlist after N items (implies --playlist).
    #[arg(long, value_name = "N")]
    pub playlist_limit: Option<u32>,

    /// Output directory.
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Quality: best, 4k, 2k, 1080, 720, 480, 360 or audio.
    #[arg(long, short = 'q')]
    pub quality: Option<Quality>,

    /// Container or audio format: mp4, mkv, webm, mp3, m4a or opus.
    #[arg(long)]
    pub format: Option<Container>,
}

impl SettingsOverrides {
    pub fn apply(&self, settings: &mut DownloadSettings) {
        if let Some(jobs) = self.jobs {
            settings.concurrency_limit = jobs;
        }
        if self.playlist || self.playlist_limit.is_some() {
            settings.download_playlist = true;
        }
        if self.playlist_limit.is_some() {
            settings.playlist_limit = self.playlist_limit;
        }
        if let Some(ref output) = self.output {
            settings.output_path.clone_from(output);
        }
        if let Some(quality) = self.quality {
            settings.quality = quality;
        }
        if let Some(format) = self.format {
            settings.format = format;
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download every given URL, then print a per-job summary.
    Run {
        #[command(flatten)]
        input: UrlInput,
        #[command(flatten)]
        overrides: SettingsOverrides,
    },

    /// Show which input lines would be queued, without downloading.
    Check {
        #[command(flatten)]
        input: UrlInput,
    },

    /// Print the config file path and the active settings.
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Run { input, overrides } => {
                let lines = collect_lines(&input.urls, input.file.as_deref())?;
                run_batch(&cfg, &overrides, lines).await?;
            }
            CliCommand::Check { input } => {
                let lines = collect_lines(&input.urls, input.file.as_deref())?;
                run_check(&lines);
            }
            CliCommand::Config => run_show_config(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
