//! `batchdl run` – queue URLs and download them as one batch.

use anyhow::{Context, Result};
use batchdl_core::batch::{BatchController, BatchOutcome};
use batchdl_core::config::BatchdlConfig;
use batchdl_core::engine::ytdlp::YtDlpEngine;
use batchdl_core::job::{Job, JobStatus};
use batchdl_core::progress::{progress_channel, spawn_aggregator, QueueOverview};
use batchdl_core::store::StoreHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::cli::SettingsOverrides;

const STATUS_INTERVAL_MS: u64 = 500;

pub async fn run_batch(
    cfg: &BatchdlConfig,
    overrides: &SettingsOverrides,
    lines: Vec<String>,
) -> Result<()> {
    let mut settings = cfg.download.clone();
    overrides.apply(&mut settings);

    let store = StoreHandle::spawn();
    let offered = lines.len();
    let added = store.add(lines).await?;
    tracing::info!(offered, added, "queued URLs");
    if added == 0 {
        println!("No valid URLs to download.");
        return Ok(());
    }

    let (sink, stream) = progress_channel();
    let aggregator = spawn_aggregator(stream, store.clone());
    let engine = Arc::new(YtDlpEngine::new(&cfg.engine, sink));
    let version = engine
        .version()
        .await
        .with_context(|| format!("{} is not usable", cfg.engine.program.display()))?;
    tracing::info!(%version, "using yt-dlp");

    println!(
        "Downloading {} job(s), up to {} at a time, into {}",
        added,
        settings.concurrency_limit(),
        display_dir(&settings.output_path)
    );

    let (_settings_tx, settings_rx) = watch::channel(settings);
    let controller = BatchController::new(store.clone(), engine, settings_rx);
    let mut batch = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.start().await })
    };

    let mut ticker = tokio::time::interval(Duration::from_millis(STATUS_INTERVAL_MS));
    let mut ctrl_c = std::pin::pin!(tokio::signal::ctrl_c());
    let mut stopping = false;
    let outcome = loop {
        tokio::select! {
            res = &mut batch => break res.context("batch task")??,
            _ = &mut ctrl_c, if !stopping => {
                stopping = true;
                println!("Stopping; waiting for running downloads to end...");
                controller.stop();
            }
            _ = ticker.tick() => print_status(&store, &controller).await?,
        }
    };
    aggregator.abort();

    let jobs = store.snapshot().await?;
    print_jobs(&jobs);
    match outcome {
        BatchOutcome::Finished(report) => println!(
            "{} completed, {} failed{}",
            report.completed,
            report.failed,
            if report.cancelled { " (stopped)" } else { "" }
        ),
        BatchOutcome::NothingToDo | BatchOutcome::AlreadyRunning => {
            println!("Nothing to download.")
        }
    }

    let failed = jobs.iter().filter(|j| j.status == JobStatus::Error).count();
    if failed > 0 {
        anyhow::bail!("{} download(s) failed", failed);
    }
    Ok(())
}

fn display_dir(path: &std::path::Path) -> String {
    if path.as_os_str().is_empty() {
        ".".to_string()
    } else {
        path.display().to_string()
    }
}

async fn print_status(store: &StoreHandle, controller: &BatchController) -> Result<()> {
    let jobs = store.snapshot().await?;
    let overview = QueueOverview::from_jobs(&jobs);
    let playlist = controller
        .playlist_summary()
        .await?
        .map(|p| format!("  playlist {}/{}: {}", p.index, p.total, p.title))
        .unwrap_or_default();
    println!("{}{}", status_line(&overview), playlist);
    Ok(())
}

pub(crate) fn status_line(overview: &QueueOverview) -> String {
    format!(
        "  {:5.1}%  {}/{} done  {} active  {} failed",
        overview.fraction() * 100.0,
        overview.finished(),
        overview.total,
        overview.active,
        overview.failed
    )
}

fn print_jobs(jobs: &[Job]) {
    println!("{:<5} {:<12} {:>6}  {}", "ID", "STATUS", "DONE", "TITLE");
    for j in jobs {
        println!(
            "{:<5} {:<12} {:>5.0}%  {}",
            j.id,
            j.status.as_str(),
            j.progress,
            j.title
        );
        if let Some(ref err) = j.error {
            println!("{:<5} {}", "", err);
        }
    }
}
