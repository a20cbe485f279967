//! `tracing` subscriber setup for the `batchdl` binary.
//!
//! Events go to `~/.local/state/batchdl/batchdl.log`. If the state directory or
//! the file cannot be opened, [`init`] installs a stderr subscriber instead and
//! says so in the returned [`LogTarget`].

use anyhow::Result;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Directive used when neither `BATCHDL_LOG` nor `RUST_LOG` is set.
pub const DEFAULT_FILTER: &str = "info,batchdl=debug,batchdl_core=debug";

/// Where [`init`] ended up sending events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr,
}

enum Sink {
    File(fs::File),
    Stderr,
}

impl io::Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::File(f) => f.write(buf),
            Sink::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::File(f) => f.flush(),
            Sink::Stderr => io::stderr().lock().flush(),
        }
    }
}

/// Hands out a clone of the log file per event; a failed clone degrades that
/// event to stderr rather than dropping it.
struct SharedFile(fs::File);

impl<'a> MakeWriter<'a> for SharedFile {
    type Writer = Sink;

    fn make_writer(&'a self) -> Self::Writer {
        self.0.try_clone().map(Sink::File).unwrap_or(Sink::Stderr)
    }
}

/// First parseable directive among `BATCHDL_LOG`, `RUST_LOG`, then [`DEFAULT_FILTER`].
fn filter_from(batchdl_log: Option<&str>, rust_log: Option<&str>) -> EnvFilter {
    [batchdl_log, rust_log]
        .into_iter()
        .flatten()
        .find_map(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

fn env_filter() -> EnvFilter {
    let batchdl_log = std::env::var("BATCHDL_LOG").ok();
    let rust_log = std::env::var("RUST_LOG").ok();
    filter_from(batchdl_log.as_deref(), rust_log.as_deref())
}

/// `~/.local/state/batchdl/batchdl.log`; the directory is created on the way.
pub fn log_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("batchdl")?;
    Ok(xdg_dirs.place_state_file("batchdl.log")?)
}

fn open_log_file() -> Result<(PathBuf, fs::File)> {
    let path = log_path()?;
    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((path, file))
}

/// Installs the global subscriber. Call once, before anything logs.
pub fn init() -> LogTarget {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false);

    match open_log_file() {
        Ok((path, file)) => {
            builder
                .with_writer(BoxMakeWriter::new(SharedFile(file)))
                .init();
            tracing::info!(path = %path.display(), "batchdl logging to file");
            LogTarget::File(path)
        }
        Err(e) => {
            builder.with_writer(io::stderr).init();
            tracing::warn!("log file unavailable, logging to stderr: {:#}", e);
            LogTarget::Stderr
        }
    }
}
