//! [`DownloadEngine`] backed by an external yt-dlp process.
//!
//! One child process per job. Stdout is read line by line (`--newline`) and
//! turned into progress notifications; the last `ERROR:` line on stderr becomes
//! the failure message. Output is decoded lossily, since file names follow the
//! source's encoding rather than ours. Every failure is also announced as an
//! `error` notification so the notification channel and the return value agree.
//! `cancel()` kills every child this engine has running.

mod args;
mod parse;

pub use args::{build_args, format_selector};
pub use parse::{error_message, OutputTracker};

use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::config::EngineConfig;
use crate::control::AbortRegistry;
use crate::engine::{DownloadEngine, DownloadParams, EngineError};
use crate::job::JobId;
use crate::progress::{ProgressEvent, ProgressSink};

/// Reads the next `\n`-terminated line into `buf` and decodes it lossily,
/// without the line ending. `None` at end of stream.
async fn next_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buf);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

pub struct YtDlpEngine {
    program: PathBuf,
    program_args: Vec<String>,
    extra_args: Vec<String>,
    progress: ProgressSink,
    aborts: AbortRegistry,
}

impl YtDlpEngine {
    pub fn new(config: &EngineConfig, progress: ProgressSink) -> Self {
        Self {
            program: config.program.clone(),
            program_args: config.program_args.clone(),
            extra_args: config.extra_args.clone(),
            progress,
            aborts: AbortRegistry::new(),
        }
    }

    /// Runs `<program> --version`; used by the CLI to fail fast when yt-dlp is missing.
    pub async fn version(&self) -> Result<String, EngineError> {
        let out = self
            .command()
            .arg("--version")
            .output()
            .await
            .map_err(|source| self.spawn_error(source))?;
        if !out.status.success() {
            return Err(EngineError::Failed(format!(
                "{} --version exited with {}",
                self.program.display(),
                out.status
            )));
        }
        Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.program_args);
        cmd
    }

    fn spawn_error(&self, source: io::Error) -> EngineError {
        EngineError::Spawn {
            program: self.program.display().to_string(),
            source,
        }
    }

    fn emit(&self, event: ProgressEvent) {
        // Receiver gone means nobody is watching; the download itself goes on.
        let _ = self.progress.send(event);
    }

    async fn run_child(
        &self,
        job_id: JobId,
        url: &str,
        params: &DownloadParams,
    ) -> Result<(), EngineError> {
        let args = build_args(url, params, &self.extra_args);
        tracing::debug!(job_id = %job_id, program = %self.program.display(), ?args, "spawning engine");

        let registration = self.aborts.register(job_id);
        let token = registration.token();
        let mut child = self
            .command()
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| self.spawn_error(source))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Failed("engine stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::Failed("engine stderr not captured".to_string()))?;

        let stderr_task = tokio::spawn(async move {
            let mut reader = BufReader::new(stderr);
            let mut buf = Vec::new();
            let mut last_error = None;
            loop {
                match next_line(&mut reader, &mut buf).await {
                    Ok(Some(line)) => {
                        if let Some(msg) = error_message(&line) {
                            last_error = Some(msg.to_string());
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::debug!("engine stderr read: {}", e);
                        break;
                    }
                }
            }
            last_error
        });

        let mut tracker = OutputTracker::new();
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(job_id = %job_id, "killing engine process");
                    let _ = child.kill().await;
                    stderr_task.abort();
                    return Err(EngineError::Cancelled);
                }
                line = next_line(&mut reader, &mut buf) => match line? {
                    Some(line) => {
                        if let Some(event) = tracker.observe(job_id, &line) {
                            self.emit(event);
                        }
                    }
                    None => break,
                },
            }
        }

        let status = tokio::select! {
            _ = token.cancelled() => None,
            status = child.wait() => Some(status?),
        };
        let Some(status) = status.filter(|_| !token.is_cancelled()) else {
            let _ = child.kill().await;
            stderr_task.abort();
            return Err(EngineError::Cancelled);
        };
        let last_error = stderr_task.await.unwrap_or_default();

        if status.success() {
            self.emit(tracker.finished(job_id));
            return Ok(());
        }
        Err(EngineError::Failed(last_error.unwrap_or_else(|| {
            format!("{} exited with {}", self.program.display(), status)
        })))
    }
}

#[async_trait]
impl DownloadEngine for YtDlpEngine {
    async fn run(
        &self,
        job_id: JobId,
        url: &str,
        params: &DownloadParams,
    ) -> Result<(), EngineError> {
        let result = self.run_child(job_id, url, params).await;
        match &result {
            Ok(()) | Err(EngineError::Cancelled) => {}
            Err(e) => self.emit(ProgressEvent::failed(job_id, e.to_string())),
        }
        result
    }

    fn cancel(&self) {
        let signalled = self.aborts.abort_all();
        tracing::debug!(signalled, "engine cancel");
    }
}
