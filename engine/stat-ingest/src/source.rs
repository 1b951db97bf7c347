//! Spawning the external stat source
//!
//! The source is a script run by a fixed interpreter. Its stdout is collected
//! in full, its stderr is relayed to the log line by line, and nothing is
//! parsed until the process has exited.

use crate::config::{FeedChannel, SourceConfig};
use crate::error::{IngestError, Result};
use std::process::Stdio;
use tempfile::NamedTempFile;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{info, warn};

/// Environment variable naming the payload file for [`FeedChannel::PayloadFile`]
pub const FEED_PATH_ENV: &str = "STAT_FEED_PATH";

/// Everything the source produced during one run
#[derive(Debug)]
pub enum SourceOutput {
    /// Full stdout text, payload delimited by sentinels
    Stdout(String),

    /// Payload file written by the source; removed on drop
    PayloadFile { file: NamedTempFile, stdout: String },
}

/// Runs the external stat source
#[derive(Debug, Clone)]
pub struct SourceProcess {
    config: SourceConfig,
}

impl SourceProcess {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    /// Spawn the source and wait for it to finish
    ///
    /// A non-zero exit or a signal-terminated process yields
    /// [`IngestError::ProcessFailure`]; its output is discarded.
    pub async fn run(&self) -> Result<SourceOutput> {
        info!(
            "Starting stat source: {} {}",
            self.config.executable.display(),
            self.config.script.display()
        );

        let mut command = Command::new(&self.config.executable);
        command
            .arg(&self.config.script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let payload_file = match self.config.channel {
            FeedChannel::Sentinel => None,
            FeedChannel::PayloadFile => {
                let file = NamedTempFile::new()?;
                command.env(FEED_PATH_ENV, file.path());
                Some(file)
            }
        };

        let mut child = command.spawn().map_err(|e| {
            IngestError::process_failure(format!(
                "could not spawn {}: {}",
                self.config.executable.display(),
                e
            ))
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| IngestError::process_failure("stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| IngestError::process_failure("stderr was not captured"))?;

        let (stdout, relayed) = tokio::join!(read_all(stdout), relay_stderr(stderr));
        let stdout = stdout.map_err(|e| {
            IngestError::process_failure(format!("failed to read source stdout: {e}"))
        })?;

        let status = child
            .wait()
            .await
            .map_err(|e| IngestError::process_failure(format!("failed to wait for source: {e}")))?;

        if !status.success() {
            let reason = match status.code() {
                Some(code) => format!("source exited with code {code}"),
                None => "source was terminated by a signal".to_string(),
            };
            return Err(IngestError::process_failure(reason));
        }

        info!("Stat source finished ({} bytes of stdout, {} log lines)", stdout.len(), relayed);

        Ok(match payload_file {
            None => SourceOutput::Stdout(stdout),
            Some(file) => SourceOutput::PayloadFile { file, stdout },
        })
    }
}

async fn read_all<R: AsyncRead + Unpin>(mut reader: R) -> std::io::Result<String> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

async fn relay_stderr<R: AsyncRead + Unpin>(reader: R) -> usize {
    let mut lines = BufReader::new(reader).lines();
    let mut count = 0;
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                warn!("Source log: {}", line);
                count += 1;
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Stopped relaying source stderr: {}", e);
                break;
            }
        }
    }
    count
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn write_script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("source.sh");
        std::fs::write(&path, body).unwrap();
        path
    }

    fn shell_source(script: PathBuf, channel: FeedChannel) -> SourceProcess {
        SourceProcess::new(SourceConfig { executable: PathBuf::from("sh"), script, channel })
    }

    #[tokio::test]
    async fn test_captures_stdout() {
        let dir = TempDir::new().unwrap();
        let script = write_script(dir.path(), "echo hello\necho oops >&2\necho world\n");

        let output = shell_source(script, FeedChannel::Sentinel).run().await.unwrap();
        match output {
            SourceOutput::Stdout(text) => assert_eq!(text, "hello\nworld\n"),
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_process_failure() {
        let dir = TempDir::new().unwrap();
        let script = write_script(dir.path(), "echo '---JSON_START---[]---JSON_END---'\nexit 3\n");

        let err = shell_source(script, FeedChannel::Sentinel).run().await.unwrap_err();
        match err {
            IngestError::ProcessFailure(reason) => assert!(reason.contains("code 3")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_executable_is_process_failure() {
        let source = SourceProcess::new(SourceConfig {
            executable: PathBuf::from("/nonexistent/interpreter"),
            script: PathBuf::from("scrape.py"),
            channel: FeedChannel::Sentinel,
        });

        assert!(matches!(source.run().await, Err(IngestError::ProcessFailure(_))));
    }

    #[tokio::test]
    async fn test_payload_file_channel_passes_path() {
        let dir = TempDir::new().unwrap();
        let script = write_script(dir.path(), "printf '[]' > \"$STAT_FEED_PATH\"\necho done\n");

        let output = shell_source(script, FeedChannel::PayloadFile).run().await.unwrap();
        match output {
            SourceOutput::PayloadFile { file, stdout } => {
                assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "[]");
                assert_eq!(stdout.trim(), "done");
            }
            other => panic!("unexpected output: {other:?}"),
        }
    }
}
