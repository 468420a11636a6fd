use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use story_core::Candidate;
use story_logging::story_debug;
use thiserror::Error;
use tokio::process::Command;

/// Captured result of a process that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    /// `-1` when the process was ended by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("process did not finish within {0:?}")]
    Timeout(Duration),
    #[error("io error while waiting for process: {0}")]
    Io(#[from] io::Error),
}

#[async_trait::async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(
        &self,
        candidate: &Candidate,
        trailing_args: &[String],
    ) -> Result<RunOutput, RunError>;
}

/// Spawns candidates directly (no shell) with stdin closed, both output
/// streams captured and the working directory pinned.
#[derive(Debug, Clone)]
pub struct TokioProcessRunner {
    working_dir: PathBuf,
    timeout: Duration,
}

impl TokioProcessRunner {
    pub fn new(working_dir: PathBuf, timeout: Duration) -> Self {
        Self {
            working_dir,
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        candidate: &Candidate,
        trailing_args: &[String],
    ) -> Result<RunOutput, RunError> {
        let mut command = Command::new(candidate.program());
        command
            .args(candidate.leading_args())
            .args(trailing_args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|source| RunError::Launch {
            program: candidate.program().to_string(),
            source,
        })?;
        story_debug!("Spawned {} (pid {:?})", candidate.program(), child.id());

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| RunError::Timeout(self.timeout))??;

        Ok(RunOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
