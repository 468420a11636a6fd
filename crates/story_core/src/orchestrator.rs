//! Candidate fallback as a pure state machine.
//!
//! The driver feeds [`Msg`]s into [`update`] and performs the [`Launch`]
//! it gets back; no process is spawned here.

use thiserror::Error;

use crate::candidate::Candidate;
use crate::classify::is_interpreter_missing;
use crate::payload::Payload;
use crate::preview::{prepare_preview, MAX_STDOUT_PREVIEW};
use crate::recover::{recover_payload, RecoveryError};

/// How one attempt ended, as observed by the process runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The OS could not create the process.
    LaunchFailed { message: String },
    Exited {
        code: i32,
        stdout: String,
        stderr: String,
    },
    /// The attempt exceeded its time budget and was killed.
    TimedOut { after_secs: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    Start,
    AttemptFinished(AttemptOutcome),
}

/// Request to run one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    pub attempt: usize,
    pub candidate: Candidate,
}

/// Details of the most recent attempt, overwritten on each one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Diagnostics {
    pub command: String,
    pub stderr: String,
    pub stdout_preview: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvocationError {
    #[error("no backend interpreter found (last tried `{}`): {message}", .diagnostics.command)]
    InterpreterMissing {
        message: String,
        diagnostics: Diagnostics,
    },
    #[error("backend failed with exit code {code} (`{}`)", .diagnostics.command)]
    BackendExecutionFailure { code: i32, diagnostics: Diagnostics },
    #[error("backend timed out after {after_secs}s (`{}`)", .diagnostics.command)]
    Timeout {
        after_secs: u64,
        diagnostics: Diagnostics,
    },
    #[error("backend returned invalid output: {reason} (`{}`)", .diagnostics.command)]
    InvalidOutput {
        reason: String,
        diagnostics: Diagnostics,
    },
    #[error("no backend candidates to try")]
    NoCandidates { diagnostics: Diagnostics },
}

impl InvocationError {
    pub fn diagnostics(&self) -> &Diagnostics {
        match self {
            InvocationError::InterpreterMissing { diagnostics, .. }
            | InvocationError::BackendExecutionFailure { diagnostics, .. }
            | InvocationError::Timeout { diagnostics, .. }
            | InvocationError::InvalidOutput { diagnostics, .. }
            | InvocationError::NoCandidates { diagnostics } => diagnostics,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackState {
    Pending { next: usize },
    Trying { index: usize },
    Success(Payload),
    Failed(InvocationError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fallback {
    candidates: Vec<Candidate>,
    trailing_args: Vec<String>,
    state: FallbackState,
    last: Diagnostics,
}

impl Fallback {
    pub fn new(candidates: Vec<Candidate>, trailing_args: Vec<String>) -> Self {
        Self {
            candidates,
            trailing_args,
            state: FallbackState::Pending { next: 0 },
            last: Diagnostics::default(),
        }
    }

    pub fn state(&self) -> &FallbackState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.state,
            FallbackState::Success(_) | FallbackState::Failed(_)
        )
    }

    /// Terminal result; a machine that never finished reports missing candidates.
    pub fn into_result(self) -> Result<Payload, InvocationError> {
        match self.state {
            FallbackState::Success(payload) => Ok(payload),
            FallbackState::Failed(err) => Err(err),
            FallbackState::Pending { .. } | FallbackState::Trying { .. } => {
                Err(InvocationError::NoCandidates {
                    diagnostics: self.last,
                })
            }
        }
    }

    fn command_line(&self, index: usize) -> String {
        let mut argv: Vec<String> = self.candidates[index].argv().to_vec();
        argv.extend(self.trailing_args.iter().cloned());
        display_command_line(&argv)
    }

    fn launch(&mut self, index: usize) -> Option<Launch> {
        self.state = FallbackState::Trying { index };
        self.last = Diagnostics {
            command: self.command_line(index),
            ..Diagnostics::default()
        };
        Some(Launch {
            attempt: index + 1,
            candidate: self.candidates[index].clone(),
        })
    }

    fn fail(&mut self, err: InvocationError) -> Option<Launch> {
        self.state = FallbackState::Failed(err);
        None
    }
}

/// Pure transition function: applies a message and returns the next launch, if any.
pub fn update(mut fallback: Fallback, msg: Msg) -> (Fallback, Option<Launch>) {
    let launch = match (fallback.state.clone(), msg) {
        (FallbackState::Pending { next }, Msg::Start) => {
            if next < fallback.candidates.len() {
                fallback.launch(next)
            } else {
                let diagnostics = fallback.last.clone();
                fallback.fail(InvocationError::NoCandidates { diagnostics })
            }
        }
        (FallbackState::Trying { index }, Msg::AttemptFinished(outcome)) => {
            on_attempt_finished(&mut fallback, index, outcome)
        }
        // Messages that do not apply to the current state are ignored.
        _ => None,
    };
    (fallback, launch)
}

fn on_attempt_finished(
    fallback: &mut Fallback,
    index: usize,
    outcome: AttemptOutcome,
) -> Option<Launch> {
    let missing = is_interpreter_missing(&outcome);
    let message = match outcome {
        AttemptOutcome::LaunchFailed { message } => {
            fallback.last.stderr = message.clone();
            message
        }
        AttemptOutcome::TimedOut { after_secs } => {
            let diagnostics = fallback.last.clone();
            return fallback.fail(InvocationError::Timeout {
                after_secs,
                diagnostics,
            });
        }
        AttemptOutcome::Exited {
            code,
            stdout,
            stderr,
        } => {
            fallback.last.stderr = stderr.clone();
            fallback.last.stdout_preview = prepare_preview(&stdout, MAX_STDOUT_PREVIEW);
            if !missing {
                return finish_exited(fallback, code, &stdout, &stderr);
            }
            format!("exit code {code}")
        }
    };

    // Only a missing interpreter gets here.
    let next = index + 1;
    if fallback.candidates.len() > 1 && next < fallback.candidates.len() {
        return fallback.launch(next);
    }
    let diagnostics = fallback.last.clone();
    fallback.fail(InvocationError::InterpreterMissing {
        message,
        diagnostics,
    })
}

fn finish_exited(
    fallback: &mut Fallback,
    code: i32,
    stdout: &str,
    stderr: &str,
) -> Option<Launch> {
    if code != 0 {
        let diagnostics = fallback.last.clone();
        return fallback.fail(InvocationError::BackendExecutionFailure {
            code,
            diagnostics,
        });
    }
    match recover_payload(stdout, stderr) {
        Ok(payload) => {
            fallback.state = FallbackState::Success(payload);
            None
        }
        Err(RecoveryError::InvalidOutput { reason, .. }) => {
            let diagnostics = fallback.last.clone();
            fallback.fail(InvocationError::InvalidOutput {
                reason,
                diagnostics,
            })
        }
    }
}

/// Join an argument vector for display, quoting elements that need it.
pub fn display_command_line(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| {
            let needs_quotes = arg.is_empty()
                || arg
                    .chars()
                    .any(|c| c.is_whitespace() || c == '"' || c == '\'');
            if needs_quotes {
                format!("\"{}\"", arg.replace('"', "\\\""))
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
