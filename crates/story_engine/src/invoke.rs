use story_core::{
    display_command_line, update, AttemptOutcome, Candidate, Fallback, InvocationError, Msg,
    Payload,
};
use story_logging::{story_debug, story_info, story_warn};

use crate::runner::{ProcessRunner, RunError};

/// Everything needed to run the backend: who to try, and what to pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationPlan {
    pub candidates: Vec<Candidate>,
    /// Arguments after each candidate's own argv (script path, flags).
    pub trailing_args: Vec<String>,
}

/// Run candidates one at a time until one yields a payload or the
/// fallback machine gives up.
pub async fn invoke(
    runner: &dyn ProcessRunner,
    plan: InvocationPlan,
) -> Result<Payload, InvocationError> {
    let InvocationPlan {
        candidates,
        trailing_args,
    } = plan;
    story_debug!(
        "Backend candidates: {:?}",
        candidates.iter().map(Candidate::argv).collect::<Vec<_>>()
    );

    let (mut fallback, mut next) = update(
        Fallback::new(candidates, trailing_args.clone()),
        Msg::Start,
    );
    while let Some(launch) = next {
        story_info!(
            "Backend attempt {}: {}",
            launch.attempt,
            attempt_command_line(&launch.candidate, &trailing_args)
        );
        let outcome = match runner.run(&launch.candidate, &trailing_args).await {
            Ok(output) => AttemptOutcome::Exited {
                code: output.exit_code,
                stdout: output.stdout,
                stderr: output.stderr,
            },
            Err(RunError::Launch { source, .. }) => AttemptOutcome::LaunchFailed {
                message: source.to_string(),
            },
            Err(RunError::Timeout(after)) => AttemptOutcome::TimedOut {
                after_secs: after.as_secs(),
            },
            Err(err @ RunError::Io(_)) => AttemptOutcome::Exited {
                code: -1,
                stdout: String::new(),
                stderr: err.to_string(),
            },
        };
        (fallback, next) = update(fallback, Msg::AttemptFinished(outcome));
    }

    let result = fallback.into_result();
    if let Err(err) = &result {
        story_warn!("Backend invocation failed: {}", err);
    }
    result
}

/// The full command line of one attempt, quoted the same way as in diagnostics.
pub fn attempt_command_line(candidate: &Candidate, trailing_args: &[String]) -> String {
    let mut argv = candidate.argv().to_vec();
    argv.extend(trailing_args.iter().cloned());
    display_command_line(&argv)
}
