use std::sync::Once;

use pretty_assertions::assert_eq;
use story_core::{
    update, AttemptOutcome, Candidate, Fallback, FallbackState, InvocationError, Launch, Msg,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(story_logging::initialize_for_tests);
}

fn trailing() -> Vec<String> {
    vec!["--days".into(), "3".into()]
}

fn exited(code: i32, stdout: &str, stderr: &str) -> AttemptOutcome {
    AttemptOutcome::Exited {
        code,
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    }
}

/// Feed outcomes in order until the machine stops asking for launches.
fn drive(candidates: Vec<Candidate>, outcomes: Vec<AttemptOutcome>) -> (Fallback, Vec<Launch>) {
    let mut launches = Vec::new();
    let (mut fallback, mut next) = update(Fallback::new(candidates, trailing()), Msg::Start);
    let mut outcomes = outcomes.into_iter();
    while let Some(launch) = next {
        launches.push(launch);
        let outcome = outcomes.next().expect("outcome for every launch");
        let (updated, launch) = update(fallback, Msg::AttemptFinished(outcome));
        fallback = updated;
        next = launch;
    }
    (fallback, launches)
}

const PAYLOAD: &str =
    r#"{"generated_at_utc":"2024-05-01 12:00:00","days":3,"min_votes":500,"stories":[]}"#;

#[test]
fn all_missing_fails_naming_last_candidate() {
    init_logging();
    let candidates = vec![
        Candidate::new("python3"),
        Candidate::new("python"),
        Candidate::with_args("py", ["-3"]),
    ];
    let (fallback, launches) = drive(
        candidates,
        vec![
            AttemptOutcome::LaunchFailed {
                message: "No such file or directory".into(),
            },
            exited(127, "", "sh: python: not found"),
            exited(9009, "", ""),
        ],
    );

    assert_eq!(launches.len(), 3);
    assert_eq!(launches[2].attempt, 3);
    match fallback.into_result() {
        Err(InvocationError::InterpreterMissing { diagnostics, .. }) => {
            assert_eq!(diagnostics.command, "py -3 --days 3");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn override_is_tried_once_even_when_missing() {
    init_logging();
    let (fallback, launches) = drive(
        vec![Candidate::new("/opt/custom/python")],
        vec![exited(127, "", "not found")],
    );

    assert_eq!(launches.len(), 1);
    assert!(matches!(
        fallback.state(),
        FallbackState::Failed(InvocationError::InterpreterMissing { .. })
    ));
}

#[test]
fn real_backend_failure_stops_fallback() {
    init_logging();
    let (fallback, launches) = drive(
        vec![Candidate::new("python3"), Candidate::new("python")],
        vec![exited(1, "", "Backend error: connection reset")],
    );

    assert_eq!(launches.len(), 1);
    match fallback.into_result() {
        Err(InvocationError::BackendExecutionFailure { code, diagnostics }) => {
            assert_eq!(code, 1);
            assert_eq!(diagnostics.stderr, "Backend error: connection reset");
            assert_eq!(diagnostics.command, "python3 --days 3");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn missing_then_success_recovers_noisy_payload() {
    init_logging();
    let noisy = format!("DeprecationWarning: old api\n{PAYLOAD}\n");
    let (fallback, launches) = drive(
        vec![Candidate::new("python3"), Candidate::new("python")],
        vec![
            exited(1, "", "'python3' is not recognized as an internal or external command"),
            exited(0, &noisy, ""),
        ],
    );

    assert_eq!(launches.len(), 2);
    assert_eq!(launches[1].candidate, Candidate::new("python"));
    let payload = fallback.into_result().expect("payload");
    assert_eq!(payload.days, 3);
    assert_eq!(payload.min_votes, 500);
    assert!(payload.stories.is_empty());
}

#[test]
fn zero_exit_with_garbage_is_invalid_output() {
    init_logging();
    let (fallback, launches) = drive(
        vec![Candidate::new("python3"), Candidate::new("python")],
        vec![exited(0, "Traceback: nothing useful", "warn")],
    );

    assert_eq!(launches.len(), 1);
    match fallback.into_result() {
        Err(InvocationError::InvalidOutput { diagnostics, .. }) => {
            assert_eq!(diagnostics.stdout_preview, "Traceback: nothing useful");
            assert_eq!(diagnostics.stderr, "warn");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn timeout_is_not_retried() {
    init_logging();
    let (fallback, launches) = drive(
        vec![Candidate::new("python3"), Candidate::new("python")],
        vec![AttemptOutcome::TimedOut { after_secs: 30 }],
    );

    assert_eq!(launches.len(), 1);
    assert!(matches!(
        fallback.into_result(),
        Err(InvocationError::Timeout { after_secs: 30, .. })
    ));
}

#[test]
fn empty_candidate_list_fails_immediately() {
    init_logging();
    let (fallback, launch) = update(Fallback::new(Vec::new(), trailing()), Msg::Start);
    assert_eq!(launch, None);
    assert!(matches!(
        fallback.into_result(),
        Err(InvocationError::NoCandidates { .. })
    ));
}

#[test]
fn stray_messages_are_ignored() {
    init_logging();
    let fallback = Fallback::new(vec![Candidate::new("python3")], trailing());
    let (fallback, launch) = update(fallback, Msg::AttemptFinished(exited(0, PAYLOAD, "")));
    assert_eq!(launch, None);
    assert_eq!(fallback.state(), &FallbackState::Pending { next: 0 });
    assert!(!fallback.is_finished());
}

#[test]
fn launch_failure_on_last_candidate_finishes_as_missing() {
    init_logging();
    let (fallback, launches) = drive(
        vec![Candidate::new("/opt/custom/python")],
        vec![AttemptOutcome::LaunchFailed {
            message: "No such file or directory".into(),
        }],
    );

    assert_eq!(launches.len(), 1);
    assert!(fallback.is_finished());
    match fallback.into_result() {
        Err(InvocationError::InterpreterMissing {
            message,
            diagnostics,
        }) => {
            assert_eq!(message, "No such file or directory");
            assert_eq!(diagnostics.stderr, "No such file or directory");
            assert_eq!(diagnostics.command, "/opt/custom/python --days 3");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
