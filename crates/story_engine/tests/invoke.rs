use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use pretty_assertions::assert_eq;
use story_core::{Candidate, InvocationError, InvocationRequest};
use story_engine::{
    attempt_command_line, invoke, InvocationPlan, ProcessRunner, RunError, RunOutput,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(story_logging::initialize_for_tests);
}

const PAYLOAD: &str = r#"{"generated_at_utc":"2024-05-01 12:00:00","days":3,"min_votes":500,"stories":[{"title":"A","link":"https://a.example","votes":1000,"age_text":"1 hour ago"}]}"#;

/// Replays canned results and records which candidates were run.
#[derive(Default)]
struct ScriptedRunner {
    results: Mutex<VecDeque<Result<RunOutput, RunError>>>,
    seen: Arc<Mutex<Vec<Vec<String>>>>,
}

impl ScriptedRunner {
    fn new(results: Vec<Result<RunOutput, RunError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            seen: Arc::default(),
        }
    }

    fn seen(&self) -> Vec<Vec<String>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(
        &self,
        candidate: &Candidate,
        trailing_args: &[String],
    ) -> Result<RunOutput, RunError> {
        let mut argv = candidate.argv().to_vec();
        argv.extend(trailing_args.iter().cloned());
        self.seen.lock().unwrap().push(argv);
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .expect("a canned result per attempt")
    }
}

fn exited(code: i32, stdout: &str, stderr: &str) -> Result<RunOutput, RunError> {
    Ok(RunOutput {
        exit_code: code,
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    })
}

fn not_found() -> Result<RunOutput, RunError> {
    Err(RunError::Launch {
        program: "python3".into(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
    })
}

fn plan(candidates: Vec<Candidate>) -> InvocationPlan {
    InvocationPlan {
        candidates,
        trailing_args: InvocationRequest::clamped(3, 500, 2).to_args(),
    }
}

#[tokio::test]
async fn falls_through_missing_interpreters_to_a_working_one() {
    init_logging();
    let runner = ScriptedRunner::new(vec![
        not_found(),
        exited(9009, "", ""),
        exited(0, &format!("warning: noisy\n{PAYLOAD}"), ""),
    ]);
    let candidates = vec![
        Candidate::new("python3"),
        Candidate::new("python"),
        Candidate::with_args("py", ["-3"]),
    ];

    let payload = invoke(&runner, plan(candidates)).await.unwrap();

    assert_eq!(payload.stories.len(), 1);
    assert_eq!(payload.stories[0].votes, 1000);
    let seen = runner.seen();
    assert_eq!(seen.len(), 3);
    assert_eq!(
        seen[2],
        vec!["py", "-3", "--days", "3", "--min-votes", "500", "--max-pages", "2"]
    );
}

#[tokio::test]
async fn real_failure_is_surfaced_without_trying_more() {
    init_logging();
    let runner = ScriptedRunner::new(vec![exited(1, "", "Backend error: upstream 500")]);
    let err = invoke(
        &runner,
        plan(vec![Candidate::new("python3"), Candidate::new("python")]),
    )
    .await
    .unwrap_err();

    assert_eq!(runner.seen().len(), 1);
    match err {
        InvocationError::BackendExecutionFailure { code, diagnostics } => {
            assert_eq!(code, 1);
            assert_eq!(diagnostics.stderr, "Backend error: upstream 500");
            assert_eq!(
                diagnostics.command,
                "python3 --days 3 --min-votes 500 --max-pages 2"
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn attempt_log_line_matches_the_reported_command() {
    init_logging();
    let candidate = Candidate::new("/opt/My Tools/story_fetch");
    let plan = plan(vec![candidate.clone()]);
    let logged = attempt_command_line(&candidate, &plan.trailing_args);
    assert_eq!(
        logged,
        "\"/opt/My Tools/story_fetch\" --days 3 --min-votes 500 --max-pages 2"
    );

    let runner = ScriptedRunner::new(vec![exited(2, "", "Backend error: upstream 500")]);
    let err = invoke(&runner, plan).await.unwrap_err();
    assert_eq!(err.diagnostics().command, logged);
}

#[tokio::test]
async fn timeouts_are_reported_not_retried() {
    init_logging();
    let runner = ScriptedRunner::new(vec![Err(RunError::Timeout(Duration::from_secs(120)))]);
    let err = invoke(
        &runner,
        plan(vec![Candidate::new("python3"), Candidate::new("python")]),
    )
    .await
    .unwrap_err();

    assert_eq!(runner.seen().len(), 1);
    assert!(matches!(err, InvocationError::Timeout { after_secs: 120, .. }));
}

#[tokio::test]
async fn override_candidate_gets_a_single_attempt() {
    init_logging();
    let runner = ScriptedRunner::new(vec![not_found()]);
    let err = invoke(&runner, plan(vec![Candidate::new("/custom/python")]))
        .await
        .unwrap_err();

    assert_eq!(runner.seen().len(), 1);
    assert!(matches!(err, InvocationError::InterpreterMissing { .. }));
    assert!(err.to_string().contains("/custom/python"));
}

#[cfg(unix)]
#[tokio::test]
async fn drives_real_processes_end_to_end() {
    use story_engine::TokioProcessRunner;

    init_logging();
    let dir = tempfile::TempDir::new().unwrap();
    let script = dir.path().join("backend.sh");
    std::fs::write(
        &script,
        format!("echo 'starting backend' >&2\nprintf '%s' '{PAYLOAD}'\n"),
    )
    .unwrap();

    let runner = TokioProcessRunner::new(dir.path().to_path_buf(), Duration::from_secs(10));
    let plan = InvocationPlan {
        candidates: vec![
            Candidate::new("definitely-not-a-real-interpreter-xyz"),
            Candidate::with_args("sh", ["-c", "exit 127"]),
            Candidate::new("sh"),
        ],
        trailing_args: vec![script.to_string_lossy().into_owned()],
    };

    let payload = invoke(&runner, plan).await.unwrap();
    assert_eq!(payload.days, 3);
    assert_eq!(payload.stories[0].title, "A");
}
