//! The caller: locate the backend, run it, and hand a renderable result on.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use story_core::{
    dependency_hint, resolve_candidates, BackendRuntime, InvocationError, InvocationRequest,
    InvocationResult, Payload, PlatformProbe,
};
use story_engine::{invoke, InvocationPlan, SystemProbe, TokioProcessRunner};
use story_logging::story_info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RuntimeKind {
    /// The `story_fetch` executable
    Native,
    /// A Python 3 interpreter running `--script`
    Python,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(Debug, Parser)]
#[command(name = "story_digest")]
#[command(about = "Collect recent popular stories through the fetch backend", long_about = None)]
#[command(allow_negative_numbers = true)]
pub struct DigestCli {
    /// Only keep stories newer than this many days (clamped to 1-30)
    #[arg(long, default_value_t = 7)]
    pub days: i64,

    /// Only keep stories with at least this many votes (clamped to 0-5000)
    #[arg(long, default_value_t = 250)]
    pub min_votes: i64,

    /// Upper bound on listing pages to read (clamped to 1-20)
    #[arg(long, default_value_t = 5)]
    pub max_pages: i64,

    /// Run exactly this executable instead of searching for one
    #[arg(long, env = "STORY_BACKEND")]
    pub backend: Option<String>,

    /// Kind of backend to search for
    #[arg(long, value_enum, default_value_t = RuntimeKind::Native)]
    pub runtime: RuntimeKind,

    /// Backend script passed to the interpreter (python runtime)
    #[arg(long, required_if_eq("runtime", "python"))]
    pub script: Option<PathBuf>,

    /// Working directory for the backend process
    #[arg(long)]
    pub backend_dir: Option<PathBuf>,

    /// Seconds allowed per backend attempt
    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Log debug details to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl DigestCli {
    pub fn request(&self) -> InvocationRequest {
        InvocationRequest::clamped(self.days, self.min_votes, self.max_pages)
    }

    fn backend_runtime(&self) -> BackendRuntime {
        match self.runtime {
            RuntimeKind::Native => BackendRuntime::default(),
            RuntimeKind::Python => BackendRuntime::Python,
        }
    }

    fn script_path(&self) -> Option<PathBuf> {
        self.script
            .as_ref()
            .map(|script| std::path::absolute(script).unwrap_or_else(|_| script.clone()))
    }
}

/// Candidates plus the arguments every candidate receives.
pub fn build_plan(cli: &DigestCli, probe: &dyn PlatformProbe) -> InvocationPlan {
    let candidates = resolve_candidates(cli.backend.as_deref(), &cli.backend_runtime(), probe);

    let mut trailing_args = Vec::new();
    if cli.runtime == RuntimeKind::Python {
        if let Some(script) = cli.script_path() {
            trailing_args.push(script.to_string_lossy().into_owned());
        }
    }
    trailing_args.extend(cli.request().to_args());

    InvocationPlan {
        candidates,
        trailing_args,
    }
}

/// Explicit `--backend-dir`, else the script's directory, else ours.
pub fn working_dir(cli: &DigestCli, probe: &dyn PlatformProbe) -> PathBuf {
    if let Some(dir) = &cli.backend_dir {
        return dir.clone();
    }
    cli.script_path()
        .and_then(|script| script.parent().map(|p| p.to_path_buf()))
        .or_else(|| probe.current_exe_dir())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Turn an invocation outcome into the result the view layer renders.
pub fn into_result(outcome: Result<Payload, InvocationError>) -> InvocationResult {
    match outcome {
        Ok(payload) => InvocationResult::success(payload),
        Err(err) => {
            let diagnostics = err.diagnostics();
            let hint = dependency_hint(&diagnostics.stderr, &diagnostics.command).or_else(|| {
                matches!(err, InvocationError::InterpreterMissing { .. }).then(|| {
                    "No usable backend executable was found. Install it, or set STORY_BACKEND \
                     to its full path."
                        .to_string()
                })
            });
            InvocationResult::failure(&err, hint)
        }
    }
}

/// Plain listing for terminals; failures render as an empty list plus the error.
pub fn render_text(result: &InvocationResult) -> String {
    let mut out = String::new();
    if !result.ok {
        out.push_str("No stories available.\n");
        if let Some(error) = &result.error {
            let _ = writeln!(out, "Error: {error}");
        }
        if let Some(stderr) = &result.stderr_detail {
            let _ = writeln!(out, "Details: {stderr}");
        }
        if let Some(preview) = &result.stdout_preview {
            let _ = writeln!(out, "Output: {preview}");
        }
        if let Some(hint) = &result.hint {
            let _ = writeln!(out, "Hint: {hint}");
        }
        return out;
    }

    if let Some(payload) = &result.payload {
        let _ = writeln!(
            out,
            "Stories from the last {} day(s) with at least {} votes (generated {} UTC)",
            payload.days, payload.min_votes, payload.generated_at_utc
        );
    }
    if result.stories().is_empty() {
        out.push_str("No stories matched.\n");
    }
    for story in result.stories() {
        let _ = writeln!(out, "{:>5}  {}", story.votes, story.title);
        let _ = writeln!(out, "       {} ({})", story.link, story.age_text);
    }
    out
}

pub async fn run(cli: &DigestCli) -> anyhow::Result<()> {
    let probe = SystemProbe;
    let plan = build_plan(cli, &probe);
    let dir = working_dir(cli, &probe);
    story_info!(
        "Invoking backend with {} candidate(s) in {}",
        plan.candidates.len(),
        dir.display()
    );

    let runner = TokioProcessRunner::new(dir, Duration::from_secs(cli.timeout_secs.max(1)));
    let result = into_result(invoke(&runner, plan).await);

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print!("{}", render_text(&result)),
    }
    Ok(())
}
