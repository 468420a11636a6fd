use std::process::ExitCode;

use clap::Parser;
use story_app::fetch::{run, FetchCli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = FetchCli::parse();
    story_logging::initialize_stderr(story_logging::level_for(cli.verbose));

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Stdout carries only the payload; failures are reported on stderr.
            eprintln!("Backend error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
