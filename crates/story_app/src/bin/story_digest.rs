use clap::Parser;
use story_app::digest::{run, DigestCli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = DigestCli::parse();
    story_logging::initialize_stderr(story_logging::level_for(cli.verbose));
    run(&cli).await
}
