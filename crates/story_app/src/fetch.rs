//! The backend process: fetch the listing and print one JSON payload.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use story_core::InvocationRequest;
use story_engine::{
    Clock, FetchSettings, DEFAULT_BASE_URL, HnListingExtractor, ReqwestFetcher, StoryPipeline,
};

#[derive(Debug, Parser)]
#[command(name = "story_fetch")]
#[command(about = "Fetch recent popular stories and print them as JSON", long_about = None)]
#[command(allow_negative_numbers = true)]
pub struct FetchCli {
    /// Only keep stories newer than this many days (1-30)
    #[arg(long, default_value_t = 7)]
    pub days: i64,

    /// Only keep stories with at least this many votes (0-5000)
    #[arg(long, default_value_t = 250)]
    pub min_votes: i64,

    /// Upper bound on listing pages to read (1-20)
    #[arg(long, default_value_t = 5)]
    pub max_pages: i64,

    /// Listing URL; pages are requested with `?p=<n>`
    #[arg(long, env = "STORY_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request HTTP timeout in seconds
    #[arg(long, default_value_t = 15)]
    pub request_timeout_secs: u64,

    /// Log debug details to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn utc_clock() -> Clock {
    Arc::new(|| Utc::now().format("%Y-%m-%d %H:%M:%S").to_string())
}

pub async fn run(cli: &FetchCli) -> anyhow::Result<()> {
    let request = InvocationRequest::clamped(cli.days, cli.min_votes, cli.max_pages);
    let settings = FetchSettings {
        base_url: cli.base_url.clone(),
        request_timeout: Duration::from_secs(cli.request_timeout_secs.max(1)),
        ..FetchSettings::default()
    };
    let extractor = HnListingExtractor::new(&settings.base_url)
        .with_context(|| format!("invalid base url {}", settings.base_url))?;
    let pipeline = StoryPipeline::new(
        Arc::new(ReqwestFetcher::new(settings.clone())),
        Arc::new(extractor),
        settings,
        utc_clock(),
    );

    let payload = pipeline.build_payload(&request).await?;
    let json = serde_json::to_vec(&payload).context("serializing payload")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    out.write_all(&json).context("writing payload")?;
    out.flush().context("flushing payload")?;
    Ok(())
}
