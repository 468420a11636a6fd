//! Story engine: page fetching, listing extraction and backend process IO.
mod age;
mod decode;
mod extract;
mod fetch;
mod invoke;
mod pipeline;
mod probe;
mod runner;
mod types;

pub use age::parse_age_seconds;
pub use decode::{decode_html, DecodedHtml};
pub use extract::{normalize_link, HnListingExtractor, ListingExtractor, RawStory};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher, DEFAULT_BASE_URL};
pub use invoke::{attempt_command_line, invoke, InvocationPlan};
pub use pipeline::{Clock, PipelineError, StoryPipeline};
pub use probe::SystemProbe;
pub use runner::{ProcessRunner, RunError, RunOutput, TokioProcessRunner};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput};
