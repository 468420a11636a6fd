use std::sync::Arc;

use story_core::{InvocationRequest, Payload, StoryRecord};
use story_logging::{story_debug, story_info, story_warn};
use thiserror::Error;
use url::Url;

use crate::age::parse_age_seconds;
use crate::decode::decode_html;
use crate::extract::{ListingExtractor, RawStory};
use crate::fetch::{FetchSettings, Fetcher};
use crate::{FailureKind, FetchError, FetchOutput};

/// Produces the payload timestamp (`YYYY-MM-DD HH:MM:SS`, UTC).
pub type Clock = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not fetch the story listing: {0}")]
    Upstream(#[from] FetchError),
}

pub struct StoryPipeline {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn ListingExtractor>,
    settings: FetchSettings,
    clock: Clock,
}

impl StoryPipeline {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn ListingExtractor>,
        settings: FetchSettings,
        clock: Clock,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            settings,
            clock,
        }
    }

    /// Fetch, filter and sort, then wrap the result with the effective parameters.
    pub async fn build_payload(
        &self,
        request: &InvocationRequest,
    ) -> Result<Payload, PipelineError> {
        let stories = self.collect_stories(request).await?;
        Ok(Payload {
            generated_at_utc: (self.clock)(),
            days: request.days(),
            min_votes: request.min_votes(),
            stories,
        })
    }

    /// Walk listing pages in order and keep stories inside the age cutoff
    /// with at least `min_votes`, sorted by votes (stable, descending).
    ///
    /// Paging stops early after a page with no entry inside the cutoff,
    /// after a page with no story rows, or when a page after the first one
    /// cannot be fetched. A failure on the first page is an error.
    pub async fn collect_stories(
        &self,
        request: &InvocationRequest,
    ) -> Result<Vec<StoryRecord>, PipelineError> {
        let cutoff = request.cutoff_seconds();
        let mut stories: Vec<StoryRecord> = Vec::new();

        for page in 1..=request.max_pages() {
            let rows = match self.load_page(page).await {
                Ok(rows) => rows,
                Err(err) if page == 1 => return Err(err.into()),
                Err(err) => {
                    story_warn!("Page {} failed, keeping {} stories: {}", page, stories.len(), err);
                    break;
                }
            };
            if rows.is_empty() {
                story_debug!("Page {} has no story rows, stopping", page);
                break;
            }

            let mut any_within_cutoff = false;
            for raw in rows {
                let Some(age_seconds) = parse_age_seconds(&raw.age_text) else {
                    story_debug!("Skipping entry with unreadable age {:?}", raw.age_text);
                    continue;
                };
                if age_seconds > cutoff {
                    continue;
                }
                any_within_cutoff = true;
                if raw.votes < request.min_votes() {
                    continue;
                }
                stories.push(into_record(raw));
            }

            if !any_within_cutoff {
                story_debug!(
                    "Page {} is entirely older than {} days, stopping",
                    page,
                    request.days()
                );
                break;
            }
        }

        stories.sort_by(|a, b| b.votes.cmp(&a.votes));
        story_info!(
            "Collected {} stories (days={}, min_votes={})",
            stories.len(),
            request.days(),
            request.min_votes()
        );
        Ok(stories)
    }

    async fn load_page(&self, page: u32) -> Result<Vec<RawStory>, FetchError> {
        let url = page_url(&self.settings.base_url, page)?;
        story_info!("Fetching page {} ({})", page, url);

        let output = match self.fetcher.fetch(&url, &self.settings.primary_user_agent).await {
            Err(err) if page == 1 && err.is_blocked() => {
                story_warn!("First page answered {}, retrying with fallback client id", err.kind);
                self.fetcher
                    .fetch(&url, &self.settings.fallback_user_agent)
                    .await?
            }
            other => other?,
        };

        self.parse_page(&output)
    }

    fn parse_page(&self, output: &FetchOutput) -> Result<Vec<RawStory>, FetchError> {
        if output.bytes.is_empty() {
            return Ok(Vec::new());
        }
        let decoded = decode_html(&output.bytes, output.metadata.content_type.as_deref())?;
        story_debug!(
            "Decoded {} bytes as {} from {} (requested {}, {} redirect(s))",
            output.metadata.byte_len,
            decoded.encoding_label,
            output.metadata.final_url,
            output.metadata.original_url,
            output.metadata.redirect_count
        );
        Ok(self.extractor.extract(&decoded.html))
    }
}

fn page_url(base_url: &str, page: u32) -> Result<String, FetchError> {
    let mut url = Url::parse(base_url)
        .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
    url.query_pairs_mut().append_pair("p", &page.to_string());
    Ok(url.into())
}

fn into_record(raw: RawStory) -> StoryRecord {
    StoryRecord {
        title: raw.title,
        link: raw.link,
        votes: raw.votes,
        age_text: raw.age_text,
    }
}
