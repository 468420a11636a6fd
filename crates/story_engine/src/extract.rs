use scraper::{ElementRef, Html, Selector};
use url::Url;

/// One listing entry before any filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStory {
    pub title: String,
    pub link: String,
    /// Zero when the entry shows no score.
    pub votes: u32,
    pub age_text: String,
}

pub trait ListingExtractor: Send + Sync {
    fn extract(&self, html: &str) -> Vec<RawStory>;
}

/// Extractor for the Hacker News listing markup:
/// - each story is a `tr.athing` row holding `span.titleline > a`
/// - the next `tr` sibling carries `span.score` and `span.age`
/// - rows without a title link or a following row are skipped.
#[derive(Debug, Clone)]
pub struct HnListingExtractor {
    site_root: Url,
}

struct ListingSelectors {
    row: Selector,
    title: Selector,
    score: Selector,
    age: Selector,
}

impl ListingSelectors {
    fn parse() -> Option<Self> {
        Some(Self {
            row: Selector::parse("tr.athing").ok()?,
            title: Selector::parse("span.titleline > a").ok()?,
            score: Selector::parse("span.score").ok()?,
            age: Selector::parse("span.age").ok()?,
        })
    }
}

impl HnListingExtractor {
    /// `base_url` is the listing URL; relative story links resolve against its root.
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        let site_root = Url::parse(base_url)?.join("/")?;
        Ok(Self { site_root })
    }
}

impl ListingExtractor for HnListingExtractor {
    fn extract(&self, html: &str) -> Vec<RawStory> {
        let Some(sel) = ListingSelectors::parse() else {
            return Vec::new();
        };
        let doc = Html::parse_document(html);

        let mut stories = Vec::new();
        for row in doc.select(&sel.row) {
            let Some(title_link) = row.select(&sel.title).next() else {
                continue;
            };
            let Some(meta_row) = next_row(row) else {
                continue;
            };

            let title = element_text(title_link);
            let href = title_link.value().attr("href").unwrap_or_default();
            let votes = meta_row
                .select(&sel.score)
                .next()
                .map(|score| leading_number(&element_text(score)))
                .unwrap_or(0);
            let age_text = meta_row
                .select(&sel.age)
                .next()
                .map(element_text)
                .unwrap_or_default();

            stories.push(RawStory {
                title,
                link: normalize_link(&self.site_root, href),
                votes,
                age_text,
            });
        }
        stories
    }
}

fn next_row(row: ElementRef<'_>) -> Option<ElementRef<'_>> {
    row.next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "tr")
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn leading_number(text: &str) -> u32 {
    let digits: String = text.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

/// Make a listing link absolute: `item?`/`from?` links and root-relative
/// paths resolve against the site root; anything else is kept verbatim.
pub fn normalize_link(site_root: &Url, href: &str) -> String {
    let relative = href.starts_with("item?") || href.starts_with("from?") || href.starts_with('/');
    if !relative {
        return href.to_string();
    }
    site_root
        .join(href)
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}
