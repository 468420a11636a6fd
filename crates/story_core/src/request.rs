use std::ops::RangeInclusive;

pub const DAYS_RANGE: RangeInclusive<u32> = 1..=30;
pub const MIN_VOTES_RANGE: RangeInclusive<u32> = 0..=5000;
pub const MAX_PAGES_RANGE: RangeInclusive<u32> = 1..=20;

/// Parameters handed to the backend. Only constructible through clamping,
/// so every value is inside its documented range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationRequest {
    days: u32,
    min_votes: u32,
    max_pages: u32,
}

impl InvocationRequest {
    pub fn clamped(days: i64, min_votes: i64, max_pages: i64) -> Self {
        Self {
            days: clamp_to(days, &DAYS_RANGE),
            min_votes: clamp_to(min_votes, &MIN_VOTES_RANGE),
            max_pages: clamp_to(max_pages, &MAX_PAGES_RANGE),
        }
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn min_votes(&self) -> u32 {
        self.min_votes
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    pub fn cutoff_seconds(&self) -> u64 {
        u64::from(self.days) * 86_400
    }

    /// Flags passed to the backend process, in a fixed order.
    pub fn to_args(&self) -> Vec<String> {
        vec![
            "--days".to_string(),
            self.days.to_string(),
            "--min-votes".to_string(),
            self.min_votes.to_string(),
            "--max-pages".to_string(),
            self.max_pages.to_string(),
        ]
    }
}

impl Default for InvocationRequest {
    fn default() -> Self {
        Self::clamped(7, 250, 5)
    }
}

fn clamp_to(value: i64, range: &RangeInclusive<u32>) -> u32 {
    let low = i64::from(*range.start());
    let high = i64::from(*range.end());
    // Bounded by a u32 range, so the cast is lossless.
    value.clamp(low, high) as u32
}
