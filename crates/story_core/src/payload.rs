use serde::{Deserialize, Serialize};

use crate::orchestrator::InvocationError;

/// One story as emitted by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryRecord {
    pub title: String,
    pub link: String,
    pub votes: u32,
    pub age_text: String,
}

/// The single JSON object the backend writes to stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// `YYYY-MM-DD HH:MM:SS`, UTC.
    pub generated_at_utc: String,
    pub days: u32,
    pub min_votes: u32,
    pub stories: Vec<StoryRecord>,
}

/// What the caller hands to the view layer: always renderable, even when
/// the backend could not be run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResult {
    pub ok: bool,
    pub payload: Option<Payload>,
    pub error: Option<String>,
    pub stderr_detail: Option<String>,
    /// Start of the backend's stdout when it could not be parsed.
    pub stdout_preview: Option<String>,
    pub command: Option<String>,
    pub hint: Option<String>,
}

impl InvocationResult {
    pub fn success(payload: Payload) -> Self {
        Self {
            ok: true,
            payload: Some(payload),
            error: None,
            stderr_detail: None,
            stdout_preview: None,
            command: None,
            hint: None,
        }
    }

    pub fn failure(err: &InvocationError, hint: Option<String>) -> Self {
        let diagnostics = err.diagnostics();
        let stderr = diagnostics.stderr.trim();
        Self {
            ok: false,
            payload: None,
            error: Some(err.to_string()),
            stderr_detail: (!stderr.is_empty()).then(|| stderr.to_string()),
            stdout_preview: (!diagnostics.stdout_preview.is_empty())
                .then(|| diagnostics.stdout_preview.clone()),
            command: (!diagnostics.command.is_empty()).then(|| diagnostics.command.clone()),
            hint,
        }
    }

    /// Stories to render; empty on failure.
    pub fn stories(&self) -> &[StoryRecord] {
        self.payload
            .as_ref()
            .map(|payload| payload.stories.as_slice())
            .unwrap_or(&[])
    }
}
