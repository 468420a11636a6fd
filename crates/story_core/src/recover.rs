use serde_json::Value;
use thiserror::Error;

use crate::payload::Payload;
use crate::preview::{prepare_preview, MAX_STDOUT_PREVIEW};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecoveryError {
    #[error("backend output is not a JSON object: {reason}")]
    InvalidOutput {
        reason: String,
        stdout_preview: String,
        stderr: String,
    },
}

impl RecoveryError {
    fn invalid(reason: impl Into<String>, stdout: &str, stderr: &str) -> Self {
        RecoveryError::InvalidOutput {
            reason: reason.into(),
            stdout_preview: prepare_preview(stdout, MAX_STDOUT_PREVIEW),
            stderr: stderr.to_string(),
        }
    }
}

/// Parse backend stdout as a JSON object.
///
/// Exact parsing is tried first. If that fails, the text between the first
/// `{` and the last `}` is parsed instead, which recovers an object printed
/// among warnings or log lines.
pub fn recover_json_object(stdout: &str, stderr: &str) -> Result<Value, RecoveryError> {
    let text = stdout.strip_prefix('\u{feff}').unwrap_or(stdout);

    if let Some(object) = parse_object(text.trim()) {
        return Ok(object);
    }
    if let Some(object) = extract_embedded_object(text) {
        return Ok(object);
    }

    let reason = if text.trim().is_empty() {
        "empty output"
    } else {
        "no parseable object found"
    };
    Err(RecoveryError::invalid(reason, stdout, stderr))
}

/// Recover the object and check it against the payload schema.
pub fn recover_payload(stdout: &str, stderr: &str) -> Result<Payload, RecoveryError> {
    let object = recover_json_object(stdout, stderr)?;
    serde_json::from_value(object).map_err(|err| {
        RecoveryError::invalid(format!("payload schema mismatch: {err}"), stdout, stderr)
    })
}

fn parse_object(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(Value::is_object)
}

fn extract_embedded_object(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    parse_object(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exact_object_parses() {
        let value = recover_json_object(r#"{"a":1}"#, "").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn leading_bom_is_stripped() {
        let value = recover_json_object("\u{feff}{\"a\":1}", "").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn bare_scalars_are_not_objects() {
        assert!(recover_json_object("42", "").is_err());
        assert!(recover_json_object("[1,2]", "").is_err());
    }

    #[test]
    fn reversed_braces_do_not_match() {
        assert!(recover_json_object("} junk {", "").is_err());
    }
}
