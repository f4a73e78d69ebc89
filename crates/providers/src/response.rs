//! Chat-completions response decoding.
//!
//! Walks the JSON by hand instead of deriving, so that a missing `content`
//! degrades to an empty answer while a broken envelope is an error.

use crate::ProviderError;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatCompletion {
    pub finish_reason: Option<String>,
    pub content: Option<String>,
}

impl ChatCompletion {
    pub fn content_or_empty(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

pub fn parse_completion(body: &str) -> Result<ChatCompletion, ProviderError> {
    let root: Value = serde_json::from_str(body)
        .map_err(|e| ProviderError::MalformedResponse(format!("invalid JSON: {e}")))?;

    let choices = root
        .get("choices")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::MalformedResponse("missing choices array".into()))?;
    let first = choices
        .first()
        .ok_or_else(|| ProviderError::MalformedResponse("empty choices array".into()))?;
    let message = first
        .get("message")
        .filter(|m| m.is_object())
        .ok_or_else(|| ProviderError::MalformedResponse("choice has no message object".into()))?;

    Ok(ChatCompletion {
        finish_reason: first
            .get("finish_reason")
            .and_then(Value::as_str)
            .map(str::to_string),
        content: message
            .get("content")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_choice() {
        let body = r#"{"choices":[{"finish_reason":"stop","message":{"role":"assistant","content":"Yes."}},{"message":{"content":"No"}}]}"#;
        let completion = parse_completion(body).unwrap();
        assert_eq!(completion.finish_reason.as_deref(), Some("stop"));
        assert_eq!(completion.content.as_deref(), Some("Yes."));
    }

    #[test]
    fn null_finish_reason_and_content_are_allowed() {
        let body = r#"{"choices":[{"finish_reason":null,"message":{"content":null}}]}"#;
        let completion = parse_completion(body).unwrap();
        assert_eq!(completion.finish_reason, None);
        assert_eq!(completion.content_or_empty(), "");
    }

    #[test]
    fn broken_envelopes_are_malformed() {
        for body in [
            "not json",
            "{}",
            r#"{"choices":{}}"#,
            r#"{"choices":[]}"#,
            r#"{"choices":[1]}"#,
            r#"{"choices":[{"message":"hi"}]}"#,
            r#"{"error":{"message":"model not loaded"}}"#,
        ] {
            assert!(
                matches!(parse_completion(body), Err(ProviderError::MalformedResponse(_))),
                "expected malformed for {body}"
            );
        }
    }
}
