//! Reply parsing: turn the model's text into an [`AnalysisResult`].
//!
//! Models are asked for strict JSON but routinely wrap it in Markdown code
//! fences, and occasionally put a sentence of prose in front of it. Both are
//! tolerated here; anything else is a [`AnalysisError::MalformedReply`].

use crate::error::AnalysisError;
use crate::model::AnalysisResult;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

/// How much of a bad reply is quoted back in the error.
const EXCERPT_CHARS: usize = 120;

static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)```(?:json)?").unwrap());

/// Remove every code-fence marker and trim the remainder.
pub fn strip_code_fences(reply: &str) -> String {
    RE_FENCE.replace_all(reply, "").trim().to_string()
}

/// Parse a raw model reply.
///
/// Fence markers are stripped first. If the rest is not valid JSON, the
/// slice from the first `{` to the last `}` is tried once.
pub fn parse_reply(reply: &str) -> Result<AnalysisResult, AnalysisError> {
    let cleaned = strip_code_fences(reply);

    let value = match serde_json::from_str::<Value>(&cleaned) {
        Ok(v) => v,
        Err(first) => match brace_slice(&cleaned).and_then(|s| serde_json::from_str::<Value>(s).ok()) {
            Some(v) => {
                warn!("Model reply had text around the JSON object; using the embedded object");
                v
            }
            None => return Err(malformed(first.to_string(), &cleaned)),
        },
    };

    if !value.is_object() {
        return Err(malformed("expected a JSON object".to_string(), &cleaned));
    }

    serde_json::from_value(value).map_err(|e| malformed(e.to_string(), &cleaned))
}

fn brace_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn malformed(detail: String, reply: &str) -> AnalysisError {
    AnalysisError::MalformedReply {
        detail,
        excerpt: reply.chars().take(EXCERPT_CHARS).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BARE: &str = r#"{
        "company_name": "Tata Motors",
        "current_fy": "2024",
        "financials": [
            {"year": "2024", "revenue": 1000, "net_profit": 100},
            {"year": "2023", "revenue": 900, "net_profit": 90}
        ]
    }"#;

    #[test]
    fn fenced_reply_equals_bare_reply() {
        let fenced = format!("```json\n{}\n```", BARE);
        assert_eq!(parse_reply(&fenced).unwrap(), parse_reply(BARE).unwrap());

        let plain_fence = format!("```\n{}\n```\n", BARE);
        assert_eq!(parse_reply(&plain_fence).unwrap(), parse_reply(BARE).unwrap());
    }

    #[test]
    fn prose_prefix_falls_back_to_brace_slice() {
        let chatty = format!("Here is the analysis you asked for:\n{}\nLet me know!", BARE);
        let parsed = parse_reply(&chatty).unwrap();
        assert_eq!(parsed.company_name(), "Tata Motors");
        assert_eq!(parsed.financials.len(), 2);
    }

    #[test]
    fn non_json_is_malformed_with_excerpt() {
        match parse_reply("Sorry, the document is unreadable.") {
            Err(AnalysisError::MalformedReply { excerpt, .. }) => {
                assert!(excerpt.starts_with("Sorry"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn array_reply_is_rejected() {
        assert!(matches!(
            parse_reply("[1, 2, 3]"),
            Err(AnalysisError::MalformedReply { .. })
        ));
    }

    #[test]
    fn empty_object_is_accepted() {
        let parsed = parse_reply("```json\n{}\n```").unwrap();
        assert_eq!(parsed, AnalysisResult::default());
    }

    #[test]
    fn excerpt_is_bounded() {
        let long = "x".repeat(1000);
        match parse_reply(&long) {
            Err(AnalysisError::MalformedReply { excerpt, .. }) => {
                assert_eq!(excerpt.chars().count(), EXCERPT_CHARS)
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
