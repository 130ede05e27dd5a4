//! Score and rationale extraction from free-form model replies.

use std::sync::LazyLock;

use regex::Regex;

static FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```json|```").expect("valid regex"));
static SCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']score["']\s*:\s*(\d)"#).expect("valid regex"));
static REASON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)["']reason["']\s*:\s*(.+)$"#).expect("valid regex"));

/// Rationale used when a reply has a score but no reason.
pub const REASON_NOT_FOUND: &str = "Reason not found";

/// A score and its rationale parsed out of a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedScore {
    /// First digit after the `score` key.
    pub score: u32,
    /// Text of the `reason` value.
    pub reason: String,
}

/// Parse a reply that looks roughly like `{"score": 1, "reason": "..."}`.
///
/// Markdown code fences are ignored. The score is the single digit after
/// `"score":` (either quote style). The reason is everything after
/// `"reason":`, cut to the span between its first and last quote. Returns
/// `None` when no score is present.
#[must_use]
pub fn extract_score(response: &str) -> Option<ParsedScore> {
    let cleaned = FENCE.replace_all(response, "");
    let cleaned = cleaned.trim();

    let score = SCORE.captures(cleaned)?.get(1)?.as_str().parse().ok()?;

    let reason = REASON
        .captures(cleaned)
        .and_then(|c| c.get(1))
        .map_or_else(|| REASON_NOT_FOUND.to_string(), |m| strip_to_quotes(m.as_str()));

    Some(ParsedScore { score, reason })
}

/// Text between the first and last quote of either style.
///
/// Without a usable pair of quotes the trimmed input is returned.
fn strip_to_quotes(s: &str) -> String {
    let is_quote = |c: char| c == '"' || c == '\'';
    match (s.find(is_quote), s.rfind(is_quote)) {
        (Some(first), Some(last)) if first < last => s[first + 1..last].to_string(),
        _ => s.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json() {
        let parsed = extract_score(r#"{"score": 1, "reason": "The cat is present."}"#).unwrap();
        assert_eq!(parsed.score, 1);
        assert_eq!(parsed.reason, "The cat is present.");
    }

    #[test]
    fn test_fenced_reply_with_single_quotes() {
        let reply = "```json\n{'score': 0, 'reason': 'No cat; the image shows a dog.'}\n```";
        let parsed = extract_score(reply).unwrap();
        assert_eq!(parsed.score, 0);
        assert_eq!(parsed.reason, "No cat; the image shows a dog.");
    }

    #[test]
    fn test_reason_keeps_inner_quotes() {
        let reply = r#"{"score": 1, "reason": "It reads "hello" clearly"}"#;
        assert_eq!(extract_score(reply).unwrap().reason, r#"It reads "hello" clearly"#);
    }

    #[test]
    fn test_multiline_reason() {
        let reply = "{\"score\": 1,\n \"reason\": \"first line\nsecond line\"\n}";
        assert_eq!(extract_score(reply).unwrap().reason, "first line\nsecond line");
    }

    #[test]
    fn test_missing_reason() {
        let parsed = extract_score(r#"{"score": 1}"#).unwrap();
        assert_eq!(parsed.reason, REASON_NOT_FOUND);
    }

    #[test]
    fn test_only_first_digit_taken() {
        assert_eq!(extract_score(r#"{"score": 10}"#).unwrap().score, 1);
    }

    #[test]
    fn test_missing_score() {
        assert!(extract_score("I cannot evaluate this image.").is_none());
        assert!(extract_score(r#"{"score": "high"}"#).is_none());
        assert!(extract_score("Error").is_none());
    }
}
