use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Header name → all values joined with `", "`.
pub type HeaderMap = BTreeMap<String, String>;

/// One received HTTP call. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub path: String,
    pub headers: HeaderMap,
    pub body: String,
    /// Structured body, present iff `body` is valid JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_json: Option<Value>,
}

impl WebhookRecord {
    /// Build a record from a captured request, parsing the body as JSON when possible.
    pub fn capture(
        id: i64,
        timestamp: DateTime<Utc>,
        method: impl Into<String>,
        path: impl Into<String>,
        headers: HeaderMap,
        body: impl Into<String>,
    ) -> Self {
        let body = body.into();
        let body_json = parse_body_json(&body);
        Self {
            id,
            timestamp,
            method: method.into(),
            path: path.into(),
            headers,
            body,
            body_json,
        }
    }

    /// Single-line preview of the raw body, cut to `max` characters.
    pub fn body_preview(&self, max: usize) -> String {
        truncate_single_line(&self.body, max)
    }
}

/// Parse a request body as JSON. Invalid JSON is expected input, not an error.
pub fn parse_body_json(body: &str) -> Option<Value> {
    if body.trim().is_empty() {
        return None;
    }
    serde_json::from_str(body).ok()
}

/// Collect `(name, value)` pairs into a [`HeaderMap`], joining repeated names.
pub fn collect_headers<I, K, V>(pairs: I) -> HeaderMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: AsRef<str>,
{
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        headers
            .entry(name.into())
            .and_modify(|joined: &mut String| {
                joined.push_str(", ");
                joined.push_str(value.as_ref());
            })
            .or_insert_with(|| value.as_ref().to_string());
    }
    headers
}

/// Flatten line breaks and cut to `max` characters, appending `...` when cut.
pub fn truncate_single_line(text: &str, max: usize) -> String {
    let flat: String = text
        .chars()
        .filter(|c| *c != '\r')
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    if flat.chars().count() <= max {
        return flat;
    }
    let mut cut: String = flat.chars().take(max).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn capture_attaches_json_body_when_valid() {
        let record = testing::record_with_body(1, r#"{"event":"test"}"#);
        assert_eq!(
            record.body_json,
            Some(serde_json::json!({ "event": "test" }))
        );
    }

    #[test]
    fn capture_leaves_json_absent_for_plain_text() {
        let record = testing::record_with_body(1, "hello=world");
        assert!(record.body_json.is_none());
        assert_eq!(record.body, "hello=world");
    }

    #[test]
    fn empty_body_has_no_json() {
        assert!(parse_body_json("").is_none());
        assert!(parse_body_json("   ").is_none());
    }

    #[test]
    fn scalar_json_bodies_are_structured() {
        assert_eq!(parse_body_json("42"), Some(serde_json::json!(42)));
    }

    #[test]
    fn repeated_headers_are_joined() {
        let headers = collect_headers([
            ("accept", "text/plain"),
            ("x-trace", "a"),
            ("accept", "application/json"),
        ]);
        assert_eq!(headers["accept"], "text/plain, application/json");
        assert_eq!(headers["x-trace"], "a");
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn preview_flattens_and_truncates() {
        assert_eq!(truncate_single_line("a\r\nb", 10), "a b");
        assert_eq!(truncate_single_line("abcdef", 3), "abc...");
        assert_eq!(truncate_single_line("", 3), "");
    }
}
