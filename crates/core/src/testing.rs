use crate::record::{HeaderMap, WebhookRecord};
use chrono::{TimeZone, Utc};

/// POST record with a JSON content type and the given body.
pub fn record_with_body(id: i64, body: &str) -> WebhookRecord {
    let mut headers = HeaderMap::new();
    headers.insert("content-type".to_string(), "application/json".to_string());
    WebhookRecord::capture(
        id,
        Utc.timestamp_opt(1_700_000_000 + id, 0).unwrap(),
        "POST",
        "/webhook",
        headers,
        body,
    )
}

/// GET record with no headers and an empty body.
pub fn record(id: i64) -> WebhookRecord {
    WebhookRecord::capture(
        id,
        Utc.timestamp_opt(1_700_000_000 + id, 0).unwrap(),
        "GET",
        format!("/hook/{id}"),
        HeaderMap::new(),
        "",
    )
}

/// `count` records with ids `1..=count`, newest first (store page order).
pub fn records_desc(count: i64) -> Vec<WebhookRecord> {
    (1..=count).rev().map(record).collect()
}
