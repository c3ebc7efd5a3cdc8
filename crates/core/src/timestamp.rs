use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Legacy layouts written by earlier versions (and by SQLite's `CURRENT_TIMESTAMP`).
const LEGACY_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Canonical stored form: RFC3339 with full sub-second precision.
pub fn format_stored(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse a stored timestamp. Unparseable values decode to the Unix epoch so a
/// single bad row never fails a whole page.
pub fn parse_stored(value: &str) -> DateTime<Utc> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return dt.with_timezone(&Utc);
    }
    for format in LEGACY_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return dt.and_utc();
        }
    }
    DateTime::<Utc>::UNIX_EPOCH
}
