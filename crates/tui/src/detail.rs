//! Frozen, scrollable content of the detail screen.

use unicode_width::UnicodeWidthChar;
use webhook_tui_core::WebhookRecord;

/// What a row of detail content represents; drives its styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// `Label: value` metadata line.
    Field,
    /// Section heading ("Headers", "Body").
    Heading,
    /// `name: value` request header.
    Header,
    Body,
    /// Placeholder for an empty body.
    Placeholder,
    Blank,
}

/// One display row. `label_len` is the char count of the highlighted label
/// prefix on this row (0 for continuation rows and unlabeled rows).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRow {
    pub kind: RowKind,
    pub text: String,
    pub label_len: usize,
}

impl DetailRow {
    fn plain(kind: RowKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            label_len: 0,
        }
    }

    fn labeled(kind: RowKind, label: &str, value: &str) -> Self {
        let text = format!("{label}: {value}");
        Self {
            kind,
            label_len: label.chars().count() + 1,
            text,
        }
    }

    pub fn label(&self) -> &str {
        split_at_char(&self.text, self.label_len).0
    }

    pub fn value(&self) -> &str {
        split_at_char(&self.text, self.label_len).1
    }
}

/// Content of the detail screen, captured when the screen is opened.
///
/// Later changes to the record list do not affect an open snapshot. Rows are
/// kept wrapped for the last width given to [`DetailSnapshot::set_width`].
#[derive(Debug, Clone, PartialEq)]
pub struct DetailSnapshot {
    pub id: i64,
    pub method: String,
    rows: Vec<DetailRow>,
    wrap_width: u16,
    lines: Vec<DetailRow>,
}

impl DetailSnapshot {
    pub fn capture(record: &WebhookRecord, width: u16) -> Self {
        let mut rows = vec![
            DetailRow::labeled(RowKind::Field, "Method", &record.method),
            DetailRow::labeled(RowKind::Field, "Path", &record.path),
            DetailRow::labeled(RowKind::Field, "Time", &record.timestamp.to_rfc3339()),
            DetailRow::plain(RowKind::Blank, ""),
            DetailRow::plain(RowKind::Heading, "Headers"),
        ];
        for (name, value) in &record.headers {
            rows.push(DetailRow::labeled(RowKind::Header, &format!("  {name}"), value));
        }
        rows.push(DetailRow::plain(RowKind::Blank, ""));
        rows.push(DetailRow::plain(RowKind::Heading, "Body"));

        let pretty = record
            .body_json
            .as_ref()
            .and_then(|value| serde_json::to_string_pretty(value).ok());
        match pretty {
            Some(text) => push_body(&mut rows, &text),
            None if !record.body.is_empty() => push_body(&mut rows, &record.body),
            None => rows.push(DetailRow::plain(RowKind::Placeholder, "(empty)")),
        }

        let lines = wrap_rows(&rows, width);
        Self {
            id: record.id,
            method: record.method.clone(),
            rows,
            wrap_width: width,
            lines,
        }
    }

    pub fn title(&self) -> String {
        format!("Webhook #{} Details", self.id)
    }

    /// Re-wrap for a new width. Returns false when `width` is unchanged.
    pub fn set_width(&mut self, width: u16) -> bool {
        if width == self.wrap_width {
            return false;
        }
        self.lines = wrap_rows(&self.rows, width);
        self.wrap_width = width;
        true
    }

    pub fn wrap_width(&self) -> u16 {
        self.wrap_width
    }

    /// Rows hard-wrapped to the current width.
    pub fn lines(&self) -> &[DetailRow] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Rows hard-wrapped to an arbitrary `width`, leaving the cache alone.
    pub fn wrapped(&self, width: u16) -> Vec<DetailRow> {
        wrap_rows(&self.rows, width)
    }
}

fn wrap_rows(rows: &[DetailRow], width: u16) -> Vec<DetailRow> {
    let width = usize::from(width.max(1));
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let mut label_len = row.label_len;
        for chunk in wrap_line(&row.text, width) {
            let chunk_chars = chunk.chars().count();
            out.push(DetailRow {
                kind: row.kind,
                label_len: label_len.min(chunk_chars),
                text: chunk,
            });
            label_len = label_len.saturating_sub(chunk_chars);
        }
    }
    out
}

fn push_body(rows: &mut Vec<DetailRow>, text: &str) {
    for line in text.lines() {
        rows.push(DetailRow::plain(RowKind::Body, line.replace('\t', "    ")));
    }
}

fn split_at_char(text: &str, chars: usize) -> (&str, &str) {
    let idx = text
        .char_indices()
        .nth(chars)
        .map_or(text.len(), |(idx, _)| idx);
    text.split_at(idx)
}

/// Hard-wrap one line by display width. An empty line yields one empty row.
fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    for ch in line.chars().filter(|c| *c != '\r') {
        let w = ch.width().unwrap_or(0);
        if current_width + w > width && !current.is_empty() {
            out.push(std::mem::take(&mut current));
            current_width = 0;
        }
        current.push(ch);
        current_width += w;
    }
    out.push(current);
    out
}
