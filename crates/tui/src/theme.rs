use ratatui::prelude::*;
use ratatui::widgets::{Block, BorderType, Padding};
use std::time::Duration;

pub struct Theme;

impl Theme {
    // ── Background ───────────────────────────────────────────────────
    pub const BG_SURFACE: Color = Color::Rgb(30, 35, 50);

    // ── Border ───────────────────────────────────────────────────────
    pub const BORDER_DIM: Color = Color::DarkGray;
    pub const BORDER_NORMAL: Color = Color::Rgb(60, 65, 80);
    pub const BORDER_ACCENT: Color = Color::Rgb(100, 180, 240);

    // ── Text hierarchy ───────────────────────────────────────────────
    pub const TEXT_PRIMARY: Color = Color::White;
    pub const TEXT_SECONDARY: Color = Color::Rgb(140, 145, 160);
    pub const TEXT_MUTED: Color = Color::Rgb(80, 85, 100);
    pub const TEXT_HINT: Color = Color::Rgb(60, 65, 80);
    pub const TEXT_CONTENT: Color = Color::Rgb(170, 175, 190);

    // ── Key style (for footer hints) ─────────────────────────────────
    pub const TEXT_KEY: Color = Color::Rgb(140, 145, 160);
    pub const TEXT_KEY_DESC: Color = Color::DarkGray;

    // ── Accent ───────────────────────────────────────────────────────
    pub const ACCENT_BLUE: Color = Color::Rgb(100, 180, 240);
    pub const ACCENT_GREEN: Color = Color::Rgb(80, 200, 120);
    pub const ACCENT_RED: Color = Color::Rgb(220, 80, 80);
    pub const ACCENT_YELLOW: Color = Color::Rgb(220, 180, 60);
    pub const ACCENT_PURPLE: Color = Color::Rgb(180, 140, 220);
    pub const ACCENT_ORANGE: Color = Color::Rgb(217, 119, 80);
    pub const ACCENT_CYAN: Color = Color::Rgb(80, 200, 200);

    // ── Form ─────────────────────────────────────────────────────────
    pub const FIELD_VALUE: Color = Color::Rgb(100, 105, 120);

    // ── Padding ──────────────────────────────────────────────────────
    pub const PADDING_COMPACT: Padding = Padding::new(1, 1, 0, 0);

    // ── Block helpers ────────────────────────────────────────────────

    pub fn block() -> Block<'static> {
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(Self::BORDER_NORMAL))
    }

    pub fn block_dim() -> Block<'static> {
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(Self::BORDER_DIM))
    }

    pub fn block_accent() -> Block<'static> {
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(Self::BORDER_ACCENT))
    }
}

// ── HTTP method colors ───────────────────────────────────────────────

pub fn method_color(method: &str) -> Color {
    match method {
        "GET" => Theme::ACCENT_GREEN,
        "POST" => Theme::ACCENT_BLUE,
        "PUT" => Theme::ACCENT_ORANGE,
        "DELETE" => Theme::ACCENT_RED,
        "PATCH" => Theme::ACCENT_PURPLE,
        _ => Theme::TEXT_SECONDARY,
    }
}

// ── Tunnel countdown ─────────────────────────────────────────────────

/// Green with plenty of time left, yellow under five minutes, red under one.
pub fn countdown_color(remaining: Duration) -> Color {
    if remaining < Duration::from_secs(60) {
        Theme::ACCENT_RED
    } else if remaining < Duration::from_secs(5 * 60) {
        Theme::ACCENT_YELLOW
    } else {
        Theme::ACCENT_GREEN
    }
}

/// `MM:SS`, minutes uncapped.
pub fn format_countdown(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
