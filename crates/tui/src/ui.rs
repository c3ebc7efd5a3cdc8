use crate::app::{App, FlashLevel, Viewport, ViewState};
use crate::theme::Theme;
use crate::views::{setup, webhook_detail, webhook_list};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

pub fn render(frame: &mut Frame, app: &App) {
    let [header_area, body_area, footer_area] = layout(frame.area());

    render_header(frame, app, header_area);
    match &app.view {
        ViewState::Setup { .. } => setup::render(frame, app, body_area),
        ViewState::Running { .. } => webhook_list::render(frame, app, body_area),
        ViewState::Detail { .. } => webhook_detail::render(frame, app, body_area),
    }
    render_footer(frame, app, footer_area);
}

/// Header, body and footer rows of the screen.
pub fn layout(area: Rect) -> [Rect; 3] {
    Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(area)
}

/// Size of the detail content area for a terminal of `area`.
pub fn detail_viewport(area: Rect) -> Viewport {
    let [_, body, _] = layout(area);
    let content = webhook_detail::content_area(body);
    Viewport {
        width: content.width,
        height: content.height,
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let mode = match app.view {
        ViewState::Setup { .. } => "Setup",
        ViewState::Running { .. } => "Listening",
        ViewState::Detail { .. } => "Detail",
    };
    let header = Line::from(vec![
        Span::styled(" webhook-tui", Style::new().fg(Theme::ACCENT_ORANGE).bold()),
        Span::styled("  Webhook Listener", Style::new().fg(Theme::TEXT_PRIMARY).bold()),
        Span::styled(format!("  [{mode}]"), Style::new().fg(Theme::TEXT_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let key_style = Style::new().fg(Theme::TEXT_KEY);
    let desc_style = Style::new().fg(Theme::TEXT_KEY_DESC);

    let mut spans = match app.view {
        ViewState::Setup { .. } => vec![
            Span::styled(" Tab ", key_style),
            Span::styled("next field  ", desc_style),
            Span::styled("S-Tab ", key_style),
            Span::styled("prev field  ", desc_style),
            Span::styled("Enter ", key_style),
            Span::styled("start  ", desc_style),
            Span::styled("q ", key_style),
            Span::styled("quit", desc_style),
        ],
        ViewState::Running { .. } => {
            let mut spans = vec![
                Span::styled(" j/k ", key_style),
                Span::styled("select  ", desc_style),
            ];
            if app.cursor.total_pages() > 1 {
                spans.push(Span::styled("n/p ", key_style));
                spans.push(Span::styled("page  ", desc_style));
            }
            spans.extend([
                Span::styled("Enter ", key_style),
                Span::styled("details  ", desc_style),
                Span::styled("t ", key_style),
                Span::styled("view  ", desc_style),
            ]);
            if app.tunnel.phase.can_reconnect() {
                spans.push(Span::styled("r ", key_style));
                spans.push(Span::styled("reconnect  ", desc_style));
            }
            spans.extend([
                Span::styled("l ", key_style),
                Span::styled("load DB  ", desc_style),
                Span::styled("c ", key_style),
                Span::styled("clear  ", desc_style),
                Span::styled("q ", key_style),
                Span::styled("quit", desc_style),
            ]);
            spans
        }
        ViewState::Detail { .. } => vec![
            Span::styled(" j/k ", key_style),
            Span::styled("scroll  ", desc_style),
            Span::styled("^f/^b/^d/^u ", key_style),
            Span::styled("page  ", desc_style),
            Span::styled("g/G ", key_style),
            Span::styled("top/bottom  ", desc_style),
            Span::styled("Esc ", key_style),
            Span::styled("back  ", desc_style),
            Span::styled("q ", key_style),
            Span::styled("quit", desc_style),
        ],
    };

    if let Some((ref msg, level)) = app.flash_message {
        let color = match level {
            FlashLevel::Success => Theme::ACCENT_GREEN,
            FlashLevel::Error => Theme::ACCENT_RED,
            FlashLevel::Info => Theme::ACCENT_BLUE,
        };
        spans.push(Span::styled("  ", Style::new()));
        spans.push(Span::styled(msg.as_str(), Style::new().fg(color)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
