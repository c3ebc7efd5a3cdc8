use crate::app::{App, PublicIpStatus, ViewState};
use crate::theme::Theme;
use ratatui::prelude::*;
use ratatui::widgets::{Padding, Paragraph};
use webhook_tui_runtime_config::SetupField;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let [title_area, ip_area, form_area, hint_area] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Length(4),
        Constraint::Length(11),
        Constraint::Fill(1),
    ])
    .areas(area);

    // ── Title ─────────────────────────────────────────────────────────
    let title = Paragraph::new(vec![
        Line::from(Span::styled(
            "Start a webhook listener",
            Style::new().fg(Theme::TEXT_PRIMARY).bold(),
        )),
        Line::from(Span::styled(
            "Incoming requests are stored locally and exposed through a public tunnel.",
            Style::new().fg(Color::DarkGray),
        )),
    ])
    .block(Theme::block().padding(Padding::new(2, 2, 0, 0)));
    frame.render_widget(title, title_area);

    // ── Public IP ─────────────────────────────────────────────────────
    let ip_lines = match &app.public_ip {
        PublicIpStatus::Fetching => vec![Line::from(Span::styled(
            "Fetching...",
            Style::new().fg(Theme::ACCENT_YELLOW),
        ))],
        PublicIpStatus::Resolved(ip) => vec![
            Line::from(Span::styled(ip.as_str(), Style::new().fg(Theme::ACCENT_CYAN).bold())),
            Line::from(Span::styled(
                "(Use this for webhook authentication if needed)",
                Style::new().fg(Theme::TEXT_HINT),
            )),
        ],
        PublicIpStatus::Unavailable => vec![Line::from(Span::styled(
            "Unable to fetch",
            Style::new().fg(Theme::ACCENT_RED),
        ))],
    };
    let ip = Paragraph::new(ip_lines).block(
        Theme::block_dim()
            .title(" Public IP Address ")
            .padding(Theme::PADDING_COMPACT),
    );
    frame.render_widget(ip, ip_area);

    // ── Form ─────────────────────────────────────────────────────────
    render_form(frame, app, form_area);

    // ── Hints ─────────────────────────────────────────────────────────
    let hints = Paragraph::new(vec![
        Line::raw(""),
        Line::from(Span::styled(
            "Leave a field empty to use its default.",
            Style::new().fg(Theme::TEXT_HINT),
        )),
    ]);
    frame.render_widget(hints, hint_area);
}

fn render_form(frame: &mut Frame, app: &App, area: Rect) {
    let focused = match app.view {
        ViewState::Setup { focused } => focused,
        _ => SetupField::default(),
    };

    let block = Theme::block_accent()
        .title(" Listener ")
        .padding(Theme::PADDING_COMPACT);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = Vec::new();
    for field in SetupField::ALL {
        let selected = field == focused;
        let pointer = if selected { ">" } else { " " };
        let pointer_style = if selected {
            Style::new().fg(Color::Cyan).bold()
        } else {
            Style::new().fg(Color::DarkGray)
        };
        let label_style = if selected {
            Style::new().fg(Theme::TEXT_PRIMARY).bold()
        } else {
            Style::new().fg(Theme::TEXT_SECONDARY)
        };
        let bg = if selected {
            Style::new().bg(Theme::BG_SURFACE)
        } else {
            Style::new()
        };

        let value = app.setup.value(field);
        let value_span = if selected {
            Span::styled(format!("{value}|"), Style::new().fg(Theme::ACCENT_YELLOW))
        } else if value.is_empty() {
            Span::styled(field.placeholder(), Style::new().fg(Theme::TEXT_MUTED))
        } else {
            Span::styled(value, Style::new().fg(Theme::FIELD_VALUE))
        };

        lines.push(
            Line::from(vec![
                Span::styled(format!(" {pointer} "), pointer_style),
                Span::styled(format!("{:<22}", field.label()), label_style),
                value_span,
            ])
            .style(bg),
        );
        lines.push(Line::from(vec![
            Span::raw("   "),
            Span::styled(field_help(app, field), Style::new().fg(Theme::TEXT_HINT)),
        ]));
        lines.push(Line::raw(""));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn field_help(app: &App, field: SetupField) -> String {
    match field {
        SetupField::Port => format!(
            "Port for the local webhook server (default: {})",
            app.defaults.default_port
        ),
        SetupField::Subdomain => {
            "Custom subdomain for localtunnel (e.g. my-app -> my-app.loca.lt)".to_string()
        }
        SetupField::Timeout => format!(
            "Auto-disconnect tunnel after this many minutes (default: {})",
            app.defaults.default_timeout_minutes
        ),
    }
}
