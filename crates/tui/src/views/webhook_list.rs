use crate::app::{App, ListMode, PublicIpStatus, ServerStatus};
use crate::theme::{self, Theme};
use chrono::{DateTime, Local, Utc};
use ratatui::prelude::*;
use ratatui::widgets::{
    Cell, HighlightSpacing, List, ListItem, ListState, Paragraph, Row, Table, TableState,
};
use webhook_tui_core::WebhookRecord;
use webhook_tui_core::record::truncate_single_line;
use webhook_tui_tunnel::TunnelPhase;

const PATH_WIDTH: usize = 20;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let status = status_lines(app, Utc::now());
    let [status_area, title_area, list_area] = Layout::vertical([
        Constraint::Length(status.len() as u16 + 2),
        Constraint::Length(1),
        Constraint::Fill(1),
    ])
    .areas(area);

    let status_block = Theme::block().title(" Status ").padding(Theme::PADDING_COMPACT);
    frame.render_widget(Paragraph::new(status).block(status_block), status_area);

    frame.render_widget(Paragraph::new(list_title(app)), title_area);

    if app.records.is_empty() {
        let waiting = Paragraph::new(Line::from(Span::styled(
            "  Waiting for webhooks...",
            Style::new().fg(Theme::TEXT_MUTED),
        )))
        .block(Theme::block_dim());
        frame.render_widget(waiting, list_area);
        return;
    }

    match app.list_mode {
        ListMode::Table => render_table(frame, app, list_area),
        ListMode::List => render_list(frame, app, list_area),
    }
}

/// Public IP, server, tunnel and store lines of the status block.
pub fn status_lines(app: &App, now: DateTime<Utc>) -> Vec<Line<'static>> {
    let label = |text: &'static str| Span::styled(text, Style::new().fg(Theme::TEXT_SECONDARY));
    let ok = Style::new().fg(Theme::ACCENT_GREEN);
    let err = Style::new().fg(Theme::ACCENT_RED);
    let muted = Style::new().fg(Theme::TEXT_MUTED);
    let mut lines = Vec::new();

    let ip = match &app.public_ip {
        PublicIpStatus::Fetching => Span::styled("Fetching...", muted),
        PublicIpStatus::Resolved(ip) => {
            Span::styled(ip.clone(), Style::new().fg(Theme::ACCENT_CYAN).bold())
        }
        PublicIpStatus::Unavailable => Span::styled("Unable to fetch", err),
    };
    lines.push(Line::from(vec![label("Public IP: "), ip]));

    let server = match &app.server {
        ServerStatus::NotStarted => vec![Span::styled("not started", muted)],
        ServerStatus::Starting { port } => {
            vec![Span::styled(format!("Starting on port {port}..."), muted)]
        }
        ServerStatus::Listening { port } => vec![
            Span::styled("● ", ok),
            Span::styled(format!("listening on port {port}"), Style::new().fg(Theme::TEXT_PRIMARY)),
        ],
        ServerStatus::Failed(e) => vec![Span::styled("✗ ", err), Span::styled(e.clone(), err)],
    };
    lines.push(Line::from([vec![label("Server: ")], server].concat()));

    let tunnel = &app.tunnel;
    match tunnel.phase {
        TunnelPhase::Errored => {
            lines.push(Line::from(vec![
                label("Tunnel: "),
                Span::styled("✗ ", err),
                Span::styled(tunnel.error.clone(), err),
                Span::styled("  press 'r' to reconnect", muted),
            ]));
        }
        TunnelPhase::Expired => {
            lines.push(Line::from(vec![
                label("Tunnel: "),
                Span::styled("● DISCONNECTED", err),
                Span::styled(
                    format!(
                        " (auto-shutdown after {}m) - press 'r' to reconnect",
                        tunnel.timeout.as_secs() / 60
                    ),
                    muted,
                ),
            ]));
            lines.push(Line::from(vec![
                label("Last URL: "),
                Span::styled(tunnel.url.clone(), muted),
            ]));
        }
        TunnelPhase::Active => {
            let remaining = tunnel.remaining_at(now).unwrap_or_default();
            lines.push(Line::from(vec![
                label("Tunnel: "),
                Span::styled("● ", ok),
                Span::styled(tunnel.url.clone(), Style::new().fg(Theme::TEXT_PRIMARY)),
            ]));
            lines.push(Line::from(vec![
                label("Webhook URL: "),
                Span::styled(
                    tunnel.webhook_url(),
                    Style::new().fg(Theme::ACCENT_CYAN).bold(),
                ),
            ]));
            lines.push(Line::from(vec![
                label("Expires in: "),
                Span::styled(
                    theme::format_countdown(remaining),
                    Style::new().fg(theme::countdown_color(remaining)).bold(),
                ),
            ]));
        }
        TunnelPhase::Terminated => {
            lines.push(Line::from(vec![
                label("Tunnel: "),
                Span::styled("stopped - press 'r' to reconnect", muted),
            ]));
        }
        TunnelPhase::Idle | TunnelPhase::Starting => {
            let subdomain = tunnel
                .subdomain
                .as_deref()
                .map(|s| format!(" (subdomain: {s})"))
                .unwrap_or_default();
            lines.push(Line::from(vec![
                label("Tunnel: "),
                Span::styled(
                    format!("Starting localtunnel...{subdomain}"),
                    Style::new().fg(Theme::ACCENT_YELLOW),
                ),
            ]));
        }
    }

    if let Some(e) = &app.store_error {
        lines.push(Line::from(vec![
            label("Store: "),
            Span::styled(format!("✗ {e}"), err),
        ]));
    }

    lines
}

fn list_title(app: &App) -> Line<'static> {
    let count = if app.cursor.total() > 0 {
        format!("{} total", app.cursor.total())
    } else {
        app.records.len().to_string()
    };
    let mut spans = vec![Span::styled(
        format!(" Webhooks ({count})"),
        Style::new().fg(Theme::ACCENT_BLUE).bold(),
    )];
    if app.cursor.total_pages() > 1 {
        spans.push(Span::styled(
            format!(
                "  Page {}/{} |",
                app.cursor.page() + 1,
                app.cursor.total_pages()
            ),
            Style::new().fg(Theme::TEXT_SECONDARY),
        ));
    }
    spans.push(Span::styled(
        format!(" [{}]", app.list_mode.label()),
        Style::new().fg(Theme::TEXT_MUTED),
    ));
    Line::from(spans)
}

fn local_time(record: &WebhookRecord) -> String {
    record
        .timestamp
        .with_timezone(&Local)
        .format("%H:%M:%S")
        .to_string()
}

fn body_preview(record: &WebhookRecord, max: usize, empty: &'static str) -> String {
    let preview = record.body_preview(max);
    if preview.is_empty() {
        empty.to_string()
    } else {
        preview
    }
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(["ID", "Time", "Method", "Path", "Body Preview"])
        .style(Style::new().fg(Theme::ACCENT_BLUE).bold());

    let rows: Vec<Row> = app
        .records
        .iter()
        .map(|record| {
            Row::new(vec![
                Cell::from(record.id.to_string()),
                Cell::from(local_time(record)),
                Cell::from(Span::styled(
                    record.method.clone(),
                    Style::new().fg(theme::method_color(&record.method)),
                )),
                Cell::from(truncate_single_line(&record.path, PATH_WIDTH - 3)),
                Cell::from(Span::styled(
                    body_preview(record, 37, "(empty)"),
                    Style::new().fg(Theme::TEXT_CONTENT),
                )),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(7),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(PATH_WIDTH as u16),
            Constraint::Fill(1),
        ],
    )
    .header(header)
    .block(Theme::block_dim())
    .row_highlight_style(Style::new().bg(Theme::BG_SURFACE).add_modifier(Modifier::BOLD))
    .highlight_symbol(" > ")
    .highlight_spacing(HighlightSpacing::Always);

    let mut state = TableState::default().with_selected(Some(app.selected()));
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_list(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .records
        .iter()
        .map(|record| {
            let line1 = Line::from(vec![
                Span::styled(
                    format!("#{} ", record.id),
                    Style::new().fg(Theme::TEXT_PRIMARY).bold(),
                ),
                Span::styled(
                    format!("{} ", local_time(record)),
                    Style::new().fg(Theme::TEXT_MUTED),
                ),
                Span::styled(
                    format!("{} ", record.method),
                    Style::new().fg(theme::method_color(&record.method)),
                ),
                Span::styled(record.path.clone(), Style::new().fg(Theme::TEXT_SECONDARY)),
            ]);
            let line2 = Line::from(Span::styled(
                format!("    {}", body_preview(record, 50, "(empty body)")),
                Style::new().fg(Theme::TEXT_CONTENT),
            ));
            ListItem::new(vec![line1, line2])
        })
        .collect();

    let list = List::new(items)
        .block(Theme::block_dim())
        .highlight_style(Style::new().bg(Theme::BG_SURFACE).add_modifier(Modifier::BOLD))
        .highlight_symbol(" > ")
        .highlight_spacing(HighlightSpacing::Always);

    let mut state = ListState::default().with_selected(Some(app.selected()));
    frame.render_stateful_widget(list, area, &mut state);
}
