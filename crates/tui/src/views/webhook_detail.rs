use crate::app::{App, ViewState};
use crate::detail::{DetailRow, RowKind};
use crate::theme::{self, Theme};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};
use std::borrow::Cow;

fn content_block() -> Block<'static> {
    Theme::block_dim().padding(Theme::PADDING_COMPACT)
}

fn areas(area: Rect) -> [Rect; 3] {
    Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(area)
}

/// Inner area the scrollable content is drawn into.
pub fn content_area(area: Rect) -> Rect {
    let [_, body, _] = areas(area);
    content_block().inner(body)
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let ViewState::Detail {
        scroll, snapshot, ..
    } = &app.view
    else {
        return;
    };
    let [title_area, body_area, scroll_area] = areas(area);

    let title = Line::from(Span::styled(
        format!(" {}", snapshot.title()),
        Style::new().fg(Theme::ACCENT_BLUE).bold(),
    ));
    frame.render_widget(Paragraph::new(title), title_area);

    let inner = content_block().inner(body_area);
    let rows: Cow<'_, [DetailRow]> = if snapshot.wrap_width() == inner.width {
        Cow::Borrowed(snapshot.lines())
    } else {
        Cow::Owned(snapshot.wrapped(inner.width))
    };
    let visible = usize::from(inner.height);
    let start = (*scroll).min(rows.len().saturating_sub(visible));
    let lines: Vec<Line> = rows
        .iter()
        .skip(start)
        .take(visible)
        .map(|row| styled_row(row, &snapshot.method))
        .collect();
    frame.render_widget(Paragraph::new(lines).block(content_block()), body_area);

    if rows.len() > visible {
        let mut scrollbar_state =
            ScrollbarState::new(rows.len().saturating_sub(visible)).position(start);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(None)
            .end_symbol(None)
            .thumb_style(Style::new().fg(Theme::TEXT_MUTED));
        frame.render_stateful_widget(
            scrollbar,
            body_area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }

    let indicator = Paragraph::new(Line::from(Span::styled(
        format!("─── {}% ───", app.scroll_percent()),
        Style::new().fg(Theme::TEXT_MUTED),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(indicator, scroll_area);
}

fn styled_row<'a>(row: &'a DetailRow, method: &str) -> Line<'a> {
    let label_style = Style::new().fg(Theme::ACCENT_CYAN).bold();
    match row.kind {
        RowKind::Field => {
            let value_style = if row.label() == "Method:" {
                Style::new().fg(theme::method_color(method)).bold()
            } else {
                Style::new().fg(Theme::TEXT_PRIMARY)
            };
            Line::from(vec![
                Span::styled(row.label(), label_style),
                Span::styled(row.value(), value_style),
            ])
        }
        RowKind::Header => Line::from(vec![
            Span::styled(row.label(), label_style),
            Span::styled(row.value(), Style::new().fg(Theme::TEXT_CONTENT)),
        ]),
        RowKind::Heading => Line::from(Span::styled(
            row.text.as_str(),
            Style::new().fg(Theme::ACCENT_BLUE).bold(),
        )),
        RowKind::Body => Line::from(Span::styled(
            row.text.as_str(),
            Style::new().fg(Theme::ACCENT_GREEN),
        )),
        RowKind::Placeholder => Line::from(Span::styled(
            row.text.as_str(),
            Style::new().fg(Theme::TEXT_MUTED).italic(),
        )),
        RowKind::Blank => Line::raw(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{AppEvent, Viewport};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;
    use webhook_tui_core::{RecordPage, testing};
    use webhook_tui_runtime_config::ListenerSettings;

    fn buffer_to_string(buffer: &Buffer) -> String {
        let area = *buffer.area();
        let mut out = String::new();
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn render_text(app: &App, width: u16, height: u16) -> String {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).expect("terminal");
        terminal
            .draw(|frame| render(frame, app, frame.area()))
            .expect("draw");
        buffer_to_string(terminal.backend().buffer())
    }

    fn press(app: &mut App, code: KeyCode) {
        app.apply(AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn detail_app(record: webhook_tui_core::WebhookRecord, width: u16, height: u16) -> App {
        let mut app = App::new(ListenerSettings::default());
        press(&mut app, KeyCode::Enter);
        app.apply(AppEvent::PageLoaded(Ok(RecordPage {
            records: vec![record],
            total: 1,
            page: 0,
        })));
        app.set_viewport(Viewport {
            width: content_area(Rect::new(0, 0, width, height)).width,
            height: content_area(Rect::new(0, 0, width, height)).height,
        });
        press(&mut app, KeyCode::Enter);
        app
    }

    #[test]
    fn detail_shows_title_metadata_and_body() {
        let app = detail_app(testing::record_with_body(7, r#"{"event":"test"}"#), 100, 30);
        let text = render_text(&app, 100, 30);
        assert!(text.contains("Webhook #7 Details"));
        assert!(text.contains("Method: POST"));
        assert!(text.contains("Path: /webhook"));
        assert!(text.contains("content-type: application/json"));
        assert!(text.contains(r#""event": "test""#));
        assert!(text.contains("100%"));
    }

    #[test]
    fn scrolled_detail_hides_top_rows() {
        let body = (0..60).map(|i| format!("line {i:02}")).collect::<Vec<_>>().join("\n");
        let mut app = detail_app(testing::record_with_body(1, &body), 80, 20);

        let top = render_text(&app, 80, 20);
        assert!(top.contains("Method: POST"));
        assert!(top.contains("─── 0% ───"));

        press(&mut app, KeyCode::Char('G'));
        let bottom = render_text(&app, 80, 20);
        assert!(!bottom.contains("Method: POST"));
        assert!(bottom.contains("line 59"));
        assert!(bottom.contains("100%"));
    }
}
