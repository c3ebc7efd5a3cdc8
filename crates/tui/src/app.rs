use crate::async_ops::AsyncCommand;
use crate::detail::DetailSnapshot;
use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;
use webhook_tui_core::{PageCursor, RecordPage, WebhookRecord};
use webhook_tui_runtime_config::{ListenerConfig, ListenerSettings, SetupField, SetupInput};
use webhook_tui_tunnel::{TunnelEvent, TunnelPhase, TunnelRequest};

/// Inputs to [`App::apply`].
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    PublicIp(Result<String, String>),
    PageLoaded(Result<RecordPage, String>),
    ServerStarted { port: u16 },
    ServerFailed(String),
    WebhookReceived(WebhookRecord),
    Tunnel(TunnelEvent),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Setup {
        focused: SetupField,
    },
    Running {
        selected: usize,
    },
    Detail {
        selected: usize,
        scroll: usize,
        snapshot: DetailSnapshot,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListMode {
    #[default]
    Table,
    List,
}

impl ListMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Table => Self::List,
            Self::List => Self::Table,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Table => "Table",
            Self::List => "List",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PublicIpStatus {
    #[default]
    Fetching,
    Resolved(String),
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ServerStatus {
    #[default]
    NotStarted,
    Starting { port: u16 },
    Listening { port: u16 },
    Failed(String),
}

/// Coordinator-side copy of the tunnel session, updated from [`TunnelEvent`]s.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TunnelStatus {
    pub phase: TunnelPhase,
    pub url: String,
    pub error: String,
    pub started_at: Option<DateTime<Utc>>,
    pub timeout: Duration,
    pub subdomain: Option<String>,
    /// Newest session generation seen; older events are ignored.
    pub generation: u64,
}

impl TunnelStatus {
    /// Time left before expiry, saturating at zero. `None` unless active.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.phase != TunnelPhase::Active {
            return None;
        }
        let started_at = self.started_at?;
        let elapsed = (now - started_at).to_std().unwrap_or(Duration::ZERO);
        Some(self.timeout.saturating_sub(elapsed))
    }

    pub fn webhook_url(&self) -> String {
        format!("{}/webhook", self.url)
    }

    fn apply(&mut self, event: TunnelEvent) {
        match event {
            TunnelEvent::Started {
                url,
                generation,
                started_at,
            } => {
                if generation < self.generation {
                    return;
                }
                self.generation = generation;
                self.phase = TunnelPhase::Active;
                self.url = url;
                self.error.clear();
                self.started_at = Some(started_at);
            }
            TunnelEvent::Failed {
                message,
                generation,
            } => {
                if generation < self.generation {
                    return;
                }
                self.generation = generation;
                self.phase = TunnelPhase::Errored;
                self.error = message;
            }
            TunnelEvent::Expired { generation } => {
                if generation < self.generation {
                    return;
                }
                self.generation = generation;
                self.phase = TunnelPhase::Expired;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Error,
    Info,
}

/// Visible size of the detail content area, set by the event loop from the
/// terminal size before each input is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 80,
            height: 20,
        }
    }
}

pub struct App {
    pub view: ViewState,
    pub list_mode: ListMode,
    pub setup: SetupInput,
    pub defaults: ListenerSettings,
    pub listener: Option<ListenerConfig>,
    pub records: Vec<WebhookRecord>,
    pub cursor: PageCursor,
    pub public_ip: PublicIpStatus,
    pub server: ServerStatus,
    pub tunnel: TunnelStatus,
    /// Last page-load failure; cleared by the next successful load.
    pub store_error: Option<String>,
    pub flash_message: Option<(String, FlashLevel)>,
    pub viewport: Viewport,
    pub should_quit: bool,
    pending: Vec<AsyncCommand>,
}

impl App {
    /// Fresh app in the setup view. Queues the public-IP lookup and the
    /// first page of stored webhooks.
    pub fn new(defaults: ListenerSettings) -> Self {
        Self {
            view: ViewState::Setup {
                focused: SetupField::default(),
            },
            list_mode: ListMode::default(),
            setup: SetupInput::default(),
            defaults,
            listener: None,
            records: Vec::new(),
            cursor: PageCursor::default(),
            public_ip: PublicIpStatus::default(),
            server: ServerStatus::default(),
            tunnel: TunnelStatus::default(),
            store_error: None,
            flash_message: None,
            viewport: Viewport::default(),
            should_quit: false,
            pending: vec![AsyncCommand::FetchPublicIp, AsyncCommand::LoadPage { page: 0 }],
        }
    }

    /// Commands queued since the last call.
    pub fn take_commands(&mut self) -> Vec<AsyncCommand> {
        std::mem::take(&mut self.pending)
    }

    pub fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::Key(key) => {
                if self.handle_key(key) {
                    self.should_quit = true;
                }
            }
            AppEvent::PublicIp(Ok(ip)) => self.public_ip = PublicIpStatus::Resolved(ip),
            AppEvent::PublicIp(Err(_)) => self.public_ip = PublicIpStatus::Unavailable,
            AppEvent::PageLoaded(Ok(page)) => self.apply_page(page),
            AppEvent::PageLoaded(Err(e)) => self.store_error = Some(e),
            AppEvent::ServerStarted { port } => {
                self.server = ServerStatus::Listening { port };
                self.flash_success(format!("Listening for webhooks on port {port}"));
            }
            AppEvent::ServerFailed(e) => self.server = ServerStatus::Failed(e),
            AppEvent::WebhookReceived(record) => {
                // Concurrent captures can arrive out of id order.
                let at = self.records.partition_point(|r| r.id > record.id);
                self.records.insert(at, record);
                self.clamp_selection();
            }
            AppEvent::Tunnel(event) => self.tunnel.apply(event),
        }
    }

    /// Handle a key press. Returns true to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        self.flash_message = None;

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            return true;
        }
        if !ctrl && key.code == KeyCode::Char('q') {
            return true;
        }

        match self.view {
            ViewState::Setup { .. } => self.handle_setup_key(key),
            ViewState::Running { .. } => self.handle_running_key(key),
            ViewState::Detail { .. } => self.handle_detail_key(key),
        }
        false
    }

    fn handle_setup_key(&mut self, key: KeyEvent) {
        let ViewState::Setup { focused } = self.view else {
            return;
        };
        match key.code {
            KeyCode::Tab => {
                self.view = ViewState::Setup {
                    focused: focused.next(),
                };
            }
            KeyCode::BackTab => {
                self.view = ViewState::Setup {
                    focused: focused.prev(),
                };
            }
            KeyCode::Backspace => self.setup.backspace(focused),
            KeyCode::Enter => self.submit_setup(),
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.setup.push(focused, ch);
            }
            _ => {}
        }
    }

    fn submit_setup(&mut self) {
        let config = match self.setup.resolve(&self.defaults) {
            Ok(config) => config,
            Err(e) => {
                self.flash_error(e.to_string());
                return;
            }
        };

        self.tunnel = TunnelStatus {
            phase: TunnelPhase::Starting,
            timeout: config.timeout,
            subdomain: config.subdomain.clone(),
            generation: self.tunnel.generation,
            ..TunnelStatus::default()
        };
        self.server = ServerStatus::Starting { port: config.port };
        self.pending.push(AsyncCommand::StartTunnel {
            request: TunnelRequest {
                port: config.port,
                subdomain: config.subdomain.clone(),
            },
            timeout: config.timeout,
        });
        self.pending.push(AsyncCommand::StartServer { port: config.port });
        self.listener = Some(config);
        self.view = ViewState::Running { selected: 0 };
    }

    fn handle_running_key(&mut self, key: KeyEvent) {
        let ViewState::Running { selected } = self.view else {
            return;
        };
        let last = self.records.len().saturating_sub(1);
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.view = ViewState::Running {
                    selected: selected.saturating_sub(1),
                };
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.view = ViewState::Running {
                    selected: (selected + 1).min(last),
                };
            }
            KeyCode::Char('g') => self.view = ViewState::Running { selected: 0 },
            KeyCode::Char('G') => self.view = ViewState::Running { selected: last },
            KeyCode::Enter => {
                if let Some(record) = self.records.get(selected) {
                    self.view = ViewState::Detail {
                        selected,
                        scroll: 0,
                        snapshot: DetailSnapshot::capture(record, self.viewport.width),
                    };
                }
            }
            KeyCode::Char('n') | KeyCode::Right => {
                if let Some(page) = self.cursor.next_page() {
                    self.pending.push(AsyncCommand::LoadPage { page });
                }
            }
            KeyCode::Char('p') | KeyCode::Left => {
                if let Some(page) = self.cursor.prev_page() {
                    self.pending.push(AsyncCommand::LoadPage { page });
                }
            }
            KeyCode::Char('l') => {
                self.pending.push(AsyncCommand::LoadPage { page: 0 });
                self.flash_info("Reloading webhooks from the database");
            }
            KeyCode::Char('c') => {
                self.records.clear();
                self.view = ViewState::Running { selected: 0 };
            }
            KeyCode::Char('t') => self.list_mode = self.list_mode.toggled(),
            KeyCode::Char('r') => self.reconnect_tunnel(),
            _ => {}
        }
    }

    fn reconnect_tunnel(&mut self) {
        if self.listener.is_none() || !self.tunnel.phase.can_reconnect() {
            return;
        }
        self.tunnel.phase = TunnelPhase::Starting;
        self.tunnel.error.clear();
        self.tunnel.url.clear();
        self.tunnel.started_at = None;
        self.pending.push(AsyncCommand::ReconnectTunnel);
        self.flash_info("Reconnecting tunnel...");
    }

    fn handle_detail_key(&mut self, key: KeyEvent) {
        let max_scroll = self.max_scroll();
        let page = usize::from(self.viewport.height.max(1));
        let half = (page / 2).max(1);
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        let ViewState::Detail {
            selected, scroll, ..
        } = &mut self.view
        else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                let selected = *selected;
                self.view = ViewState::Running { selected };
                self.clamp_selection();
                return;
            }
            KeyCode::Up | KeyCode::Char('k') => *scroll = scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => *scroll += 1,
            KeyCode::PageUp => *scroll = scroll.saturating_sub(half),
            KeyCode::PageDown => *scroll += half,
            KeyCode::Char('u') if ctrl => *scroll = scroll.saturating_sub(half),
            KeyCode::Char('d') if ctrl => *scroll += half,
            KeyCode::Char('b') if ctrl => *scroll = scroll.saturating_sub(page),
            KeyCode::Char('f') if ctrl => *scroll += page,
            KeyCode::Char('g') => *scroll = 0,
            KeyCode::Char('G') => *scroll = max_scroll,
            _ => {}
        }
        *scroll = (*scroll).min(max_scroll);
    }

    /// Largest scroll offset that still fills the viewport.
    pub fn max_scroll(&self) -> usize {
        match &self.view {
            ViewState::Detail { snapshot, .. } => snapshot
                .line_count()
                .saturating_sub(usize::from(self.viewport.height)),
            _ => 0,
        }
    }

    /// Scroll position as a percentage; 100 when everything fits.
    pub fn scroll_percent(&self) -> usize {
        let ViewState::Detail { scroll, .. } = &self.view else {
            return 0;
        };
        let max = self.max_scroll();
        if max == 0 {
            100
        } else {
            (*scroll).min(max) * 100 / max
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if let ViewState::Detail { snapshot, .. } = &mut self.view {
            snapshot.set_width(viewport.width);
        }
        let max_scroll = self.max_scroll();
        if let ViewState::Detail { scroll, .. } = &mut self.view {
            *scroll = (*scroll).min(max_scroll);
        }
    }

    fn apply_page(&mut self, page: RecordPage) {
        self.store_error = None;
        self.cursor.apply(page.page, page.total);
        self.records = page.records;
        match &mut self.view {
            ViewState::Running { selected } | ViewState::Detail { selected, .. } => *selected = 0,
            ViewState::Setup { .. } => {}
        }
    }

    fn clamp_selection(&mut self) {
        let last = self.records.len().saturating_sub(1);
        match &mut self.view {
            ViewState::Running { selected } | ViewState::Detail { selected, .. } => {
                *selected = (*selected).min(last);
            }
            ViewState::Setup { .. } => {}
        }
    }

    /// Index of the highlighted record in the running view.
    pub fn selected(&self) -> usize {
        match self.view {
            ViewState::Running { selected } | ViewState::Detail { selected, .. } => selected,
            ViewState::Setup { .. } => 0,
        }
    }

    pub fn flash_success(&mut self, msg: impl Into<String>) {
        self.flash_message = Some((msg.into(), FlashLevel::Success));
    }

    pub fn flash_error(&mut self, msg: impl Into<String>) {
        self.flash_message = Some((msg.into(), FlashLevel::Error));
    }

    pub fn flash_info(&mut self, msg: impl Into<String>) {
        self.flash_message = Some((msg.into(), FlashLevel::Info));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webhook_tui_core::{PAGE_SIZE, testing};

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(ch: char) -> AppEvent {
        AppEvent::Key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL))
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.apply(key(KeyCode::Char(ch)));
        }
    }

    fn page(records: Vec<WebhookRecord>, total: usize, page: usize) -> AppEvent {
        AppEvent::PageLoaded(Ok(RecordPage {
            records,
            total,
            page,
        }))
    }

    /// App past setup with default listener settings.
    fn running_app() -> App {
        let mut app = App::new(ListenerSettings::default());
        app.take_commands();
        app.apply(key(KeyCode::Enter));
        app.take_commands();
        app
    }

    fn running_with(count: i64) -> App {
        let mut app = running_app();
        app.apply(page(testing::records_desc(count), count as usize, 0));
        app
    }

    #[test]
    fn startup_queues_ip_lookup_and_first_page() {
        let mut app = App::new(ListenerSettings::default());
        assert_eq!(
            app.take_commands(),
            vec![AsyncCommand::FetchPublicIp, AsyncCommand::LoadPage { page: 0 }]
        );
        assert!(app.take_commands().is_empty());
        assert!(matches!(app.view, ViewState::Setup { focused: SetupField::Port }));
    }

    #[test]
    fn tab_cycles_setup_fields() {
        let mut app = App::new(ListenerSettings::default());
        app.apply(key(KeyCode::Tab));
        assert!(matches!(app.view, ViewState::Setup { focused: SetupField::Subdomain }));
        app.apply(key(KeyCode::Tab));
        app.apply(key(KeyCode::Tab));
        assert!(matches!(app.view, ViewState::Setup { focused: SetupField::Port }));
        app.apply(key(KeyCode::BackTab));
        assert!(matches!(app.view, ViewState::Setup { focused: SetupField::Timeout }));
    }

    #[test]
    fn setup_typing_respects_field_limits() {
        let mut app = App::new(ListenerSettings::default());
        type_text(&mut app, "1234567");
        assert_eq!(app.setup.port, "12345");
        app.apply(key(KeyCode::Backspace));
        assert_eq!(app.setup.port, "1234");
    }

    #[test]
    fn submitting_defaults_starts_server_and_tunnel() {
        let mut app = App::new(ListenerSettings::default());
        app.take_commands();
        app.apply(key(KeyCode::Enter));

        assert!(matches!(app.view, ViewState::Running { selected: 0 }));
        assert_eq!(
            app.take_commands(),
            vec![
                AsyncCommand::StartTunnel {
                    request: TunnelRequest {
                        port: 8098,
                        subdomain: None,
                    },
                    timeout: Duration::from_secs(30 * 60),
                },
                AsyncCommand::StartServer { port: 8098 },
            ]
        );
        assert_eq!(app.server, ServerStatus::Starting { port: 8098 });
        assert_eq!(app.tunnel.phase, TunnelPhase::Starting);
    }

    #[test]
    fn submitting_custom_values() {
        let mut app = App::new(ListenerSettings::default());
        app.take_commands();
        type_text(&mut app, "9000");
        app.apply(key(KeyCode::Tab));
        type_text(&mut app, "my-hooks");
        app.apply(key(KeyCode::Tab));
        type_text(&mut app, "5");
        app.apply(key(KeyCode::Enter));

        let listener = app.listener.clone().unwrap();
        assert_eq!(listener.port, 9000);
        assert_eq!(listener.subdomain.as_deref(), Some("my-hooks"));
        assert_eq!(listener.timeout, Duration::from_secs(5 * 60));
        assert_eq!(app.tunnel.subdomain.as_deref(), Some("my-hooks"));
    }

    #[test]
    fn invalid_port_stays_in_setup_with_error() {
        let mut app = App::new(ListenerSettings::default());
        app.take_commands();
        app.apply(key(KeyCode::Char('0')));
        app.apply(key(KeyCode::Enter));

        assert!(matches!(app.view, ViewState::Setup { .. }));
        assert!(app.take_commands().is_empty());
        let (msg, level) = app.flash_message.clone().unwrap();
        assert_eq!(level, FlashLevel::Error);
        assert!(msg.contains('0'), "{msg}");
    }

    #[test]
    fn zero_timeout_uses_default() {
        let mut app = App::new(ListenerSettings::default());
        app.apply(key(KeyCode::BackTab));
        type_text(&mut app, "0");
        app.apply(key(KeyCode::Enter));
        assert_eq!(app.listener.unwrap().timeout, Duration::from_secs(30 * 60));
    }

    #[test]
    fn q_and_ctrl_c_quit_from_any_view() {
        let mut app = App::new(ListenerSettings::default());
        app.apply(key(KeyCode::Char('q')));
        assert!(app.should_quit);

        let mut app = running_app();
        app.apply(ctrl('c'));
        assert!(app.should_quit);

        let mut app = running_with(2);
        app.apply(key(KeyCode::Enter));
        assert!(matches!(app.view, ViewState::Detail { .. }));
        app.apply(key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn selection_is_clamped() {
        let mut app = running_app();
        app.apply(key(KeyCode::Down));
        assert_eq!(app.selected(), 0);

        app.apply(page(testing::records_desc(3), 3, 0));
        for _ in 0..5 {
            app.apply(key(KeyCode::Char('j')));
        }
        assert_eq!(app.selected(), 2);
        app.apply(key(KeyCode::Char('k')));
        assert_eq!(app.selected(), 1);
        app.apply(key(KeyCode::Char('g')));
        assert_eq!(app.selected(), 0);
        app.apply(key(KeyCode::Char('G')));
        assert_eq!(app.selected(), 2);
    }

    #[test]
    fn reload_resets_selection_and_replaces_snapshot() {
        let mut app = running_with(5);
        for _ in 0..3 {
            app.apply(key(KeyCode::Down));
        }
        assert_eq!(app.selected(), 3);

        app.apply(key(KeyCode::Char('l')));
        assert_eq!(app.take_commands(), vec![AsyncCommand::LoadPage { page: 0 }]);
        app.apply(page(testing::records_desc(2), 2, 0));

        assert_eq!(app.selected(), 0);
        let ids: Vec<_> = app.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn paging_never_requests_out_of_range_pages() {
        let mut app = running_with(5);
        app.apply(key(KeyCode::Char('n')));
        app.apply(key(KeyCode::Char('p')));
        assert!(app.take_commands().is_empty());

        let total = PAGE_SIZE * 2 + 1;
        app.apply(page(testing::records_desc(PAGE_SIZE as i64), total, 0));
        app.apply(key(KeyCode::Right));
        assert_eq!(app.take_commands(), vec![AsyncCommand::LoadPage { page: 1 }]);

        app.apply(page(Vec::new(), total, 2));
        assert_eq!(app.cursor.page(), 2);
        app.apply(key(KeyCode::Char('n')));
        assert!(app.take_commands().is_empty());
        app.apply(key(KeyCode::Left));
        assert_eq!(app.take_commands(), vec![AsyncCommand::LoadPage { page: 1 }]);
    }

    #[test]
    fn page_load_failure_is_display_only() {
        let mut app = running_with(3);
        app.apply(AppEvent::PageLoaded(Err("database is locked".into())));
        assert_eq!(app.store_error.as_deref(), Some("database is locked"));
        assert_eq!(app.records.len(), 3);

        app.apply(page(testing::records_desc(1), 1, 0));
        assert!(app.store_error.is_none());
    }

    #[test]
    fn clear_empties_snapshot_only() {
        let mut app = running_with(4);
        app.apply(key(KeyCode::Down));
        app.apply(key(KeyCode::Char('c')));
        assert!(app.records.is_empty());
        assert_eq!(app.selected(), 0);
        assert_eq!(app.cursor.total(), 4);
        assert!(app.take_commands().is_empty());
    }

    #[test]
    fn toggle_flips_list_mode() {
        let mut app = running_app();
        assert_eq!(app.list_mode, ListMode::Table);
        app.apply(key(KeyCode::Char('t')));
        assert_eq!(app.list_mode, ListMode::List);
        app.apply(key(KeyCode::Char('t')));
        assert_eq!(app.list_mode, ListMode::Table);
    }

    #[test]
    fn live_records_are_prepended_without_touching_cursor() {
        let mut app = running_with(2);
        app.apply(key(KeyCode::Down));
        app.apply(AppEvent::WebhookReceived(testing::record(3)));

        let ids: Vec<_> = app.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(app.selected(), 1);
        assert_eq!(app.cursor.total(), 2);
    }

    #[test]
    fn late_live_record_is_placed_by_id() {
        let mut app = running_with(2);
        app.apply(AppEvent::WebhookReceived(testing::record(4)));
        app.apply(AppEvent::WebhookReceived(testing::record(3)));

        let ids: Vec<_> = app.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
    }

    #[test]
    fn enter_opens_detail_and_esc_keeps_selection() {
        let mut app = running_with(5);
        app.apply(key(KeyCode::Down));
        app.apply(key(KeyCode::Down));
        app.apply(key(KeyCode::Enter));

        match &app.view {
            ViewState::Detail {
                selected, snapshot, ..
            } => {
                assert_eq!(*selected, 2);
                assert_eq!(snapshot.id, 3);
            }
            other => panic!("expected detail view, got {other:?}"),
        }

        app.apply(AppEvent::WebhookReceived(testing::record(6)));
        if let ViewState::Detail { snapshot, .. } = &app.view {
            assert_eq!(snapshot.id, 3);
        }

        app.apply(key(KeyCode::Esc));
        assert!(matches!(app.view, ViewState::Running { selected: 2 }));
    }

    #[test]
    fn enter_with_no_records_stays_in_running() {
        let mut app = running_app();
        app.apply(key(KeyCode::Enter));
        assert!(matches!(app.view, ViewState::Running { selected: 0 }));
    }

    #[test]
    fn detail_scroll_is_clamped_to_content() {
        let body = (0..50).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let mut app = running_app();
        app.apply(page(vec![testing::record_with_body(1, &body)], 1, 0));
        app.set_viewport(Viewport {
            width: 40,
            height: 10,
        });
        app.apply(key(KeyCode::Enter));

        let max = app.max_scroll();
        assert!(max > 0);
        app.apply(key(KeyCode::Up));
        assert_eq!(app.scroll_percent(), 0);

        app.apply(key(KeyCode::Char('G')));
        assert_eq!(app.scroll_percent(), 100);
        app.apply(key(KeyCode::Down));
        assert!(matches!(app.view, ViewState::Detail { scroll, .. } if scroll == max));

        app.apply(key(KeyCode::Char('g')));
        app.apply(ctrl('d'));
        assert!(matches!(app.view, ViewState::Detail { scroll: 5, .. }));
        app.apply(ctrl('f'));
        assert!(matches!(app.view, ViewState::Detail { scroll: 15, .. }));
        app.apply(key(KeyCode::PageUp));
        assert!(matches!(app.view, ViewState::Detail { scroll: 10, .. }));
        app.apply(ctrl('b'));
        assert!(matches!(app.view, ViewState::Detail { scroll: 0, .. }));
    }

    #[test]
    fn detail_wraps_once_per_viewport_width() {
        let body = "z".repeat(200);
        let mut app = running_app();
        app.apply(page(vec![testing::record_with_body(1, &body)], 1, 0));
        app.set_viewport(Viewport {
            width: 40,
            height: 10,
        });
        app.apply(key(KeyCode::Enter));

        let ViewState::Detail { snapshot, .. } = &mut app.view else {
            panic!("expected detail view");
        };
        assert_eq!(snapshot.wrap_width(), 40);
        assert!(!snapshot.set_width(40));
        let narrow = snapshot.line_count();

        app.set_viewport(Viewport {
            width: 100,
            height: 10,
        });
        let ViewState::Detail { snapshot, .. } = &mut app.view else {
            panic!("expected detail view");
        };
        assert_eq!(snapshot.wrap_width(), 100);
        assert!(snapshot.line_count() < narrow);
        assert!(!snapshot.set_width(100));
    }

    #[test]
    fn short_detail_reports_full_scroll() {
        let mut app = running_with(1);
        app.apply(key(KeyCode::Enter));
        assert_eq!(app.max_scroll(), 0);
        assert_eq!(app.scroll_percent(), 100);
    }

    #[test]
    fn status_events_update_their_own_fields() {
        let mut app = running_app();
        app.apply(AppEvent::PublicIp(Ok("203.0.113.9".into())));
        app.apply(AppEvent::ServerFailed("address in use".into()));
        assert_eq!(app.public_ip, PublicIpStatus::Resolved("203.0.113.9".into()));
        assert_eq!(app.server, ServerStatus::Failed("address in use".into()));
        assert_eq!(app.tunnel.phase, TunnelPhase::Starting);

        app.apply(AppEvent::PublicIp(Err("timeout".into())));
        app.apply(AppEvent::ServerStarted { port: 8098 });
        assert_eq!(app.public_ip, PublicIpStatus::Unavailable);
        assert_eq!(app.server, ServerStatus::Listening { port: 8098 });
    }

    #[test]
    fn tunnel_lifecycle_and_reconnect() {
        let mut app = running_app();
        app.apply(key(KeyCode::Char('r')));
        assert!(app.take_commands().is_empty(), "starting tunnel cannot reconnect");

        let started_at = Utc::now();
        app.apply(AppEvent::Tunnel(TunnelEvent::Started {
            url: "https://quiet-otter.loca.lt".into(),
            generation: 1,
            started_at,
        }));
        assert_eq!(app.tunnel.phase, TunnelPhase::Active);
        assert_eq!(app.tunnel.webhook_url(), "https://quiet-otter.loca.lt/webhook");
        app.apply(key(KeyCode::Char('r')));
        assert!(app.take_commands().is_empty(), "active tunnel cannot reconnect");

        app.apply(AppEvent::Tunnel(TunnelEvent::Expired { generation: 1 }));
        assert_eq!(app.tunnel.phase, TunnelPhase::Expired);
        app.apply(key(KeyCode::Char('r')));
        assert_eq!(app.take_commands(), vec![AsyncCommand::ReconnectTunnel]);
        assert_eq!(app.tunnel.phase, TunnelPhase::Starting);

        app.apply(AppEvent::Tunnel(TunnelEvent::Failed {
            message: "tunnel process exited before announcing a URL".into(),
            generation: 2,
        }));
        assert_eq!(app.tunnel.phase, TunnelPhase::Errored);
        app.apply(key(KeyCode::Char('r')));
        assert_eq!(app.take_commands(), vec![AsyncCommand::ReconnectTunnel]);
        assert!(app.tunnel.error.is_empty());
    }

    #[test]
    fn stale_tunnel_events_are_ignored() {
        let mut app = running_app();
        app.apply(AppEvent::Tunnel(TunnelEvent::Started {
            url: "https://b.loca.lt".into(),
            generation: 2,
            started_at: Utc::now(),
        }));
        app.apply(AppEvent::Tunnel(TunnelEvent::Expired { generation: 1 }));
        assert_eq!(app.tunnel.phase, TunnelPhase::Active);
        assert_eq!(app.tunnel.url, "https://b.loca.lt");
    }

    #[test]
    fn remaining_time_counts_down_from_start() {
        let started_at = Utc::now();
        let status = TunnelStatus {
            phase: TunnelPhase::Active,
            started_at: Some(started_at),
            timeout: Duration::from_secs(600),
            ..TunnelStatus::default()
        };
        let later = started_at + chrono::Duration::seconds(90);
        assert_eq!(status.remaining_at(later), Some(Duration::from_secs(510)));
        let way_later = started_at + chrono::Duration::seconds(3600);
        assert_eq!(status.remaining_at(way_later), Some(Duration::ZERO));

        let expired = TunnelStatus {
            phase: TunnelPhase::Expired,
            ..status
        };
        assert_eq!(expired.remaining_at(later), None);
    }

    #[test]
    fn any_key_clears_flash() {
        let mut app = running_app();
        app.flash_success("saved");
        app.apply(key(KeyCode::Char('j')));
        assert!(app.flash_message.is_none());
    }
}
