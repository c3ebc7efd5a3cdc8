mod app;
mod async_ops;
mod detail;
mod logging;
mod theme;
mod ui;
mod views;

use anyhow::{Context, Result};
use app::{App, AppEvent};
use async_ops::{BgEvent, Services};
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;
use webhook_tui_local_db::RecordStore;
use webhook_tui_runtime_config::{WebhookTuiConfig, paths};
use webhook_tui_server::{BoundServer, LiveFeed};
use webhook_tui_tunnel::{CommandLauncher, TunnelEvent, TunnelManager};

/// Receivers drained by the event loop, plus the ingestion server once bound.
struct Inbox {
    bg_rx: mpsc::Receiver<BgEvent>,
    tunnel_rx: mpsc::Receiver<TunnelEvent>,
    feed: Option<LiveFeed>,
    server: Option<BoundServer>,
}

/// Launch the listener TUI. Returns once the user quits.
pub fn run() -> Result<()> {
    let store = RecordStore::open().context("failed to initialize webhook storage")?;
    if let Ok(log_path) = paths::log_path() {
        logging::init(&log_path);
    }
    tracing::info!(db = %store.path().display(), "webhook-tui starting");

    let config = webhook_tui_runtime_config::load_config().unwrap_or_else(|e| {
        tracing::warn!("{e}; using default configuration");
        WebhookTuiConfig::default()
    });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let (bg_tx, bg_rx) = mpsc::channel();
    let (tunnel_tx, tunnel_rx) = mpsc::channel();
    let services = Services {
        runtime: runtime.handle().clone(),
        store: Arc::new(store),
        tunnel: TunnelManager::new(CommandLauncher::from_settings(&config.tunnel), tunnel_tx),
        public_ip: config.public_ip.clone(),
        events: bg_tx,
    };
    let mut inbox = Inbox {
        bg_rx,
        tunnel_rx,
        feed: None,
        server: None,
    };
    let mut app = App::new(config.listener);

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = event_loop(&mut terminal, &mut app, &services, &mut inbox);

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    services.tunnel.shutdown();
    if let Some(server) = inbox.server.take() {
        server.shutdown();
    }
    runtime.shutdown_background();
    tracing::info!("webhook-tui stopped");

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    services: &Services,
    inbox: &mut Inbox,
) -> Result<()> {
    loop {
        // ── Background results ───────────────────────────────────────
        while let Ok(ev) = inbox.bg_rx.try_recv() {
            match ev {
                BgEvent::App(event) => app.apply(event),
                BgEvent::ServerBound { server, feed } => {
                    let port = server.local_addr().port();
                    inbox.server = Some(server);
                    inbox.feed = Some(feed);
                    app.apply(AppEvent::ServerStarted { port });
                }
            }
        }

        // ── Live webhooks ────────────────────────────────────────────
        if let Some(feed) = inbox.feed.as_mut() {
            while let Some(record) = feed.poll() {
                app.apply(AppEvent::WebhookReceived(record));
            }
        }

        // ── Tunnel status ────────────────────────────────────────────
        while let Ok(ev) = inbox.tunnel_rx.try_recv() {
            app.apply(AppEvent::Tunnel(ev));
        }

        for cmd in app.take_commands() {
            async_ops::execute(cmd, services);
        }

        if app.should_quit {
            return Ok(());
        }

        let size = terminal.size()?;
        app.set_viewport(ui::detail_viewport(Rect::new(0, 0, size.width, size.height)));
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.apply(AppEvent::Key(key));
                }
            }
        }
    }
}
