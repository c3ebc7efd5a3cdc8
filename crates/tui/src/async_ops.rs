use crate::app::AppEvent;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Duration;
use tokio::runtime::Handle;
use webhook_tui_core::PAGE_SIZE;
use webhook_tui_local_db::RecordStore;
use webhook_tui_runtime_config::PublicIpSettings;
use webhook_tui_server::{BoundServer, IngestServer, LiveFeed, listen_addr};
use webhook_tui_tunnel::{TunnelManager, TunnelRequest, ip_lookup};

/// Work requested by the reducer. Each variant runs off the control thread
/// and reports back through a [`BgEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum AsyncCommand {
    FetchPublicIp,
    LoadPage { page: usize },
    StartServer { port: u16 },
    StartTunnel {
        request: TunnelRequest,
        timeout: Duration,
    },
    ReconnectTunnel,
}

/// Results delivered to the event loop.
pub enum BgEvent {
    App(AppEvent),
    /// The ingestion server is listening. The loop keeps the handle and the
    /// feed; the reducer only sees `ServerStarted`.
    ServerBound { server: BoundServer, feed: LiveFeed },
}

/// Everything a command needs to run.
pub struct Services {
    pub runtime: Handle,
    pub store: Arc<RecordStore>,
    pub tunnel: TunnelManager,
    pub public_ip: PublicIpSettings,
    pub events: Sender<BgEvent>,
}

fn report(events: &Sender<BgEvent>, event: AppEvent) {
    if events.send(BgEvent::App(event)).is_err() {
        tracing::debug!("event loop gone, dropping background result");
    }
}

/// Start `cmd` without blocking the caller.
pub fn execute(cmd: AsyncCommand, services: &Services) {
    match cmd {
        AsyncCommand::FetchPublicIp => {
            let events = services.events.clone();
            let endpoints = services.public_ip.endpoints.clone();
            let timeout = Duration::from_secs(services.public_ip.timeout_secs);
            services.runtime.spawn(async move {
                let result = match ip_lookup::lookup_client(timeout) {
                    Ok(client) => ip_lookup::fetch_public_ip(&client, &endpoints).await,
                    Err(e) => Err(e.to_string()),
                };
                if let Err(ref e) = result {
                    tracing::warn!("public IP lookup failed: {e}");
                }
                report(&events, AppEvent::PublicIp(result));
            });
        }
        AsyncCommand::LoadPage { page } => {
            let events = services.events.clone();
            let store = Arc::clone(&services.store);
            services.runtime.spawn_blocking(move || {
                let result = store
                    .query_page(page, PAGE_SIZE)
                    .map_err(|e| e.to_string());
                if let Err(ref e) = result {
                    tracing::warn!(page, "failed to load webhooks: {e}");
                }
                report(&events, AppEvent::PageLoaded(result));
            });
        }
        AsyncCommand::StartServer { port } => {
            let events = services.events.clone();
            let store = Arc::clone(&services.store);
            services.runtime.spawn(async move {
                let seed_store = Arc::clone(&store);
                let first_id = match tokio::task::spawn_blocking(move || seed_store.max_id()).await
                {
                    Ok(Ok(max)) => max + 1,
                    Ok(Err(e)) => {
                        tracing::warn!("could not read highest webhook id: {e}");
                        1
                    }
                    Err(e) => {
                        tracing::warn!("id seed task failed: {e}");
                        1
                    }
                };
                match IngestServer::new(store, first_id)
                    .bind(listen_addr(port))
                    .await
                {
                    Ok((server, feed)) => {
                        if events.send(BgEvent::ServerBound { server, feed }).is_err() {
                            tracing::debug!("event loop gone before server start was reported");
                        }
                    }
                    Err(e) => {
                        tracing::warn!("{e}");
                        report(&events, AppEvent::ServerFailed(e.to_string()));
                    }
                }
            });
        }
        AsyncCommand::StartTunnel { request, timeout } => {
            if let Err(e) = services.tunnel.start(request, timeout, &services.runtime) {
                tracing::warn!("tunnel start refused: {e}");
            }
        }
        AsyncCommand::ReconnectTunnel => {
            if let Err(e) = services.tunnel.reconnect(&services.runtime) {
                tracing::warn!("tunnel reconnect refused: {e}");
            }
        }
    }
}
