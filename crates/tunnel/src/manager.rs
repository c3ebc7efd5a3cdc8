use crate::TunnelError;
use crate::launcher::{TunnelLauncher, TunnelRequest, parse_announced_url};
use crate::process::TunnelProcess;
use chrono::{DateTime, Utc};
use std::io::BufRead;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;

/// Lifecycle phase of the current tunnel session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TunnelPhase {
    #[default]
    Idle,
    Starting,
    Active,
    Expired,
    Errored,
    Terminated,
}

impl TunnelPhase {
    pub fn is_running(self) -> bool {
        self == Self::Active
    }

    pub fn is_expired(self) -> bool {
        self == Self::Expired
    }

    /// Whether a reconnect may be issued from this phase.
    pub fn can_reconnect(self) -> bool {
        !matches!(self, Self::Starting | Self::Active)
    }
}

/// Point-in-time view of the tunnel session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TunnelSession {
    pub phase: TunnelPhase,
    /// Empty until announced.
    pub url: String,
    /// Empty when there is no error.
    pub error: String,
    pub timeout: Duration,
    pub started_at: Option<DateTime<Utc>>,
    pub generation: u64,
    pub request: Option<TunnelRequest>,
}

impl TunnelSession {
    pub fn is_running(&self) -> bool {
        self.phase.is_running()
    }

    pub fn is_expired(&self) -> bool {
        self.phase.is_expired()
    }
}

/// Status changes reported to the coordinator. `generation` identifies the
/// session that produced the event.
#[derive(Debug, Clone, PartialEq)]
pub enum TunnelEvent {
    Started {
        url: String,
        generation: u64,
        started_at: DateTime<Utc>,
    },
    Failed {
        message: String,
        generation: u64,
    },
    Expired {
        generation: u64,
    },
}

struct State {
    session: TunnelSession,
    process: Option<Box<dyn TunnelProcess>>,
}

struct Shared {
    launcher: Box<dyn TunnelLauncher>,
    events: Sender<TunnelEvent>,
    state: Mutex<State>,
}

/// Owns the tunnel subprocess: start, timed expiry, reconnect, shutdown.
///
/// Each start bumps the session generation. Readers and timers carry the
/// generation they were created for and do nothing once it is stale.
pub struct TunnelManager {
    shared: Arc<Shared>,
}

impl TunnelManager {
    pub fn new(launcher: impl TunnelLauncher + 'static, events: Sender<TunnelEvent>) -> Self {
        Self {
            shared: Arc::new(Shared {
                launcher: Box::new(launcher),
                events,
                state: Mutex::new(State {
                    session: TunnelSession::default(),
                    process: None,
                }),
            }),
        }
    }

    /// Launch a new session on `runtime`'s blocking pool. Returns its generation.
    pub fn start(
        &self,
        request: TunnelRequest,
        timeout: Duration,
        runtime: &Handle,
    ) -> Result<u64, TunnelError> {
        let generation = {
            let mut state = self.shared.lock();
            if !state.session.phase.can_reconnect() {
                return Err(TunnelError::AlreadyRunning);
            }
            let generation = state.session.generation + 1;
            state.session = TunnelSession {
                phase: TunnelPhase::Starting,
                url: String::new(),
                error: String::new(),
                timeout,
                started_at: None,
                generation,
                request: Some(request.clone()),
            };
            generation
        };

        tracing::info!(generation, port = request.port, "starting tunnel");
        let shared = Arc::clone(&self.shared);
        let timer_runtime = runtime.clone();
        runtime.spawn_blocking(move || {
            run_session(&shared, generation, &request, timeout, &timer_runtime);
        });
        Ok(generation)
    }

    /// Restart with the previously requested port, subdomain and timeout.
    pub fn reconnect(&self, runtime: &Handle) -> Result<u64, TunnelError> {
        let (request, timeout) = {
            let state = self.shared.lock();
            if !state.session.phase.can_reconnect() {
                return Err(TunnelError::AlreadyRunning);
            }
            let request = state
                .session
                .request
                .clone()
                .ok_or(TunnelError::NeverStarted)?;
            (request, state.session.timeout)
        };
        self.start(request, timeout, runtime)
    }

    /// Expire session `generation`. Returns false (and does nothing) when that
    /// session is not the active one.
    pub fn expire(&self, generation: u64) -> bool {
        self.shared.expire(generation)
    }

    /// Terminate any live session. Idempotent.
    pub fn shutdown(&self) {
        self.shared.shutdown();
    }

    pub fn snapshot(&self) -> TunnelSession {
        self.shared.lock().session.clone()
    }
}

impl Drop for TunnelManager {
    fn drop(&mut self) {
        self.shared.shutdown();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: TunnelEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("tunnel event receiver dropped");
        }
    }

    /// Keep draining output until EOF, then report an unexpected exit.
    fn watch_exit(&self, generation: u64, mut output: Box<dyn BufRead + Send>) {
        let mut line = String::new();
        loop {
            line.clear();
            match output.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }

        let mut state = self.lock();
        if state.session.generation != generation || state.session.phase != TunnelPhase::Active {
            return;
        }
        let alive = state.process.as_mut().is_some_and(|p| p.is_alive());
        if alive {
            return;
        }
        if let Some(mut process) = state.process.take() {
            process.terminate();
        }
        let message = "tunnel process exited".to_string();
        state.session.phase = TunnelPhase::Errored;
        state.session.error = message.clone();
        drop(state);

        tracing::warn!(generation, "tunnel process exited unexpectedly");
        self.emit(TunnelEvent::Failed {
            message,
            generation,
        });
    }

    fn fail(&self, generation: u64, error: &TunnelError) {
        let mut state = self.lock();
        if state.session.generation != generation || state.session.phase != TunnelPhase::Starting {
            return;
        }
        if let Some(mut process) = state.process.take() {
            process.terminate();
        }
        let message = error.to_string();
        state.session.phase = TunnelPhase::Errored;
        state.session.error = message.clone();
        drop(state);

        tracing::warn!(generation, "tunnel failed: {message}");
        self.emit(TunnelEvent::Failed {
            message,
            generation,
        });
    }

    fn expire(&self, generation: u64) -> bool {
        let mut state = self.lock();
        if state.session.generation != generation || state.session.phase != TunnelPhase::Active {
            return false;
        }
        if let Some(mut process) = state.process.take() {
            process.terminate();
        }
        state.session.phase = TunnelPhase::Expired;
        drop(state);

        tracing::info!(generation, "tunnel expired");
        self.emit(TunnelEvent::Expired { generation });
        true
    }

    fn shutdown(&self) {
        let mut state = self.lock();
        if let Some(mut process) = state.process.take() {
            process.terminate();
        }
        if matches!(
            state.session.phase,
            TunnelPhase::Starting | TunnelPhase::Active
        ) {
            state.session.phase = TunnelPhase::Terminated;
            tracing::info!(generation = state.session.generation, "tunnel terminated");
        }
    }
}

fn run_session(
    shared: &Arc<Shared>,
    generation: u64,
    request: &TunnelRequest,
    timeout: Duration,
    runtime: &Handle,
) {
    let launched = match shared.launcher.launch(request) {
        Ok(launched) => launched,
        Err(e) => {
            shared.fail(generation, &e);
            return;
        }
    };

    let mut output = launched.output;
    {
        let mut state = shared.lock();
        let mut process = launched.process;
        if state.session.generation != generation
            || state.session.phase != TunnelPhase::Starting
        {
            process.terminate();
            return;
        }
        state.process = Some(process);
    }

    let url = match read_announced_url(&mut output) {
        Ok(url) => url,
        Err(e) => {
            shared.fail(generation, &e);
            return;
        }
    };

    let started_at = Utc::now();
    {
        let mut state = shared.lock();
        if state.session.generation != generation
            || state.session.phase != TunnelPhase::Starting
        {
            return;
        }
        state.session.phase = TunnelPhase::Active;
        state.session.url = url.clone();
        state.session.started_at = Some(started_at);
    }
    let deadline = {
        let _guard = runtime.enter();
        tokio::time::Instant::now() + timeout
    };
    let timer = Arc::clone(shared);
    runtime.spawn(async move {
        tokio::time::sleep_until(deadline).await;
        timer.expire(generation);
    });

    tracing::info!(generation, %url, "tunnel active");
    shared.emit(TunnelEvent::Started {
        url,
        generation,
        started_at,
    });

    shared.watch_exit(generation, output);
}

fn read_announced_url(output: &mut dyn BufRead) -> Result<String, TunnelError> {
    let mut line = String::new();
    loop {
        line.clear();
        let read = output.read_line(&mut line).map_err(TunnelError::Read)?;
        if read == 0 {
            return Err(TunnelError::ExitedWithoutUrl);
        }
        if let Some(url) = parse_announced_url(&line) {
            return Ok(url);
        }
    }
}
