use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "webhook_tui=info";

/// Send `tracing` output to `path`, appending. The terminal belongs to the
/// UI, so when the file cannot be opened logging stays off.
pub fn init(path: &Path) {
    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => file,
        Err(_) => return,
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_DIRECTIVE.into()),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}
