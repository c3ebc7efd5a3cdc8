#[derive(Debug, thiserror::Error)]
pub enum TunnelError {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("tunnel process has no stdout")]
    MissingStdout,
    #[error("failed to read tunnel output: {0}")]
    Read(#[source] std::io::Error),
    #[error("tunnel exited before announcing a URL")]
    ExitedWithoutUrl,
    #[error("tunnel is already running")]
    AlreadyRunning,
    #[error("no tunnel has been started")]
    NeverStarted,
}
