use crate::TunnelError;
use crate::process::{ChildTunnelProcess, TunnelProcess};
use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};
use webhook_tui_runtime_config::TunnelSettings;

/// What to expose through the tunnel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelRequest {
    pub port: u16,
    pub subdomain: Option<String>,
}

/// A spawned tunnel and the stream it announces its URL on.
pub struct LaunchedTunnel {
    pub process: Box<dyn TunnelProcess>,
    pub output: Box<dyn BufRead + Send>,
}

pub trait TunnelLauncher: Send + Sync {
    fn launch(&self, request: &TunnelRequest) -> Result<LaunchedTunnel, TunnelError>;
}

/// Runs an external tunnel command (`npx localtunnel` by default).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLauncher {
    command: String,
    args: Vec<String>,
}

impl Default for CommandLauncher {
    fn default() -> Self {
        Self::from_settings(&TunnelSettings::default())
    }
}

impl CommandLauncher {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    pub fn from_settings(settings: &TunnelSettings) -> Self {
        Self::new(settings.command.clone(), settings.args.clone())
    }

    /// Arguments passed to the command for `request`.
    pub fn argv(&self, request: &TunnelRequest) -> Vec<String> {
        let mut argv = self.args.clone();
        argv.push("--port".to_string());
        argv.push(request.port.to_string());
        if let Some(subdomain) = request.subdomain.as_deref().filter(|s| !s.is_empty()) {
            argv.push("--subdomain".to_string());
            argv.push(subdomain.to_string());
        }
        argv
    }
}

impl TunnelLauncher for CommandLauncher {
    fn launch(&self, request: &TunnelRequest) -> Result<LaunchedTunnel, TunnelError> {
        let mut cmd = Command::new(&self.command);
        cmd.args(self.argv(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = cmd.spawn().map_err(|source| TunnelError::Spawn {
            command: self.command.clone(),
            source,
        })?;
        let stdout = child.stdout.take();
        let mut process = ChildTunnelProcess::new(child);
        let Some(stdout) = stdout else {
            process.terminate();
            return Err(TunnelError::MissingStdout);
        };

        tracing::info!(pid = ?process.pid(), port = request.port, "tunnel process spawned");
        Ok(LaunchedTunnel {
            process: Box::new(process),
            output: Box::new(BufReader::new(stdout)),
        })
    }
}

/// Extract the public URL from a line of tunnel output: everything from the
/// first `https://` to the end of the line, trimmed.
pub fn parse_announced_url(line: &str) -> Option<String> {
    let start = line.find("https://")?;
    let url = line[start..].lines().next().unwrap_or_default().trim();
    (!url.is_empty()).then(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_localtunnel_banner() {
        assert_eq!(
            parse_announced_url("your url is: https://brave-fox.loca.lt\n"),
            Some("https://brave-fox.loca.lt".to_string())
        );
    }

    #[test]
    fn ignores_lines_without_https() {
        assert_eq!(parse_announced_url("npm WARN exec"), None);
        assert_eq!(parse_announced_url("http://insecure.example"), None);
        assert_eq!(parse_announced_url(""), None);
    }

    #[test]
    fn trims_trailing_whitespace() {
        assert_eq!(
            parse_announced_url("https://a.loca.lt  \r\n"),
            Some("https://a.loca.lt".to_string())
        );
    }

    #[test]
    fn argv_includes_subdomain_only_when_set() {
        let launcher = CommandLauncher::default();
        let plain = TunnelRequest {
            port: 8098,
            subdomain: None,
        };
        assert_eq!(launcher.argv(&plain), vec!["localtunnel", "--port", "8098"]);

        let named = TunnelRequest {
            port: 9000,
            subdomain: Some("my-hook".to_string()),
        };
        assert_eq!(
            launcher.argv(&named),
            vec!["localtunnel", "--port", "9000", "--subdomain", "my-hook"]
        );
    }

    #[test]
    fn missing_command_is_a_spawn_error() {
        let launcher = CommandLauncher::new("webhook-tui-definitely-not-installed", Vec::new());
        let request = TunnelRequest {
            port: 1,
            subdomain: None,
        };
        let err = launcher.launch(&request).err().expect("spawn should fail");
        assert!(matches!(err, TunnelError::Spawn { .. }));
    }
}
