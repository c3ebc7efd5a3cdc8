//! Outbound tunnel lifecycle and public-IP discovery.

mod error;
pub mod ip_lookup;
pub mod launcher;
pub mod manager;
pub mod process;

pub use error::TunnelError;
pub use launcher::{
    CommandLauncher, LaunchedTunnel, TunnelLauncher, TunnelRequest, parse_announced_url,
};
pub use manager::{TunnelEvent, TunnelManager, TunnelPhase, TunnelSession};
pub use process::{ChildTunnelProcess, TunnelProcess};
