use std::process::Child;

/// A running tunnel subprocess.
pub trait TunnelProcess: Send {
    fn pid(&self) -> Option<u32>;

    /// Stop the process and everything it spawned. Safe to call more than once.
    fn terminate(&mut self);

    fn is_alive(&mut self) -> bool;
}

/// [`TunnelProcess`] over a child spawned as its own process-group leader.
pub struct ChildTunnelProcess {
    child: Child,
    terminated: bool,
}

impl ChildTunnelProcess {
    pub fn new(child: Child) -> Self {
        Self {
            child,
            terminated: false,
        }
    }
}

impl TunnelProcess for ChildTunnelProcess {
    fn pid(&self) -> Option<u32> {
        Some(self.child.id())
    }

    fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;

        #[cfg(unix)]
        {
            if let Ok(pgid) = i32::try_from(self.child.id()) {
                // SAFETY: kill(2) with a negative pid signals the process group we created
                // at spawn; it has no memory-safety preconditions.
                unsafe {
                    libc::kill(-pgid, libc::SIGTERM);
                }
            }
        }

        if let Err(e) = self.child.kill() {
            tracing::debug!("tunnel kill: {e}");
        }
        if let Err(e) = self.child.wait() {
            tracing::debug!("tunnel wait: {e}");
        }
    }

    fn is_alive(&mut self) -> bool {
        !self.terminated && matches!(self.child.try_wait(), Ok(None))
    }
}

impl Drop for ChildTunnelProcess {
    fn drop(&mut self) {
        self.terminate();
    }
}
