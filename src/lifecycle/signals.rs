//! OS signal handling.
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP triggers config reload, not shutdown
//! - Non-unix targets only get Ctrl-C

/// Internal events derived from OS signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Shutdown,
    Reload,
}

/// Listens for process signals and yields them as [`Signal`]s.
pub struct SignalListener {
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    hangup: tokio::signal::unix::Signal,
}

impl SignalListener {
    #[cfg(unix)]
    pub fn new() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            terminate: signal(SignalKind::terminate())?,
            interrupt: signal(SignalKind::interrupt())?,
            hangup: signal(SignalKind::hangup())?,
        })
    }

    #[cfg(not(unix))]
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {})
    }

    /// Wait for the next signal. Returns `None` once signal delivery ends.
    #[cfg(unix)]
    pub async fn recv(&mut self) -> Option<Signal> {
        tokio::select! {
            s = self.terminate.recv() => s.map(|_| Signal::Shutdown),
            s = self.interrupt.recv() => s.map(|_| Signal::Shutdown),
            s = self.hangup.recv() => s.map(|_| Signal::Reload),
        }
    }

    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> Option<Signal> {
        tokio::signal::ctrl_c().await.ok().map(|_| Signal::Shutdown)
    }
}
