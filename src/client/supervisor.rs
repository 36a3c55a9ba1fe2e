//! Reconnecting wrapper around [`ClientSession`].
//!
//! A session never reconnects by itself. The supervisor starts a fresh
//! session per attempt, carries the synchronization state across, and waits
//! the retry interval between attempts.

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::config::ClientConfig;
use super::handler::{NoopHandler, SessionEventHandler};
use super::session::ClientSession;
use crate::core::SessionError;
use crate::sync::SyncSnapshot;
use crate::transport::Security;

/// Keeps a session to one cache alive until shut down.
#[derive(Debug)]
pub struct SessionSupervisor<H = NoopHandler> {
    config: ClientConfig,
    addr: String,
    security: Security,
    handler: H,
    snapshot: Mutex<SyncSnapshot>,
    shutdown: CancellationToken,
}

impl<H: SessionEventHandler + Clone> SessionSupervisor<H> {
    /// Create a supervisor for the cache at `addr`.
    pub fn new(config: ClientConfig, addr: impl Into<String>, security: Security, handler: H) -> Self {
        Self {
            config,
            addr: addr.into(),
            security,
            handler,
            snapshot: Mutex::new(SyncSnapshot::default()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Start from previously saved synchronization state.
    pub fn with_snapshot(self, snapshot: SyncSnapshot) -> Self {
        *self.snapshot.lock() = snapshot;
        self
    }

    /// Synchronization state of the most recent session.
    pub fn snapshot(&self) -> SyncSnapshot {
        *self.snapshot.lock()
    }

    /// Token that stops [`run`](Self::run) when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop the supervisor, disconnecting the current session.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Run sessions back to back until shut down.
    ///
    /// Fails only on invalid configuration; session errors are logged and
    /// followed by a reconnect.
    pub async fn run(&self) -> Result<(), SessionError> {
        self.config.validate()?;

        loop {
            let session = ClientSession::resume(self.config.clone(), self.handler.clone(), self.snapshot());

            let outcome = {
                let start = session.start(&self.addr, &self.security);
                tokio::pin!(start);

                tokio::select! {
                    biased;
                    outcome = &mut start => outcome,
                    _ = self.shutdown.cancelled() => {
                        session.disconnect().await;
                        start.await
                    }
                }
            };

            *self.snapshot.lock() = session.sync_snapshot();

            if self.shutdown.is_cancelled() {
                info!(addr = %self.addr, "supervisor stopped");
                return Ok(());
            }

            let retry = session.retry_interval();
            match outcome {
                Ok(()) => info!(addr = %self.addr, ?retry, "session ended, reconnecting"),
                Err(err) => warn!(addr = %self.addr, %err, ?retry, "session failed, reconnecting"),
            }

            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!(addr = %self.addr, "supervisor stopped");
                    return Ok(());
                }
                _ = tokio::time::sleep(retry) => {}
            }
        }
    }
}
