//! Connection state management for the RTR session.
//!
//! The state lives in a `tokio::sync::watch` channel so that every
//! transition is a serialized compare-and-set and tasks can wait for a
//! transition without polling.

use tokio::sync::watch;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Configured, not started.
    Idle,
    /// Transport establishment in progress.
    Connecting,
    /// Transport established, tasks running.
    Connected,
    /// Teardown in progress.
    Disconnecting,
    /// Teardown complete. Terminal.
    Disconnected,
}

impl ConnectionState {
    /// Whether the state is `Disconnecting` or `Disconnected`.
    pub fn is_terminating(&self) -> bool {
        matches!(self, Self::Disconnecting | Self::Disconnected)
    }
}

/// Shared, atomically transitioned connection state.
#[derive(Debug)]
pub struct ConnectionStateCell {
    tx: watch::Sender<ConnectionState>,
}

impl Default for ConnectionStateCell {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionStateCell {
    /// Create a cell in the `Idle` state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ConnectionState::Idle);
        Self { tx }
    }

    /// Current state.
    pub fn get(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.tx.subscribe()
    }

    /// Move to `to` if the current state is one of `from`.
    ///
    /// Returns the previous state on success, the unchanged current state on
    /// failure.
    pub fn transition(
        &self,
        from: &[ConnectionState],
        to: ConnectionState,
    ) -> Result<ConnectionState, ConnectionState> {
        let mut outcome = Err(ConnectionState::Idle);
        self.tx.send_if_modified(|state| {
            if from.contains(state) {
                outcome = Ok(*state);
                *state = to;
                true
            } else {
                outcome = Err(*state);
                false
            }
        });
        outcome
    }

    /// `Idle -> Connecting`.
    pub fn begin_connect(&self) -> Result<(), ConnectionState> {
        self.transition(&[ConnectionState::Idle], ConnectionState::Connecting)
            .map(|_| ())
    }

    /// `Connecting -> Idle`, after a failed establishment.
    pub fn abort_connect(&self) -> bool {
        self.transition(&[ConnectionState::Connecting], ConnectionState::Idle)
            .is_ok()
    }

    /// `Connecting -> Connected`.
    pub fn mark_connected(&self) -> bool {
        self.transition(&[ConnectionState::Connecting], ConnectionState::Connected)
            .is_ok()
    }

    /// Any live state `-> Disconnecting`.
    ///
    /// Exactly one caller observes `Some(previous)`; everybody else gets
    /// `None`.
    pub fn begin_disconnect(&self) -> Option<ConnectionState> {
        self.transition(
            &[
                ConnectionState::Idle,
                ConnectionState::Connecting,
                ConnectionState::Connected,
            ],
            ConnectionState::Disconnecting,
        )
        .ok()
    }

    /// `Disconnecting -> Disconnected`.
    pub fn mark_disconnected(&self) -> bool {
        self.transition(
            &[ConnectionState::Disconnecting],
            ConnectionState::Disconnected,
        )
        .is_ok()
    }
}

/// Wait until the watched state is anything other than `state`.
pub async fn wait_while(rx: &mut watch::Receiver<ConnectionState>, state: ConnectionState) {
    let _ = rx.wait_for(|current| *current != state).await;
}
