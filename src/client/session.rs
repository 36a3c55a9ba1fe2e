//! The RTR client session engine.
//!
//! A [`ClientSession`] owns one transport to one cache. While connected it
//! runs two tasks:
//!
//! - the **transmit task**, the only writer of the transport, which drains
//!   the bounded outbound queue
//! - the **receive loop**, on the caller of [`ClientSession::start`], which
//!   decodes PDUs, dispatches them to the [`SessionEventHandler`] and fires
//!   the refresh timer
//!
//! Teardown always goes through [`ClientSession::disconnect`], so the
//! handler sees at most one `client_disconnected`.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until, timeout};
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::config::ClientConfig;
use super::handler::{NoopHandler, SessionEventHandler};
use crate::core::{ProtocolVersion, SessionError, TRANSPORT_CLOSE_TIMEOUT, Versioned};
use crate::pdu::{Message, Pdu};
use crate::sync::{SerialState, SyncQuery, SyncSnapshot, SyncStatus};
use crate::transport::{ConnectionState, ConnectionStateCell, RtrCodec, Security, connect, wait_while};

/// Negotiated protocol version, downgraded at most once.
#[derive(Debug)]
struct VersionCell {
    configured: ProtocolVersion,
    current: AtomicU8,
}

impl VersionCell {
    fn new(version: ProtocolVersion) -> Self {
        Self {
            configured: version,
            current: AtomicU8::new(version.as_u8()),
        }
    }

    fn get(&self) -> ProtocolVersion {
        ProtocolVersion::try_from(self.current.load(Ordering::Acquire)).unwrap_or(self.configured)
    }

    /// Move from `from` to the lower `to`. Only one caller can win.
    fn downgrade(&self, from: ProtocolVersion, to: ProtocolVersion) -> bool {
        to < from
            && self
                .current
                .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
    }
}

struct Inner<H> {
    config: ClientConfig,
    handler: H,
    state: ConnectionStateCell,
    version: VersionCell,
    sync: Mutex<SyncStatus>,
    outbound_tx: mpsc::Sender<Pdu>,
    /// Taken by the transmit task when the session connects.
    outbound_rx: Mutex<Option<mpsc::Receiver<Pdu>>>,
    shutdown: CancellationToken,
}

/// One RTR client session.
///
/// Cheap to clone; clones share the same session. A session runs at most
/// once: after it reaches [`ConnectionState::Disconnected`] a new one must
/// be created, optionally continuing from [`ClientSession::sync_snapshot`].
pub struct ClientSession<H = NoopHandler> {
    inner: Arc<Inner<H>>,
}

impl<H> Clone for ClientSession<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H> fmt::Debug for ClientSession<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSession")
            .field("state", &self.inner.state.get())
            .field("version", &self.inner.version.get())
            .field("serial", &self.inner.sync.lock().serial())
            .finish()
    }
}

impl ClientSession<NoopHandler> {
    /// Create a session whose events are ignored.
    pub fn without_handler(config: ClientConfig) -> Self {
        Self::new(config, NoopHandler)
    }
}

impl<H: SessionEventHandler> ClientSession<H> {
    /// Create an idle session.
    pub fn new(config: ClientConfig, handler: H) -> Self {
        Self::resume(config, handler, SyncSnapshot::default())
    }

    /// Create an idle session that continues from an earlier session's
    /// synchronization state.
    pub fn resume(config: ClientConfig, handler: H, snapshot: SyncSnapshot) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel(config.queue_capacity.max(1));
        let sync = SyncStatus::resume(config.timers, snapshot, Instant::now());

        Self {
            inner: Arc::new(Inner {
                version: VersionCell::new(config.version),
                handler,
                state: ConnectionStateCell::new(),
                sync: Mutex::new(sync),
                outbound_tx,
                outbound_rx: Mutex::new(Some(outbound_rx)),
                shutdown: CancellationToken::new(),
                config,
            }),
        }
    }

    /// Session configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The event handler.
    pub fn handler(&self) -> &H {
        &self.inner.handler
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.inner.state.get()
    }

    /// Watch connection state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Whether the session is connected.
    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    /// Negotiated protocol version.
    pub fn version(&self) -> ProtocolVersion {
        self.inner.version.get()
    }

    /// Serial confirmed by the last End of Data.
    pub fn last_serial(&self) -> Option<SerialState> {
        self.inner.sync.lock().serial()
    }

    /// Synchronization state to hand to a follow-up session.
    pub fn sync_snapshot(&self) -> SyncSnapshot {
        self.inner.sync.lock().snapshot()
    }

    /// How long to wait before starting a follow-up session.
    pub fn retry_interval(&self) -> Duration {
        self.inner.sync.lock().timers().retry_interval()
    }

    /// Connect to the cache at `addr` and run the session.
    ///
    /// Returns once the session has fully torn down: `Ok(())` if it was
    /// ended by [`disconnect`](Self::disconnect), the terminal error
    /// otherwise. If the transport cannot be established the session goes
    /// back to `Idle`, the handler is not called, and the error is returned.
    pub async fn start(&self, addr: &str, security: &Security) -> Result<(), SessionError> {
        self.begin_connect()?;
        debug!(%addr, "connecting to cache");

        let connected = tokio::select! {
            biased;
            _ = self.inner.shutdown.cancelled() => Err(SessionError::Disconnected),
            result = connect(addr, security) => result,
        };

        match connected {
            Ok(stream) => self.run(stream).await,
            Err(err) => {
                error!(%addr, %err, "failed to establish transport");
                self.fail_connect();
                Err(err)
            }
        }
    }

    /// Run the session over an already established byte stream.
    pub async fn start_with_stream<S>(&self, stream: S) -> Result<(), SessionError>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        self.begin_connect()?;
        self.run(stream).await
    }

    /// End the session.
    ///
    /// Safe to call any number of times from any task; only the first call
    /// has an effect. The handler's `client_disconnected` runs on this call
    /// if the session was connected.
    pub async fn disconnect(&self) {
        let Some(previous) = self.inner.state.begin_disconnect() else {
            return;
        };
        debug!(state = ?previous, "disconnecting");

        if previous == ConnectionState::Connected {
            self.inner.handler.client_disconnected(self).await;
        }
        self.inner.shutdown.cancel();

        // Nothing else is running to finish the teardown.
        if previous == ConnectionState::Idle {
            self.inner.state.mark_disconnected();
        }
    }

    /// Enqueue a Reset Query.
    pub async fn send_reset_query(&self) -> Result<(), SessionError> {
        self.send_pdu(Pdu::reset_query(self.version())).await
    }

    /// Enqueue a Serial Query for `serial`, using the session id of the last
    /// End of Data (0 if there was none).
    pub async fn send_serial_query(&self, serial: u32) -> Result<(), SessionError> {
        let session_id = self.last_serial().map_or(0, |state| state.session_id);
        self.send_pdu(Pdu::serial_query(self.version(), session_id, serial))
            .await
    }

    /// Enqueue whichever query continues synchronization: a Serial Query
    /// from the last confirmed serial, or a Reset Query if there is none or
    /// it has expired.
    pub async fn send_sync_query(&self) -> Result<(), SessionError> {
        let query = self.inner.sync.lock().next_query(Instant::now());
        self.send_query(query).await
    }

    /// Stamp `pdu` with the negotiated version and enqueue it.
    pub async fn send_pdu(&self, mut pdu: Pdu) -> Result<(), SessionError> {
        pdu.set_version(self.version());
        self.send_raw_pdu(pdu).await
    }

    /// Enqueue `pdu` unchanged.
    ///
    /// Waits while the queue is full. Fails with
    /// [`SessionError::Disconnected`] once the session is shutting down.
    pub async fn send_raw_pdu(&self, pdu: Pdu) -> Result<(), SessionError> {
        if self.connection_state().is_terminating() {
            return Err(SessionError::Disconnected);
        }

        tokio::select! {
            biased;
            _ = self.inner.shutdown.cancelled() => Err(SessionError::Disconnected),
            sent = self.inner.outbound_tx.send(pdu) => sent.map_err(|_| SessionError::Disconnected),
        }
    }

    fn begin_connect(&self) -> Result<(), SessionError> {
        self.inner.state.begin_connect().map_err(|state| {
            SessionError::InvalidState(format!("cannot start a session that is {state:?}"))
        })
    }

    /// Undo `begin_connect`, or finish a disconnect that raced with it.
    fn fail_connect(&self) {
        if !self.inner.state.abort_connect() {
            self.inner.state.mark_disconnected();
        }
    }

    async fn run<S>(&self, stream: S) -> Result<(), SessionError>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let outbound_rx = self.inner.outbound_rx.lock().take();
        let Some(outbound_rx) = outbound_rx else {
            self.fail_connect();
            return Err(SessionError::InvalidState(
                "session has already run".to_string(),
            ));
        };

        if !self.inner.state.mark_connected() {
            self.inner.state.mark_disconnected();
            return Err(SessionError::Disconnected);
        }

        let (reader, writer) = tokio::io::split(stream);
        let mut frames = FramedRead::new(reader, RtrCodec::new());
        let sink = FramedWrite::new(writer, RtrCodec::new());

        let transmit = tokio::spawn(self.clone().transmit_loop(sink, outbound_rx));

        info!(version = %self.version(), "connected to cache");
        self.inner.handler.client_connected(self).await;

        let result = self.receive_loop(&mut frames).await;

        self.disconnect().await;
        drop(frames);
        let transmit_result = match transmit.await {
            Ok(result) => result,
            Err(err) => {
                error!(%err, "transmit task panicked");
                Ok(())
            }
        };

        self.inner.state.mark_disconnected();
        info!("session closed");
        result.and(transmit_result)
    }

    async fn receive_loop<R>(&self, frames: &mut FramedRead<R, RtrCodec>) -> Result<(), SessionError>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            let refresh_at = self.inner.sync.lock().timers().refresh_deadline();

            // The deadline goes ahead of the frame branch so a long burst of
            // buffered PDUs cannot hold back a due refresh.
            tokio::select! {
                biased;
                _ = self.inner.shutdown.cancelled() => return Ok(()),
                _ = sleep_until(refresh_at) => self.refresh().await,
                frame = frames.next() => {
                    let pdu = match frame {
                        Some(Ok(pdu)) => pdu,
                        Some(Err(err)) => {
                            let err = SessionError::from(err);
                            error!(%err, "failed to read PDU");
                            return Err(err);
                        }
                        None => {
                            info!("cache closed the connection");
                            return Err(SessionError::Closed);
                        }
                    };

                    trace!(pdu_type = pdu.pdu_type(), version = %pdu.version(), "received PDU");
                    self.observe(&pdu);
                    self.inner.handler.handle_pdu(self, pdu).await;
                }
            }
        }
    }

    /// Session bookkeeping for an inbound PDU, ahead of the handler.
    fn observe(&self, pdu: &Pdu) {
        let current = self.version();
        let received = pdu.version();
        if received < current && self.inner.version.downgrade(current, received) {
            info!(from = %current, to = %received, "cache speaks an older protocol version, downgrading");
        }

        if let Message::EndOfData(eod) = pdu.message() {
            self.inner.sync.lock().on_end_of_data(
                eod,
                self.inner.config.adopt_cache_intervals,
                Instant::now(),
            );
            debug!(session_id = eod.session_id, serial = eod.serial, "synchronized with cache");
        }
    }

    async fn refresh(&self) {
        let query = self.inner.sync.lock().on_refresh_due(Instant::now());
        debug!(?query, "refresh timer fired");

        if let Err(err) = self.send_query(query).await {
            debug!(%err, "refresh query not sent");
        }
    }

    async fn send_query(&self, query: SyncQuery) -> Result<(), SessionError> {
        match query {
            SyncQuery::Serial(state) => {
                self.send_pdu(Pdu::serial_query(self.version(), state.session_id, state.serial))
                    .await
            }
            SyncQuery::Reset => self.send_reset_query().await,
        }
    }

    async fn transmit_loop<W>(
        self,
        mut sink: FramedWrite<W, RtrCodec>,
        mut outbound_rx: mpsc::Receiver<Pdu>,
    ) -> Result<(), SessionError>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let mut state_rx = self.inner.state.subscribe();

        loop {
            let pdu = tokio::select! {
                biased;
                _ = self.inner.shutdown.cancelled() => break,
                _ = wait_while(&mut state_rx, ConnectionState::Connected) => break,
                pdu = outbound_rx.recv() => match pdu {
                    Some(pdu) => pdu,
                    None => break,
                },
            };

            trace!(pdu_type = pdu.pdu_type(), version = %pdu.version(), "sending PDU");
            let sent = tokio::select! {
                biased;
                _ = self.inner.shutdown.cancelled() => break,
                sent = sink.send(pdu) => sent,
            };

            if let Err(err) = sent {
                let err = SessionError::from(err);
                error!(%err, "failed to write PDU");
                self.disconnect().await;
                return Err(err);
            }
        }

        // A non-empty buffer means a write stalled on a peer that stopped
        // reading; dropping the sink abandons it.
        if !sink.write_buffer().is_empty() {
            debug!(pending = sink.write_buffer().len(), "dropping unsent bytes");
            return Ok(());
        }

        match timeout(TRANSPORT_CLOSE_TIMEOUT, sink.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(%err, "failed to shut down transport"),
            Err(_) => debug!("transport shutdown timed out"),
        }
        Ok(())
    }
}
