//! Session event callbacks.

use std::future::Future;

use super::session::ClientSession;
use crate::pdu::Pdu;

/// Receives lifecycle events and inbound PDUs of a [`ClientSession`].
///
/// `handle_pdu` is awaited on the receive path before the next PDU is read,
/// so PDUs reach the handler in wire order. A handler may call the session's
/// query methods from any callback; it must not await `start` or anything
/// that waits for the session to finish.
///
/// # Example
///
/// ```ignore
/// struct Printer;
///
/// impl SessionEventHandler for Printer {
///     async fn handle_pdu(&self, _session: &ClientSession<Self>, pdu: Pdu) {
///         println!("{pdu:?}");
///     }
///
///     async fn client_connected(&self, session: &ClientSession<Self>) {
///         let _ = session.send_sync_query().await;
///     }
/// }
/// ```
pub trait SessionEventHandler: Sized + Send + Sync + 'static {
    /// Handle one decoded PDU.
    fn handle_pdu(&self, session: &ClientSession<Self>, pdu: Pdu) -> impl Future<Output = ()> + Send;

    /// The transport is up and the transmit task is running.
    fn client_connected(&self, session: &ClientSession<Self>) -> impl Future<Output = ()> + Send {
        let _ = session;
        async {}
    }

    /// The session has begun tearing down. Called at most once, and only
    /// after `client_connected`.
    fn client_disconnected(&self, session: &ClientSession<Self>) -> impl Future<Output = ()> + Send {
        let _ = session;
        async {}
    }
}

/// Handler that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl SessionEventHandler for NoopHandler {
    async fn handle_pdu(&self, _session: &ClientSession<Self>, _pdu: Pdu) {}
}
