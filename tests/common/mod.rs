//! Shared fixtures for the session integration tests.

#![allow(dead_code)]

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use parking_lot::Mutex;
use rtr_session::pdu::{EndOfData, Intervals};
use rtr_session::prelude::*;
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};
use tracing_subscriber::fmt::MakeWriter;

/// Something the handler saw.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Connected,
    Pdu(Pdu),
    Disconnected,
}

/// Handler that records every callback.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
    sync_on_connect: bool,
}

impl Recorder {
    /// Recorder that sends a sync query from `client_connected`.
    pub fn syncing() -> Self {
        Self {
            sync_on_connect: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events.lock().iter().filter(|e| *e == event).count()
    }

    pub fn pdu_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, Event::Pdu(_)))
            .count()
    }
}

impl SessionEventHandler for Recorder {
    async fn handle_pdu(&self, _session: &ClientSession<Self>, pdu: Pdu) {
        self.events.lock().push(Event::Pdu(pdu));
    }

    async fn client_connected(&self, session: &ClientSession<Self>) {
        self.events.lock().push(Event::Connected);
        if self.sync_on_connect {
            session.send_sync_query().await.unwrap();
        }
    }

    async fn client_disconnected(&self, _session: &ClientSession<Self>) {
        self.events.lock().push(Event::Disconnected);
    }
}

/// End of Data with the RFC default intervals in version 1.
pub fn end_of_data(version: ProtocolVersion, session_id: u16, serial: u32) -> Pdu {
    let intervals = (version == ProtocolVersion::V1).then(Intervals::default);
    Pdu::new(
        version,
        Message::EndOfData(EndOfData {
            session_id,
            serial,
            intervals,
        }),
    )
}

pub fn cache_response(version: ProtocolVersion, session_id: u16) -> Pdu {
    Pdu::new(version, Message::CacheResponse { session_id })
}

/// Poll `condition` until it holds, failing the test after five seconds.
pub async fn wait_for(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met in time");
}

/// In-memory log sink for `tracing_subscriber::fmt`.
#[derive(Debug, Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Transport whose reads come from a pipe and whose writes always fail.
#[derive(Debug)]
pub struct BrokenWriter {
    reader: DuplexStream,
}

impl BrokenWriter {
    /// Returns the transport and the peer end of its read side.
    pub fn new() -> (Self, DuplexStream) {
        let (reader, peer) = tokio::io::duplex(1024);
        (Self { reader }, peer)
    }
}

impl AsyncRead for BrokenWriter {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.reader).poll_read(cx, buf)
    }
}

impl AsyncWrite for BrokenWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::from(io::ErrorKind::BrokenPipe)))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
