//! Integration tests for the reconnecting supervisor.

#![cfg(feature = "client")]

mod common;

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_util::codec::Framed;

use common::{Event, Recorder, cache_response, end_of_data, wait_for};
use rtr_session::prelude::*;

#[tokio::test]
async fn test_reconnect_resumes_with_serial_query() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let config = ClientConfig::builder()
        .retry_interval(Duration::from_millis(50))
        .adopt_cache_intervals(false)
        .build()
        .unwrap();
    let handler = Recorder::syncing();
    let supervisor = Arc::new(SessionSupervisor::new(
        config,
        addr,
        Security::Plain,
        handler.clone(),
    ));
    let runner = tokio::spawn({
        let supervisor = Arc::clone(&supervisor);
        async move { supervisor.run().await }
    });

    // First session: full synchronization, then the cache goes away.
    let (socket, _) = listener.accept().await.unwrap();
    let mut cache = Framed::new(socket, RtrCodec::new());
    let query = cache.next().await.unwrap().unwrap();
    assert_eq!(query.message(), &Message::ResetQuery);

    cache.send(cache_response(ProtocolVersion::V1, 7)).await.unwrap();
    cache.send(end_of_data(ProtocolVersion::V1, 7, 42)).await.unwrap();
    wait_for(|| handler.pdu_count() == 2).await;
    drop(cache);

    // Second session picks up where the first left off.
    let (socket, _) = listener.accept().await.unwrap();
    let mut cache = Framed::new(socket, RtrCodec::new());
    let query = cache.next().await.unwrap().unwrap();
    assert_eq!(
        query.message(),
        &Message::SerialQuery {
            session_id: 7,
            serial: 42
        }
    );

    supervisor.shutdown();
    runner.await.unwrap().unwrap();

    assert_eq!(handler.count(&Event::Connected), 2);
    assert_eq!(handler.count(&Event::Disconnected), 2);
    assert_eq!(
        supervisor.snapshot().serial,
        Some(SerialState {
            session_id: 7,
            serial: 42
        })
    );
}

#[tokio::test]
async fn test_shutdown_while_waiting_to_retry() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let handler = Recorder::default();
    let supervisor = Arc::new(SessionSupervisor::new(
        ClientConfig::default(),
        addr,
        Security::Plain,
        handler.clone(),
    ));
    let runner = tokio::spawn({
        let supervisor = Arc::clone(&supervisor);
        async move { supervisor.run().await }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    supervisor.shutdown();

    tokio::time::timeout(Duration::from_secs(5), runner)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(handler.events().is_empty());
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let config = ClientConfig {
        queue_capacity: 0,
        ..ClientConfig::default()
    };
    let supervisor = SessionSupervisor::new(config, "127.0.0.1:1", Security::Plain, Recorder::default());

    assert!(matches!(
        supervisor.run().await,
        Err(SessionError::Config(ConfigError::ZeroQueueCapacity))
    ));
}
