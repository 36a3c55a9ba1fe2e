//! Byte-stream transports for RTR.
//!
//! RTR runs over plain TCP or over a TLS-wrapped TCP connection
//! (RFC 6810 section 7). The session only needs an async byte stream, so
//! both are erased to [`BoxedStream`].

#[cfg(feature = "tls")]
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::debug;

use crate::core::SessionError;

#[cfg(feature = "tls")]
use tokio_rustls::{
    TlsConnector,
    rustls::{ClientConfig, pki_types::ServerName},
};

/// Async byte stream usable as an RTR transport.
pub trait RtrStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> RtrStream for T {}

/// Type-erased transport stream.
pub type BoxedStream = Box<dyn RtrStream>;

/// How to secure the transport.
#[derive(Debug, Clone, Default)]
pub enum Security {
    /// Plain TCP.
    #[default]
    Plain,
    /// TLS over TCP.
    #[cfg(feature = "tls")]
    #[cfg_attr(docsrs, doc(cfg(feature = "tls")))]
    Tls(TlsSettings),
}

/// TLS client settings.
///
/// Certificate validation policy is entirely up to the supplied rustls
/// configuration.
#[cfg(feature = "tls")]
#[cfg_attr(docsrs, doc(cfg(feature = "tls")))]
#[derive(Debug, Clone)]
pub struct TlsSettings {
    config: Arc<ClientConfig>,
    server_name: ServerName<'static>,
}

#[cfg(feature = "tls")]
impl TlsSettings {
    /// Create TLS settings with an explicit server name.
    pub fn new(config: Arc<ClientConfig>, server_name: ServerName<'static>) -> Self {
        Self {
            config,
            server_name,
        }
    }

    /// Create TLS settings, parsing the server name from a host string.
    pub fn for_host(config: Arc<ClientConfig>, host: &str) -> Result<Self, SessionError> {
        let server_name = ServerName::try_from(host.to_string()).map_err(|err| {
            SessionError::Connect {
                addr: host.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, err),
            }
        })?;
        Ok(Self::new(config, server_name))
    }

    /// Server name presented for SNI and certificate validation.
    pub fn server_name(&self) -> &ServerName<'static> {
        &self.server_name
    }
}

/// Resolve `addr` and establish the transport.
pub async fn connect(addr: &str, security: &Security) -> Result<BoxedStream, SessionError> {
    let connect_err = |source| SessionError::Connect {
        addr: addr.to_string(),
        source,
    };

    let tcp = TcpStream::connect(addr).await.map_err(connect_err)?;
    if let Err(err) = tcp.set_nodelay(true) {
        debug!(%addr, %err, "failed to set TCP_NODELAY");
    }

    match security {
        Security::Plain => Ok(Box::new(tcp)),
        #[cfg(feature = "tls")]
        Security::Tls(settings) => {
            let connector = TlsConnector::from(Arc::clone(&settings.config));
            let stream = connector
                .connect(settings.server_name.clone(), tcp)
                .await
                .map_err(connect_err)?;
            debug!(%addr, "TLS handshake complete");
            Ok(Box::new(stream))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_plain() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4];
            socket.read_exact(&mut buf).await.unwrap();
            buf
        });

        let mut stream = connect(&addr, &Security::Plain).await.unwrap();
        stream.write_all(b"rtr!").await.unwrap();
        assert_eq!(&server.await.unwrap(), b"rtr!");
    }

    #[tokio::test]
    async fn test_connect_refused_reports_address() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        match connect(&addr, &Security::Plain).await {
            Err(SessionError::Connect { addr: failed, .. }) => assert_eq!(failed, addr),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("connect to a closed port succeeded"),
        }
    }
}
