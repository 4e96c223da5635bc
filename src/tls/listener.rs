use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use rustls::ServerConfig;
use tokio::sync::mpsc::{channel, Receiver, Sender};
use tokio::time::timeout;
use tokio_rustls::TlsAcceptor;
use tracing::debug;
use crate::addr::NetAddr;
use crate::conn::{Conn, Listener};
use crate::error::{Error, ErrorKind, Result};
use crate::tcp::{self, TcpConn, TcpListener};
use super::conn::TlsConn;
use super::store;
use super::TlsConfig;

/// Accepts TCP connections and wraps each in a server-side TLS
/// session.
///
/// Handshakes run on their own tasks and completed sessions arrive
/// on an internal channel, so one client that stalls mid-handshake
/// cannot hold up the others. Handshakes that fail or outlive
/// [`HANDSHAKE_TIMEOUT`] are dropped and acceptance continues.
pub struct TlsListener {
    listener: TcpListener,
    acceptor: TlsAcceptor,
    tx:       Sender<TlsConn>,
    rx:       Receiver<TlsConn>,
}

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Binds a TCP listener on addr and serves TLS over it. Certificate
/// and key files are required and are loaded before the socket binds.
pub async fn listen(addr: &str, config: &TlsConfig) -> Result<TlsListener> {
    let (cert, key) = match (&config.cert_file, &config.key_file) {
        (Some(cert), Some(key)) => (cert, key),
        _ => {
            let msg = "certificate and key files are required for tls server";
            return Err(Error::new(ErrorKind::Tls, msg));
        }
    };

    let certs = store::certs(cert)?;
    let key   = store::key(key)?;

    let server = ServerConfig::builder()
        .with_safe_defaults()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;

    let listener = tcp::listen(addr).await?;
    let acceptor = TlsAcceptor::from(Arc::new(server));
    let (tx, rx) = channel(16);

    Ok(TlsListener { listener, acceptor, tx, rx })
}

impl TlsListener {
    /// Returns the next connection whose handshake completed,
    /// accepting further TCP connections in the meantime.
    pub async fn accept_tls(&mut self) -> Result<TlsConn> {
        loop {
            tokio::select! {
                conn = self.listener.accept_tcp() => {
                    let acceptor = self.acceptor.clone();
                    let tx       = self.tx.clone();
                    let conn     = conn?;

                    tokio::spawn(async move {
                        if let Some(conn) = handshake(acceptor, conn).await {
                            tx.send(conn).await.ok();
                        }
                    });
                }
                Some(conn) = self.rx.recv() => return Ok(conn),
            }
        }
    }

    pub fn local_addr(&self) -> &NetAddr {
        self.listener.local_addr()
    }
}

async fn handshake(acceptor: TlsAcceptor, conn: TcpConn) -> Option<TlsConn> {
    let (local, peer) = conn.addrs();
    let stream = conn.into_stream();

    match timeout(HANDSHAKE_TIMEOUT, acceptor.accept(stream)).await {
        Ok(Ok(stream)) => Some(TlsConn::new(stream.into(), local, peer)),
        Ok(Err(e)) => {
            debug!("handshake with {} failed: {}", peer, e);
            None
        }
        Err(_) => {
            debug!("handshake with {} timed out", peer);
            None
        }
    }
}

#[async_trait]
impl Listener for TlsListener {
    async fn accept(&mut self) -> Result<Box<dyn Conn>> {
        Ok(Box::new(self.accept_tls().await?))
    }

    async fn close(&mut self) -> Result<()> {
        self.rx.close();
        Listener::close(&mut self.listener).await
    }

    fn addr(&self) -> &NetAddr {
        self.listener.addr()
    }
}
