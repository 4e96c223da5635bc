use std::convert::TryFrom;
use std::net::IpAddr;
use std::sync::Arc;
use async_trait::async_trait;
use rustls::{ClientConfig, RootCertStore, ServerName};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_rustls::{TlsConnector, TlsStream};
use tracing::debug;
use crate::addr::{split_host_port, NetAddr};
use crate::conn::{deadline, Conn};
use crate::error::{Error, ErrorKind, Result};
use crate::tcp;
use super::store;
use super::verify::InsecureVerifier;
use super::TlsConfig;

/// An established TLS session over a TCP connection.
pub struct TlsConn {
    stream: TlsStream<TcpStream>,
    local:  NetAddr,
    peer:   NetAddr,
    read_deadline:  Option<Instant>,
    write_deadline: Option<Instant>,
    closed: bool,
}

/// Opens a TCP connection to addr and negotiates TLS over it. The
/// host portion of addr doubles as the name presented for SNI and
/// checked against the server certificate. An IP-literal host only
/// verifies against certificates carrying a matching IP identity.
pub async fn dial(addr: &str, config: &TlsConfig) -> Result<TlsConn> {
    let connector = connector(config)?;

    let (host, _) = split_host_port(addr)?;
    let name = match host.parse::<IpAddr>() {
        Ok(ip) => ServerName::IpAddress(ip),
        Err(_) => ServerName::try_from(host).map_err(|_| {
            Error::new(ErrorKind::Tls, format!("invalid server name: {}", host))
        })?,
    };

    let conn = tcp::dial(addr).await?;
    let (local, peer) = conn.addrs();

    let stream = connector.connect(name, conn.into_stream()).await.map_err(|e| {
        Error::with_cause(ErrorKind::Tls, format!("handshake failed: {}", e), e)
    })?;

    debug!("tls session established with {}", peer);

    Ok(TlsConn::new(stream.into(), local, peer))
}

fn connector(config: &TlsConfig) -> Result<TlsConnector> {
    let roots = match config.insecure_skip_verify {
        true  => RootCertStore::empty(),
        false => store::roots(config)?,
    };

    let builder = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots);

    let mut client = match (&config.cert_file, &config.key_file) {
        (Some(cert), Some(key)) => {
            let certs = store::certs(cert)?;
            let key   = store::key(key)?;
            builder.with_single_cert(certs, key)?
        }
        _ => builder.with_no_client_auth(),
    };

    if config.insecure_skip_verify {
        client.dangerous().set_certificate_verifier(Arc::new(InsecureVerifier));
    }

    Ok(TlsConnector::from(Arc::new(client)))
}

impl TlsConn {
    pub(crate) fn new(stream: TlsStream<TcpStream>, local: NetAddr, peer: NetAddr) -> Self {
        Self {
            stream,
            local,
            peer,
            read_deadline:  None,
            write_deadline: None,
            closed:         false,
        }
    }
}

#[async_trait]
impl Conn for TlsConn {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.closed {
            return Err(Error::closed());
        }
        deadline(self.read_deadline, self.stream.read(buf)).await
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if self.closed {
            return Err(Error::closed());
        }
        deadline(self.write_deadline, self.stream.write(buf)).await
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.stream.shutdown().await.ok();
        }
        Ok(())
    }

    fn local_addr(&self) -> &NetAddr {
        &self.local
    }

    fn remote_addr(&self) -> &NetAddr {
        &self.peer
    }

    fn set_read_deadline(&mut self, deadline: Option<Instant>) {
        self.read_deadline = deadline;
    }

    fn set_write_deadline(&mut self, deadline: Option<Instant>) {
        self.write_deadline = deadline;
    }
}
