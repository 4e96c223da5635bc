use std::os::unix::io::AsRawFd;
use async_trait::async_trait;
use nix::sys::socket::{shutdown, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpSocket, TcpStream};
use tokio::time::Instant;
use tracing::debug;
use crate::addr::{resolve, Net, NetAddr};
use crate::conn::{deadline, Conn, Listener};
use crate::error::{Error, Result};

const BACKLOG: u32 = 128;

/// An open TCP connection.
pub struct TcpConn {
    stream: TcpStream,
    local:  NetAddr,
    peer:   NetAddr,
    read_deadline:  Option<Instant>,
    write_deadline: Option<Instant>,
    closed: bool,
}

/// A bound TCP socket accepting incoming connections.
pub struct TcpListener {
    listener: Option<tokio::net::TcpListener>,
    local:    NetAddr,
}

/// Opens a TCP connection to addr.
pub async fn dial(addr: &str) -> Result<TcpConn> {
    let peer = resolve(Net::Tcp, addr).await?;

    let socket = TcpSocket::new_v4()?;
    let stream = socket.connect(peer.socket_addr()).await?;
    let local  = NetAddr::new(Net::Tcp, stream.local_addr()?);

    debug!("connected to {}", peer);

    Ok(TcpConn::new(stream, local, peer))
}

/// Binds a listening TCP socket on addr. An empty host or a port of 0
/// delegate the choice of interface or port to the operating system.
pub async fn listen(addr: &str) -> Result<TcpListener> {
    let addr = resolve(Net::Tcp, addr).await?;

    let socket = TcpSocket::new_v4()?;
    socket.set_reuseaddr(true)?;
    socket.bind(addr.socket_addr())?;

    let listener = socket.listen(BACKLOG)?;
    let local    = NetAddr::new(Net::Tcp, listener.local_addr()?);

    debug!("listening on {}", local);

    Ok(TcpListener {
        listener: Some(listener),
        local,
    })
}

impl TcpConn {
    pub(crate) fn new(stream: TcpStream, local: NetAddr, peer: NetAddr) -> Self {
        Self {
            stream,
            local,
            peer,
            read_deadline:  None,
            write_deadline: None,
            closed: false,
        }
    }

    /// Shuts down the read direction. Writes remain open; further
    /// reads observe end of stream.
    pub fn close_read(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::closed());
        }
        shutdown(self.stream.as_raw_fd(), Shutdown::Read)?;
        Ok(())
    }

    /// Shuts down the write direction, signalling end of stream to the
    /// peer. Reads remain open.
    pub async fn close_write(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::closed());
        }
        self.stream.shutdown().await?;
        Ok(())
    }

    /// Consumes the connection and surrenders the underlying stream
    /// without closing it. The caller becomes responsible for shutting
    /// the stream down.
    pub fn into_stream(self) -> TcpStream {
        self.stream
    }

    pub(crate) fn addrs(&self) -> (NetAddr, NetAddr) {
        (self.local, self.peer)
    }
}

#[async_trait]
impl Conn for TcpConn {
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

impl TcpListener {
    /// Accepts the next incoming connection as a concrete [`TcpConn`].
    pub async fn accept_tcp(&self) -> Result<TcpConn> {
        let listener = self.listener.as_ref().ok_or_else(Error::closed)?;

        let (stream, peer) = listener.accept().await?;
        let peer = NetAddr::new(Net::Tcp, peer);

        debug!("accepted connection from {}", peer);

        Ok(TcpConn::new(stream, self.local, peer))
    }

    pub fn local_addr(&self) -> &NetAddr {
        &self.local
    }
}

#[async_trait]
impl Listener for TcpListener {
    async fn accept(&mut self) -> Result<Box<dyn Conn>> {
        Ok(Box::new(self.accept_tcp().await?))
    }

    async fn close(&mut self) -> Result<()> {
        self.listener.take();
        Ok(())
    }

    fn addr(&self) -> &NetAddr {
        &self.local
    }
}
