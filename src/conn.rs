use std::fmt;
use std::future::Future;
use std::io;
use async_trait::async_trait;
use tokio::time::{timeout_at, Instant};
use crate::addr::NetAddr;
use crate::error::{Error, Result};

/// A bidirectional, ordered byte stream between two endpoints.
///
/// Deadlines are absolute points in time and apply to every subsequent
/// read or write until changed. `None` clears a deadline. A deadline
/// already in the past fails the operation immediately with a timeout.
#[async_trait]
pub trait Conn: Send {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
    async fn write(&mut self, buf: &[u8]) -> Result<usize>;
    async fn close(&mut self) -> Result<()>;

    fn local_addr(&self) -> &NetAddr;
    fn remote_addr(&self) -> &NetAddr;

    fn set_read_deadline(&mut self, deadline: Option<Instant>);
    fn set_write_deadline(&mut self, deadline: Option<Instant>);

    fn set_deadline(&mut self, deadline: Option<Instant>) {
        self.set_read_deadline(deadline);
        self.set_write_deadline(deadline);
    }
}

impl fmt::Debug for dyn Conn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Conn")
            .field("local",  self.local_addr())
            .field("remote", self.remote_addr())
            .finish()
    }
}

/// A bound endpoint that yields a new [`Conn`] per incoming connection.
#[async_trait]
pub trait Listener: Send {
    async fn accept(&mut self) -> Result<Box<dyn Conn>>;
    async fn close(&mut self) -> Result<()>;

    fn addr(&self) -> &NetAddr;
}

/// A connectionless endpoint carrying individually addressed messages.
#[async_trait]
pub trait PacketConn: Send {
    async fn read_from(&mut self, buf: &mut [u8]) -> Result<(usize, NetAddr)>;
    async fn write_to(&mut self, buf: &[u8], addr: &NetAddr) -> Result<usize>;
    async fn close(&mut self) -> Result<()>;

    fn local_addr(&self) -> &NetAddr;

    fn set_read_deadline(&mut self, deadline: Option<Instant>);
    fn set_write_deadline(&mut self, deadline: Option<Instant>);

    fn set_deadline(&mut self, deadline: Option<Instant>) {
        self.set_read_deadline(deadline);
        self.set_write_deadline(deadline);
    }
}

/// Awaits future under an optional absolute deadline.
pub(crate) async fn deadline<F, T>(deadline: Option<Instant>, future: F) -> Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match deadline {
        Some(deadline) if deadline <= Instant::now() => Err(Error::timeout()),
        Some(deadline) => match timeout_at(deadline, future).await {
            Ok(result) => Ok(result?),
            Err(_)     => Err(Error::timeout()),
        },
        None => Ok(future.await?),
    }
}
