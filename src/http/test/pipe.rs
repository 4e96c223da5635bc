use std::net::SocketAddr;
use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::time::Instant;
use crate::addr::{Net, NetAddr};
use crate::conn::Conn;
use crate::error::Result;

/// In-memory connection for exercising protocol code without
/// sockets.
pub(crate) struct Pipe {
    stream: DuplexStream,
    local:  NetAddr,
    peer:   NetAddr,
}

impl Pipe {
    pub(crate) fn pair() -> (Pipe, Pipe) {
        let (near, far) = tokio::io::duplex(64 * 1024);
        (Pipe::new(near), Pipe::new(far))
    }

    fn new(stream: DuplexStream) -> Self {
        let addr = "127.0.0.1:0".parse::<SocketAddr>().unwrap();
        let addr = NetAddr::new(Net::Tcp, addr);

        Self { stream, local: addr, peer: addr }
    }
}

#[async_trait]
impl Conn for Pipe {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.stream.read(buf).await?)
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        Ok(self.stream.write(buf).await?)
    }

    async fn close(&mut self) -> Result<()> {
        self.stream.shutdown().await.ok();
        Ok(())
    }

    fn local_addr(&self) -> &NetAddr {
        &self.local
    }

    fn remote_addr(&self) -> &NetAddr {
        &self.peer
    }

    fn set_read_deadline(&mut self, _: Option<Instant>) {}

    fn set_write_deadline(&mut self, _: Option<Instant>) {}
}
