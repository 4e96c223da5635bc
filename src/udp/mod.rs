use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::debug;
use crate::addr::{resolve, Net, NetAddr};
use crate::conn::{deadline, PacketConn};
use crate::error::{Error, ErrorKind, Result};

/// A UDP endpoint.
///
/// Dialing with a remote address yields a connected socket whose read
/// and write calls talk to that peer only. Listening, or dialing
/// without a remote, yields an unconnected socket addressed per
/// message through read_from and write_to.
pub struct UdpConn {
    socket: Option<UdpSocket>,
    local:  NetAddr,
    peer:   Option<NetAddr>,
    read_deadline:  Option<Instant>,
    write_deadline: Option<Instant>,
}

/// Opens a UDP endpoint bound to local, or to an ephemeral wildcard
/// port when local is None, and connects it to remote when given.
pub async fn dial(local: Option<&str>, remote: Option<&str>) -> Result<UdpConn> {
    let addr = match local {
        Some(addr) => resolve(Net::Udp, addr).await?,
        None       => resolve(Net::Udp, ":0").await?,
    };

    let socket = UdpSocket::bind(addr.socket_addr()).await?;

    let peer = match remote {
        Some(addr) => {
            let peer = resolve(Net::Udp, addr).await?;
            socket.connect(peer.socket_addr()).await?;
            Some(peer)
        }
        None => None,
    };

    let local = NetAddr::new(Net::Udp, socket.local_addr()?);

    debug!("udp endpoint on {}", local);

    Ok(UdpConn {
        socket: Some(socket),
        local,
        peer,
        read_deadline:  None,
        write_deadline: None,
    })
}

/// Binds an unconnected UDP endpoint on addr.
pub async fn listen(addr: &str) -> Result<UdpConn> {
    dial(Some(addr), None).await
}

impl UdpConn {
    /// Receives a datagram on a connected socket.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let socket = self.socket.as_ref().ok_or_else(Error::closed)?;
        deadline(self.read_deadline, socket.recv(buf)).await
    }

    /// Sends a datagram to the connected peer.
    pub async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let socket = self.socket.as_ref().ok_or_else(Error::closed)?;
        deadline(self.write_deadline, socket.send(buf)).await
    }

    /// The connected peer, if any.
    pub fn remote_addr(&self) -> Option<&NetAddr> {
        self.peer.as_ref()
    }
}

#[async_trait]
impl PacketConn for UdpConn {
    async fn read_from(&mut self, buf: &mut [u8]) -> Result<(usize, NetAddr)> {
        let socket = self.socket.as_ref().ok_or_else(Error::closed)?;
        let (n, addr) = deadline(self.read_deadline, socket.recv_from(buf)).await?;
        Ok((n, NetAddr::new(Net::Udp, addr)))
    }

    async fn write_to(&mut self, buf: &[u8], addr: &NetAddr) -> Result<usize> {
        if addr.network() != Net::Udp {
            return Err(Error::new(ErrorKind::InvalidAddr, "not a udp address"));
        }
        let socket = self.socket.as_ref().ok_or_else(Error::closed)?;
        deadline(self.write_deadline, socket.send_to(buf, addr.socket_addr())).await
    }

    async fn close(&mut self) -> Result<()> {
        self.socket.take();
        Ok(())
    }

    fn local_addr(&self) -> &NetAddr {
        &self.local
    }

    fn set_read_deadline(&mut self, deadline: Option<Instant>) {
        self.read_deadline = deadline;
    }

    fn set_write_deadline(&mut self, deadline: Option<Instant>) {
        self.write_deadline = deadline;
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;
    use anyhow::Result;
    use tokio::time::Instant;
    use crate::addr::{Net, NetAddr};
    use crate::conn::PacketConn;
    use crate::error::ErrorKind;
    use super::{dial, listen};

    #[test]
    fn connected_round_trip() -> Result<()> {
        tokio_test::block_on(async {
            let mut server = listen("127.0.0.1:0").await?;
            let addr = server.local_addr().to_string();

            let mut client = dial(None, Some(&addr)).await?;
            assert_eq!(client.remote_addr().map(ToString::to_string), Some(addr));

            client.write(b"ping").await?;

            let mut buf = [0u8; 64];
            let (n, sender) = server.read_from(&mut buf).await?;
            assert_eq!(&buf[..n], b"ping");
            assert_eq!(sender.network(), Net::Udp);

            server.write_to(b"pong", &sender).await?;

            let n = client.read(&mut buf).await?;
            assert_eq!(&buf[..n], b"pong");

            Ok(())
        })
    }

    #[test]
    fn unconnected_tracks_senders() -> Result<()> {
        tokio_test::block_on(async {
            let mut server = listen("127.0.0.1:0").await?;
            let addr = server.local_addr().to_string();

            let mut one = dial(None, Some(&addr)).await?;
            let mut two = dial(None, Some(&addr)).await?;

            one.write(b"from one").await?;
            two.write(b"from two").await?;

            let mut buf = [0u8; 64];
            for _ in 0..2 {
                let (n, sender) = server.read_from(&mut buf).await?;
                server.write_to(&buf[..n], &sender).await?;
            }

            let n = one.read(&mut buf).await?;
            assert_eq!(&buf[..n], b"from one");
            let n = two.read(&mut buf).await?;
            assert_eq!(&buf[..n], b"from two");

            Ok(())
        })
    }

    #[test]
    fn write_to_rejects_tcp_addrs() -> Result<()> {
        tokio_test::block_on(async {
            let mut conn = listen("127.0.0.1:0").await?;

            let addr = NetAddr::new(Net::Tcp, "127.0.0.1:9".parse()?);
            let err  = conn.write_to(b"x", &addr).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidAddr);

            Ok(())
        })
    }

    #[test]
    fn close_is_idempotent() -> Result<()> {
        tokio_test::block_on(async {
            let mut conn = listen("127.0.0.1:0").await?;
            conn.close().await?;
            conn.close().await?;

            let mut buf = [0u8; 8];
            let err = conn.read_from(&mut buf).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Closed);

            Ok(())
        })
    }

    #[test]
    fn read_deadline_expires() -> Result<()> {
        tokio_test::block_on(async {
            let mut conn = listen("127.0.0.1:0").await?;
            conn.set_read_deadline(Some(Instant::now() + Duration::from_millis(20)));

            let mut buf = [0u8; 8];
            let err = conn.read_from(&mut buf).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Timeout);

            Ok(())
        })
    }
}
