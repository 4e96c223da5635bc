pub use crate::addr::{Net, NetAddr};
pub use crate::conn::{Conn, Listener, PacketConn};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::tls::TlsConfig;

pub mod addr;
pub mod cmd;
pub mod conn;
pub mod error;
pub mod http;
pub mod tcp;
pub mod tls;
pub mod trace;
pub mod udp;

/// Opens a TCP connection to addr as a generic stream connection.
pub async fn dial(addr: &str) -> Result<Box<dyn Conn>> {
    Ok(Box::new(tcp::dial(addr).await?))
}

/// Binds a TCP listener on addr as a generic listener.
pub async fn listen(addr: &str) -> Result<Box<dyn Listener>> {
    Ok(Box::new(tcp::listen(addr).await?))
}

#[cfg(test)]
mod test {
    use anyhow::Result;
    use super::{dial, listen};

    #[test]
    fn generic_dial_and_listen() -> Result<()> {
        tokio_test::block_on(async {
            let mut listener = listen("127.0.0.1:0").await?;
            let addr = listener.addr().to_string();

            let mut conn = dial(&addr).await?;
            conn.write(b"over the trait").await?;

            let mut accepted = listener.accept().await?;
            let mut buf = [0u8; 32];
            let n = accepted.read(&mut buf).await?;
            assert_eq!(&buf[..n], b"over the trait");

            accepted.close().await?;
            conn.close().await?;
            listener.close().await?;

            Ok(())
        })
    }
}
