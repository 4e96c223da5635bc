use anyhow::Result;
use clap::{value_t, ArgMatches};
use tracing::{debug, info};
use crate::conn::{Conn, PacketConn};
use crate::{tcp, udp};

/// Echoes bytes back to every peer, over TCP or UDP.
pub async fn echo(args: &ArgMatches<'_>) -> Result<()> {
    let addr = value_t!(args, "addr", String)?;

    match args.is_present("udp") {
        true  => datagrams(&addr).await,
        false => streams(&addr).await,
    }
}

async fn streams(addr: &str) -> Result<()> {
    let listener = tcp::listen(addr).await?;
    info!("echoing tcp on {}", listener.local_addr());

    loop {
        let mut conn = listener.accept_tcp().await?;
        tokio::spawn(async move {
            let peer = *conn.remote_addr();
            let mut buf = [0u8; 2048];
            loop {
                match conn.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if conn.write(&buf[..n]).await.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!("connection from {} done", peer);
        });
    }
}

async fn datagrams(addr: &str) -> Result<()> {
    let mut conn = udp::listen(addr).await?;
    info!("echoing udp on {}", conn.local_addr());

    let mut buf = [0u8; 2048];
    loop {
        let (n, sender) = conn.read_from(&mut buf).await?;
        conn.write_to(&buf[..n], &sender).await?;
    }
}
