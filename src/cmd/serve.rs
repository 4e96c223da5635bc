use anyhow::Result;
use clap::{value_t, ArgMatches};
use tokio::signal;
use tracing::info;
use crate::http::{ServeMux, Server};
use crate::tls::TlsConfig;

/// Serves a small demo site until interrupted. With --cert and --key
/// the same site is served over TLS.
pub async fn serve(args: &ArgMatches<'_>) -> Result<()> {
    let addr = value_t!(args, "addr", String)?;
    let cert = args.value_of("cert");
    let key  = args.value_of("key");

    let mut mux = ServeMux::new();

    mux.handle("/", |mut w, _| async move {
        w.headers().set("Content-Type", "text/plain");
        w.write(b"netkit demo server\n").await.ok();
    });

    mux.handle("/hello", |mut w, _| async move {
        w.headers().set("Content-Type", "text/plain");
        w.write(b"Hello from netkit!\n").await.ok();
    });

    mux.handle("/echo", |mut w, r| async move {
        match r.method.as_str() {
            "POST" => {
                if let Some(value) = r.header("content-type") {
                    w.headers().set("Content-Type", value);
                }
                w.write(&r.body).await.ok();
            }
            _ => {
                w.write(b"send a POST to have the body echoed\n").await.ok();
            }
        }
    });

    mux.handle("/info", |mut w, r| async move {
        w.headers().set("Content-Type", "text/plain");

        let mut text = format!("{} {} {}\n", r.method, r.path, r.proto);
        if let Some(addr) = r.remote_addr {
            text.push_str(&format!("remote: {}\n", addr));
        }
        for (name, value) in r.headers.iter() {
            text.push_str(&format!("{}: {}\n", name, value));
        }

        w.write(text.as_bytes()).await.ok();
    });

    let mut server = Server::new(addr, mux);

    if let (Some(cert), Some(key)) = (cert, key) {
        server = server.with_tls(TlsConfig {
            cert_file: Some(cert.into()),
            key_file:  Some(key.into()),
            ..TlsConfig::default()
        });
    }

    server.serve_until(async {
        signal::ctrl_c().await.ok();
        info!("interrupt received, shutting down");
    }).await?;

    Ok(())
}
