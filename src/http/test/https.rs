use anyhow::Result;
use tempfile::tempdir;
use tokio_test::block_on;
use crate::error::ErrorKind;
use crate::http::{self, Client, Server};
use crate::tls::{self, TlsConfig};
use super::setup::{identity, routes, spawn};

#[test]
fn serves_https() -> Result<()> {
    block_on(async {
        let dir = tempdir()?;
        let (cert, key) = identity(&dir)?;

        let config = TlsConfig {
            cert_file: Some(cert.clone()),
            key_file:  Some(key),
            ..TlsConfig::default()
        };

        let listener = tls::listen("127.0.0.1:0", &config).await?;
        let (addr, stop, task) = spawn(Server::new("127.0.0.1:0", routes()), Box::new(listener));

        let url = format!("https://localhost:{}/hello", addr.port());

        let err = http::get(&url).await.err();
        assert_eq!(Some(ErrorKind::Tls), err.map(|e| e.kind()));

        let trusted = Client::with_tls(TlsConfig {
            ca_file: Some(cert),
            ..TlsConfig::default()
        });
        let response = trusted.get(&url).await?;
        assert_eq!(200, response.status_code);
        assert_eq!("hello\n", response.text());

        let insecure = Client::with_tls(TlsConfig {
            insecure_skip_verify: true,
            ..TlsConfig::default()
        });
        let url = format!("https://localhost:{}/echo", addr.port());
        let response = insecure.post(&url, "text/plain", b"tls body").await?;
        assert_eq!(200, response.status_code);
        assert_eq!("tls body", response.text());

        stop.send(()).ok();
        task.await??;

        Ok(())
    })
}
