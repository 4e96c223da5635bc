pub use client::{get, post, Client};
pub use message::{Headers, Request, Response};
pub use mux::{Handler, ServeMux};
pub use server::{ResponseWriter, Server};

use crate::error::Result;
use crate::tls::TlsConfig;

pub const STATUS_OK: u16                    = 200;
pub const STATUS_CREATED: u16               = 201;
pub const STATUS_BAD_REQUEST: u16           = 400;
pub const STATUS_NOT_FOUND: u16             = 404;
pub const STATUS_INTERNAL_SERVER_ERROR: u16 = 500;

/// Canonical reason phrase for the status codes this toolkit knows.
pub fn status_text(code: u16) -> &'static str {
    match code {
        STATUS_OK                    => "OK",
        STATUS_CREATED               => "Created",
        STATUS_BAD_REQUEST           => "Bad Request",
        STATUS_NOT_FOUND             => "Not Found",
        STATUS_INTERNAL_SERVER_ERROR => "Internal Server Error",
        _                            => "Unknown",
    }
}

/// Binds addr and serves requests routed through mux.
pub async fn listen_and_serve(addr: &str, mux: ServeMux) -> Result<()> {
    Server::new(addr, mux).listen_and_serve().await
}

/// Like [`listen_and_serve`], with TLS using the given certificate
/// and key files.
pub async fn listen_and_serve_tls(addr: &str, cert: &str, key: &str, mux: ServeMux) -> Result<()> {
    let config = TlsConfig {
        cert_file: Some(cert.into()),
        key_file:  Some(key.into()),
        ..TlsConfig::default()
    };
    Server::new(addr, mux).with_tls(config).listen_and_serve().await
}

mod client;
mod message;
mod mux;
mod server;
mod wire;

#[cfg(test)]
mod test;
