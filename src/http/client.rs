use std::str::FromStr;
use tracing::debug;
use crate::conn::Conn;
use crate::error::{Error, ErrorKind, Result};
use crate::tcp;
use crate::tls::{self, TlsConfig};
use super::message::Response;
use super::wire;

/// A minimal HTTP/1.1 client.
///
/// Every request opens a fresh connection, sends `Connection: close`,
/// and reads the response until the server hangs up.
#[derive(Clone, Debug, Default)]
pub struct Client {
    tls: TlsConfig,
}

/// Fetches a URL with a default client.
pub async fn get(url: &str) -> Result<Response> {
    Client::new().get(url).await
}

/// Posts a body to a URL with a default client.
pub async fn post(url: &str, content_type: &str, body: &[u8]) -> Result<Response> {
    Client::new().post(url, content_type, body).await
}

impl Client {
    pub fn new() -> Self {
        Self::default()
    }

    /// A client that dials https URLs with the given TLS settings.
    pub fn with_tls(tls: TlsConfig) -> Self {
        Self { tls }
    }

    pub async fn get(&self, url: &str) -> Result<Response> {
        let url = Url::parse(url)?;

        let mut head = format!("GET {} HTTP/1.1\r\n", url.path);
        head.push_str(&format!("Host: {}\r\n", url.address));
        head.push_str("Connection: close\r\n");
        head.push_str("\r\n");

        self.roundtrip(&url, head.as_bytes(), &[]).await
    }

    pub async fn post(&self, url: &str, content_type: &str, body: &[u8]) -> Result<Response> {
        let url = Url::parse(url)?;

        let mut head = format!("POST {} HTTP/1.1\r\n", url.path);
        head.push_str(&format!("Host: {}\r\n", url.address));
        head.push_str(&format!("Content-Type: {}\r\n", content_type));
        head.push_str(&format!("Content-Length: {}\r\n", body.len()));
        head.push_str("Connection: close\r\n");
        head.push_str("\r\n");

        self.roundtrip(&url, head.as_bytes(), body).await
    }

    async fn roundtrip(&self, url: &Url, head: &[u8], body: &[u8]) -> Result<Response> {
        let mut conn = self.connect(url).await?;

        send(conn.as_mut(), head).await?;
        send(conn.as_mut(), body).await?;

        let raw = drain(conn.as_mut()).await;
        conn.close().await.ok();

        wire::parse_response(&raw)
    }

    async fn connect(&self, url: &Url) -> Result<Box<dyn Conn>> {
        Ok(match url.scheme {
            Scheme::Http  => Box::new(tcp::dial(&url.address).await?),
            Scheme::Https => Box::new(tls::dial(&url.address, &self.tls).await?),
        })
    }
}

#[derive(Debug, Eq, PartialEq)]
struct Url {
    scheme:  Scheme,
    address: String,
    path:    String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Scheme {
    Http,
    Https,
}

impl Url {
    /// Splits a URL into scheme, host:port address, and path. The
    /// scheme's default port is appended when the URL names none.
    fn parse(url: &str) -> Result<Self> {
        let (scheme, rest) = url.split_once("://").ok_or_else(|| {
            Error::new(ErrorKind::InvalidAddr, format!("invalid url: {}", url))
        })?;
        let scheme = scheme.parse::<Scheme>()?;

        let (address, path) = match rest.find('/') {
            Some(index) => (&rest[..index], &rest[index..]),
            None        => (rest, "/"),
        };

        let address = match address.contains(':') {
            true  => address.to_owned(),
            false => format!("{}:{}", address, scheme.default_port()),
        };

        Ok(Self {
            scheme,
            address,
            path: path.to_owned(),
        })
    }
}

impl Scheme {
    fn default_port(&self) -> u16 {
        match self {
            Self::Http  => 80,
            Self::Https => 443,
        }
    }
}

impl FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http"  => Ok(Self::Http),
            "https" => Ok(Self::Https),
            _       => Err(Error::new(ErrorKind::InvalidAddr, format!("unsupported scheme: {}", s))),
        }
    }
}

async fn send(conn: &mut dyn Conn, mut data: &[u8]) -> Result<()> {
    while !data.is_empty() {
        let n = conn.write(data).await?;
        data = &data[n..];
    }
    Ok(())
}

async fn drain(conn: &mut dyn Conn) -> Vec<u8> {
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match conn.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => raw.extend_from_slice(&buf[..n]),
            Err(e) => {
                debug!("response read stopped: {}", e);
                break;
            }
        }
    }
    raw
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn url_scheme() {
        let url = Url::parse("http://example.com/x").unwrap();
        assert_eq!(Scheme::Http, url.scheme);

        let url = Url::parse("https://example.com/x").unwrap();
        assert_eq!(Scheme::Https, url.scheme);

        assert!(Url::parse("ftp://example.com/").is_err());
        assert!(Url::parse("example.com/x").is_err());
    }

    #[test]
    fn url_address_gets_default_port() {
        let url = Url::parse("http://example.com/x").unwrap();
        assert_eq!("example.com:80", url.address);

        let url = Url::parse("https://example.com").unwrap();
        assert_eq!("example.com:443", url.address);

        let url = Url::parse("http://example.com:8080/x").unwrap();
        assert_eq!("example.com:8080", url.address);
    }

    #[test]
    fn url_path_defaults_to_root() {
        let url = Url::parse("http://example.com").unwrap();
        assert_eq!("/", url.path);

        let url = Url::parse("http://example.com/a/b?q=1").unwrap();
        assert_eq!("/a/b?q=1", url.path);
    }
}
