use std::future::Future;
use std::sync::Arc;
use futures::future;
use tokio::sync::{mpsc, oneshot, Semaphore};
use tracing::{debug, debug_span, info, warn, Instrument};
use crate::conn::{Conn, Listener};
use crate::error::{Error, Result};
use crate::tcp;
use crate::tls::{self, TlsConfig};
use super::message::Headers;
use super::mux::ServeMux;
use super::wire;
use super::{status_text, STATUS_OK};

/// Writes one response to one connection.
///
/// The head commits on the first call to [`write_header`] or
/// [`write`], whichever comes first, and only once. Body writes
/// stream straight to the connection.
///
/// [`write_header`]: ResponseWriter::write_header
/// [`write`]: ResponseWriter::write
pub struct ResponseWriter {
    conn:      Option<Box<dyn Conn>>,
    reclaim:   Option<oneshot::Sender<Box<dyn Conn>>>,
    headers:   Headers,
    committed: bool,
}

/// Serves HTTP connections from a bound address, dispatching each
/// request through a [`ServeMux`].
pub struct Server {
    addr:  String,
    mux:   Arc<ServeMux>,
    tls:   Option<TlsConfig>,
    limit: Option<usize>,
}

impl ResponseWriter {
    pub(crate) fn new(conn: Box<dyn Conn>) -> (Self, oneshot::Receiver<Box<dyn Conn>>) {
        let (tx, rx) = oneshot::channel();

        let writer = Self {
            conn:      Some(conn),
            reclaim:   Some(tx),
            headers:   Headers::new(),
            committed: false,
        };

        (writer, rx)
    }

    /// Response headers to send. Changes made after the head commits
    /// are not sent.
    pub fn headers(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Commits the status line and headers. Calls after the first
    /// have no effect.
    pub async fn write_header(&mut self, code: u16) -> Result<()> {
        if self.committed {
            return Ok(());
        }
        self.committed = true;

        let mut head = format!("HTTP/1.1 {} {}\r\n", code, status_text(code));
        for (name, value) in self.headers.iter() {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");

        self.send(head.as_bytes()).await
    }

    /// Writes body data, committing the head with status 200 first
    /// when it is not committed yet.
    pub async fn write(&mut self, data: &[u8]) -> Result<usize> {
        if !self.committed {
            self.write_header(STATUS_OK).await?;
        }
        self.send(data).await?;
        Ok(data.len())
    }

    async fn send(&mut self, mut data: &[u8]) -> Result<()> {
        let conn = self.conn.as_mut().ok_or_else(Error::closed)?;
        while !data.is_empty() {
            let n = conn.write(data).await?;
            data = &data[n..];
        }
        Ok(())
    }
}

impl Drop for ResponseWriter {
    fn drop(&mut self) {
        if let (Some(conn), Some(tx)) = (self.conn.take(), self.reclaim.take()) {
            tx.send(conn).ok();
        }
    }
}

impl Server {
    pub fn new(addr: impl Into<String>, mux: ServeMux) -> Self {
        Self {
            addr:  addr.into(),
            mux:   Arc::new(mux),
            tls:   None,
            limit: None,
        }
    }

    /// Serves TLS with the given certificate configuration.
    pub fn with_tls(mut self, config: TlsConfig) -> Self {
        self.tls = Some(config);
        self
    }

    /// Caps how many connections are served at once. At the cap,
    /// accepting waits until a connection finishes.
    pub fn with_connection_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Binds the configured address and serves until the listener
    /// fails.
    pub async fn listen_and_serve(self) -> Result<()> {
        self.serve_until(future::pending()).await
    }

    /// Binds the configured address and serves until shutdown
    /// resolves, then stops accepting and waits for connections
    /// already being served to finish.
    pub async fn serve_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener.
    pub async fn serve<F>(self, mut listener: Box<dyn Listener>, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        info!("serving http on {}", listener.addr());

        let semaphore = self.limit.map(|n| Arc::new(Semaphore::new(n)));
        let (guard, mut done) = mpsc::channel::<()>(1);

        tokio::pin!(shutdown);

        loop {
            let permit = match &semaphore {
                Some(semaphore) => {
                    let semaphore = Arc::clone(semaphore);
                    tokio::select! {
                        permit = semaphore.acquire_owned() => permit.ok(),
                        _      = &mut shutdown             => break,
                    }
                }
                None => None,
            };

            let conn = tokio::select! {
                conn = listener.accept() => conn,
                _    = &mut shutdown     => break,
            };

            let conn = match conn {
                Ok(conn) => conn,
                Err(e)   => {
                    warn!("accept failed: {}", e);
                    continue;
                }
            };

            let mux   = Arc::clone(&self.mux);
            let guard = guard.clone();
            let peer  = *conn.remote_addr();
            let span  = debug_span!("conn", %peer);

            tokio::spawn(async move {
                match handle(conn, mux).await {
                    Ok(()) => debug!("connection done"),
                    Err(e) => debug!("connection failed: {}", e),
                }
                drop(permit);
                drop(guard);
            }.instrument(span));
        }

        listener.close().await.ok();

        drop(guard);
        let _ = done.recv().await;

        info!("http server stopped");

        Ok(())
    }

    async fn bind(&self) -> Result<Box<dyn Listener>> {
        Ok(match &self.tls {
            Some(config) => Box::new(tls::listen(&self.addr, config).await?),
            None         => Box::new(tcp::listen(&self.addr).await?),
        })
    }
}

async fn handle(mut conn: Box<dyn Conn>, mux: Arc<ServeMux>) -> Result<()> {
    let mut request = wire::read_request(conn.as_mut()).await?;
    request.remote_addr = Some(*conn.remote_addr());

    debug!("{} {}", request.method, request.path);

    let (writer, reclaim) = ResponseWriter::new(conn);
    mux.serve(writer, request).await;

    if let Ok(mut conn) = reclaim.await {
        conn.close().await.ok();
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use anyhow::Result;
    use tokio_test::block_on;
    use crate::http::test::Pipe;
    use super::*;

    #[test]
    fn head_commits_once() -> Result<()> {
        block_on(async {
            let (near, far) = Pipe::pair();
            let (mut writer, reclaim) = ResponseWriter::new(Box::new(near));

            writer.write_header(201).await?;
            writer.write_header(500).await?;
            writer.write(b"made it").await?;
            drop(writer);
            drop(reclaim);

            let raw = drain(far).await;
            assert!(raw.starts_with("HTTP/1.1 201 Created\r\n"));
            assert!(raw.ends_with("\r\n\r\nmade it"));
            assert!(!raw.contains("500"));

            Ok(())
        })
    }

    #[test]
    fn body_write_commits_200() -> Result<()> {
        block_on(async {
            let (near, far) = Pipe::pair();
            let (mut writer, reclaim) = ResponseWriter::new(Box::new(near));

            writer.headers().set("Server", "demo");
            writer.headers().set("Content-Type", "text/plain");
            writer.write(b"ok").await?;
            drop(writer);
            drop(reclaim);

            let raw = drain(far).await;
            assert!(raw.starts_with("HTTP/1.1 200 OK\r\n"));
            assert!(raw.contains("content-type: text/plain\r\n"));
            assert!(raw.contains("server: demo\r\n"));

            let content = raw.find("content-type").unwrap();
            let server  = raw.find("server").unwrap();
            assert!(content < server);

            Ok(())
        })
    }

    #[test]
    fn late_headers_are_not_sent() -> Result<()> {
        block_on(async {
            let (near, far) = Pipe::pair();
            let (mut writer, reclaim) = ResponseWriter::new(Box::new(near));

            writer.write(b"x").await?;
            writer.headers().set("Late", "1");
            writer.write(b"y").await?;
            drop(writer);
            drop(reclaim);

            let raw = drain(far).await;
            assert!(!raw.contains("late"));
            assert!(raw.ends_with("\r\n\r\nxy"));

            Ok(())
        })
    }

    async fn drain(mut conn: Pipe) -> String {
        let mut raw = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            match conn.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => raw.extend_from_slice(&buf[..n]),
            }
        }
        String::from_utf8_lossy(&raw).into_owned()
    }
}
