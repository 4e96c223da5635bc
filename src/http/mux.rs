use std::collections::BTreeMap;
use std::future::Future;
use futures::future::BoxFuture;
use super::message::Request;
use super::server::ResponseWriter;
use super::STATUS_NOT_FOUND;

pub type Handler = Box<dyn Fn(ResponseWriter, Request) -> BoxFuture<'static, ()> + Send + Sync>;

/// Routes requests to handlers by path pattern.
///
/// Lookup prefers an exact match, then the longest registered
/// pattern that prefixes the request path. Requests that match
/// nothing get a plain 404.
#[derive(Default)]
pub struct ServeMux {
    handlers: BTreeMap<String, Handler>,
}

impl ServeMux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for a pattern, replacing any previous one
    /// registered for the same pattern.
    pub fn handle<H, F>(&mut self, pattern: &str, handler: H)
    where
        H: Fn(ResponseWriter, Request) -> F + Send + Sync + 'static,
        F: Future<Output = ()> + Send + 'static,
    {
        let handler = Box::new(move |w, r| -> BoxFuture<'static, ()> {
            Box::pin(handler(w, r))
        });
        self.handlers.insert(pattern.to_owned(), handler);
    }

    pub(crate) async fn serve(&self, mut w: ResponseWriter, r: Request) {
        match self.lookup(&r.path) {
            Some(handler) => handler(w, r).await,
            None => {
                w.write_header(STATUS_NOT_FOUND).await.ok();
                w.write(b"404 page not found\n").await.ok();
            }
        }
    }

    fn lookup(&self, path: &str) -> Option<&Handler> {
        if let Some(handler) = self.handlers.get(path) {
            return Some(handler);
        }
        self.handlers.iter()
            .filter(|(pattern, _)| path.starts_with(pattern.as_str()))
            .max_by_key(|(pattern, _)| pattern.len())
            .map(|(_, handler)| handler)
    }
}

#[cfg(test)]
mod test {
    use anyhow::Result;
    use tokio_test::block_on;
    use crate::conn::Conn;
    use crate::http::test::Pipe;
    use crate::http::wire;
    use super::*;

    #[test]
    fn routes_by_longest_prefix() -> Result<()> {
        block_on(async {
            let mut mux = ServeMux::new();
            mux.handle("/",          |mut w, _| async move { w.write(b"root").await.ok(); });
            mux.handle("/static/",   |mut w, _| async move { w.write(b"static").await.ok(); });
            mux.handle("/static/js", |mut w, _| async move { w.write(b"js").await.ok(); });

            assert_eq!("root",   body(&mux, "/other").await?);
            assert_eq!("static", body(&mux, "/static/").await?);
            assert_eq!("static", body(&mux, "/static/css/site.css").await?);
            assert_eq!("js",     body(&mux, "/static/js/app.js").await?);

            Ok(())
        })
    }

    #[test]
    fn unmatched_paths_get_404() -> Result<()> {
        block_on(async {
            let mut mux = ServeMux::new();
            mux.handle("/hello", |mut w, _| async move { w.write(b"hi").await.ok(); });

            let response = response(&mux, "/missing").await?;
            assert_eq!(404, response.status_code);
            assert_eq!("404 page not found\n", response.text());

            Ok(())
        })
    }

    #[test]
    fn registration_replaces() -> Result<()> {
        block_on(async {
            let mut mux = ServeMux::new();
            mux.handle("/x", |mut w, _| async move { w.write(b"one").await.ok(); });
            mux.handle("/x", |mut w, _| async move { w.write(b"two").await.ok(); });

            assert_eq!("two", body(&mux, "/x").await?);

            Ok(())
        })
    }

    async fn body(mux: &ServeMux, path: &str) -> Result<String> {
        let response = response(mux, path).await?;
        Ok(response.text().into_owned())
    }

    async fn response(mux: &ServeMux, path: &str) -> Result<crate::http::Response> {
        let (near, mut far) = Pipe::pair();
        let (writer, reclaim) = ResponseWriter::new(Box::new(near));

        let request = Request {
            method: "GET".to_owned(),
            path:   path.to_owned(),
            ..Request::default()
        };

        mux.serve(writer, request).await;
        drop(reclaim);

        let mut raw = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            match far.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => raw.extend_from_slice(&buf[..n]),
            }
        }

        Ok(wire::parse_response(&raw)?)
    }
}
