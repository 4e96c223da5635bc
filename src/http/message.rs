use std::borrow::Cow;
use std::collections::BTreeMap;
use crate::addr::NetAddr;

/// Header map with case-insensitive names.
///
/// Names are trimmed and lowercased on insert and iteration runs in
/// sorted name order, so serialized heads come out deterministic.
#[derive(Clone, Debug, Default)]
pub struct Headers(BTreeMap<String, String>);

/// An HTTP request, as received by a server handler or about to be
/// sent by the client.
#[derive(Clone, Debug, Default)]
pub struct Request {
    pub method:  String,
    pub path:    String,
    pub proto:   String,
    pub headers: Headers,
    pub body:    Vec<u8>,
    pub remote_addr: Option<NetAddr>,
}

/// An HTTP response, as returned by the client.
#[derive(Clone, Debug, Default)]
pub struct Response {
    pub proto:       String,
    pub status_code: u16,
    pub status:      String,
    pub headers:     Headers,
    pub body:        Vec<u8>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a header, replacing any previous value for the name.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(canonical(name), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&canonical(name)).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&canonical(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Request {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// The body decoded as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

impl Response {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// The body decoded as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

fn canonical(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
