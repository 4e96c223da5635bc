use bytes::BytesMut;
use crate::conn::Conn;
use crate::error::{Error, Result};
use super::message::{Headers, Request, Response};

pub(crate) const MAX_HEAD_BYTES: usize = 1024 * 1024;
pub(crate) const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Reads one request off the connection: the head up to the blank
/// line, then as much body as content-length promises. Bodies beyond
/// the declared length are dropped.
pub(crate) async fn read_request(conn: &mut dyn Conn) -> Result<Request> {
    let mut buf   = BytesMut::with_capacity(4096);
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        match conn.read(&mut chunk).await? {
            0 => return Err(Error::protocol("truncated request head")),
            n => {
                let from = buf.len().saturating_sub(3);
                buf.extend_from_slice(&chunk[..n]);
                if let Some(index) = find_head_end(&buf, from) {
                    break index;
                }
                if buf.len() > MAX_HEAD_BYTES {
                    return Err(Error::protocol("request head too large"));
                }
            }
        }
    };

    let body = buf.split_off(head_end + 4);
    let mut request = parse_request(&buf[..head_end])?;

    let length = content_length(&request.headers)?;
    request.body = read_body(conn, body, length).await?;

    Ok(request)
}

/// Parses a request head, excluding the blank-line terminator.
pub(crate) fn parse_request(head: &[u8]) -> Result<Request> {
    let text = String::from_utf8_lossy(head);
    let mut lines = lines(&text);

    let line = lines.next().unwrap_or("");
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap_or("").to_owned();
    let path   = parts.next().unwrap_or("").to_owned();
    let proto  = parts.next().unwrap_or("").to_owned();

    if method.is_empty() || path.is_empty() {
        return Err(Error::protocol("invalid request line"));
    }

    let headers = parse_headers(lines);

    Ok(Request { method, path, proto, headers, ..Request::default() })
}

/// Parses a complete response, head and close-delimited body.
pub(crate) fn parse_response(raw: &[u8]) -> Result<Response> {
    let (head_end, body_start) = match find_head_end(raw, 0) {
        Some(index) => (index, index + 4),
        None        => (raw.len(), raw.len()),
    };

    let text = String::from_utf8_lossy(&raw[..head_end]);
    let mut lines = lines(&text);

    let line = lines.next().unwrap_or("");
    let mut parts = line.splitn(3, ' ');
    let proto  = parts.next().unwrap_or("").to_owned();
    let code   = parts.next().unwrap_or("");
    let status = parts.next().unwrap_or("").trim().to_owned();

    let status_code = match code.parse::<u16>() {
        Ok(code) => code,
        Err(_)   => return Err(Error::protocol("invalid status line")),
    };

    let headers = parse_headers(lines);
    let body    = raw[body_start..].to_vec();

    Ok(Response { proto, status_code, status, headers, body })
}

pub(crate) fn content_length(headers: &Headers) -> Result<Option<usize>> {
    match headers.get("content-length") {
        Some(value) => match value.parse::<usize>() {
            Ok(length) => Ok(Some(length)),
            Err(_)     => Err(Error::protocol("invalid content-length")),
        },
        None => Ok(None),
    }
}

async fn read_body(conn: &mut dyn Conn, mut body: BytesMut, length: Option<usize>) -> Result<Vec<u8>> {
    let length = match length {
        Some(length) if length > MAX_BODY_BYTES => {
            return Err(Error::protocol("request body too large"));
        }
        Some(length) => length,
        None         => return Ok(body.to_vec()),
    };

    let mut chunk = [0u8; 4096];
    while body.len() < length {
        match conn.read(&mut chunk).await? {
            0 => return Err(Error::protocol("truncated request body")),
            n => body.extend_from_slice(&chunk[..n]),
        }
    }

    body.truncate(length);

    Ok(body.to_vec())
}

/// Splits head text into lines, tolerating bare newlines.
fn lines<'a>(text: &'a str) -> impl Iterator<Item = &'a str> {
    text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line))
}

fn parse_headers<'a>(lines: impl Iterator<Item = &'a str>) -> Headers {
    let mut headers = Headers::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.set(name, value.trim());
        }
    }
    headers
}

fn find_head_end(buf: &[u8], from: usize) -> Option<usize> {
    let tail = &buf[from..];
    tail.windows(4).position(|w| w == b"\r\n\r\n").map(|i| from + i)
}
