//! Owns one accepted connection: parses the request, invokes the
//! application, and drains its streamed response back to the socket
//! (spec §4.1).

use std::sync::Arc;

use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

use crate::error::Error;
use crate::protocol::{Application, Receiver, Sender};
use crate::scope::{AsgiVersions, HttpScope, Scope, State};
use crate::Result;

/// A single read of up to this many bytes is parsed; anything beyond it is
/// silently dropped (spec §4.1, §8 boundary behavior — a documented
/// limitation, not a bug).
const MAX_REQUEST_BYTES: usize = 10_000;

/// Converts one accepted connection into one `Application` invocation.
pub struct RequestResponseCycle {
    app: Arc<dyn Application>,
    stream: TcpStream,
    state: State,
}

impl RequestResponseCycle {
    pub fn new(app: Arc<dyn Application>, stream: TcpStream, state: State) -> Self {
        RequestResponseCycle { app, stream, state }
    }

    /// Reads up to [`MAX_REQUEST_BYTES`] in a single read, parses it,
    /// invokes the application, and returns once the application returns.
    /// Closing the socket is driven by the final `send()` call, not by this
    /// method.
    pub async fn complete(mut self) -> Result<()> {
        let mut buf = vec![0u8; MAX_REQUEST_BYTES];
        let n = self
            .stream
            .read(&mut buf)
            .await
            .map_err(Error::new_io)?;
        buf.truncate(n);
        let parsed = ParsedRequest::parse(&buf);

        let scope = Scope::Http(HttpScope {
            http_version: "1.1",
            asgi: AsgiVersions::default(),
            method: parsed.method.clone(),
            path: parsed.path.clone(),
            query_string: parsed.query_string,
            headers: parsed.headers,
            state: self.state,
        });

        let (read_half, write_half) = self.stream.into_split();
        // The body has already been fully read; the read half is no longer
        // needed but is kept alive implicitly by dropping it here, matching
        // the single-shot-read policy (spec §1 Non-goals: no body streaming
        // beyond a single read).
        drop(read_half);

        let receive = Receiver::new_http(parsed.body);
        let send = Sender::new_http(write_half, parsed.method, parsed.path);

        self.app
            .call(scope, receive, send)
            .await
            .map_err(|e| Error::new_handler(e))
    }
}

struct ParsedRequest {
    method: Bytes,
    path: Bytes,
    query_string: Bytes,
    headers: Vec<(Bytes, Bytes)>,
    body: Bytes,
}

impl ParsedRequest {
    /// Implements spec §4.1's single-shot, best-effort parsing algorithm
    /// exactly: split on `\r\n`, first line is `METHOD SP TARGET SP
    /// VERSION`, target splits at the first `?`, headers split on first
    /// `": "` with lowercased names, body begins after the first blank
    /// line. A malformed request is not rejected; missing pieces degrade to
    /// empty bytes (spec §4.1 Edge-case policy).
    fn parse(raw: &[u8]) -> ParsedRequest {
        let body_index = find(raw, b"\r\n\r\n");
        let body = match body_index {
            Some(idx) => Bytes::copy_from_slice(&raw[idx + 4..]),
            None => Bytes::new(),
        };

        let head_end = body_index.unwrap_or(raw.len());
        let head = &raw[..head_end];
        let mut lines = split_on(head, b"\r\n");

        let request_line = lines.next().unwrap_or(&[]);
        let mut parts = request_line.splitn(2, |&b| b == b' ');
        let method = parts.next().unwrap_or(&[]);
        let rest = parts.next().unwrap_or(&[]);
        // rest is "TARGET SP VERSION"; take everything up to the next space
        // as the target.
        let target = rest.splitn(2, |&b| b == b' ').next().unwrap_or(&[]);

        let (path, query_string) = match find(target, b"?") {
            Some(idx) => (&target[..idx], &target[idx + 1..]),
            None => (target, &b""[..]),
        };

        let mut headers = Vec::new();
        for line in lines {
            if line.is_empty() {
                continue;
            }
            if let Some(idx) = find(line, b": ") {
                let name = line[..idx].to_ascii_lowercase();
                let value = line[idx + 2..].to_vec();
                headers.push((Bytes::from(name), Bytes::from(value)));
            }
        }

        ParsedRequest {
            method: Bytes::copy_from_slice(method),
            path: Bytes::copy_from_slice(path),
            query_string: Bytes::copy_from_slice(query_string),
            headers,
            body,
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len().max(1))
        .position(|window| window == needle)
}

fn split_on<'a>(buf: &'a [u8], sep: &'static [u8]) -> impl Iterator<Item = &'a [u8]> {
    let mut rest = Some(buf);
    std::iter::from_fn(move || {
        let slice = rest?;
        match find(slice, sep) {
            Some(idx) => {
                let (line, remainder) = slice.split_at(idx);
                rest = Some(&remainder[sep.len()..]);
                Some(line)
            }
            None => {
                rest = None;
                Some(slice)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_method_path_and_query() {
        let raw = b"GET /search?q=hello&n=2 HTTP/1.1\r\nHost: x\r\n\r\n";
        let parsed = ParsedRequest::parse(raw);
        assert_eq!(&parsed.method[..], b"GET");
        assert_eq!(&parsed.path[..], b"/search");
        assert_eq!(&parsed.query_string[..], b"q=hello&n=2");
        assert_eq!(parsed.headers, vec![(Bytes::from_static(b"host"), Bytes::from_static(b"x"))]);
        assert_eq!(&parsed.body[..], b"");
    }

    #[test]
    fn query_string_absent_leaves_path_as_full_target() {
        let raw = b"GET /no-query HTTP/1.1\r\n\r\n";
        let parsed = ParsedRequest::parse(raw);
        assert_eq!(&parsed.path[..], b"/no-query");
        assert_eq!(&parsed.query_string[..], b"");
    }

    #[test]
    fn lowercases_header_names_but_not_values() {
        let raw = b"GET / HTTP/1.1\r\nX-Custom-Header: MixedCase\r\n\r\n";
        let parsed = ParsedRequest::parse(raw);
        assert_eq!(
            parsed.headers,
            vec![(
                Bytes::from_static(b"x-custom-header"),
                Bytes::from_static(b"MixedCase")
            )]
        );
    }

    #[test]
    fn body_present_after_blank_line() {
        let raw = b"POST /x HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
        let parsed = ParsedRequest::parse(raw);
        assert_eq!(&parsed.body[..], b"hello");
    }

    #[test]
    fn no_blank_line_means_empty_body() {
        let raw = b"GET / HTTP/1.1\r\nHost: x\r\n";
        let parsed = ParsedRequest::parse(raw);
        assert_eq!(&parsed.body[..], b"");
    }

    #[test]
    fn malformed_request_line_degrades_gracefully() {
        let raw = b"garbage\r\n\r\n";
        let parsed = ParsedRequest::parse(raw);
        assert_eq!(&parsed.method[..], b"garbage");
        assert_eq!(&parsed.path[..], b"");
    }
}
