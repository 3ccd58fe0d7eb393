//! Wire-format capture of requests and responses
//!
//! Produces the text an HTTP/1.1 peer would see: start line, headers sorted
//! by canonical name, a blank line, then the body. Lines end with CRLF.

use bytes::{BufMut, Bytes, BytesMut};
use reqwest::header::HeaderMap;
use reqwest::{Request, StatusCode, Version};

/// Serialize an outbound request and its body
pub fn capture_request(request: &Request, body: &[u8]) -> Bytes {
    let start_line = format!("{} {} HTTP/1.1", request.method(), request.url());
    render(&start_line, request.headers(), body)
}

/// Serialize a received response
pub fn capture_response(
    version: Version,
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
) -> Bytes {
    let start_line = match status.canonical_reason() {
        Some(reason) => format!("{version:?} {} {reason}", status.as_u16()),
        None => format!("{version:?} {}", status.as_u16()),
    };
    render(&start_line, headers, body)
}

fn render(start_line: &str, headers: &HeaderMap, body: &[u8]) -> Bytes {
    let mut lines: Vec<(String, String)> = headers
        .iter()
        .map(|(name, value)| {
            (
                canonical_name(name.as_str()),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    // stable: repeated headers keep their order
    lines.sort_by(|a, b| a.0.cmp(&b.0));

    let mut buf = BytesMut::with_capacity(start_line.len() + body.len() + 64 * lines.len() + 4);
    buf.put_slice(start_line.as_bytes());
    buf.put_slice(b"\r\n");
    for (name, value) in &lines {
        buf.put_slice(name.as_bytes());
        buf.put_slice(b": ");
        buf.put_slice(value.as_bytes());
        buf.put_slice(b"\r\n");
    }
    buf.put_slice(b"\r\n");
    buf.put_slice(body);
    buf.freeze()
}

/// `content-type` -> `Content-Type`
pub fn canonical_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
