//! Plain HTTP/1.1 writer for requests `ureq` refuses to build.
//!
//! `ureq` only accepts header values made of visible ASCII and tabs, and it
//! trims surrounding whitespace before writing them. Header fuzzers produce
//! exactly such values, so those requests are written byte for byte over a
//! [`TcpStream`] instead. Only `http://` targets can be reached this way.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use apifuzz_types::{Header, HttpMethod, ServiceRequest, ServiceResponse, TransportError};
use tracing::trace;
use url::Url;

use crate::http_caller::io_error;

/// Whether `ureq` sends `value` unchanged.
pub fn is_client_safe_value(value: &str) -> bool {
    value.trim() == value && value.bytes().all(|b| b == b'\t' || (0x20..0x7f).contains(&b))
}

/// Whether any header of `request` has to bypass `ureq`.
pub fn needs_raw_writer(request: &ServiceRequest) -> bool {
    request
        .headers
        .iter()
        .any(|h| !is_client_safe_value(&h.value))
}

/// Sends one request over a fresh connection and reads the whole response.
#[derive(Debug, Clone, Copy)]
pub struct RawRequestWriter {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl RawRequestWriter {
    pub fn send(
        &self,
        url: &Url,
        request: &ServiceRequest,
    ) -> Result<ServiceResponse, TransportError> {
        if url.scheme() != "http" {
            return Err(TransportError::Unsendable {
                reason: format!(
                    "raw header bytes need a plain http:// server, not {}://",
                    url.scheme()
                ),
            });
        }
        let host = url.host_str().ok_or_else(|| TransportError::InvalidRequest {
            reason: format!("no host in {}", url),
        })?;
        let port = url.port_or_known_default().unwrap_or(80);

        let mut stream = self.connect(host, port, url.as_str())?;
        trace!(url = %url, "writing raw request");
        stream
            .write_all(&encode_request(url, host, request))
            .and_then(|()| stream.flush())
            .map_err(|e| io_error(&e, url.as_str()))?;

        read_response(stream, request.method, url.as_str())
    }

    fn connect(&self, host: &str, port: u16, url: &str) -> Result<TcpStream, TransportError> {
        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|e| io_error(&e, url))?
            .collect();
        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => {
                    stream
                        .set_read_timeout(Some(self.timeout))
                        .and_then(|()| stream.set_write_timeout(Some(self.timeout)))
                        .map_err(|e| io_error(&e, url))?;
                    return Ok(stream);
                }
                Err(e) => last_error = Some(e),
            }
        }
        Err(match last_error {
            Some(e) if e.kind() != io::ErrorKind::ConnectionRefused => io_error(&e, url),
            _ => TransportError::ConnectionRefused {
                url: url.to_string(),
            },
        })
    }
}

fn encode_request(url: &Url, host: &str, request: &ServiceRequest) -> Vec<u8> {
    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }
    let authority = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    let mut head = format!("{} {} HTTP/1.1\r\nHost: {}\r\n", request.method, target, authority);
    for header in &request.headers {
        head.push_str(&header.name);
        head.push_str(": ");
        head.push_str(&header.value);
        head.push_str("\r\n");
    }
    if let Some(body) = &request.body {
        if request.header("Content-Type").is_none() {
            head.push_str(&format!("Content-Type: {}\r\n", request.content_type));
        }
        head.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    head.push_str("Connection: close\r\n\r\n");

    let mut bytes = head.into_bytes();
    if let Some(body) = &request.body {
        bytes.extend_from_slice(body.as_bytes());
    }
    bytes
}

fn read_response(
    stream: TcpStream,
    method: HttpMethod,
    url: &str,
) -> Result<ServiceResponse, TransportError> {
    let mut reader = BufReader::new(stream);
    let status_line = read_line(&mut reader, url)?;
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| TransportError::Io {
            url: url.to_string(),
            message: format!("malformed status line '{}'", status_line),
        })?;

    let mut headers = Vec::new();
    loop {
        let line = read_line(&mut reader, url)?;
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push(Header::new(name.trim(), value.trim()));
        }
    }

    let no_body = method == HttpMethod::Head || status == 204 || status == 304 || status < 200;
    let body = if no_body {
        Vec::new()
    } else if let Some(length) = header_value(&headers, "Content-Length")
        .and_then(|v| v.parse::<usize>().ok())
    {
        let mut body = vec![0u8; length];
        reader
            .read_exact(&mut body)
            .map_err(|e| io_error(&e, url))?;
        body
    } else if header_value(&headers, "Transfer-Encoding")
        .is_some_and(|v| v.eq_ignore_ascii_case("chunked"))
    {
        read_chunked(&mut reader, url)?
    } else {
        let mut body = Vec::new();
        reader
            .read_to_end(&mut body)
            .map_err(|e| io_error(&e, url))?;
        body
    };

    trace!(status, url = %url, "received raw response");
    Ok(ServiceResponse {
        status,
        body: String::from_utf8_lossy(&body).into_owned(),
        headers,
    })
}

fn header_value<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.has_name(name))
        .map(|h| h.value.as_str())
}

/// One CRLF-terminated line without its terminator.
fn read_line(reader: &mut impl BufRead, url: &str) -> Result<String, TransportError> {
    let mut line = Vec::new();
    let read = reader
        .read_until(b'\n', &mut line)
        .map_err(|e| io_error(&e, url))?;
    if read == 0 {
        return Err(TransportError::Io {
            url: url.to_string(),
            message: "connection closed before the response was complete".to_string(),
        });
    }
    while matches!(line.last(), Some(b'\n' | b'\r')) {
        line.pop();
    }
    Ok(String::from_utf8_lossy(&line).into_owned())
}

fn read_chunked(reader: &mut impl BufRead, url: &str) -> Result<Vec<u8>, TransportError> {
    let mut body = Vec::new();
    loop {
        let line = read_line(reader, url)?;
        let size = line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size, 16).map_err(|_| TransportError::Io {
            url: url.to_string(),
            message: format!("malformed chunk size '{}'", line),
        })?;
        if size == 0 {
            while !read_line(reader, url)?.is_empty() {}
            return Ok(body);
        }
        let start = body.len();
        body.resize(start + size, 0);
        reader
            .read_exact(&mut body[start..])
            .map_err(|e| io_error(&e, url))?;
        read_line(reader, url)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(headers: Vec<Header>) -> ServiceRequest {
        ServiceRequest {
            method: HttpMethod::Get,
            path: "/pets".to_string(),
            query: Vec::new(),
            headers,
            body: None,
            content_type: "application/json".to_string(),
        }
    }

    #[test]
    fn test_client_safe_values() {
        assert!(is_client_safe_value("abc def"));
        assert!(!is_client_safe_value(" "));
        assert!(!is_client_safe_value("abc\t"));
        assert!(!is_client_safe_value("abc\r\n"));
        assert!(!is_client_safe_value("\u{0007}abc"));
        assert!(!is_client_safe_value("abc\u{FEFF}"));
        assert!(!is_client_safe_value("\u{3000}"));
        assert!(needs_raw_writer(&get(vec![Header::new("X-Trace", "a\u{0000}")])));
        assert!(!needs_raw_writer(&get(vec![Header::new("X-Trace", "a b")])));
    }

    #[test]
    fn test_encoded_request_keeps_header_bytes() {
        let url = Url::parse("http://127.0.0.1:8080/pets?status=two").unwrap();
        let request = get(vec![Header::new("X-Trace", "abc\u{0007}")]);
        let bytes = encode_request(&url, "127.0.0.1", &request);
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("GET /pets?status=two HTTP/1.1\r\nHost: 127.0.0.1:8080\r\n"));
        assert!(text.contains("X-Trace: abc\u{0007}\r\n"));
        assert!(text.ends_with("Connection: close\r\n\r\n"));
    }

    #[test]
    fn test_chunked_body_is_reassembled() {
        let raw = b"4\r\nWiki\r\n5;ext=1\r\npedia\r\n0\r\n\r\n";
        let body = read_chunked(&mut &raw[..], "http://x").unwrap();
        assert_eq!(body, b"Wikipedia");
    }

    #[test]
    fn test_https_target_is_unsendable() {
        let url = Url::parse("https://localhost:8443/pets").unwrap();
        let writer = RawRequestWriter {
            timeout: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(1),
        };
        let err = writer
            .send(&url, &get(vec![Header::new("X-Trace", "\u{0000}")]))
            .unwrap_err();
        assert!(matches!(err, TransportError::Unsendable { .. }));
    }
}
