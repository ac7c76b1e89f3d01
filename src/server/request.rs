use crate::context::IncomingRequest;
use may_minihttp::Request;
use smallvec::SmallVec;
use std::io::{self, Read};
use tracing::debug;

/// Owned copy of a `may_minihttp::Request`.
///
/// The transport request borrows its connection buffer and is consumed when
/// the body is read, so everything the dispatcher needs is copied out first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    /// HTTP method as sent (e.g. `GET`)
    pub method: String,
    /// Request target including the query string
    pub uri: String,
    /// Protocol version, e.g. `HTTP/1.1`
    pub proto: String,
    /// Client address derived from proxy headers, or `-`
    pub client_addr: String,
    /// Header name/value pairs in arrival order
    pub headers: Vec<(String, String)>,
    /// Raw request body
    pub body: Vec<u8>,
}

impl ParsedRequest {
    /// Run `f` with a borrowed [`IncomingRequest`] view of this request.
    pub fn with_incoming<R>(&self, f: impl FnOnce(&IncomingRequest<'_>) -> R) -> R {
        let headers: SmallVec<[(&str, &str); 16]> = self
            .headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        let incoming = IncomingRequest::new(&self.method, &self.uri)
            .with_proto(&self.proto)
            .with_client_addr(&self.client_addr)
            .with_headers(&headers)
            .with_body(&self.body);
        f(&incoming)
    }
}

/// Client address from `X-Forwarded-For` (first entry) or `X-Real-IP`.
///
/// Returns `-` when neither header carries a value.
#[must_use]
pub fn client_addr_from_headers(headers: &[(String, String)]) -> String {
    let find = |wanted: &str| {
        headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
            .map(|(_, value)| value.as_str())
    };
    find("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| find("x-real-ip").map(str::trim).filter(|v| !v.is_empty()))
        .unwrap_or("-")
        .to_owned()
}

/// Copy a transport request into a [`ParsedRequest`], reading the whole body.
///
/// # Errors
///
/// Returns the I/O error raised while reading the request body.
pub fn parse_request(req: Request) -> io::Result<ParsedRequest> {
    let method = req.method().to_owned();
    let uri = req.path().to_owned();
    let proto = format!("HTTP/1.{}", req.version());
    let headers: Vec<(String, String)> = req
        .headers()
        .iter()
        .map(|h| {
            (
                h.name.to_owned(),
                String::from_utf8_lossy(h.value).into_owned(),
            )
        })
        .collect();
    let client_addr = client_addr_from_headers(&headers);

    let mut body = Vec::new();
    req.body().read_to_end(&mut body)?;

    debug!(
        method = %method,
        uri = %uri,
        proto = %proto,
        headers_count = headers.len(),
        body_size_bytes = body.len(),
        "HTTP request parsed"
    );

    Ok(ParsedRequest {
        method,
        uri,
        proto,
        client_addr,
        headers,
        body,
    })
}
