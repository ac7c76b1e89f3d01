use super::response::ResponseBuffer;
use crate::ids::RequestId;
use serde::de::DeserializeOwned;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU64, Ordering};

/// Maximum decoded input parameters before heap allocation.
pub const MAX_INLINE_INPUTS: usize = 8;

/// Body capacity a pooled context may keep between requests.
///
/// Larger request or response body allocations are shrunk to this size when
/// the context returns to its pool.
pub const MAX_RETAINED_BODY_CAPACITY: usize = 64 * 1024;

/// Maximum inline headers before heap allocation.
const MAX_INLINE_HEADERS: usize = 16;

/// Decoded input parameters (query string plus urlencoded form body).
pub type InputVec = SmallVec<[(String, String); MAX_INLINE_INPUTS]>;

type OwnedHeaderVec = SmallVec<[(String, String); MAX_INLINE_HEADERS]>;

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

/// Borrowed, transport-neutral view of an inbound request.
///
/// The transport adapter builds one of these per request and hands it to the
/// dispatcher, which copies it into a pooled [`Context`].
#[derive(Debug, Clone, Copy)]
pub struct IncomingRequest<'a> {
    /// HTTP method exactly as received (`GET`, `PATCH`, ...)
    pub method: &'a str,
    /// Request target including any query string
    pub uri: &'a str,
    /// Protocol string for the access log, e.g. `HTTP/1.1`
    pub proto: &'a str,
    /// Client address, `-` when the transport cannot tell
    pub client_addr: &'a str,
    /// Header name/value pairs in arrival order
    pub headers: &'a [(&'a str, &'a str)],
    /// Raw request body
    pub body: &'a [u8],
}

impl<'a> IncomingRequest<'a> {
    /// A bodiless `HTTP/1.1` request with no headers and an unknown client.
    #[must_use]
    pub fn new(method: &'a str, uri: &'a str) -> Self {
        Self {
            method,
            uri,
            proto: "HTTP/1.1",
            client_addr: "-",
            headers: &[],
            body: &[],
        }
    }

    #[must_use]
    pub fn with_headers(mut self, headers: &'a [(&'a str, &'a str)]) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: &'a [u8]) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub fn with_client_addr(mut self, client_addr: &'a str) -> Self {
        self.client_addr = client_addr;
        self
    }

    #[must_use]
    pub fn with_proto(mut self, proto: &'a str) -> Self {
        self.proto = proto;
        self
    }

    /// Request path without the query string.
    #[must_use]
    pub fn path(&self) -> &'a str {
        match self.uri.split_once('?') {
            Some((path, _)) => path,
            None => self.uri,
        }
    }

    /// Raw query string, if any.
    #[must_use]
    pub fn query(&self) -> Option<&'a str> {
        self.uri.split_once('?').map(|(_, q)| q)
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }
}

/// Owned copy of the inbound request held by a [`Context`].
///
/// String buffers are cleared and refilled on reuse rather than reallocated.
#[derive(Debug, Default)]
pub struct RequestData {
    method: String,
    uri: String,
    path: String,
    proto: String,
    client_addr: String,
    headers: OwnedHeaderVec,
    input: InputVec,
    body: Vec<u8>,
}

impl RequestData {
    fn fill(&mut self, incoming: &IncomingRequest<'_>) {
        refill(&mut self.method, incoming.method);
        refill(&mut self.uri, incoming.uri);
        refill(&mut self.path, incoming.path());
        refill(&mut self.proto, incoming.proto);
        refill(&mut self.client_addr, incoming.client_addr);

        self.headers.clear();
        self.headers.extend(
            incoming
                .headers
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned())),
        );

        self.body.clear();
        self.body.extend_from_slice(incoming.body);

        self.input.clear();
        if let Some(query) = incoming.query() {
            self.input.extend(
                url::form_urlencoded::parse(query.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned())),
            );
        }
        let is_form = incoming
            .header("content-type")
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
        if is_form {
            self.input.extend(
                url::form_urlencoded::parse(incoming.body)
                    .map(|(k, v)| (k.into_owned(), v.into_owned())),
            );
        }
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Request target including the query string.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Request path as received (not normalized).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn proto(&self) -> &str {
        &self.proto
    }

    #[must_use]
    pub fn client_addr(&self) -> &str {
        &self.client_addr
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All decoded input parameters in arrival order.
    #[must_use]
    pub fn input(&self) -> &[(String, String)] {
        &self.input
    }

    /// Get an input parameter by name
    ///
    /// Uses "last write wins" semantics: a form body value overrides a query
    /// string value of the same name, and `?a=1&a=2` yields `2`.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.input
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Bytes allocated for the body buffer.
    #[must_use]
    pub fn body_capacity(&self) -> usize {
        self.body.capacity()
    }

    fn shed_body(&mut self) {
        self.body.clear();
        self.body.shrink_to(MAX_RETAINED_BODY_CAPACITY);
    }

    /// Deserialize the raw body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the body is not valid JSON for `T`.
    pub fn json_body<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}

fn refill(buf: &mut String, value: &str) {
    buf.clear();
    buf.push_str(value);
}

/// Mutable per-request state shared between the dispatcher and a resource.
///
/// A context is exclusively owned by one in-flight request at a time. Between
/// requests it lives in the [`ContextPool`](crate::pool::ContextPool).
#[derive(Debug)]
pub struct Context {
    request_id: RequestId,
    serial: u64,
    uses: u64,
    /// The inbound request
    pub request: RequestData,
    /// The response being built for this request
    pub response: ResponseBuffer,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Create an empty context with a process-unique serial number.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: RequestId::new(),
            serial: NEXT_SERIAL.fetch_add(1, Ordering::Relaxed),
            uses: 0,
            request: RequestData::default(),
            response: ResponseBuffer::default(),
        }
    }

    /// Overwrite all per-request state with `incoming`.
    ///
    /// The request id is taken from a valid `X-Request-Id` header or freshly
    /// minted. The response is returned to `200`, no headers, empty body, not
    /// started.
    pub fn reset(&mut self, incoming: &IncomingRequest<'_>) {
        self.request_id = RequestId::from_header_or_new(incoming.header("x-request-id"));
        self.uses += 1;
        self.request.fill(incoming);
        self.response.reset();
    }

    /// Drop both bodies and cap their retained allocations at
    /// [`MAX_RETAINED_BODY_CAPACITY`].
    pub(crate) fn shed(&mut self) {
        self.request.shed_body();
        self.response.shed_body(MAX_RETAINED_BODY_CAPACITY);
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Identity of the physical instance; stable across reuse.
    #[must_use]
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Number of requests this instance has served, including the current one.
    #[must_use]
    pub fn uses(&self) -> u64 {
        self.uses
    }
}
