use serde::Serialize;
use smallvec::SmallVec;
use std::borrow::Cow;
use tracing::error;

/// Status a response carries until a resource sets one.
pub const DEFAULT_STATUS: u16 = 200;

pub const CONTENT_TYPE_JSON: &str = "Content-Type: application/json";
pub const CONTENT_TYPE_TEXT: &str = "Content-Type: text/plain; charset=utf-8";
pub const NOSNIFF: &str = "X-Content-Type-Options: nosniff";

/// One complete `Name: value` header line.
///
/// Constant lines stay borrowed; computed ones (`Location`, `ETag`,
/// `Set-Cookie`) are owned.
pub type HeaderLine = Cow<'static, str>;

/// Header lines of one response, in the order they were set.
pub type HeaderLines = SmallVec<[HeaderLine; 4]>;

fn header_name(line: &str) -> &str {
    line.split(':').next().unwrap_or(line).trim()
}

/// Structured error body written by [`ResponseBuffer::error_with_code`].
///
/// Serializes as
/// `{"code":404,"data":null,"errCode":"resource:not_found","errMsg":"...","innerErrMsg":""}`.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope<'a> {
    pub code: u16,
    pub data: Option<()>,
    #[serde(rename = "errCode")]
    pub err_code: &'a str,
    #[serde(rename = "errMsg")]
    pub err_msg: &'a str,
    #[serde(rename = "innerErrMsg")]
    pub inner_err_msg: &'a str,
}

/// Destination for a finished response.
///
/// Implemented for `may_minihttp::Response` by the server module and by
/// [`CapturedResponse`] for in-process use.
pub trait ResponseSink {
    fn send(&mut self, status: u16, headers: &[HeaderLine], body: &[u8]);
}

/// In-memory [`ResponseSink`] that records what was sent.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CapturedResponse {
    pub status: u16,
    pub headers: Vec<String>,
    pub body: Vec<u8>,
    /// How many times `send` was called
    pub sends: usize,
}

impl CapturedResponse {
    /// Whether exactly `line` was sent.
    #[must_use]
    pub fn has_header(&self, line: &str) -> bool {
        self.headers.iter().any(|h| h == line)
    }

    /// Value of the header called `name` (case-insensitive), trimmed.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| header_name(h).eq_ignore_ascii_case(name))
            .and_then(|h| h.split_once(':'))
            .map(|(_, value)| value.trim())
    }

    /// Body decoded as UTF-8 (lossy).
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON, `Value::Null` when it is not JSON.
    #[must_use]
    pub fn body_json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

impl ResponseSink for CapturedResponse {
    fn send(&mut self, status: u16, headers: &[HeaderLine], body: &[u8]) {
        self.status = status;
        self.headers = headers.iter().map(|h| h.to_string()).collect();
        self.body = body.to_vec();
        self.sends += 1;
    }
}

/// Buffered response owned by a [`Context`](super::Context).
///
/// Setting a status or writing a body marks the response as started.
/// Validators use that flag to tell the dispatcher a request is already
/// answered. Headers alone do not start it.
#[derive(Debug)]
pub struct ResponseBuffer {
    status: u16,
    headers: HeaderLines,
    body: Vec<u8>,
    started: bool,
}

impl Default for ResponseBuffer {
    fn default() -> Self {
        Self {
            status: DEFAULT_STATUS,
            headers: HeaderLines::new(),
            body: Vec::new(),
            started: false,
        }
    }
}

impl ResponseBuffer {
    pub(crate) fn reset(&mut self) {
        self.status = DEFAULT_STATUS;
        self.headers.clear();
        self.body.clear();
        self.started = false;
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &[HeaderLine] {
        &self.headers
    }

    /// Whether exactly `line` has been set.
    #[must_use]
    pub fn has_header(&self, line: &str) -> bool {
        self.headers.iter().any(|h| h == line)
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

    pub(crate) fn shed_body(&mut self, max_capacity: usize) {
        self.body.clear();
        self.body.shrink_to(max_capacity);
    }

    /// Number of body bytes written so far.
    #[must_use]
    pub fn content_length(&self) -> usize {
        self.body.len()
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
        self.started = true;
    }

    /// Append a header line, replacing an earlier line with the same name.
    ///
    /// Takes a constant (`"Cache-Control: no-store"`) or a computed
    /// `String` (`format!("Location: /user/{id}/")`).
    pub fn header(&mut self, line: impl Into<HeaderLine>) {
        let line = line.into();
        self.remove_header(header_name(&line));
        self.headers.push(line);
    }

    /// Drop every line called `name` (case-insensitive).
    pub fn remove_header(&mut self, name: &str) {
        self.headers
            .retain(|existing| !header_name(existing).eq_ignore_ascii_case(name));
    }

    /// Append raw bytes to the body.
    pub fn write(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
        self.started = true;
    }

    /// Replace the response with a JSON body.
    ///
    /// A value that fails to serialize is answered with a 500 error envelope.
    pub fn json<T: Serialize + ?Sized>(&mut self, status: u16, value: &T) {
        self.begin(status, CONTENT_TYPE_JSON);
        if let Err(e) = serde_json::to_writer(&mut self.body, value) {
            error!(error = %e, "Failed to serialize response body");
            self.error_with_code(500, "rest:serialize_error", "response serialization failed", "");
        }
    }

    /// Replace the response with a plain-text body.
    pub fn text(&mut self, status: u16, body: &str) {
        self.begin(status, CONTENT_TYPE_TEXT);
        self.body.extend_from_slice(body.as_bytes());
    }

    /// Replace the response with the structured error envelope.
    pub fn error_with_code(&mut self, status: u16, code: &str, message: &str, detail: &str) {
        self.begin(status, CONTENT_TYPE_JSON);
        let envelope = ErrorEnvelope {
            code: status,
            data: None,
            err_code: code,
            err_msg: message,
            inner_err_msg: detail,
        };
        if let Err(e) = serde_json::to_writer(&mut self.body, &envelope) {
            error!(error = %e, code, "Failed to serialize error envelope");
        }
    }

    /// Replace the response with a bare `text/plain` error, no envelope.
    pub fn raw_error(&mut self, status: u16, message: &str) {
        self.begin(status, CONTENT_TYPE_TEXT);
        self.header(NOSNIFF);
        self.body.extend_from_slice(message.as_bytes());
    }

    /// Write the buffered response to `sink`.
    pub fn send_to(&self, sink: &mut dyn ResponseSink) {
        sink.send(self.status, &self.headers, &self.body);
    }

    /// Start a fresh body. Headers other than `Content-Type` are kept.
    fn begin(&mut self, status: u16, content_type: &'static str) {
        self.status = status;
        self.header(content_type);
        self.body.clear();
        self.started = true;
    }
}
