use crate::context::{HeaderLine, ResponseSink};
use http::StatusCode;
use may_minihttp::Response;
use parking_lot::Mutex;
use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::warn;

/// Header slots `may_minihttp` reserves per response.
pub const MAX_RESPONSE_HEADERS: usize = 16;

/// Owned header lines already promoted to `'static`.
static INTERNED_HEADERS: OnceLock<Mutex<HashSet<&'static str>>> = OnceLock::new();

/// Reason phrase for `status`; unregistered codes get `"Unknown"`.
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
}

/// `'static` view of a header line for `may_minihttp`.
///
/// Borrowed lines pass through. Owned lines are leaked once per distinct
/// value, so a repeated `Location` or `Cache-Control` value costs one
/// allocation for the life of the process.
#[must_use]
pub fn static_header(line: &HeaderLine) -> &'static str {
    match line {
        Cow::Borrowed(s) => *s,
        Cow::Owned(s) => {
            let mut interned = INTERNED_HEADERS.get_or_init(Mutex::default).lock();
            if let Some(existing) = interned.get(s.as_str()) {
                return *existing;
            }
            let leaked: &'static str = Box::leak(s.clone().into_boxed_str());
            interned.insert(leaked);
            leaked
        }
    }
}

impl ResponseSink for Response<'_> {
    fn send(&mut self, status: u16, headers: &[HeaderLine], body: &[u8]) {
        self.status_code(usize::from(status), status_reason(status));
        if headers.len() > MAX_RESPONSE_HEADERS {
            warn!(
                count = headers.len(),
                max = MAX_RESPONSE_HEADERS,
                "Dropping header lines beyond transport limit"
            );
        }
        for line in headers.iter().take(MAX_RESPONSE_HEADERS) {
            self.header(static_header(line));
        }
        self.body_vec(body.to_vec());
    }
}
