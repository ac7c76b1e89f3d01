//! # Context Module
//!
//! Per-request scratch state handed to resources by the dispatcher.
//!
//! ## Overview
//!
//! A [`Context`] carries everything a resource needs to serve one request:
//!
//! - [`RequestData`] - method, URI, headers and decoded input parameters
//! - [`ResponseBuffer`] - the status, header lines and body the resource writes
//! - a per-request [`RequestId`](crate::ids::RequestId) for log correlation
//!
//! Contexts are recycled through [`ContextPool`](crate::pool::ContextPool).
//! Every field is overwritten by [`Context::reset`] before a request sees it,
//! while the underlying buffers keep their capacity so steady-state traffic
//! does not allocate fresh request/response storage. Body buffers above
//! [`MAX_RETAINED_BODY_CAPACITY`] are shrunk when a context goes back to the
//! pool, so one large upload does not pin memory in an idle context.
//!
//! ## Response Writing
//!
//! Resources never talk to the transport directly. They fill the
//! [`ResponseBuffer`]; the dispatcher sends it through a [`ResponseSink`]
//! exactly once when the request finishes.
//!
//! ```rust
//! use restdispatch::context::{CapturedResponse, Context, IncomingRequest};
//!
//! let mut ctx = Context::new();
//! ctx.reset(&IncomingRequest::new("GET", "/user/profile/?id=7"));
//! assert_eq!(ctx.request.param("id"), Some("7"));
//!
//! ctx.response.text(200, "hello");
//! let mut sink = CapturedResponse::default();
//! ctx.response.send_to(&mut sink);
//! assert_eq!(sink.body, b"hello");
//! ```

mod core;
mod response;

pub use self::core::{
    Context, IncomingRequest, InputVec, RequestData, MAX_INLINE_INPUTS, MAX_RETAINED_BODY_CAPACITY,
};
pub use response::{
    CapturedResponse, ErrorEnvelope, HeaderLine, HeaderLines, ResponseBuffer, ResponseSink,
    CONTENT_TYPE_JSON, CONTENT_TYPE_TEXT, DEFAULT_STATUS, NOSNIFF,
};
