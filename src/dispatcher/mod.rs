//! # Dispatcher Module
//!
//! The dispatcher is the request-handling entry point. It owns the context
//! pool, consults the [`ResourceRegistry`](crate::registry::ResourceRegistry)
//! and drives each request through a fixed lifecycle.
//!
//! ## Request Lifecycle
//!
//! ```text
//! RECEIVED → NORMALIZED → LOOKED_UP ─┬─ NOT_FOUND ────────────────────────────────┬→ FINISHED
//!                                    └─ VALIDATED → PREPARED → METHOD_DISPATCHED ─┘
//! ```
//!
//! 1. A context is checked out of the pool and reset with the inbound request.
//! 2. The path gets a trailing `/` if it lacks one ([`normalize_endpoint`]).
//! 3. The registry is queried for that exact endpoint.
//!    - Not found: HTTP 404 with the `resource:not_found` error envelope.
//! 4. The [`ArgsValidator`](crate::validator::ArgsValidator) runs. If it wrote
//!    a response, that response is sent unchanged and the resource is not called.
//! 5. A method other than `GET`, `PUT`, `POST` or `DELETE` gets a bare
//!    `text/plain` 405 "Method Not Allowed" without the error envelope, and
//!    `prepare` is not called. Otherwise `prepare` runs, then the verb handler.
//! 6. The buffered response is sent and one access-log record is emitted.
//!
//! Every branch ends in step 6, and the context returns to the pool when
//! [`Dispatcher::serve`] returns. A panic inside a resource hook is caught and
//! answered with a 500 `rest:internal_error` envelope.
//!
//! ## Access Log
//!
//! One INFO record per request on target [`ACCESS_LOG_TARGET`]:
//!
//! ```text
//! 10.0.0.7 - - [05/Mar/2024 14:07:09] "GET /user/profile/ HTTP/1.1" 200 17 0.000153
//! ```
//!
//! with structured fields `timeDur` (seconds), `status`, `request_id` and
//! `outcome`.
//!
//! ## Example
//!
//! ```rust
//! use restdispatch::context::{CapturedResponse, Context, IncomingRequest};
//! use restdispatch::dispatcher::Dispatcher;
//! use restdispatch::registry::ResourceRegistry;
//! use restdispatch::resource::RestResource;
//! use std::sync::Arc;
//!
//! struct Profile;
//! impl RestResource for Profile {
//!     fn resource(&self) -> &str { "user.profile" }
//!     fn get(&self, ctx: &mut Context) { ctx.response.text(200, "hi"); }
//! }
//!
//! let registry = Arc::new(ResourceRegistry::new());
//! registry.register(Arc::new(Profile)).unwrap();
//! let dispatcher = Dispatcher::new(registry);
//!
//! let mut sink = CapturedResponse::default();
//! let record = dispatcher.serve(&IncomingRequest::new("GET", "/user/profile"), &mut sink);
//! assert_eq!(record.status, 200);
//! assert_eq!(sink.body_text(), "hi");
//! ```

mod access_log;
mod core;

pub use access_log::{AccessRecord, ACCESS_LOG_TARGET};
pub use self::core::{
    normalize_endpoint, DispatchOutcome, Dispatcher, INTERNAL_ERROR_CODE, NOT_FOUND_CODE,
    NOT_FOUND_MESSAGE,
};
