//! # Server Module
//!
//! Adapter between the `may_minihttp` coroutine HTTP server and the
//! [`Dispatcher`](crate::dispatcher::Dispatcher).
//!
//! - [`parse_request`] copies the transport request (method, target,
//!   protocol, headers, body) into an owned [`ParsedRequest`].
//! - [`AppService`] implements `may_minihttp::HttpService` and calls
//!   [`Dispatcher::serve`](crate::dispatcher::Dispatcher::serve) with the
//!   transport `Response` as the [`ResponseSink`](crate::context::ResponseSink).
//! - [`HttpServer`] / [`ServerHandle`] start the server and manage its lifecycle.
//!
//! `may_minihttp` does not expose the peer socket address, so the access log's
//! client address comes from `X-Forwarded-For` (first entry), then
//! `X-Real-IP`, else `-`.
//!
//! `may_minihttp` also only accepts `&'static str` header lines, at most
//! [`MAX_RESPONSE_HEADERS`] per response. Computed lines are interned by
//! [`static_header`] before they are handed over.
//!
//! ## Example
//!
//! ```rust,no_run
//! use restdispatch::dispatcher::Dispatcher;
//! use restdispatch::registry::ResourceRegistry;
//! use restdispatch::server::{AppService, HttpServer};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(ResourceRegistry::new());
//! // registry.register(...) for each resource
//! let service = AppService::new(Arc::new(Dispatcher::new(registry)));
//! let handle = HttpServer(service).start("0.0.0.0:8080").unwrap();
//! handle.join().unwrap();
//! ```

pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{client_addr_from_headers, parse_request, ParsedRequest};
pub use response::{static_header, status_reason, MAX_RESPONSE_HEADERS};
pub use service::AppService;
