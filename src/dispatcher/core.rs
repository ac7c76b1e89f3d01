//! Dispatcher core module - hot path for request dispatch.
//!
//! Allocation discipline: the normalized endpoint is borrowed when the path
//! already ends in `/`, and per-request buffers come from the context pool.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use super::access_log::{AccessRecord, ACCESS_LOG_TARGET};
use crate::context::{Context, IncomingRequest, ResponseSink};
use crate::pool::{ContextPool, PoolConfig, PoolStats};
use crate::registry::ResourceRegistry;
use crate::resource::{RestResource, METHOD_NOT_ALLOWED};
use crate::validator::{ArgsValidator, RequiredArgsValidator};
use chrono::Local;
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, trace};

/// Error code of the 404 envelope for an unregistered endpoint.
pub const NOT_FOUND_CODE: &str = "resource:not_found";
/// Message of the 404 envelope ("invalid endpoint").
pub const NOT_FOUND_MESSAGE: &str = "无效的endpoint";
/// Error code of the 500 envelope written when a resource panics.
pub const INTERNAL_ERROR_CODE: &str = "rest:internal_error";

/// Append the trailing `/` an endpoint key requires.
///
/// Idempotent: `normalize_endpoint(&normalize_endpoint(p)) == normalize_endpoint(p)`.
/// The empty path normalizes to `/`. Borrows when no change is needed.
#[must_use]
pub fn normalize_endpoint(path: &str) -> Cow<'_, str> {
    if path.ends_with('/') {
        Cow::Borrowed(path)
    } else {
        let mut endpoint = String::with_capacity(path.len() + 1);
        endpoint.push_str(path);
        endpoint.push('/');
        Cow::Owned(endpoint)
    }
}

/// How a request left the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No resource at the normalized path; 404 envelope sent
    NotFound,
    /// The validator wrote a response; resource hooks were skipped
    Rejected,
    /// `prepare` and the verb handler ran
    Dispatched,
    /// Method outside GET/PUT/POST/DELETE; bare 405 sent
    MethodNotAllowed,
    /// A resource hook panicked; 500 envelope sent
    Panicked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Get,
    Put,
    Post,
    Delete,
}

impl Verb {
    fn parse(method: &str) -> Option<Self> {
        match method {
            "GET" => Some(Self::Get),
            "PUT" => Some(Self::Put),
            "POST" => Some(Self::Post),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// Request-handling entry point.
///
/// Shared by every connection coroutine; all methods take `&self`.
pub struct Dispatcher {
    registry: Arc<ResourceRegistry>,
    validator: Arc<dyn ArgsValidator>,
    pool: ContextPool,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Dispatcher over `registry` with the [`RequiredArgsValidator`] and a
    /// default context pool.
    #[must_use]
    pub fn new(registry: Arc<ResourceRegistry>) -> Self {
        Self {
            registry,
            validator: Arc::new(RequiredArgsValidator),
            pool: ContextPool::default(),
        }
    }

    /// Replace the argument validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn ArgsValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Use a fresh context pool built from `config`.
    #[must_use]
    pub fn with_pool_config(self, config: PoolConfig) -> Self {
        self.with_pool(ContextPool::with_config(config))
    }

    /// Replace the context pool.
    #[must_use]
    pub fn with_pool(mut self, pool: ContextPool) -> Self {
        self.pool = pool;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ResourceRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn pool_stats(&self) -> &PoolStats {
        self.pool.stats()
    }

    /// Handle one request to completion and send its response to `sink`.
    ///
    /// Every request, including 404, validator rejections, 405 and resource
    /// panics, sends exactly one response and emits exactly one access-log
    /// record after handling finishes. The pooled context is released when
    /// this returns.
    pub fn serve(&self, incoming: &IncomingRequest<'_>, sink: &mut dyn ResponseSink) -> AccessRecord {
        let start = Instant::now();
        let started_at = Local::now();
        debug!(path = %incoming.path(), method = %incoming.method, "request");

        let mut ctx = self.pool.acquire(incoming);
        let outcome = self.handle(&mut ctx);
        ctx.response.send_to(sink);

        let record = AccessRecord {
            client_addr: ctx.request.client_addr().to_owned(),
            started_at,
            method: ctx.request.method().to_owned(),
            uri: ctx.request.uri().to_owned(),
            proto: ctx.request.proto().to_owned(),
            status: ctx.response.status(),
            content_length: ctx.response.content_length(),
            elapsed: start.elapsed(),
            outcome,
        };
        info!(
            target: ACCESS_LOG_TARGET,
            request_id = %ctx.request_id(),
            timeDur = record.elapsed_secs(),
            status = record.status,
            outcome = ?record.outcome,
            "{}",
            record
        );
        record
    }

    fn handle(&self, ctx: &mut Context) -> DispatchOutcome {
        let resource = self.registry.lookup(&normalize_endpoint(ctx.request.path()));
        let Some(resource) = resource else {
            debug!(
                request_id = %ctx.request_id(),
                path = %ctx.request.path(),
                "Endpoint not found"
            );
            ctx.response
                .error_with_code(404, NOT_FOUND_CODE, NOT_FOUND_MESSAGE, "");
            return DispatchOutcome::NotFound;
        };

        let run = panic::catch_unwind(AssertUnwindSafe(|| {
            self.run_resource(resource.as_ref(), ctx)
        }));
        match run {
            Ok(outcome) => outcome,
            Err(payload) => {
                error!(
                    request_id = %ctx.request_id(),
                    resource = resource.resource(),
                    panic_message = %panic_message(payload.as_ref()),
                    "Resource panicked - CRITICAL"
                );
                // Headers set before the panic belong to the abandoned response.
                ctx.response.reset();
                ctx.response
                    .error_with_code(500, INTERNAL_ERROR_CODE, "internal server error", "");
                DispatchOutcome::Panicked
            }
        }
    }

    fn run_resource(&self, resource: &dyn RestResource, ctx: &mut Context) -> DispatchOutcome {
        self.validator.check(resource, ctx);
        if ctx.response.is_started() {
            debug!(
                request_id = %ctx.request_id(),
                resource = resource.resource(),
                status = ctx.response.status(),
                "Validator answered request"
            );
            return DispatchOutcome::Rejected;
        }

        // Unsupported methods never reach prepare.
        let Some(verb) = Verb::parse(ctx.request.method()) else {
            ctx.response.raw_error(405, METHOD_NOT_ALLOWED);
            return DispatchOutcome::MethodNotAllowed;
        };

        resource.prepare(ctx);
        trace!(request_id = %ctx.request_id(), "Resource prepared");
        debug!(
            request_id = %ctx.request_id(),
            resource = resource.resource(),
            method = ?verb,
            params = ?ctx.request.input(),
            "Dispatching to resource"
        );
        match verb {
            Verb::Get => resource.get(ctx),
            Verb::Put => resource.put(ctx),
            Verb::Post => resource.post(ctx),
            Verb::Delete => resource.delete(ctx),
        }
        DispatchOutcome::Dispatched
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
