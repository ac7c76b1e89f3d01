//! # Validator Module
//!
//! Argument validation runs before a resource's `prepare` hook. A validator
//! rejects a request by writing a response into the context; the dispatcher
//! sees [`ResponseBuffer::is_started`](crate::context::ResponseBuffer::is_started)
//! and sends that response as-is without calling the resource.

use crate::context::Context;
use crate::resource::{ArgKind, RestResource};
use tracing::debug;

/// Error code for a declared argument that is absent.
pub const MISSING_ARGUMENT: &str = "rest:missing_argument";
/// Error code for an argument that does not parse as its declared type.
pub const INVALID_ARGUMENT: &str = "rest:invalid_argument";

/// Pre-dispatch check of a request against a resource.
pub trait ArgsValidator: Send + Sync {
    fn check(&self, resource: &dyn RestResource, ctx: &mut Context);
}

/// Accepts every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopValidator;

impl ArgsValidator for NoopValidator {
    fn check(&self, _resource: &dyn RestResource, _ctx: &mut Context) {}
}

/// Enforces the resource's [`ParamSpec`](crate::resource::ParamSpec) for the
/// request method.
///
/// The first failing argument is answered with HTTP 400 and the
/// [`MISSING_ARGUMENT`] or [`INVALID_ARGUMENT`] error envelope.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequiredArgsValidator;

impl ArgsValidator for RequiredArgsValidator {
    fn check(&self, resource: &dyn RestResource, ctx: &mut Context) {
        let spec = resource.parameters();
        for arg in spec.args_for(ctx.request.method()) {
            let failure = match ctx.request.param(&arg.name) {
                None | Some("") if arg.optional => None,
                None | Some("") => Some((MISSING_ARGUMENT, "missing argument")),
                Some(value) if !parses_as(value, arg.kind) => {
                    Some((INVALID_ARGUMENT, "invalid argument"))
                }
                Some(_) => None,
            };
            if let Some((code, message)) = failure {
                debug!(
                    request_id = %ctx.request_id(),
                    resource = resource.resource(),
                    argument = %arg.name,
                    code,
                    "Argument check failed"
                );
                ctx.response.error_with_code(400, code, message, &arg.name);
                return;
            }
        }
    }
}

fn parses_as(value: &str, kind: ArgKind) -> bool {
    match kind {
        ArgKind::String => true,
        ArgKind::Int => value.parse::<i64>().is_ok(),
        ArgKind::Bool => value.parse::<bool>().is_ok(),
        ArgKind::Json => serde_json::from_str::<serde_json::Value>(value).is_ok(),
    }
}
