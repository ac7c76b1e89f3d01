//! # Resource Module
//!
//! The [`RestResource`] trait is the seam between the dispatcher and the
//! application. One resource serves one endpoint; its declared name
//! `"<group>.<item>"` is registered at `/<group>/<item>/`.
//!
//! ## Example
//!
//! ```rust
//! use restdispatch::context::Context;
//! use restdispatch::resource::{ParamSpec, RestResource};
//! use serde_json::json;
//!
//! struct Profile;
//!
//! impl RestResource for Profile {
//!     fn resource(&self) -> &str {
//!         "user.profile"
//!     }
//!
//!     fn parameters(&self) -> ParamSpec {
//!         ParamSpec::new().method("GET", &["id:int"])
//!     }
//!
//!     fn get(&self, ctx: &mut Context) {
//!         let id = ctx.request.param("id").unwrap_or_default().to_owned();
//!         ctx.response.json(200, &json!({ "id": id }));
//!     }
//! }
//! ```

use crate::context::Context;
use std::fmt;

/// Body of the plain-text 405 response.
pub const METHOD_NOT_ALLOWED: &str = "Method Not Allowed";

/// Type a declared argument must parse as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    String,
    Int,
    Bool,
    Json,
}

/// One declared argument, parsed from `[?]name[:int|:bool|:json]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: String,
    pub kind: ArgKind,
    pub optional: bool,
}

impl ArgSpec {
    /// Parse a declaration. Unknown type suffixes are treated as strings.
    #[must_use]
    pub fn parse(decl: &str) -> Self {
        let (optional, rest) = match decl.strip_prefix('?') {
            Some(rest) => (true, rest),
            None => (false, decl),
        };
        let (name, kind) = match rest.rsplit_once(':') {
            Some((name, "int")) => (name, ArgKind::Int),
            Some((name, "bool")) => (name, ArgKind::Bool),
            Some((name, "json")) => (name, ArgKind::Json),
            Some((name, _)) => (name, ArgKind::String),
            None => (rest, ArgKind::String),
        };
        Self {
            name: name.to_owned(),
            kind,
            optional,
        }
    }
}

/// Arguments a resource expects, per HTTP method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSpec {
    methods: Vec<(String, Vec<ArgSpec>)>,
}

impl ParamSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the arguments for `method` (case-insensitive).
    #[must_use]
    pub fn method(mut self, method: &str, args: &[&str]) -> Self {
        let method = method.to_ascii_uppercase();
        let args = args.iter().map(|a| ArgSpec::parse(a)).collect();
        self.methods.retain(|(m, _)| *m != method);
        self.methods.push((method, args));
        self
    }

    /// Declared arguments for `method`; empty when none were declared.
    #[must_use]
    pub fn args_for(&self, method: &str) -> &[ArgSpec] {
        self.methods
            .iter()
            .find(|(m, _)| m.eq_ignore_ascii_case(method))
            .map(|(_, args)| args.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// A REST resource served at the endpoint derived from [`RestResource::resource`].
///
/// The dispatcher calls, in order: the argument validator (which reads
/// [`RestResource::parameters`]), [`RestResource::prepare`], then the handler
/// for the request method. Verbs a resource does not override answer with a
/// plain-text 405.
pub trait RestResource: Send + Sync {
    /// Declared name in `"<group>.<item>"` form.
    fn resource(&self) -> &str;

    /// Arguments the validator should enforce.
    fn parameters(&self) -> ParamSpec {
        ParamSpec::default()
    }

    /// Runs after validation passes and before the verb handler.
    fn prepare(&self, _ctx: &mut Context) {}

    fn get(&self, ctx: &mut Context) {
        ctx.response.raw_error(405, METHOD_NOT_ALLOWED);
    }

    fn put(&self, ctx: &mut Context) {
        ctx.response.raw_error(405, METHOD_NOT_ALLOWED);
    }

    fn post(&self, ctx: &mut Context) {
        ctx.response.raw_error(405, METHOD_NOT_ALLOWED);
    }

    fn delete(&self, ctx: &mut Context) {
        ctx.response.raw_error(405, METHOD_NOT_ALLOWED);
    }
}

impl fmt::Debug for dyn RestResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestResource")
            .field("resource", &self.resource())
            .finish()
    }
}
