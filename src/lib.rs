//! # restdispatch
//!
//! **restdispatch** is a minimal, coroutine-powered REST resource dispatcher. Resources declare
//! a dotted name such as `"user.profile"`, are registered once at startup, and are served at the
//! derived endpoint `/user/profile/` with one handler per HTTP verb.
//!
//! ## Architecture
//!
//! - **[`resource`]** - The [`RestResource`] trait: declared name, `prepare`, and `get`/`put`/`post`/`delete`
//! - **[`registry`]** - Endpoint table built from declared names (`"a.b"` → `/a/b/`)
//! - **[`dispatcher`]** - Request lifecycle: normalize, look up, validate, prepare, dispatch, log
//! - **[`context`]** - Per-request state (parsed request, buffered response, request id)
//! - **[`pool`]** - Recycling of request contexts across requests
//! - **[`validator`]** - Pre-dispatch argument checks
//! - **[`server`]** - HTTP transport on `may_minihttp`
//! - **[`logging`]** - `tracing-subscriber` setup, including the access log
//! - **[`runtime_config`]** - Environment-driven runtime settings
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as HttpServer<br/>(may_minihttp)
//!     participant Dispatcher
//!     participant Pool as ContextPool
//!     participant Registry as ResourceRegistry
//!     participant Validator as ArgsValidator
//!     participant Resource as RestResource
//!
//!     Client->>Server: GET /user/profile?id=7
//!     Server->>Dispatcher: serve(IncomingRequest, Response)
//!     Dispatcher->>Pool: acquire()
//!     Pool-->>Dispatcher: Context (reset)
//!     Dispatcher->>Dispatcher: normalize "/user/profile" → "/user/profile/"
//!     Dispatcher->>Registry: lookup("/user/profile/")
//!
//!     alt No Resource
//!         Registry-->>Dispatcher: None
//!         Dispatcher-->>Client: 404 {"errCode":"resource:not_found",...}
//!     end
//!
//!     Dispatcher->>Validator: check(resource, ctx)
//!     alt Rejected
//!         Validator-->>Client: 400 error envelope
//!     end
//!
//!     alt Method outside GET/PUT/POST/DELETE
//!         Dispatcher-->>Client: 405 Method Not Allowed (text/plain)
//!     end
//!     Dispatcher->>Resource: prepare(ctx)
//!     Dispatcher->>Resource: get(ctx)
//!     Resource-->>Dispatcher: ctx.response written
//!     Dispatcher-->>Client: 200 response
//!     Dispatcher->>Dispatcher: access log (timeDur, status)
//!     Dispatcher->>Pool: release (guard dropped, bodies shrunk)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use restdispatch::context::Context;
//! use restdispatch::{AppService, Dispatcher, HttpServer, ResourceRegistry, RestResource};
//! use std::sync::Arc;
//!
//! struct Profile;
//!
//! impl RestResource for Profile {
//!     fn resource(&self) -> &str {
//!         "user.profile"
//!     }
//!
//!     fn get(&self, ctx: &mut Context) {
//!         let id = ctx.request.param("id").unwrap_or("anonymous").to_string();
//!         ctx.response.json(200, &serde_json::json!({ "id": id }));
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     restdispatch::logging::init_logging("info")?;
//!     let config = restdispatch::runtime_config::RuntimeConfig::from_env();
//!     config.apply();
//!
//!     let registry = Arc::new(ResourceRegistry::new());
//!     registry.register(Arc::new(Profile))?;
//!
//!     let dispatcher = Dispatcher::new(registry).with_pool_config(config.pool_config());
//!     let handle = HttpServer(AppService::new(Arc::new(dispatcher))).start("0.0.0.0:8080")?;
//!     handle.wait_ready()?;
//!     let _ = handle.join();
//!     Ok(())
//! }
//! ```
//!
//! ```bash
//! curl http://localhost:8080/user/profile?id=7     # 200 {"id":"7"}
//! curl http://localhost:8080/user/unknown/         # 404 envelope
//! curl -X PATCH http://localhost:8080/user/profile # 405 Method Not Allowed
//! ```

pub mod context;
pub mod dispatcher;
pub mod ids;
pub mod logging;
pub mod pool;
pub mod registry;
pub mod resource;
pub mod runtime_config;
pub mod server;
pub mod validator;

pub use context::Context;
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use registry::{RegistrationError, ResourceRegistry};
pub use resource::{ParamSpec, RestResource};
pub use server::{AppService, HttpServer, ServerHandle};
