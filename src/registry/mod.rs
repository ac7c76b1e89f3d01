//! # Registry Module
//!
//! The resource registry maps normalized endpoint paths to
//! [`RestResource`](crate::resource::RestResource) implementations.
//!
//! ## Overview
//!
//! - **Registration** derives the endpoint from the resource's declared name:
//!   `"user.profile"` is served at `/user/profile/`. The name is split on its
//!   last `.`, so `"shop.order.item"` becomes `/shop.order/item/`.
//! - **Lookup** is an exact match on the normalized path. There are no path
//!   parameters, wildcards or patterns.
//!
//! ## Concurrency
//!
//! Registration is expected during startup, before the server accepts traffic;
//! lookup runs on every request. Writers take the table's exclusive lock and
//! readers a shared lock, so any number of concurrent lookups proceed in
//! parallel. A lookup clones the resource's `Arc` and releases the lock before
//! the resource runs.
//!
//! The registry is an ordinary value. Build one, register resources into it,
//! and hand it to the [`Dispatcher`](crate::dispatcher::Dispatcher) as an
//! `Arc<ResourceRegistry>`.
//!
//! ## Example
//!
//! ```rust
//! use restdispatch::registry::ResourceRegistry;
//! use restdispatch::resource::RestResource;
//! use std::sync::Arc;
//!
//! struct Profile;
//! impl RestResource for Profile {
//!     fn resource(&self) -> &str { "user.profile" }
//! }
//!
//! let registry = ResourceRegistry::new();
//! let endpoint = registry.register(Arc::new(Profile)).unwrap();
//! assert_eq!(endpoint, "/user/profile/");
//! assert!(registry.lookup("/user/profile/").is_some());
//! ```

mod core;

pub use self::core::{endpoint_for, RegistrationError, ResourceRegistry};
