//! # Runtime Configuration Module
//!
//! Environment-variable configuration for the coroutine runtime and the
//! dispatcher's context pool.
//!
//! ## Environment Variables
//!
//! ### `RESTD_STACK_SIZE`
//!
//! Stack size for connection coroutines. Accepts decimal (`16384`) or
//! hexadecimal (`0x4000`). Default: `0x4000` (16 KB).
//!
//! Total stack memory is roughly `stack_size × concurrent_connections`; too
//! small overflows in deep resource handlers.
//!
//! ### `RESTD_CONTEXT_POOL_MAX`
//!
//! Maximum number of idle request contexts kept for reuse. Default: `1024`.
//!
//! ### `RESTD_CONTEXT_POOL_PREWARM`
//!
//! Contexts created up front when the pool is built. Default: `0`.
//!
//! ## Usage
//!
//! ```rust
//! use restdispatch::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! config.apply();
//! let pool = config.pool_config();
//! assert!(pool.max_size >= pool.initial_size);
//! ```

use crate::pool::PoolConfig;
use std::env;

const DEFAULT_STACK_SIZE: usize = 0x4000;
const DEFAULT_POOL_MAX: usize = 1024;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes (default: 16 KB / 0x4000)
    pub stack_size: usize,
    /// Idle contexts retained by the pool
    pub context_pool_max: usize,
    /// Contexts created when the pool is built
    pub context_pool_prewarm: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            context_pool_max: DEFAULT_POOL_MAX,
            context_pool_prewarm: 0,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`; unset or unparsable values fall
    /// back to their defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let read = |key: &str, default: usize| {
            lookup(key)
                .and_then(|val| parse_size(&val))
                .unwrap_or(default)
        };
        Self {
            stack_size: read("RESTD_STACK_SIZE", defaults.stack_size),
            context_pool_max: read("RESTD_CONTEXT_POOL_MAX", defaults.context_pool_max),
            context_pool_prewarm: read("RESTD_CONTEXT_POOL_PREWARM", defaults.context_pool_prewarm),
        }
    }

    /// Set the `may` coroutine stack size. Call before starting the server.
    pub fn apply(&self) {
        may::config().set_stack_size(self.stack_size);
    }

    /// Pool settings for [`Dispatcher::with_pool_config`](crate::dispatcher::Dispatcher::with_pool_config).
    #[must_use]
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new()
            .max_size(self.context_pool_max)
            .pre_warm(self.context_pool_prewarm.min(self.context_pool_max))
    }
}

fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> RuntimeConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        RuntimeConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(config(&[]), RuntimeConfig::default());
        assert_eq!(RuntimeConfig::default().stack_size, 0x4000);
    }

    #[test]
    fn test_stack_size_hex_and_decimal() {
        assert_eq!(config(&[("RESTD_STACK_SIZE", "0x8000")]).stack_size, 0x8000);
        assert_eq!(config(&[("RESTD_STACK_SIZE", "32768")]).stack_size, 32768);
        assert_eq!(config(&[("RESTD_STACK_SIZE", "big")]).stack_size, 0x4000);
    }

    #[test]
    fn test_pool_config_caps_prewarm() {
        let cfg = config(&[
            ("RESTD_CONTEXT_POOL_MAX", "8"),
            ("RESTD_CONTEXT_POOL_PREWARM", "32"),
        ]);
        let pool = cfg.pool_config();
        assert_eq!(pool.max_size, 8);
        assert_eq!(pool.initial_size, 8);
        assert!(pool.pre_warm);
    }
}
