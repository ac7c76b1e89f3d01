//! # Context Pool Module
//!
//! Recycles [`Context`] values across requests so the hot path does not
//! allocate fresh request/response buffers for every inbound request.
//!
//! ## Protocol
//!
//! 1. [`ContextPool::acquire`] pops an idle context (or builds one with the
//!    pool's factory when none is idle) and resets it with the inbound request
//!    before handing it out. A context is never observable in its previous
//!    request's state.
//! 2. The returned [`PooledContext`] guard gives exclusive access to the
//!    context for the lifetime of the request.
//! 3. Dropping the guard returns the context to the pool. This happens on every
//!    exit path, including early returns and unwinding out of a resource.
//!    Body buffers are emptied on return and shrunk to
//!    [`MAX_RETAINED_BODY_CAPACITY`] if a large request grew them.
//!
//! There is no ordering or identity guarantee about which idle instance a
//! caller receives.
//!
//! ## Configuration
//!
//! - `max_size`: idle contexts retained; surplus contexts are dropped on release
//! - `initial_size`: contexts created up front when `pre_warm` is set

use crate::context::{Context, IncomingRequest, MAX_RETAINED_BODY_CAPACITY};
use parking_lot::Mutex;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Configuration for a context pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum number of idle contexts kept for reuse
    pub max_size: usize,
    /// Number of contexts created when the pool is built
    pub initial_size: usize,
    /// Create `initial_size` contexts up front
    pub pre_warm: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: 1024,
            initial_size: 0,
            pre_warm: false,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn max_size(mut self, size: usize) -> Self {
        self.max_size = size;
        self
    }

    /// Pre-warm the pool with `size` contexts.
    #[must_use]
    pub fn pre_warm(mut self, size: usize) -> Self {
        self.initial_size = size;
        self.pre_warm = size > 0;
        self
    }
}

/// Pool counters
#[derive(Debug, Default)]
pub struct PoolStats {
    hits: AtomicU64,
    misses: AtomicU64,
    returns: AtomicU64,
    drops: AtomicU64,
}

impl PoolStats {
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_return(&self) {
        self.returns.fetch_add(1, Ordering::Relaxed);
    }

    fn record_drop(&self) {
        self.drops.fetch_add(1, Ordering::Relaxed);
    }

    /// Acquisitions served by an idle context
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Acquisitions that had to build a new context
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Releases that put the context back for reuse
    #[must_use]
    pub fn returns(&self) -> u64 {
        self.returns.load(Ordering::Relaxed)
    }

    /// Releases discarded because the pool was full
    #[must_use]
    pub fn drops(&self) -> u64 {
        self.drops.load(Ordering::Relaxed)
    }
}

type Factory = Box<dyn Fn() -> Context + Send + Sync>;

/// Concurrent cache of reusable [`Context`] values.
pub struct ContextPool {
    idle: Mutex<Vec<Context>>,
    factory: Factory,
    config: PoolConfig,
    stats: PoolStats,
}

impl fmt::Debug for ContextPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextPool")
            .field("idle", &self.idle())
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish()
    }
}

impl Default for ContextPool {
    fn default() -> Self {
        Self::with_config(PoolConfig::default())
    }
}

impl ContextPool {
    /// Create a pool that builds contexts with `factory` when none are idle.
    pub fn new<F>(config: PoolConfig, factory: F) -> Self
    where
        F: Fn() -> Context + Send + Sync + 'static,
    {
        let idle = if config.pre_warm {
            (0..config.initial_size).map(|_| factory()).collect()
        } else {
            Vec::with_capacity(config.initial_size)
        };
        Self {
            idle: Mutex::new(idle),
            factory: Box::new(factory),
            config,
            stats: PoolStats::default(),
        }
    }

    /// Create a pool using [`Context::new`] as the factory.
    #[must_use]
    pub fn with_config(config: PoolConfig) -> Self {
        Self::new(config, Context::new)
    }

    /// Check out a context reset for `incoming`.
    ///
    /// Never blocks beyond the internal mutex; an empty pool falls back to the
    /// factory.
    pub fn acquire(&self, incoming: &IncomingRequest<'_>) -> PooledContext<'_> {
        let recycled = self.idle.lock().pop();
        let mut ctx = match recycled {
            Some(ctx) => {
                self.stats.record_hit();
                ctx
            }
            None => {
                self.stats.record_miss();
                debug!(idle = 0, "Context pool empty - creating context");
                (self.factory)()
            }
        };
        ctx.reset(incoming);
        PooledContext {
            ctx: Some(ctx),
            pool: self,
        }
    }

    fn release(&self, mut ctx: Context) {
        ctx.shed();
        let mut idle = self.idle.lock();
        if idle.len() < self.config.max_size {
            idle.push(ctx);
            self.stats.record_return();
        } else {
            self.stats.record_drop();
        }
    }

    #[must_use]
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    #[must_use]
    pub fn config(&self) -> PoolConfig {
        self.config
    }

    /// Number of contexts currently idle in the pool
    #[must_use]
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }
}

/// Exclusive handle to a checked-out [`Context`].
///
/// Dropping the guard returns the context to its pool.
pub struct PooledContext<'a> {
    ctx: Option<Context>,
    pool: &'a ContextPool,
}

impl Deref for PooledContext<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        // `ctx` is only taken in `drop`.
        match &self.ctx {
            Some(ctx) => ctx,
            None => unreachable!("pooled context used after release"),
        }
    }
}

impl DerefMut for PooledContext<'_> {
    fn deref_mut(&mut self) -> &mut Context {
        match &mut self.ctx {
            Some(ctx) => ctx,
            None => unreachable!("pooled context used after release"),
        }
    }
}

impl Drop for PooledContext<'_> {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            self.pool.release(ctx);
        }
    }
}
