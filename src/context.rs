//! Explicit parallel-execution context.
//!
//! Every data-parallel pass in the crate runs inside an [`ExecContext`]: a
//! dedicated rayon pool created once by the caller and handed to each
//! operation. [`ExecContext::global`] gives a lazily built process-wide
//! default for callers that do not want to manage a pool themselves.

use std::sync::Arc;

use once_cell::sync::Lazy;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};

use crate::multicut_error::MulticutError;

/// Settings for building an [`ExecContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Number of worker threads; `None` lets rayon pick (one per logical core).
    pub num_threads: Option<usize>,
    /// Prefix for worker thread names.
    pub thread_name_prefix: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            thread_name_prefix: "gaec-worker".to_string(),
        }
    }
}

/// Handle to the worker pool all kernels run on. Cheap to clone.
#[derive(Clone)]
pub struct ExecContext {
    pool: Arc<ThreadPool>,
}

static GLOBAL: Lazy<ExecContext> = Lazy::new(|| {
    ExecContext::new(&ContextConfig::default()).expect("failed to build default worker pool")
});

impl ExecContext {
    /// Build a new context with its own worker pool.
    pub fn new(cfg: &ContextConfig) -> Result<Self, MulticutError> {
        if cfg.num_threads == Some(0) {
            return Err(MulticutError::InvalidConfig(
                "num_threads must be positive".into(),
            ));
        }
        let prefix = cfg.thread_name_prefix.clone();
        let mut builder = ThreadPoolBuilder::new().thread_name(move |i| format!("{prefix}-{i}"));
        if let Some(n) = cfg.num_threads {
            builder = builder.num_threads(n);
        }
        let pool = builder
            .build()
            .map_err(|e| MulticutError::InvalidConfig(e.to_string()))?;
        log::debug!(
            "created execution context with {} worker threads",
            pool.current_num_threads()
        );
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Shared process-wide context with default settings, built on first use.
    ///
    /// # Panics
    /// If rayon cannot spawn the default worker pool on first use.
    pub fn global() -> &'static ExecContext {
        &GLOBAL
    }

    /// Run `op` on this context's pool and wait for it to finish.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl std::fmt::Debug for ExecContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecContext")
            .field("num_threads", &self.num_threads())
            .finish()
    }
}
