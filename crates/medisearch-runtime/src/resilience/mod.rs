//! Resilience patterns for medisearch-runtime.
//!
//! Generation calls are retried with bounded exponential backoff. Per-call
//! and per-request timeouts live with their callers (orchestrator, pipeline).

mod retry;

pub use retry::RetryingProvider;
