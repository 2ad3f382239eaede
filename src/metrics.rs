//! Prometheus metrics registry and instruments.

use lazy_static::lazy_static;
use prometheus::{IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref LOGINS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("storybooks_logins_total", "Google sign-in attempts by outcome"),
        &["outcome"]
    ).expect("metric can be created");

    pub static ref STORY_OPERATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("storybooks_story_operations_total", "Story mutations by operation"),
        &["operation"]
    ).expect("metric can be created");

    pub static ref COMMENT_OPERATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("storybooks_comment_operations_total", "Comment mutations by operation"),
        &["operation"]
    ).expect("metric can be created");

    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("storybooks_errors_total", "Total number of errors returned to clients"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Register all instruments with [`REGISTRY`].
///
/// Call once at startup; a second registration of the same collector fails.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    REGISTRY.register(Box::new(LOGINS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(STORY_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(COMMENT_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(ERRORS_TOTAL.clone()))?;

    tracing::info!("Metrics registry initialized");
    Ok(())
}
