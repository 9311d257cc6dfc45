//! Structured logging for the node.
//!
//! Two output shapes: compact coloured lines while developing, and
//! flattened JSON when running as a mediator behind log aggregation.
//! Consensus-heavy paths run under spans carrying the unit number or the
//! contract request id, so one filter pulls the whole lifecycle of a unit
//! or request out of the stream. `RUST_LOG` overrides the configured
//! filter when set.

use ptn_types::Hash;
use tracing::Span;
use tracing_subscriber::EnvFilter;

/// Selects the output format for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact, coloured output for local development.
    Human,
    /// Flattened newline-delimited JSON for aggregation pipelines.
    Json,
}

impl LogFormat {
    pub fn from_config(s: &str) -> Self {
        match s {
            "json" => LogFormat::Json,
            _ => LogFormat::Human,
        }
    }
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global subscriber.
///
/// # Panics
///
/// Panics if a global subscriber has already been set (i.e. this function
/// was called twice in the same process).
pub fn init_logging(format: LogFormat, level: &str) {
    match format {
        LogFormat::Human => {
            tracing_subscriber::fmt()
                .with_env_filter(build_filter(level))
                .with_target(true)
                .compact()
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(build_filter(level))
                .json()
                .flatten_event(true)
                .init();
        }
    }
}

/// Span covering the acceptance of one unit; schedule bookkeeping and pool
/// reset logs nest under it.
pub fn unit_span(number: u64, hash: &Hash) -> Span {
    tracing::info_span!("unit", number, hash = %hash.short())
}

/// Span covering one contract request from submission to commit.
pub fn request_span(req_id: &Hash) -> Span {
    tracing::info_span!("request", req = %req_id.short())
}
