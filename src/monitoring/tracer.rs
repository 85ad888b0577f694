/*!
 * Structured Tracing
 * Subscriber setup and timed spans for storage operations
 */

use std::time::Instant;
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

use crate::core::limits::SYNC_SLOW_THRESHOLD_MS;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - BEEKEEPER_TRACE_JSON: Enable JSON output (default: false)
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("BEEKEEPER_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init();
        info!("Structured tracing initialized with JSON output");
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .init();
        info!("Structured tracing initialized");
    }
}

/// Generate a unique trace ID for correlating one operation's events
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Timed span around one storage operation
///
/// Logs completion on drop and warns when the operation ran past
/// `SYNC_SLOW_THRESHOLD_MS`. Never entered across an await point.
pub struct OperationSpan {
    span: tracing::Span,
    start: Instant,
    operation: &'static str,
    trace_id: String,
}

impl OperationSpan {
    pub fn new(operation: &'static str) -> Self {
        let trace_id = generate_trace_id();

        let span = span!(
            Level::DEBUG,
            "storage_op",
            trace_id = %trace_id,
            operation = operation,
            duration_ms = tracing::field::Empty,
            result = tracing::field::Empty,
            error = tracing::field::Empty,
        );

        debug!(parent: &span, operation = operation, trace_id = %trace_id, "operation started");

        Self {
            span,
            start: Instant::now(),
            operation,
            trace_id,
        }
    }

    /// Get the trace ID for this operation
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Record the operation result
    pub fn record_result(&self, success: bool) {
        self.span
            .record("result", if success { "success" } else { "error" });
    }

    /// Record an error
    pub fn record_error(&self, error: &dyn std::fmt::Display) {
        self.span.record("error", tracing::field::display(error));
        self.span.record("result", "error");
    }
}

impl Drop for OperationSpan {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        self.span.record("duration_ms", elapsed_ms);

        if elapsed_ms > SYNC_SLOW_THRESHOLD_MS {
            warn!(
                parent: &self.span,
                trace_id = %self.trace_id,
                operation = self.operation,
                duration_ms = elapsed_ms,
                slow = true,
                "slow storage operation"
            );
        } else {
            debug!(
                parent: &self.span,
                trace_id = %self.trace_id,
                operation = self.operation,
                duration_ms = elapsed_ms,
                "operation completed"
            );
        }
    }
}
