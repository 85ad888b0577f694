/*!
 * Monitoring
 * Structured tracing for storage operations
 */

mod tracer;

pub use tracer::{generate_trace_id, init_tracing, OperationSpan};
