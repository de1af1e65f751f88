//! Per-operation counters for the order API.
//!
//! Recorded through the `metrics` facade; the embedding process decides
//! whether and where to export them.

use metrics::counter;

/// Counter of handled requests, labelled by operation.
pub const OPERATIONS_TOTAL: &str = "order_api_operations_total";

/// Counter of failed requests, labelled by operation.
pub const OPERATION_ERRORS_TOTAL: &str = "order_api_operation_errors_total";

/// Record a request for `operation`.
pub fn record_operation(operation: &'static str) {
    counter!(OPERATIONS_TOTAL, "operation" => operation).increment(1);
}

/// Record a failed request for `operation`.
pub fn record_error(operation: &'static str) {
    counter!(OPERATION_ERRORS_TOTAL, "operation" => operation).increment(1);
}
