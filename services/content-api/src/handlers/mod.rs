//! REST API handlers

pub mod checkout;
pub mod generate;
pub mod health;
pub mod submissions;
pub mod subscription;
pub mod usage;
pub mod webhook;

pub use checkout::*;
pub use generate::*;
pub use health::*;
pub use submissions::*;
pub use subscription::*;
pub use usage::*;
pub use webhook::*;

use std::time::Instant;

/// Record an operation duration with a result label
#[inline]
pub(crate) fn record_op_duration(operation: &'static str, start: Instant, success: bool) {
    let result = if success { "ok" } else { "err" };
    metrics::histogram!(
        "quill_operation_duration_seconds",
        "operation" => operation,
        "result" => result
    )
    .record(start.elapsed().as_secs_f64());
}
