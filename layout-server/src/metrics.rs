//! Prometheus metrics for the designer server.
//!
//! Provides metrics collection and a Prometheus-compatible `/metrics` endpoint.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

const OPERATIONS_TOTAL: &str = "menu_layout_operations_total";
const SESSIONS_ACTIVE: &str = "menu_layout_sessions_active";
const SAVES_TOTAL: &str = "menu_layout_saves_total";
const RECONCILE_SECTIONS_TOTAL: &str = "menu_layout_reconcile_sections_total";
const UNPLACED_CATEGORIES_TOTAL: &str = "menu_layout_unplaced_categories_total";
const VALIDATION_FAILURES_TOTAL: &str = "menu_layout_validation_failures_total";

/// Initialize metrics and return the Prometheus handle.
///
/// # Errors
///
/// Returns an error if the Prometheus recorder cannot be installed
/// (e.g., if another recorder is already installed).
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Record a designer operation.
///
/// # Arguments
///
/// * `operation` - Operation name (add_section, drag, set_theme, ...)
/// * `success` - Whether the engine accepted it
pub fn record_operation(operation: &str, success: bool) {
    counter!(
        OPERATIONS_TOTAL,
        "operation" => operation.to_string(),
        "success" => success.to_string()
    )
    .increment(1);
}

/// Update the number of open designer sessions.
#[allow(clippy::cast_precision_loss)]
pub fn set_sessions_active(count: usize) {
    gauge!(SESSIONS_ACTIVE).set(count as f64);
}

/// Record a layout save attempt.
///
/// # Arguments
///
/// * `outcome` - "success", "conflict" or "failure"
pub fn record_save(outcome: &str) {
    counter!(SAVES_TOTAL, "outcome" => outcome.to_string()).increment(1);
}

/// Record the effect of one reconciliation.
pub fn record_reconcile(added: usize, pruned: usize, unplaced: usize) {
    counter!(RECONCILE_SECTIONS_TOTAL, "change" => "added").increment(added as u64);
    counter!(RECONCILE_SECTIONS_TOTAL, "change" => "pruned").increment(pruned as u64);
    counter!(UNPLACED_CATEGORIES_TOTAL).increment(unplaced as u64);
}

/// Record an input validation failure.
///
/// # Arguments
///
/// * `validation_type` - Type of validation that failed (menu_key, section_id, content, ...)
pub fn record_validation_failure(validation_type: &str) {
    counter!(
        VALIDATION_FAILURES_TOTAL,
        "type" => validation_type.to_string()
    )
    .increment(1);
}
