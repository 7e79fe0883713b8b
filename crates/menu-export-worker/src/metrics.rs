//! Export job metrics.
//!
//! Provides standardized metrics for monitoring export workers:
//! - Job counters by export type and failure category
//! - Render duration and retry delay histograms
//! - Queue depth, active render and circuit breaker gauges
//!
//! Recording goes through the `metrics` facade, so concurrent updates from
//! many workers are aggregated by the installed recorder.

use metrics::{counter, gauge, histogram};

// =============================================================================
// Metric Names
// =============================================================================

/// Metric name constants for consistency.
pub mod names {
    pub const JOBS_CLAIMED_TOTAL: &str = "menu_export_jobs_claimed_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "menu_export_jobs_completed_total";
    /// Every failed attempt, retried or not.
    pub const JOBS_FAILED_TOTAL: &str = "menu_export_jobs_failed_total";
    pub const JOBS_RETRIED_TOTAL: &str = "menu_export_jobs_retried_total";
    pub const JOBS_TERMINAL_TOTAL: &str = "menu_export_jobs_terminal_total";
    pub const REQUEST_REJECTIONS_TOTAL: &str = "menu_export_request_rejections_total";
    pub const OUTPUT_VALIDATION_FAILURES_TOTAL: &str =
        "menu_export_output_validation_failures_total";

    pub const RENDER_DURATION_SECONDS: &str = "menu_export_render_duration_seconds";
    pub const RETRY_DELAY_SECONDS: &str = "menu_export_retry_delay_seconds";

    pub const QUEUE_DEPTH: &str = "menu_export_queue_depth";
    pub const ACTIVE_RENDERS: &str = "menu_export_active_renders";
    /// 0 = closed, 1 = open
    pub const CIRCUIT_OPEN: &str = "menu_export_circuit_open";
}

// =============================================================================
// Recording Functions
// =============================================================================

pub fn record_job_claimed(export_type: &str) {
    counter!(names::JOBS_CLAIMED_TOTAL, "type" => export_type.to_string()).increment(1);
}

/// Record a completed job and its render time.
pub fn record_job_completed(export_type: &str, duration_secs: f64) {
    counter!(names::JOBS_COMPLETED_TOTAL, "type" => export_type.to_string()).increment(1);
    histogram!(
        names::RENDER_DURATION_SECONDS,
        "type" => export_type.to_string(),
        "outcome" => "completed"
    )
    .record(duration_secs);
}

/// Record a failed attempt and its render time.
pub fn record_job_failed(export_type: &str, category: &str, duration_secs: f64) {
    counter!(
        names::JOBS_FAILED_TOTAL,
        "type" => export_type.to_string(),
        "category" => category.to_string()
    )
    .increment(1);
    histogram!(
        names::RENDER_DURATION_SECONDS,
        "type" => export_type.to_string(),
        "outcome" => "failed"
    )
    .record(duration_secs);
}

pub fn record_job_retried(export_type: &str, category: &str, delay_secs: u64) {
    counter!(
        names::JOBS_RETRIED_TOTAL,
        "type" => export_type.to_string(),
        "category" => category.to_string()
    )
    .increment(1);
    histogram!(names::RETRY_DELAY_SECONDS, "category" => category.to_string())
        .record(delay_secs as f64);
}

pub fn record_job_terminal(export_type: &str, category: &str) {
    counter!(
        names::JOBS_TERMINAL_TOTAL,
        "type" => export_type.to_string(),
        "category" => category.to_string()
    )
    .increment(1);
}

/// Record a request rejected before enqueue.
///
/// `export_type` is the raw requested value, or `unknown`.
pub fn record_request_rejected(export_type: &str) {
    counter!(names::REQUEST_REJECTIONS_TOTAL, "type" => export_type.to_string()).increment(1);
}

pub fn record_output_validation_failure(export_type: &str) {
    counter!(
        names::OUTPUT_VALIDATION_FAILURES_TOTAL,
        "type" => export_type.to_string()
    )
    .increment(1);
}

/// Update queue depth gauge.
pub fn set_queue_depth(depth: u64) {
    gauge!(names::QUEUE_DEPTH).set(depth as f64);
}

/// Update circuit state gauge for a dependent service.
pub fn set_circuit_open(service: &str, open: bool) {
    gauge!(names::CIRCUIT_OPEN, "service" => service.to_string())
        .set(if open { 1.0 } else { 0.0 });
}

/// Tracks one in-flight render on the active renders gauge.
///
/// The gauge is decremented on drop, so an unwinding render still releases
/// its slot.
#[derive(Debug)]
#[must_use = "dropping the guard immediately ends the render"]
pub struct ActiveRenderGuard {
    _private: (),
}

impl ActiveRenderGuard {
    pub fn start() -> Self {
        gauge!(names::ACTIVE_RENDERS).increment(1.0);
        Self { _private: () }
    }
}

impl Drop for ActiveRenderGuard {
    fn drop(&mut self) {
        gauge!(names::ACTIVE_RENDERS).decrement(1.0);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn test_metric_names() {
        for name in [
            names::JOBS_CLAIMED_TOTAL,
            names::JOBS_FAILED_TOTAL,
            names::RENDER_DURATION_SECONDS,
            names::CIRCUIT_OPEN,
        ] {
            assert!(name.starts_with("menu_export_"));
        }
    }

    #[test]
    fn test_counters_are_labelled() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_job_claimed("pdf");
            record_job_claimed("pdf");
            record_job_failed("image", "transient", 1.5);
            record_job_terminal("image", "permanent");
        });

        let rendered = handle.render();
        assert!(rendered.contains("menu_export_jobs_claimed_total{type=\"pdf\"} 2"));
        assert!(rendered
            .contains("menu_export_jobs_failed_total{type=\"image\",category=\"transient\"} 1"));
        assert!(rendered
            .contains("menu_export_jobs_terminal_total{type=\"image\",category=\"permanent\"} 1"));
        assert!(rendered.contains(names::RENDER_DURATION_SECONDS));
    }

    #[test]
    fn test_active_render_guard_balances() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            let first = ActiveRenderGuard::start();
            {
                let _second = ActiveRenderGuard::start();
            }
            drop(first);
        });

        let rendered = handle.render();
        let line = rendered
            .lines()
            .find(|l| l.starts_with(names::ACTIVE_RENDERS))
            .expect("gauge rendered");
        assert!(line.ends_with(" 0"), "unexpected gauge line: {}", line);
    }
}
