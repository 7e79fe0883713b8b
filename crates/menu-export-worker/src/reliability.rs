//! Export job reliability facade.
//!
//! Ties the validators, classifier, retry strategy and observability surface
//! together around an [`ExportJob`]:
//!
//! ```text
//! admit(request) -> claim(job) -> render (external)
//!                                   |-- ok  -> record_success(job, bytes)
//!                                   `-- err -> record_failure(job, failure)
//! ```
//!
//! Each step performs the job transition first and only then emits logs and
//! metrics, so a rejected transition leaves no trace in the counters.

use std::time::Duration;

use menu_export_models::{ExportJob, ExportRequest, OutputValidation, RetryDecision, ValidationResult};
use menu_export_validation::{OutputValidator, RequestValidator};
use tracing::{info, warn};

use crate::circuit::{CircuitRegistry, ServiceKind};
use crate::config::ReliabilityConfig;
use crate::error::WorkerResult;
use crate::failure::Failure;
use crate::logging::ExportJobLogger;
use crate::metrics::{self, ActiveRenderGuard};
use crate::retry::RetryStrategy;

/// Where a job ended up after a render attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Artifact accepted; job is completed
    Completed(OutputValidation),
    /// Job returned to pending with a backoff delay
    Retrying(RetryDecision),
    /// Job failed terminally
    Failed(RetryDecision),
}

impl JobOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobOutcome::Retrying(_))
    }

    pub fn decision(&self) -> Option<&RetryDecision> {
        match self {
            JobOutcome::Completed(_) => None,
            JobOutcome::Retrying(decision) | JobOutcome::Failed(decision) => Some(decision),
        }
    }
}

/// Reliability layer shared by all workers of a process.
#[derive(Debug)]
pub struct ExportReliability {
    config: ReliabilityConfig,
    requests: RequestValidator,
    outputs: OutputValidator,
    strategy: RetryStrategy,
    circuits: CircuitRegistry,
}

impl ExportReliability {
    pub fn new(config: ReliabilityConfig) -> WorkerResult<Self> {
        let strategy = RetryStrategy::new(config.retry.clone())?;
        Ok(Self {
            requests: RequestValidator::new(config.limits.clone()),
            outputs: OutputValidator::from(&config.limits),
            circuits: CircuitRegistry::new(config.circuit_failure_threshold),
            strategy,
            config,
        })
    }

    pub fn from_env() -> WorkerResult<Self> {
        Self::new(ReliabilityConfig::from_env())
    }

    pub fn config(&self) -> &ReliabilityConfig {
        &self.config
    }

    pub fn strategy(&self) -> &RetryStrategy {
        &self.strategy
    }

    pub fn request_validator(&self) -> &RequestValidator {
        &self.requests
    }

    pub fn output_validator(&self) -> &OutputValidator {
        &self.outputs
    }

    pub fn circuits(&self) -> &CircuitRegistry {
        &self.circuits
    }

    /// Gate an incoming request before it becomes a job.
    pub fn admit(&self, request: &ExportRequest) -> ValidationResult {
        let result = self.requests.validate_request(request);
        let export_type = request.export_type.as_deref().unwrap_or("unknown");

        if !result.valid {
            metrics::record_request_rejected(export_type);
            warn!(
                export_type = %export_type,
                errors = ?result.errors,
                "Export request rejected"
            );
        } else if result.has_warnings() {
            info!(
                export_type = %export_type,
                warnings = ?result.warnings,
                "Export request admitted with warnings"
            );
        }

        result
    }

    /// Claim a pending job for `worker_id` and start tracking the render.
    ///
    /// Hold the returned guard for the duration of the render.
    pub fn claim(&self, job: &mut ExportJob, worker_id: &str) -> WorkerResult<ActiveRenderGuard> {
        job.claim(worker_id)?;

        let logger = ExportJobLogger::new(job);
        metrics::record_job_claimed(job.export_type.as_str());
        logger.claimed(worker_id, job.retry_count);
        logger.started(job.retry_count.saturating_add(1));

        Ok(ActiveRenderGuard::start())
    }

    /// Validate a rendered artifact and complete the job, or route the
    /// rejected artifact through the failure path.
    ///
    /// Only an accepted artifact counts as a renderer success.
    pub fn record_success(
        &self,
        job: &mut ExportJob,
        artifact: &[u8],
        elapsed: Duration,
    ) -> WorkerResult<JobOutcome> {
        let export_type = job.export_type.as_str();
        let validation = self.outputs.validate_output(
            Some(artifact),
            export_type,
            job.image_format.map(|f| f.as_str()),
        );

        if !validation.is_valid() {
            let failure = Failure::from_output_validation(&validation);
            let outcome = self.apply_failure(job, &failure, elapsed)?;
            metrics::record_output_validation_failure(export_type);
            return Ok(outcome);
        }

        job.complete()?;
        self.circuits.record_success(ServiceKind::Renderer);

        let logger = ExportJobLogger::new(job);
        for warning in validation.warnings() {
            logger.validation_warning(warning);
        }
        metrics::record_job_completed(export_type, elapsed.as_secs_f64());
        logger.completed(validation.file_size, elapsed);

        Ok(JobOutcome::Completed(validation))
    }

    /// Record a failed render attempt and move the job to its next state.
    pub fn record_failure(
        &self,
        job: &mut ExportJob,
        failure: &Failure,
        elapsed: Duration,
    ) -> WorkerResult<JobOutcome> {
        let outcome = self.apply_failure(job, failure, elapsed)?;

        if let (Some(service), Some(decision)) = (failure.service, outcome.decision()) {
            if decision.category().is_retryable() {
                self.circuits.record_failure(service);
            }
        }

        Ok(outcome)
    }

    /// Publish the current queue depth.
    pub fn set_queue_depth(&self, depth: u64) {
        metrics::set_queue_depth(depth);
    }

    fn apply_failure(
        &self,
        job: &mut ExportJob,
        failure: &Failure,
        elapsed: Duration,
    ) -> WorkerResult<JobOutcome> {
        let attempt_retry_count = job.retry_count;
        let decision = self.strategy.decide(failure, attempt_retry_count);
        let user_message = decision.classification.user_message.clone();

        if decision.should_retry {
            job.schedule_retry(decision.retry_delay_seconds, user_message)?;
        } else {
            job.fail(user_message)?;
        }

        let logger = ExportJobLogger::new(job);
        let export_type = job.export_type.as_str();
        let category = decision.category().as_str();

        logger.failed(&decision.classification, attempt_retry_count, elapsed);
        metrics::record_job_failed(export_type, category, elapsed.as_secs_f64());

        if decision.should_retry {
            metrics::record_job_retried(export_type, category, decision.retry_delay_seconds);
            logger.retrying(&decision, job.retry_count);
            Ok(JobOutcome::Retrying(decision))
        } else {
            metrics::record_job_terminal(export_type, category);
            logger.terminal_failure(&decision, attempt_retry_count);
            Ok(JobOutcome::Failed(decision))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use menu_export_models::{ErrorCategory, ImageFormat, JobStatus};
    use menu_export_validation::{JPEG_SOI, PDF_SIGNATURE};
    use metrics_exporter_prometheus::PrometheusBuilder;

    fn reliability() -> ExportReliability {
        ExportReliability::new(ReliabilityConfig::default()).unwrap()
    }

    fn claimed_pdf(reliability: &ExportReliability) -> ExportJob {
        let mut job = ExportJob::new_pdf("<h1>Menu</h1>");
        drop(reliability.claim(&mut job, "worker-1").unwrap());
        job
    }

    fn pdf_bytes() -> Vec<u8> {
        let mut bytes = PDF_SIGNATURE.to_vec();
        bytes.resize(2048, b'0');
        bytes
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = ReliabilityConfig::default();
        config.retry.base_delay_secs = 0;
        assert!(ExportReliability::new(config).is_err());
    }

    #[test]
    fn test_admit() {
        let reliability = reliability();
        assert!(reliability.admit(&ExportRequest::pdf("<p>ok</p>")).valid);

        let rejected = reliability.admit(&ExportRequest {
            export_type: Some("PDF".into()),
            html: "<p>ok</p>".into(),
            image_format: None,
        });
        assert!(!rejected.valid);
        assert_eq!(rejected.errors.len(), 1);
    }

    #[test]
    fn test_success_completes_job() {
        let reliability = reliability();
        let mut job = claimed_pdf(&reliability);

        let outcome = reliability
            .record_success(&mut job, &pdf_bytes(), Duration::from_millis(800))
            .unwrap();

        assert!(matches!(outcome, JobOutcome::Completed(ref v) if v.format_verified));
        assert!(outcome.is_terminal());
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[test]
    fn test_bad_artifact_fails_as_validation() {
        let reliability = reliability();
        let mut job = claimed_pdf(&reliability);

        let outcome = reliability
            .record_success(&mut job, b"<html>oops</html>", Duration::from_secs(1))
            .unwrap();

        let JobOutcome::Failed(decision) = outcome else {
            panic!("expected terminal failure, got {:?}", outcome);
        };
        assert_eq!(decision.category(), ErrorCategory::Validation);
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(
            job.error_message.as_deref(),
            Some(ErrorCategory::Validation.user_message())
        );
    }

    #[test]
    fn test_image_job_uses_declared_format() {
        let reliability = reliability();
        let mut job = ExportJob::new_image("<p/>", ImageFormat::Png);
        drop(reliability.claim(&mut job, "worker-1").unwrap());

        let mut jpeg = JPEG_SOI.to_vec();
        jpeg.resize(512, 0);
        let outcome = reliability
            .record_success(&mut job, &jpeg, Duration::from_secs(1))
            .unwrap();

        assert!(matches!(outcome, JobOutcome::Failed(_)));
    }

    #[test]
    fn test_transient_failure_schedules_retry() {
        let reliability = reliability();
        let mut job = claimed_pdf(&reliability);

        let outcome = reliability
            .record_failure(
                &mut job,
                &Failure::new("ETIMEDOUT: Connection timed out"),
                Duration::from_secs(2),
            )
            .unwrap();

        let JobOutcome::Retrying(decision) = outcome else {
            panic!("expected retry, got {:?}", outcome);
        };
        assert_eq!(decision.retry_delay_seconds, 30);
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.retry_count, 1);
        assert!(job.next_attempt_at.is_some());
        assert!(!job.error_message.as_deref().unwrap_or_default().contains("ETIMEDOUT"));
    }

    #[test]
    fn test_failure_on_unclaimed_job_is_rejected() {
        let reliability = reliability();
        let mut job = ExportJob::new_pdf("<p/>");

        let result = reliability.record_failure(&mut job, &Failure::new("ECONNRESET"), Duration::ZERO);
        assert!(result.is_err());
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.retry_count, 0);
    }

    #[test]
    fn test_service_failures_feed_circuit() {
        let mut config = ReliabilityConfig::default();
        config.circuit_failure_threshold = 2;
        let reliability = ExportReliability::new(config).unwrap();

        for _ in 0..2 {
            let mut job = claimed_pdf(&reliability);
            reliability
                .record_failure(
                    &mut job,
                    &Failure::new("Upload failed: SlowDown").with_service(ServiceKind::Storage),
                    Duration::ZERO,
                )
                .unwrap();
        }
        assert!(reliability.circuits().is_open(ServiceKind::Storage));

        // Permanent failures say nothing about service health
        let mut job = claimed_pdf(&reliability);
        reliability
            .record_failure(
                &mut job,
                &Failure::new("Menu not found").with_service(ServiceKind::Database),
                Duration::ZERO,
            )
            .unwrap();
        assert_eq!(reliability.circuits().breaker(ServiceKind::Database).failure_count(), 0);
    }

    #[test]
    fn test_rejected_artifact_keeps_renderer_failures() {
        let reliability = reliability();
        let mut job = claimed_pdf(&reliability);
        reliability
            .record_failure(
                &mut job,
                &Failure::new("Failed to launch the browser process")
                    .with_service(ServiceKind::Renderer),
                Duration::ZERO,
            )
            .unwrap();
        job.next_attempt_at = None;
        drop(reliability.claim(&mut job, "worker-2").unwrap());

        reliability
            .record_success(&mut job, b"<html>oops</html>", Duration::ZERO)
            .unwrap();
        assert_eq!(reliability.circuits().breaker(ServiceKind::Renderer).failure_count(), 1);

        let mut job = claimed_pdf(&reliability);
        reliability
            .record_success(&mut job, &pdf_bytes(), Duration::ZERO)
            .unwrap();
        assert_eq!(reliability.circuits().breaker(ServiceKind::Renderer).failure_count(), 0);
    }

    #[test]
    fn test_admit_counts_rejections() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let reliability = reliability();

        ::metrics::with_local_recorder(&recorder, || {
            reliability.admit(&ExportRequest::pdf("<p>ok</p>"));
            reliability.admit(&ExportRequest {
                export_type: Some("PDF".into()),
                html: "<p>ok</p>".into(),
                image_format: None,
            });
            reliability.admit(&ExportRequest {
                export_type: None,
                html: String::new(),
                image_format: None,
            });
        });

        let rendered = handle.render();
        assert!(rendered.contains("menu_export_request_rejections_total{type=\"PDF\"} 1"));
        assert!(rendered.contains("menu_export_request_rejections_total{type=\"unknown\"} 1"));
        assert!(!rendered.contains("menu_export_request_rejections_total{type=\"pdf\"}"));
    }

    #[test]
    fn test_rejected_artifact_metrics() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let reliability = reliability();

        ::metrics::with_local_recorder(&recorder, || {
            let mut job = claimed_pdf(&reliability);
            reliability
                .record_success(&mut job, b"<html>oops</html>", Duration::from_secs(1))
                .unwrap();
        });

        let rendered = handle.render();
        assert!(rendered.contains("menu_export_output_validation_failures_total{type=\"pdf\"} 1"));
        assert!(rendered
            .contains("menu_export_jobs_failed_total{type=\"pdf\",category=\"validation\"} 1"));
        assert!(rendered
            .contains("menu_export_jobs_terminal_total{type=\"pdf\",category=\"validation\"} 1"));
        assert!(!rendered.contains("menu_export_jobs_completed_total"));
        assert!(!rendered.contains("menu_export_jobs_retried_total"));
    }

    #[test]
    fn test_failure_outcome_metrics() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let reliability = reliability();

        ::metrics::with_local_recorder(&recorder, || {
            let mut retried = claimed_pdf(&reliability);
            reliability
                .record_failure(&mut retried, &Failure::new("ECONNRESET"), Duration::from_secs(1))
                .unwrap();

            let mut terminal = claimed_pdf(&reliability);
            reliability
                .record_failure(&mut terminal, &Failure::new("Menu not found"), Duration::from_secs(1))
                .unwrap();

            let mut completed = claimed_pdf(&reliability);
            reliability
                .record_success(&mut completed, &pdf_bytes(), Duration::from_secs(2))
                .unwrap();
        });

        let rendered = handle.render();
        assert!(rendered.contains("menu_export_jobs_claimed_total{type=\"pdf\"} 3"));
        assert!(rendered
            .contains("menu_export_jobs_retried_total{type=\"pdf\",category=\"transient\"} 1"));
        assert!(rendered.contains("menu_export_retry_delay_seconds_count{category=\"transient\"} 1"));
        assert!(rendered.contains("menu_export_retry_delay_seconds_sum{category=\"transient\"} 30"));
        assert!(rendered
            .contains("menu_export_jobs_terminal_total{type=\"pdf\",category=\"permanent\"} 1"));
        assert!(!rendered.contains("menu_export_jobs_retried_total{type=\"pdf\",category=\"permanent\"}"));
        assert!(!rendered.contains("menu_export_jobs_terminal_total{type=\"pdf\",category=\"transient\"}"));
        assert!(rendered.contains("menu_export_jobs_completed_total{type=\"pdf\"} 1"));
    }

    #[test]
    fn test_queue_depth_gauge() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let reliability = reliability();

        ::metrics::with_local_recorder(&recorder, || {
            reliability.set_queue_depth(12);
            reliability.set_queue_depth(7);
        });

        assert!(handle.render().contains("menu_export_queue_depth 7"));
    }
}
