//! Orchestrates one instance-acquisition run.
//!
//! Each run is expected to be triggered by an external scheduler. The
//! orchestrator checks whether an instance of the target shape already
//! exists, otherwise attempts exactly one launch, classifies the result,
//! and delivers exactly one notification describing it. Failures that
//! cannot be classified into an [`Outcome`] abort the run with a
//! [`LaunchError`] and no notification.

use std::time::Duration;

use chrono::Local;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::backend::{Backend, ComputeError, InstanceSummary, LaunchedInstance, ServiceError};
use crate::config::{ConfigError, LauncherConfig};
use crate::notify::{Attachment, Notifier, NotifyError};
use crate::outcome::{
    ERROR_REPORT_FILE_NAME, ErrorClass, Outcome, classify_service_error, error_report,
};
use crate::ssh_key::{SshKeyError, load_public_key};

/// Pause taken after the provider throttles a launch attempt, long enough
/// for the per-minute request quota to reset.
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(60);

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors that abort a run before it produces an [`Outcome`].
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Raised when a compute call fails without a classifiable service
    /// response, e.g. a connection failure.
    #[error("compute request failed: {0}")]
    Backend(#[source] ComputeError),
    /// Raised when the SSH public key cannot be read.
    #[error(transparent)]
    SshKey(#[from] SshKeyError),
    /// Raised when the configuration cannot produce a launch request.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Raised when a notification cannot be delivered.
    #[error("notification failed: {0}")]
    Notify(#[from] NotifyError),
    /// Raised when the diagnostic report cannot be serialised.
    #[error("failed to encode diagnostic report: {0}")]
    Report(#[from] serde_json::Error),
}

/// Runs the acquisition workflow against injected backend and notifier
/// implementations.
#[derive(Debug)]
pub struct LaunchOrchestrator<B, N> {
    backend: B,
    notifier: N,
    rate_limit_backoff: Duration,
}

impl<B, N> LaunchOrchestrator<B, N>
where
    B: Backend,
    N: Notifier,
{
    /// Creates an orchestrator with the default rate-limit backoff.
    #[must_use]
    pub const fn new(backend: B, notifier: N) -> Self {
        Self {
            backend,
            notifier,
            rate_limit_backoff: RATE_LIMIT_BACKOFF,
        }
    }

    /// Overrides the pause taken after a throttled launch attempt.
    #[must_use]
    pub const fn with_rate_limit_backoff(mut self, backoff: Duration) -> Self {
        self.rate_limit_backoff = backoff;
        self
    }

    /// Runs one acquisition attempt and reports its outcome.
    ///
    /// The happy path launches an instance; every other classified result
    /// (already present, capacity exhausted, throttled, unexpected provider
    /// error) also counts as a completed run. Exactly one notification is
    /// sent per completed run.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError`] when the run aborts without a classified
    /// outcome: transport failures, an unreadable SSH key, configuration
    /// that cannot form a launch request, or an undeliverable notification.
    pub async fn execute(&self, config: &LauncherConfig) -> Result<Outcome, LaunchError> {
        match self.backend.list_instances().await {
            Ok(instances) => {
                if shape_exists(&instances, &config.instance_shape) {
                    return self.report_already_exists(&config.instance_shape).await;
                }
            }
            Err(ComputeError::Service(service_error)) => {
                return self.report_unexpected(*service_error).await;
            }
            Err(other) => return Err(LaunchError::Backend(other)),
        }

        let public_key = load_public_key(&config.ssh_public_key_file)?;
        let request = config.launch_request(&public_key)?;

        match self.backend.launch_instance(&request).await {
            Ok(instance) => self.report_launched(instance).await,
            Err(ComputeError::Service(service_error)) => {
                match classify_service_error(&service_error) {
                    ErrorClass::CapacityExhausted => {
                        self.report_capacity_exhausted(&request.display_name, &request.shape)
                            .await
                    }
                    ErrorClass::RateLimited => self.report_rate_limited().await,
                    ErrorClass::Unexpected => self.report_unexpected(*service_error).await,
                }
            }
            Err(other) => Err(LaunchError::Backend(other)),
        }
    }

    async fn report_already_exists(&self, shape: &str) -> Result<Outcome, LaunchError> {
        warn!("a {shape} instance already exists; skipping launch");
        warn!("this process can be stopped now");
        let message = stamped(&format!(
            "A {shape} instance already exists. You can stop this process now."
        ));
        self.notifier.send(&message).await?;
        Ok(Outcome::AlreadyExists)
    }

    async fn report_launched(&self, instance: LaunchedInstance) -> Result<Outcome, LaunchError> {
        info!(
            availability_domain = %instance.availability_domain,
            display_name = %instance.display_name,
            instance_id = %instance.id,
            "instance launched"
        );
        let message = stamped(&format!(
            "Launched instance {} in {}. (ID: {})",
            instance.display_name, instance.availability_domain, instance.id
        ));
        self.notifier.send(&message).await?;
        Ok(Outcome::Launched(instance))
    }

    async fn report_capacity_exhausted(
        &self,
        display_name: &str,
        shape: &str,
    ) -> Result<Outcome, LaunchError> {
        warn!(display_name, shape, "launch failed: out of host capacity");
        let message = stamped(&format!(
            "Failed to launch instance {display_name}. \
             (InternalError(500): {shape}, Out of host capacity)"
        ));
        self.notifier.send(&message).await?;
        Ok(Outcome::CapacityExhausted)
    }

    async fn report_rate_limited(&self) -> Result<Outcome, LaunchError> {
        let wait_secs = self.rate_limit_backoff.as_secs();
        warn!("launch throttled by the provider; pausing for {wait_secs}s");
        let message = stamped(&format!(
            "Too many launch requests. Resuming in {wait_secs} seconds. (429 TooManyRequests)"
        ));
        self.notifier.send(&message).await?;
        sleep(self.rate_limit_backoff).await;
        info!("backoff over; waiting for the next scheduled run");
        Ok(Outcome::RateLimited)
    }

    async fn report_unexpected(&self, service_error: ServiceError) -> Result<Outcome, LaunchError> {
        warn!(
            operation = %service_error.operation_name,
            "run hit an unclassified provider error"
        );
        error!(
            status = %service_error.status,
            code = %service_error.code,
            request_id = %service_error.request_id,
            endpoint = %service_error.request_endpoint,
            "{}",
            service_error.message
        );
        let report = error_report(&service_error)?;
        let attachment = Attachment {
            file_name: ERROR_REPORT_FILE_NAME.to_owned(),
            bytes: report,
        };
        let message = stamped("An unexpected error occurred. Details attached.");
        self.notifier
            .send_with_attachment(&message, &attachment)
            .await?;
        Ok(Outcome::UnexpectedError(service_error))
    }
}

/// Returns true when any listed instance has exactly the target shape.
#[must_use]
pub fn shape_exists(instances: &[InstanceSummary], shape: &str) -> bool {
    instances.iter().any(|instance| instance.shape == shape)
}

/// Prefixes a notification message with the local wall-clock time.
fn stamped(message: &str) -> String {
    format!("{} | {message}", Local::now().format(TIMESTAMP_FORMAT))
}
