//! Backend abstraction for the compute operations the workflow consumes.
//!
//! The workflow needs exactly two provider operations: listing the instances
//! visible in the tenancy and launching a new instance. Implementations
//! surface provider failures either as a typed [`ServiceError`] (a structured
//! response from the provider API) or as a transport failure when no such
//! response was available.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

/// Parameters required to launch a new instance.
#[derive(Clone, Debug, PartialEq)]
pub struct LaunchRequest {
    /// Compartment the instance is created in.
    pub compartment_id: String,
    /// Availability domain targeted by the launch.
    pub availability_domain: String,
    /// Display name assigned to the new instance.
    pub display_name: String,
    /// Shape name requested (for example `VM.Standard.A1.Flex`).
    pub shape: String,
    /// Subnet the primary VNIC attaches to.
    pub subnet_id: String,
    /// Boot image identifier.
    pub image_id: String,
    /// Memory allocated to the flexible shape, in gigabytes.
    pub memory_in_gbs: f64,
    /// Number of OCPUs allocated to the flexible shape.
    pub ocpus: f64,
    /// SSH public key installed in the instance metadata.
    pub ssh_public_key: String,
}

impl LaunchRequest {
    /// Starts a builder for a [`LaunchRequest`].
    #[must_use]
    pub fn builder() -> LaunchRequestBuilder {
        LaunchRequestBuilder::new()
    }

    /// Validates the request, returning a descriptive error when a required
    /// field is missing or a numeric field is out of range.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Validation`] when any string field is empty and
    /// [`RequestError::InvalidNumber`] when a numeric field is not a positive
    /// finite value.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.compartment_id.is_empty() {
            return Err(RequestError::Validation("compartment_id".to_owned()));
        }
        if self.availability_domain.is_empty() {
            return Err(RequestError::Validation("availability_domain".to_owned()));
        }
        if self.display_name.is_empty() {
            return Err(RequestError::Validation("display_name".to_owned()));
        }
        if self.shape.is_empty() {
            return Err(RequestError::Validation("shape".to_owned()));
        }
        if self.subnet_id.is_empty() {
            return Err(RequestError::Validation("subnet_id".to_owned()));
        }
        if self.image_id.is_empty() {
            return Err(RequestError::Validation("image_id".to_owned()));
        }
        if self.ssh_public_key.is_empty() {
            return Err(RequestError::Validation("ssh_public_key".to_owned()));
        }
        require_positive(self.memory_in_gbs, "memory_in_gbs")?;
        require_positive(self.ocpus, "ocpus")?;
        Ok(())
    }
}

fn require_positive(value: f64, field: &str) -> Result<(), RequestError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(RequestError::InvalidNumber(field.to_owned()));
    }
    Ok(())
}

/// Builder for [`LaunchRequest`] that defers trimming and validation to
/// construction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LaunchRequestBuilder {
    compartment_id: String,
    availability_domain: String,
    display_name: String,
    shape: String,
    subnet_id: String,
    image_id: String,
    memory_in_gbs: f64,
    ocpus: f64,
    ssh_public_key: String,
}

impl LaunchRequestBuilder {
    /// Creates an empty builder; fields must be populated before build.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the compartment identifier.
    #[must_use]
    pub fn compartment_id(mut self, value: impl Into<String>) -> Self {
        self.compartment_id = value.into();
        self
    }

    /// Sets the availability domain.
    #[must_use]
    pub fn availability_domain(mut self, value: impl Into<String>) -> Self {
        self.availability_domain = value.into();
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn display_name(mut self, value: impl Into<String>) -> Self {
        self.display_name = value.into();
        self
    }

    /// Sets the shape name.
    #[must_use]
    pub fn shape(mut self, value: impl Into<String>) -> Self {
        self.shape = value.into();
        self
    }

    /// Sets the subnet identifier.
    #[must_use]
    pub fn subnet_id(mut self, value: impl Into<String>) -> Self {
        self.subnet_id = value.into();
        self
    }

    /// Sets the boot image identifier.
    #[must_use]
    pub fn image_id(mut self, value: impl Into<String>) -> Self {
        self.image_id = value.into();
        self
    }

    /// Sets the memory allocation in gigabytes.
    #[must_use]
    pub const fn memory_in_gbs(mut self, value: f64) -> Self {
        self.memory_in_gbs = value;
        self
    }

    /// Sets the OCPU allocation.
    #[must_use]
    pub const fn ocpus(mut self, value: f64) -> Self {
        self.ocpus = value;
        self
    }

    /// Sets the SSH public key text.
    #[must_use]
    pub fn ssh_public_key(mut self, value: impl Into<String>) -> Self {
        self.ssh_public_key = value.into();
        self
    }

    /// Builds and validates the [`LaunchRequest`], trimming string inputs.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] when validation fails.
    pub fn build(self) -> Result<LaunchRequest, RequestError> {
        let request = LaunchRequest {
            compartment_id: self.compartment_id.trim().to_owned(),
            availability_domain: self.availability_domain.trim().to_owned(),
            display_name: self.display_name.trim().to_owned(),
            shape: self.shape.trim().to_owned(),
            subnet_id: self.subnet_id.trim().to_owned(),
            image_id: self.image_id.trim().to_owned(),
            memory_in_gbs: self.memory_in_gbs,
            ocpus: self.ocpus,
            ssh_public_key: self.ssh_public_key.trim().to_owned(),
        };
        request.validate()?;
        Ok(request)
    }
}

/// Read-only view of an instance returned by the listing operation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceSummary {
    /// Provider identifier for the instance.
    pub id: String,
    /// Display name assigned at launch.
    pub display_name: String,
    /// Availability domain hosting the instance.
    pub availability_domain: String,
    /// Shape name of the instance.
    pub shape: String,
    /// Lifecycle state reported by the provider.
    pub lifecycle_state: String,
}

/// Identifiers returned by a successful launch.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LaunchedInstance {
    /// Provider identifier for the new instance.
    pub id: String,
    /// Display name assigned to the new instance.
    pub display_name: String,
    /// Availability domain the instance landed in.
    pub availability_domain: String,
}

/// Structured error payload returned by the provider API.
///
/// Produced by the backend when the provider answers a request with an error
/// response; consumed by the outcome classifier and the diagnostic report.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServiceError {
    /// HTTP status of the error response.
    pub status: u16,
    /// Provider error code (for example `TooManyRequests`).
    pub code: String,
    /// Human-readable message from the provider.
    pub message: String,
    /// Opaque request identifier for support correlation.
    pub request_id: String,
    /// Timestamp captured when the error was observed.
    pub timestamp: String,
    /// Name of the operation that failed.
    pub operation_name: String,
    /// Method and URL of the failed request.
    pub request_endpoint: String,
}

/// Errors raised while constructing a [`LaunchRequest`].
#[derive(Debug, Error, Eq, PartialEq)]
pub enum RequestError {
    /// Raised when a request is missing a required field.
    #[error("missing or empty field: {0}")]
    Validation(String),
    /// Raised when a numeric field is zero, negative, or not finite.
    #[error("field {0} must be a positive number")]
    InvalidNumber(String),
}

/// Errors raised by compute backends.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ComputeError {
    /// Raised when the provider answered with a structured error payload.
    #[error("{} returned {} {}: {}", .0.operation_name, .0.status, .0.code, .0.message)]
    Service(Box<ServiceError>),
    /// Raised when the request failed before a structured provider response
    /// was available (connect failures, body decoding, request signing).
    #[error("{operation} failed without a service response: {message}")]
    Transport {
        /// Operation that was being performed.
        operation: String,
        /// Underlying failure description.
        message: String,
    },
}

impl ComputeError {
    /// Wraps a [`ServiceError`] in the service variant.
    #[must_use]
    pub fn service(error: ServiceError) -> Self {
        Self::Service(Box::new(error))
    }
}

/// Future returned by backend operations.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ComputeError>> + Send + 'a>>;

/// Minimal interface implemented by compute backends.
pub trait Backend {
    /// Lists every instance visible in the configured tenancy.
    fn list_instances(&self) -> BackendFuture<'_, Vec<InstanceSummary>>;

    /// Launches the instance described by the request and returns its
    /// identifiers.
    fn launch_instance<'a>(
        &'a self,
        request: &'a LaunchRequest,
    ) -> BackendFuture<'a, LaunchedInstance>;
}
