//! Magpie keeps trying to grab a scarce compute instance until one sticks.
//!
//! Each invocation runs a single acquisition attempt: list the tenancy's
//! instances, launch one of the target shape if it is absent, classify the
//! provider's answer, and deliver exactly one webhook notification about
//! it. An external scheduler (cron, systemd timer) provides the retry loop.
//!
//! The crate is organised around two seams so the workflow can be tested
//! without a cloud account: [`Backend`] abstracts the compute API and
//! [`Notifier`] the notification channel. [`OciBackend`] and
//! [`DiscordWebhook`] are the production implementations.

pub mod backend;
pub mod config;
mod files;
pub mod launch;
pub mod notify;
pub mod oci;
pub mod outcome;
pub mod ssh_key;

pub use backend::{
    Backend, BackendFuture, ComputeError, InstanceSummary, LaunchRequest, LaunchRequestBuilder,
    LaunchedInstance, RequestError, ServiceError,
};
pub use config::{ConfigError, LauncherConfig};
pub use launch::{LaunchError, LaunchOrchestrator, shape_exists};
pub use notify::{Attachment, DiscordWebhook, Notifier, NotifyError, NotifyFuture};
pub use oci::{Credentials, CredentialsError, OciBackend};
pub use outcome::{ErrorClass, Outcome, classify_service_error, error_report};
pub use ssh_key::{SshKeyError, load_public_key};
