//! Shared fixtures for acquisition BDD scenarios.

use std::sync::Arc;
use std::time::Duration;

use magpie::{InstanceSummary, LauncherConfig, Outcome, ServiceError};
use rstest::fixture;
use tempfile::TempDir;
use thiserror::Error;

use super::test_doubles::{RecordingNotifier, ScriptedBackend};
use crate::test_constants::DEFAULT_TARGET_SHAPE;

#[derive(Clone, Debug)]
pub struct LaunchContext {
    pub backend: ScriptedBackend,
    pub notifier: RecordingNotifier,
    pub config: LauncherConfig,
    pub backoff: Duration,
    pub outcome: Option<LaunchResult>,
    pub elapsed: Option<Duration>,
    pub(crate) key_tmp: Arc<TempDir>,
}

#[derive(Clone, Debug)]
pub enum LaunchResult {
    Completed(Outcome),
    Failed(String),
}

#[derive(Clone, Debug, Error)]
pub enum LaunchTestError {
    #[error("failed to create workspace: {0}")]
    Workspace(String),
}

#[fixture]
pub fn launch_context_result() -> Result<LaunchContext, LaunchTestError> {
    build_launch_context()
}

#[fixture]
pub fn launch_context(
    launch_context_result: Result<LaunchContext, LaunchTestError>,
) -> LaunchContext {
    launch_context_result
        .unwrap_or_else(|err| panic!("launch context fixture should initialise: {err}"))
}

pub fn build_launch_context() -> Result<LaunchContext, LaunchTestError> {
    let tmp_dir =
        TempDir::new().map_err(|err| LaunchTestError::Workspace(format!("tempdir: {err}")))?;
    let key_path = tmp_dir.path().join("public_key.pub");
    std::fs::write(&key_path, "ssh-ed25519 AAAAC3Nza launcher@test\n")
        .map_err(|err| LaunchTestError::Workspace(format!("write key: {err}")))?;
    let key_file = key_path
        .to_str()
        .ok_or_else(|| {
            LaunchTestError::Workspace(format!("non-utf8 tempdir path: {}", key_path.display()))
        })?
        .to_owned();

    Ok(LaunchContext {
        backend: ScriptedBackend::new(),
        notifier: RecordingNotifier::new(),
        config: config(&key_file),
        backoff: Duration::from_millis(50),
        outcome: None,
        elapsed: None,
        key_tmp: Arc::new(tmp_dir),
    })
}

pub fn config(ssh_public_key_file: &str) -> LauncherConfig {
    LauncherConfig {
        compartment_id: String::from("ocid1.tenancy.oc1..demo"),
        availability_domain: String::from("QnsC:AP-OSAKA-1-AD-1"),
        instance_display_name: String::from("free-arm"),
        instance_shape: String::from(DEFAULT_TARGET_SHAPE),
        subnet_id: String::from("ocid1.subnet.oc1..net"),
        image_id: String::from("ocid1.image.oc1..ubuntu"),
        instance_memory_in_gbs: String::from("24"),
        instance_ocpus: String::from("4"),
        ssh_public_key_file: ssh_public_key_file.to_owned(),
        credentials_file: String::from("~/.oci/config"),
        credentials_profile: String::from("DEFAULT"),
        webhook_url: String::from("https://discord.test/webhook"),
    }
}

pub fn instance_summary(shape: &str) -> InstanceSummary {
    InstanceSummary {
        id: String::from("ocid1.instance.oc1..existing"),
        display_name: String::from("existing-instance"),
        availability_domain: String::from("QnsC:AP-OSAKA-1-AD-1"),
        shape: shape.to_owned(),
        lifecycle_state: String::from("RUNNING"),
    }
}

pub fn service_error(operation: &str, status: u16, code: &str, message: &str) -> ServiceError {
    ServiceError {
        status,
        code: code.to_owned(),
        message: message.to_owned(),
        request_id: String::from("req-0001"),
        timestamp: String::from("2026-08-01T00:00:00Z"),
        operation_name: operation.to_owned(),
        request_endpoint: String::from("POST https://iaas.test/20160918/instances"),
    }
}
