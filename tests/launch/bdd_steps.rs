//! BDD step definitions for the acquisition workflow.

use std::time::{Duration, Instant};

use magpie::{ComputeError, LaunchOrchestrator, LaunchedInstance, Outcome};
use rstest_bdd_macros::{given, then, when};
use tokio::runtime::Runtime;

use super::test_helpers::{LaunchContext, LaunchResult, instance_summary, service_error};
use crate::test_constants::DEFAULT_TARGET_SHAPE;

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("an empty tenancy")]
fn empty_tenancy(launch_context: LaunchContext) -> Result<LaunchContext, StepError> {
    Ok(launch_context)
}

#[given("an instance of the target shape already exists")]
fn target_shape_exists(launch_context: LaunchContext) -> Result<LaunchContext, StepError> {
    launch_context
        .backend
        .add_instance(instance_summary(DEFAULT_TARGET_SHAPE));
    Ok(launch_context)
}

#[given("an instance of a different shape exists")]
fn different_shape_exists(launch_context: LaunchContext) -> Result<LaunchContext, StepError> {
    launch_context
        .backend
        .add_instance(instance_summary("VM.Standard.E2.1.Micro"));
    Ok(launch_context)
}

#[given("the launch succeeds")]
fn launch_succeeds(launch_context: LaunchContext) -> Result<LaunchContext, StepError> {
    launch_context.backend.launch_returns(LaunchedInstance {
        id: String::from("ocid1.instance.oc1..fresh"),
        display_name: String::from("free-arm"),
        availability_domain: String::from("QnsC:AP-OSAKA-1-AD-1"),
    });
    Ok(launch_context)
}

#[given("the launch fails with status \"{status}\" code \"{code}\" message \"{message}\"")]
fn launch_fails(
    launch_context: LaunchContext,
    status: u16,
    code: String,
    message: String,
) -> Result<LaunchContext, StepError> {
    launch_context
        .backend
        .fail_launch_with(ComputeError::service(service_error(
            "launch_instance",
            status,
            &code,
            &message,
        )));
    Ok(launch_context)
}

#[given("the instance listing fails with status \"{status}\" code \"{code}\" message \"{message}\"")]
fn listing_fails(
    launch_context: LaunchContext,
    status: u16,
    code: String,
    message: String,
) -> Result<LaunchContext, StepError> {
    launch_context
        .backend
        .fail_list_with(ComputeError::service(service_error(
            "list_instances",
            status,
            &code,
            &message,
        )));
    Ok(launch_context)
}

#[given("the instance listing fails with a transport error")]
fn listing_transport_error(launch_context: LaunchContext) -> Result<LaunchContext, StepError> {
    launch_context.backend.fail_list_with(ComputeError::Transport {
        operation: String::from("list_instances"),
        message: String::from("connection refused"),
    });
    Ok(launch_context)
}

#[given("the launch fails with a transport error")]
fn launch_transport_error(launch_context: LaunchContext) -> Result<LaunchContext, StepError> {
    launch_context.backend.fail_launch_with(ComputeError::Transport {
        operation: String::from("launch_instance"),
        message: String::from("connection refused"),
    });
    Ok(launch_context)
}

#[given("the notifier fails to deliver")]
fn notifier_fails(launch_context: LaunchContext) -> Result<LaunchContext, StepError> {
    launch_context.notifier.fail_deliveries();
    Ok(launch_context)
}

#[given("the rate-limit backoff is \"{millis}\" milliseconds")]
fn backoff_override(
    mut launch_context: LaunchContext,
    millis: u64,
) -> Result<LaunchContext, StepError> {
    launch_context.backoff = Duration::from_millis(millis);
    Ok(launch_context)
}

#[when("I run one acquisition attempt")]
fn run_attempt(launch_context: LaunchContext) -> Result<LaunchContext, StepError> {
    let runtime = Runtime::new().map_err(|err| StepError::Assertion(err.to_string()))?;
    let LaunchContext {
        backend,
        notifier,
        config,
        backoff,
        key_tmp,
        ..
    } = launch_context;
    let orchestrator = LaunchOrchestrator::new(backend.clone(), notifier.clone())
        .with_rate_limit_backoff(backoff);

    let config_clone = config.clone();
    let started = Instant::now();
    let result =
        runtime.block_on(async move { orchestrator.execute(&config_clone).await });
    let elapsed = started.elapsed();

    let run_result = match result {
        Ok(outcome) => LaunchResult::Completed(outcome),
        Err(err) => LaunchResult::Failed(err.to_string()),
    };

    Ok(LaunchContext {
        backend,
        notifier,
        config,
        backoff,
        outcome: Some(run_result),
        elapsed: Some(elapsed),
        key_tmp,
    })
}

fn completed_outcome(launch_context: &LaunchContext) -> Result<&Outcome, StepError> {
    match &launch_context.outcome {
        Some(LaunchResult::Completed(outcome)) => Ok(outcome),
        Some(LaunchResult::Failed(message)) => Err(StepError::Assertion(format!(
            "run failed unexpectedly: {message}"
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

#[then("the outcome is \"{expected}\"")]
fn outcome_is(launch_context: &LaunchContext, expected: String) -> Result<(), StepError> {
    let outcome = completed_outcome(launch_context)?;
    let actual = match outcome {
        Outcome::AlreadyExists => "already-exists",
        Outcome::Launched(_) => "launched",
        Outcome::CapacityExhausted => "capacity-exhausted",
        Outcome::RateLimited => "rate-limited",
        Outcome::UnexpectedError(_) => "unexpected-error",
    };
    if actual == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected outcome {expected}, got {actual}"
        )))
    }
}

#[then("the run fails mentioning \"{substring}\"")]
fn run_fails_mentioning(launch_context: &LaunchContext, substring: String) -> Result<(), StepError> {
    match &launch_context.outcome {
        Some(LaunchResult::Failed(message)) if message.contains(&substring) => Ok(()),
        other => Err(StepError::Assertion(format!("unexpected outcome: {other:?}"))),
    }
}

#[then("exactly one notification was sent")]
fn one_notification(launch_context: &LaunchContext) -> Result<(), StepError> {
    let sent = launch_context.notifier.sent();
    if sent.len() == 1 {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected exactly one notification, got {}",
            sent.len()
        )))
    }
}

#[then("no notification was sent")]
fn no_notification(launch_context: &LaunchContext) -> Result<(), StepError> {
    let sent = launch_context.notifier.sent();
    if sent.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no notifications, got {sent:?}"
        )))
    }
}

#[then("the notification mentions \"{substring}\"")]
fn notification_mentions(
    launch_context: &LaunchContext,
    substring: String,
) -> Result<(), StepError> {
    let sent = launch_context.notifier.sent();
    if sent
        .iter()
        .any(|message| message.content.contains(&substring))
    {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "no notification contains '{substring}': {sent:?}"
        )))
    }
}

#[then("the notification text starts with a timestamp")]
fn notification_timestamped(launch_context: &LaunchContext) -> Result<(), StepError> {
    let sent = launch_context.notifier.sent();
    let message = sent
        .first()
        .ok_or_else(|| StepError::Assertion(String::from("missing notification")))?;
    let Some((prefix, _)) = message.content.split_once(" | ") else {
        return Err(StepError::Assertion(format!(
            "notification lacks a timestamp prefix: {}",
            message.content
        )));
    };
    if prefix.len() == "2026-01-01 00:00:00".len() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "unexpected timestamp prefix: {prefix}"
        )))
    }
}

#[then("the notification carries the diagnostic report")]
fn notification_carries_report(launch_context: &LaunchContext) -> Result<(), StepError> {
    let sent = launch_context.notifier.sent();
    let message = sent
        .first()
        .ok_or_else(|| StepError::Assertion(String::from("missing notification")))?;
    let attachment = message
        .attachment
        .as_ref()
        .ok_or_else(|| StepError::Assertion(String::from("notification lacks an attachment")))?;
    if attachment.file_name != "error.json" {
        return Err(StepError::Assertion(format!(
            "unexpected attachment name: {}",
            attachment.file_name
        )));
    }
    let report: serde_json::Value = serde_json::from_slice(&attachment.bytes)
        .map_err(|err| StepError::Assertion(format!("attachment is not JSON: {err}")))?;
    for key in [
        "status",
        "code",
        "opc-request-id",
        "message",
        "operation_name",
        "timestamp",
        "request_endpoint",
    ] {
        if report.get(key).is_none() {
            return Err(StepError::Assertion(format!(
                "report is missing key '{key}': {report}"
            )));
        }
    }
    Ok(())
}

#[then("no launch was attempted")]
fn no_launch(launch_context: &LaunchContext) -> Result<(), StepError> {
    if launch_context.backend.launch_calls() == 0 {
        Ok(())
    } else {
        Err(StepError::Assertion(String::from(
            "backend.launch_instance should not be invoked",
        )))
    }
}

#[then("exactly one launch was attempted")]
fn one_launch(launch_context: &LaunchContext) -> Result<(), StepError> {
    let calls = launch_context.backend.launch_calls();
    if calls == 1 {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected exactly one launch attempt, got {calls}"
        )))
    }
}

#[then("the launch request carries the configured shape and SSH key")]
fn launch_request_reflects_config(launch_context: &LaunchContext) -> Result<(), StepError> {
    let request = launch_context
        .backend
        .last_request()
        .ok_or_else(|| StepError::Assertion(String::from("missing launch request")))?;
    if request.shape != DEFAULT_TARGET_SHAPE {
        return Err(StepError::Assertion(format!(
            "unexpected shape: {}",
            request.shape
        )));
    }
    if request.ssh_public_key.contains("launcher@test") {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "unexpected SSH key: {}",
            request.ssh_public_key
        )))
    }
}

#[then("the run waited at least \"{millis}\" milliseconds")]
fn waited_at_least(launch_context: &LaunchContext, millis: u64) -> Result<(), StepError> {
    let Some(elapsed) = launch_context.elapsed else {
        return Err(StepError::Assertion(String::from("missing elapsed time")));
    };
    if elapsed >= Duration::from_millis(millis) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected a wait of at least {millis}ms, got {elapsed:?}"
        )))
    }
}
