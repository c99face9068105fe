//! BDD scenarios for the acquisition workflow.

use rstest_bdd_macros::scenario;

use super::test_helpers::{LaunchContext, launch_context};

#[scenario(
    path = "tests/features/launch.feature",
    name = "Skip the launch when the target shape is already present"
)]
fn scenario_skip_when_present(launch_context: LaunchContext) {
    let _ = launch_context;
}

#[scenario(
    path = "tests/features/launch.feature",
    name = "Launch an instance into an empty tenancy"
)]
fn scenario_launch_into_empty_tenancy(launch_context: LaunchContext) {
    let _ = launch_context;
}

#[scenario(
    path = "tests/features/launch.feature",
    name = "Ignore instances of other shapes"
)]
fn scenario_ignore_other_shapes(launch_context: LaunchContext) {
    let _ = launch_context;
}

#[scenario(
    path = "tests/features/launch.feature",
    name = "Classify an out-of-capacity refusal"
)]
fn scenario_capacity_exhausted(launch_context: LaunchContext) {
    let _ = launch_context;
}

#[scenario(
    path = "tests/features/launch.feature",
    name = "Pause after a throttled launch attempt"
)]
fn scenario_rate_limited(launch_context: LaunchContext) {
    let _ = launch_context;
}

#[scenario(
    path = "tests/features/launch.feature",
    name = "Report an unexpected provider error with diagnostics"
)]
fn scenario_unexpected_error(launch_context: LaunchContext) {
    let _ = launch_context;
}

#[scenario(
    path = "tests/features/launch.feature",
    name = "Report a failing instance listing with diagnostics"
)]
fn scenario_listing_service_error(launch_context: LaunchContext) {
    let _ = launch_context;
}

#[scenario(
    path = "tests/features/launch.feature",
    name = "Abort the run on a listing transport failure"
)]
fn scenario_listing_transport_failure(launch_context: LaunchContext) {
    let _ = launch_context;
}

#[scenario(
    path = "tests/features/launch.feature",
    name = "Abort the run on a launch transport failure"
)]
fn scenario_launch_transport_failure(launch_context: LaunchContext) {
    let _ = launch_context;
}

#[scenario(
    path = "tests/features/launch.feature",
    name = "Surface notification delivery failures"
)]
fn scenario_notification_failure(launch_context: LaunchContext) {
    let _ = launch_context;
}
