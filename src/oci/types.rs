//! Wire-format types for the provider's Core Services instances API.

use serde::{Deserialize, Serialize};

use crate::backend::{InstanceSummary, LaunchRequest, LaunchedInstance};

/// Request body for the launch-instance operation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LaunchInstanceDetails<'a> {
    pub(super) availability_domain: &'a str,
    pub(super) compartment_id: &'a str,
    pub(super) display_name: &'a str,
    pub(super) shape: &'a str,
    pub(super) image_id: &'a str,
    pub(super) subnet_id: &'a str,
    pub(super) metadata: InstanceMetadata<'a>,
    pub(super) shape_config: ShapeConfig,
    pub(super) create_vnic_details: CreateVnicDetails<'a>,
}

/// Instance metadata entries. These keys are verbatim metadata map keys,
/// not API fields, so they stay snake_case on the wire.
#[derive(Debug, Serialize)]
pub(super) struct InstanceMetadata<'a> {
    pub(super) ssh_authorized_keys: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ShapeConfig {
    #[serde(rename = "memoryInGBs")]
    pub(super) memory_in_gbs: f64,
    pub(super) ocpus: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateVnicDetails<'a> {
    pub(super) assign_public_ip: bool,
    pub(super) assign_private_dns_record: bool,
    pub(super) assign_ipv6_ip: bool,
    pub(super) subnet_id: &'a str,
}

impl<'a> LaunchInstanceDetails<'a> {
    pub(super) fn from_request(request: &'a LaunchRequest) -> Self {
        Self {
            availability_domain: &request.availability_domain,
            compartment_id: &request.compartment_id,
            display_name: &request.display_name,
            shape: &request.shape,
            image_id: &request.image_id,
            subnet_id: &request.subnet_id,
            metadata: InstanceMetadata {
                ssh_authorized_keys: &request.ssh_public_key,
            },
            shape_config: ShapeConfig {
                memory_in_gbs: request.memory_in_gbs,
                ocpus: request.ocpus,
            },
            create_vnic_details: CreateVnicDetails {
                assign_public_ip: true,
                assign_private_dns_record: true,
                assign_ipv6_ip: false,
                subnet_id: &request.subnet_id,
            },
        }
    }
}

/// One instance as returned by both the list and launch operations.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct InstanceDetail {
    pub(super) id: String,
    pub(super) display_name: String,
    pub(super) availability_domain: String,
    pub(super) shape: String,
    pub(super) lifecycle_state: String,
}

impl From<InstanceDetail> for InstanceSummary {
    fn from(detail: InstanceDetail) -> Self {
        Self {
            id: detail.id,
            display_name: detail.display_name,
            availability_domain: detail.availability_domain,
            shape: detail.shape,
            lifecycle_state: detail.lifecycle_state,
        }
    }
}

impl From<InstanceDetail> for LaunchedInstance {
    fn from(detail: InstanceDetail) -> Self {
        Self {
            id: detail.id,
            display_name: detail.display_name,
            availability_domain: detail.availability_domain,
        }
    }
}

/// Error body returned by the API on non-success responses.
#[derive(Debug, Deserialize)]
pub(super) struct ApiErrorBody {
    pub(super) code: String,
    pub(super) message: String,
}
