//! Configuration loading via `ortho-config`.

use crate::backend::LaunchRequest;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Launcher configuration derived from the configuration file and
/// environment variables.
///
/// All instance parameters are strings, including the two numeric shape
/// settings, which mirror the configuration file's string values and are
/// parsed when the launch request is built. There are no CLI flags; sources
/// merge defaults, discovered `magpie.json` files, and `MAGPIE_*` environment
/// variables.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "MAGPIE",
    discovery(
        app_name = "magpie",
        env_var = "MAGPIE_CONFIG_PATH",
        config_file_name = "magpie.json",
        dotfile_name = ".magpie.json",
        project_file_name = "magpie.json"
    )
)]
pub struct LauncherConfig {
    /// Compartment instances are created in and listed from.
    pub compartment_id: String,
    /// Availability domain targeted by launch attempts.
    pub availability_domain: String,
    /// Display name for the launched instance.
    pub instance_display_name: String,
    /// Target shape that the workflow tries to claim.
    pub instance_shape: String,
    /// Subnet for the instance's primary VNIC.
    pub subnet_id: String,
    /// Boot image identifier.
    pub image_id: String,
    /// Memory for the flexible shape, in gigabytes, as a string (for example
    /// `"24"`).
    pub instance_memory_in_gbs: String,
    /// OCPU count for the flexible shape, as a string (for example `"4"`).
    pub instance_ocpus: String,
    /// Path of the SSH public key installed on the instance. Read fresh on
    /// every run.
    #[ortho_config(default = "./ssh_keys/public_key.pub".to_owned())]
    pub ssh_public_key_file: String,
    /// Path of the provider credentials file.
    #[ortho_config(default = "~/.oci/config".to_owned())]
    pub credentials_file: String,
    /// Profile to read from the credentials file.
    #[ortho_config(default = "DEFAULT".to_owned())]
    pub credentials_profile: String,
    /// Webhook endpoint notifications are delivered to.
    pub webhook_url: String,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    json_key: &'static str,
}

impl FieldMetadata {
    const fn new(
        description: &'static str,
        env_var: &'static str,
        json_key: &'static str,
    ) -> Self {
        Self {
            description,
            env_var,
            json_key,
        }
    }
}

const MEMORY_FIELD: FieldMetadata = FieldMetadata::new(
    "instance memory in GBs",
    "MAGPIE_INSTANCE_MEMORY_IN_GBS",
    "instance_memory_in_gbs",
);
const OCPUS_FIELD: FieldMetadata = FieldMetadata::new(
    "instance OCPU count",
    "MAGPIE_INSTANCE_OCPUS",
    "instance_ocpus",
);

impl LauncherConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add \"{}\" to magpie.json",
                metadata.description, metadata.env_var, metadata.json_key
            )));
        }
        Ok(())
    }

    fn parse_positive(value: &str, metadata: &FieldMetadata) -> Result<f64, ConfigError> {
        value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|parsed| parsed.is_finite() && *parsed > 0.0)
            .ok_or_else(|| {
                ConfigError::InvalidNumber(format!(
                    "invalid {}: `{}` is not a positive number (set {} or edit \"{}\" in magpie.json)",
                    metadata.description,
                    value.trim(),
                    metadata.env_var,
                    metadata.json_key
                ))
            })
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, discovered configuration files, and environment
    /// variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("magpie")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Builds a validated [`LaunchRequest`] from this configuration and the
    /// SSH public key text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails or a numeric field does
    /// not parse.
    pub fn launch_request(&self, ssh_public_key: &str) -> Result<LaunchRequest, ConfigError> {
        self.validate()?;
        let memory_in_gbs = Self::parse_positive(&self.instance_memory_in_gbs, &MEMORY_FIELD)?;
        let ocpus = Self::parse_positive(&self.instance_ocpus, &OCPUS_FIELD)?;
        LaunchRequest::builder()
            .compartment_id(&self.compartment_id)
            .availability_domain(&self.availability_domain)
            .display_name(&self.instance_display_name)
            .shape(&self.instance_shape)
            .subnet_id(&self.subnet_id)
            .image_id(&self.image_id)
            .memory_in_gbs(memory_in_gbs)
            .ocpus(ocpus)
            .ssh_public_key(ssh_public_key)
            .build()
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation on required fields. Error messages include
    /// guidance on how to provide missing values via environment variables or
    /// the configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.compartment_id,
            &FieldMetadata::new(
                "compartment ID",
                "MAGPIE_COMPARTMENT_ID",
                "compartment_id",
            ),
        )?;
        Self::require_field(
            &self.availability_domain,
            &FieldMetadata::new(
                "availability domain",
                "MAGPIE_AVAILABILITY_DOMAIN",
                "availability_domain",
            ),
        )?;
        Self::require_field(
            &self.instance_display_name,
            &FieldMetadata::new(
                "instance display name",
                "MAGPIE_INSTANCE_DISPLAY_NAME",
                "instance_display_name",
            ),
        )?;
        Self::require_field(
            &self.instance_shape,
            &FieldMetadata::new(
                "target instance shape",
                "MAGPIE_INSTANCE_SHAPE",
                "instance_shape",
            ),
        )?;
        Self::require_field(
            &self.subnet_id,
            &FieldMetadata::new("subnet ID", "MAGPIE_SUBNET_ID", "subnet_id"),
        )?;
        Self::require_field(
            &self.image_id,
            &FieldMetadata::new("boot image ID", "MAGPIE_IMAGE_ID", "image_id"),
        )?;
        Self::require_field(&self.instance_memory_in_gbs, &MEMORY_FIELD)?;
        Self::require_field(&self.instance_ocpus, &OCPUS_FIELD)?;
        Self::require_field(
            &self.ssh_public_key_file,
            &FieldMetadata::new(
                "SSH public key path",
                "MAGPIE_SSH_PUBLIC_KEY_FILE",
                "ssh_public_key_file",
            ),
        )?;
        Self::require_field(
            &self.credentials_file,
            &FieldMetadata::new(
                "credentials file path",
                "MAGPIE_CREDENTIALS_FILE",
                "credentials_file",
            ),
        )?;
        Self::require_field(
            &self.credentials_profile,
            &FieldMetadata::new(
                "credentials profile",
                "MAGPIE_CREDENTIALS_PROFILE",
                "credentials_profile",
            ),
        )?;
        Self::require_field(
            &self.webhook_url,
            &FieldMetadata::new("webhook URL", "MAGPIE_WEBHOOK_URL", "webhook_url"),
        )?;
        Ok(())
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a numeric-as-string field does not hold a positive number.
    #[error("invalid configuration field: {0}")]
    InvalidNumber(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
