//! Configuration document model
//!
//! ```json
//! {
//!   "project_id": "my-project",
//!   "instance_config": {
//!     "name": "gpu-worker",
//!     "machine_type": "a2-highgpu-1g",
//!     "gpu_type": "nvidia-tesla-a100",
//!     "number_of_gpus": 1,
//!     "number_of_instances": 2,
//!     "zone": ["us-central1-a", "us-central1-b"],
//!     "gpu_machine_type_mapping": {"nvidia-tesla-t4": "n1-standard-8"}
//!   }
//! }
//! ```

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Machine type prefix of the accelerator-optimized family whose names
/// encode the GPU count (`a2-highgpu-8g`)
pub const HIGH_GPU_FAMILY_PREFIX: &str = "a2";

pub const DEFAULT_IMAGE_PROJECT: &str = "debian-cloud";
pub const DEFAULT_IMAGE_FAMILY: &str = "debian-12";
pub const DEFAULT_DISK_SIZE_GB: u32 = 50;
pub const DEFAULT_NETWORK: &str = "global/networks/default";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuConfig {
    pub project_id: String,
    pub instance_config: InstanceConfig,
}

/// What to provision and where
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// Instance name prefix
    pub name: String,

    pub machine_type: String,

    /// Accelerator type name, e.g. `nvidia-tesla-t4`
    pub gpu_type: String,

    pub number_of_gpus: u32,

    pub number_of_instances: u32,

    /// Zone allow-list; empty means every zone
    #[serde(default, deserialize_with = "one_or_many")]
    pub zone: Vec<String>,

    /// Per-GPU machine type overrides
    #[serde(default)]
    pub gpu_machine_type_mapping: HashMap<String, String>,

    #[serde(default = "default_image_project")]
    pub image_project: String,

    #[serde(default = "default_image_family")]
    pub image_family: String,

    #[serde(default = "default_disk_size_gb")]
    pub disk_size_gb: u32,

    #[serde(default = "default_network")]
    pub network: String,
}

fn default_image_project() -> String {
    DEFAULT_IMAGE_PROJECT.to_string()
}

fn default_image_family() -> String {
    DEFAULT_IMAGE_FAMILY.to_string()
}

fn default_disk_size_gb() -> u32 {
    DEFAULT_DISK_SIZE_GB
}

fn default_network() -> String {
    DEFAULT_NETWORK.to_string()
}

/// Accept `"zone": "us-central1-a"`, a list, or `null`
fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(zone)) if zone.trim().is_empty() => Vec::new(),
        Some(OneOrMany::One(zone)) => vec![zone],
        Some(OneOrMany::Many(zones)) => zones,
    })
}

impl GpuConfig {
    /// Parse a configuration document from JSON text
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// Check the configuration before any API call is made
    pub fn validate(&self) -> Result<()> {
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::Invalid("project_id is empty".to_string()));
        }
        self.instance_config.validate()
    }
}

impl InstanceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.number_of_gpus == 0 {
            return Err(ConfigError::Invalid(
                "number_of_gpus must be at least 1".to_string(),
            ));
        }
        if self.number_of_instances == 0 {
            return Err(ConfigError::Invalid(
                "number_of_instances must be at least 1".to_string(),
            ));
        }

        if let Some(in_machine_type) = gpus_in_machine_type(&self.machine_type)? {
            if in_machine_type != self.number_of_gpus {
                return Err(ConfigError::GpuCountMismatch {
                    machine_type: self.machine_type.clone(),
                    in_machine_type,
                    requested: self.number_of_gpus,
                });
            }
        }
        Ok(())
    }

    /// Machine type to create: the override for `gpu_type` if any, else the default
    pub fn effective_machine_type(&self) -> &str {
        self.gpu_machine_type_mapping
            .get(&self.gpu_type)
            .map(String::as_str)
            .unwrap_or(&self.machine_type)
    }

    /// Whether only some zones should be considered
    pub fn has_zone_filter(&self) -> bool {
        !self.zone.is_empty()
    }

    /// Partial URL of the boot image family
    pub fn source_image(&self) -> String {
        format!(
            "projects/{}/global/images/family/{}",
            self.image_project, self.image_family
        )
    }
}

/// Whether the machine type belongs to the family that bundles its GPUs
pub fn is_high_gpu_family(machine_type: &str) -> bool {
    machine_type.starts_with(HIGH_GPU_FAMILY_PREFIX)
}

/// GPU count encoded in a high-GPU machine type name (`a2-highgpu-8g` → 8)
///
/// Returns `None` for machine types outside the family.
pub fn gpus_in_machine_type(machine_type: &str) -> Result<Option<u32>> {
    if !is_high_gpu_family(machine_type) {
        return Ok(None);
    }

    machine_type
        .rsplit('-')
        .next()
        .and_then(|suffix| suffix.strip_suffix('g'))
        .and_then(|count| count.parse::<u32>().ok())
        .map(Some)
        .ok_or_else(|| ConfigError::MalformedMachineType(machine_type.to_string()))
}
