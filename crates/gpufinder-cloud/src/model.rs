//! Wire models for the compute service
//!
//! Field names follow the Compute Engine v1 JSON representation. Only the
//! fields the provisioner reads are modelled; everything else is ignored.

use serde::{Deserialize, Serialize};

/// Status value of a zone that accepts new resources
pub const ZONE_STATUS_UP: &str = "UP";

/// A zone as returned by `zones.list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub name: String,

    /// `UP` or `DOWN`
    pub status: String,

    /// Region URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default)]
    pub description: String,
}

impl Zone {
    pub fn is_up(&self) -> bool {
        self.status == ZONE_STATUS_UP
    }
}

/// A machine type as returned by `machineTypes.list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineType {
    pub name: String,

    #[serde(default)]
    pub guest_cpus: u32,

    #[serde(default)]
    pub description: String,

    /// Accelerators bundled with the machine type (accelerator-optimized families)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accelerators: Option<Vec<MachineAccelerator>>,
}

impl MachineType {
    /// Type of the first bundled accelerator
    pub fn primary_accelerator_type(&self) -> Option<&str> {
        self.accelerators
            .as_ref()?
            .first()
            .map(|a| a.guest_accelerator_type.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineAccelerator {
    pub guest_accelerator_type: String,
    pub guest_accelerator_count: u32,
}

/// An accelerator type as returned by `acceleratorTypes.list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceleratorType {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub maximum_cards_per_instance: u32,

    /// Zone URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

/// Long-running operation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Pending,
    Running,
    Done,
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationStatus::Pending => write!(f, "PENDING"),
            OperationStatus::Running => write!(f, "RUNNING"),
            OperationStatus::Done => write!(f, "DONE"),
        }
    }
}

/// A zonal long-running operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub name: String,

    pub status: OperationStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_link: Option<String>,

    /// Error payload, present only when the finished operation failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

impl Operation {
    pub fn is_done(&self) -> bool {
        self.status == OperationStatus::Done
    }
}

// ============ Insert body ============

/// Request body for `instances.insert`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceResource {
    pub name: String,

    /// Partial URL: `zones/{zone}/machineTypes/{type}`
    pub machine_type: String,

    pub disks: Vec<AttachedDisk>,

    pub network_interfaces: Vec<NetworkInterface>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub guest_accelerators: Vec<AcceleratorConfig>,

    pub scheduling: Scheduling,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedDisk {
    pub boot: bool,
    pub auto_delete: bool,
    pub initialize_params: DiskInitializeParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskInitializeParams {
    /// e.g. `projects/debian-cloud/global/images/family/debian-12`
    pub source_image: String,

    /// int64 travels as a string on this API
    pub disk_size_gb: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    pub network: String,

    #[serde(default)]
    pub access_configs: Vec<AccessConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessConfig {
    #[serde(rename = "type")]
    pub r#type: String,
    pub name: String,
}

impl AccessConfig {
    /// Ephemeral external IP
    pub fn external_nat() -> Self {
        Self {
            r#type: "ONE_TO_ONE_NAT".to_string(),
            name: "External NAT".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceleratorConfig {
    /// Partial URL: `zones/{zone}/acceleratorTypes/{type}`
    pub accelerator_type: String,
    pub accelerator_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scheduling {
    pub on_host_maintenance: String,
    pub automatic_restart: bool,
}

impl Scheduling {
    /// GPU instances cannot live-migrate
    pub fn gpu() -> Self {
        Self {
            on_host_maintenance: "TERMINATE".to_string(),
            automatic_restart: true,
        }
    }
}
