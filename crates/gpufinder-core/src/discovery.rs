//! Zone discovery, capability filter and quota filter
//!
//! Each step drains the relevant paginated catalog completely before
//! filtering, and hands its records to the next step.

use crate::error::{ProvisionError, Result};
use gpufinder_cloud::{AcceleratorType, ComputeApi, MachineAccelerator, collect_pages};
use serde::{Deserialize, Serialize};

/// Length of the zone suffix (`-a`) that follows the region name
const ZONE_SUFFIX_LEN: usize = 2;

/// A zone and the region it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneInfo {
    pub region: String,
    pub zone: String,
}

impl ZoneInfo {
    pub fn from_zone_name(zone: &str) -> Self {
        Self {
            region: region_of(zone).to_string(),
            zone: zone.to_string(),
        }
    }
}

/// Region part of a zone name (`us-central1-a` → `us-central1`)
pub fn region_of(zone: &str) -> &str {
    zone.get(..zone.len().saturating_sub(ZONE_SUFFIX_LEN))
        .unwrap_or_default()
}

/// A zone offering the requested machine type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineAvailability {
    pub region: String,
    pub zone: String,
    pub machine_type: String,
    pub guest_cpus: u32,
    pub description: String,

    /// The catalog lists accelerators built into the machine type
    #[serde(default)]
    pub bundles_gpus: bool,

    /// Present only when the bundled accelerator is the requested one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accelerators: Option<Vec<MachineAccelerator>>,
}

/// A zone whose accelerator limit covers the requested GPU count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceleratorAvailability {
    pub region: String,
    pub zone: String,
    pub machine_type: String,
    pub guest_cpus: u32,
    pub name: String,
    pub description: String,
    pub maximum_cards_per_instance: u32,

    /// Copied from the machine record; no `guestAccelerators` are sent when set
    #[serde(default)]
    pub bundles_gpus: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accelerators: Option<Vec<MachineAccelerator>>,
}

/// Accelerator catalog entry of one zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneAccelerator {
    pub region: String,
    pub zone: String,
    pub accelerator: AcceleratorType,
}

/// List every zone whose status is `UP`
///
/// When `allow_list` is non-empty only zones named in it are kept.
pub async fn discover_zones(
    api: &dyn ComputeApi,
    project: &str,
    allow_list: &[String],
) -> Result<Vec<ZoneInfo>> {
    if allow_list.is_empty() {
        tracing::info!("Processing all zones");
    } else {
        tracing::info!("Processing selected zones from {:?}", allow_list);
    }

    let zones = collect_pages(move |token| async move {
        api.list_zones(project, token.as_deref()).await
    })
    .await?;

    let total = zones.len();
    let zones: Vec<ZoneInfo> = zones
        .into_iter()
        .filter(|z| z.is_up())
        .filter(|z| allow_list.is_empty() || allow_list.contains(&z.name))
        .map(|z| ZoneInfo::from_zone_name(&z.name))
        .collect();

    tracing::debug!("{} of {} zones are usable", zones.len(), total);
    Ok(zones)
}

/// Keep the zones whose catalog contains `machine_type`
///
/// Accelerator details are attached only when the machine type's first
/// bundled accelerator is `gpu_type`.
pub async fn find_machine_availability(
    api: &dyn ComputeApi,
    project: &str,
    machine_type: &str,
    gpu_type: &str,
    zones: &[ZoneInfo],
) -> Result<Vec<MachineAvailability>> {
    let mut available = Vec::new();

    for zone in zones {
        let zone_name = zone.zone.as_str();
        let machines = collect_pages(move |token| async move {
            api.list_machine_types(project, zone_name, token.as_deref())
                .await
        })
        .await?;

        for machine in machines.into_iter().filter(|m| m.name == machine_type) {
            let bundles_gpus = machine.accelerators.as_ref().is_some_and(|a| !a.is_empty());
            let accelerators = if machine.primary_accelerator_type() == Some(gpu_type) {
                machine.accelerators
            } else {
                None
            };

            available.push(MachineAvailability {
                region: zone.region.clone(),
                zone: zone.zone.clone(),
                machine_type: machine.name,
                guest_cpus: machine.guest_cpus,
                description: machine.description,
                bundles_gpus,
                accelerators,
            });
        }
    }

    if available.is_empty() {
        return Err(ProvisionError::NoMachineType(machine_type.to_string()));
    }

    tracing::info!(
        "Machine type {} found in {} zones",
        machine_type,
        available.len()
    );
    Ok(available)
}

/// Keep the zones where `gpu_type` allows at least `requested_gpus` per instance
pub async fn find_accelerator_quota(
    api: &dyn ComputeApi,
    project: &str,
    gpu_type: &str,
    requested_gpus: u32,
    machines: &[MachineAvailability],
) -> Result<Vec<AcceleratorAvailability>> {
    let mut qualifying = Vec::new();

    for machine in machines {
        let zone_name = machine.zone.as_str();
        let accelerators = collect_pages(move |token| async move {
            api.list_accelerator_types(project, zone_name, token.as_deref())
                .await
        })
        .await?;

        for accelerator in accelerators.into_iter().filter(|a| a.name == gpu_type) {
            if requested_gpus <= accelerator.maximum_cards_per_instance {
                tracing::info!(
                    "{} GPUs requested per instance, {} has {} GPUs with a maximum of {} per instance",
                    requested_gpus,
                    machine.zone,
                    accelerator.name,
                    accelerator.maximum_cards_per_instance
                );
                qualifying.push(AcceleratorAvailability {
                    region: machine.region.clone(),
                    zone: machine.zone.clone(),
                    machine_type: machine.machine_type.clone(),
                    guest_cpus: machine.guest_cpus,
                    name: accelerator.name,
                    description: accelerator.description,
                    maximum_cards_per_instance: accelerator.maximum_cards_per_instance,
                    bundles_gpus: machine.bundles_gpus,
                    accelerators: machine.accelerators.clone(),
                });
            } else {
                tracing::warn!(
                    "{} GPUs requested per instance, {} doesn't have enough GPUs, with a maximum of {} per instance",
                    requested_gpus,
                    machine.zone,
                    accelerator.maximum_cards_per_instance
                );
            }
        }
    }

    if qualifying.is_empty() {
        let machine_type = machines
            .first()
            .map(|m| m.machine_type.clone())
            .unwrap_or_default();
        return Err(ProvisionError::NoAccelerator {
            gpu_type: gpu_type.to_string(),
            machine_type,
        });
    }

    Ok(qualifying)
}

/// Every accelerator type offered in each zone
pub async fn list_accelerators(
    api: &dyn ComputeApi,
    project: &str,
    zones: &[ZoneInfo],
) -> Result<Vec<ZoneAccelerator>> {
    let mut all = Vec::new();

    for zone in zones {
        let zone_name = zone.zone.as_str();
        let accelerators = collect_pages(move |token| async move {
            api.list_accelerator_types(project, zone_name, token.as_deref())
                .await
        })
        .await?;

        all.extend(accelerators.into_iter().map(|accelerator| ZoneAccelerator {
            region: zone.region.clone(),
            zone: zone.zone.clone(),
            accelerator,
        }));
    }

    Ok(all)
}

/// Distinct names in first-seen order
pub fn distinct_in_order<'a>(regions: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for region in regions {
        if !seen.iter().any(|r| r == region) {
            seen.push(region.to_string());
        }
    }
    seen
}
