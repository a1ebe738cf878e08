//! Region/zone fallback provisioning
//!
//! Instances are created one at a time. Regions are tried in turn and,
//! within a region, zones in turn. A quota rejection abandons the rest of
//! the region; reaching the requested count stops everything.

use crate::discovery::{
    AcceleratorAvailability, discover_zones, distinct_in_order, find_accelerator_quota,
    find_machine_availability,
};
use crate::error::Result;
use crate::operation::{DEFAULT_POLL_INTERVAL, wait_for_operation};
use crate::teardown::teardown;
use gpufinder_cloud::{
    AcceleratorConfig, AccessConfig, AttachedDisk, ComputeApi, DiskInitializeParams,
    InstanceResource, NetworkInterface, Scheduling,
};
use gpufinder_config::{GpuConfig, InstanceConfig, is_high_gpu_family};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// An instance confirmed created; the only handle used to delete it later
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedInstance {
    pub name: String,
    pub zone: String,
}

/// Counters and results accumulated over one provisioning run
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    /// Requested number of instances across the whole run
    pub target: u32,
    pub instances_created: u32,
    pub regions_attempted: usize,
    pub zones_attempted: usize,
    /// Set when the current region rejected an insert for quota
    pub move_regions: bool,
    pub created: Vec<CreatedInstance>,
}

impl RunContext {
    pub fn new(target: u32) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }

    pub fn target_reached(&self) -> bool {
        self.instances_created >= self.target
    }

    pub fn remaining(&self) -> u32 {
        self.target.saturating_sub(self.instances_created)
    }

    fn record(&mut self, instance: CreatedInstance) {
        self.instances_created += 1;
        self.move_regions = false;
        self.created.push(instance);
    }
}

/// Result of a provisioning run; may hold fewer instances than requested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionOutcome {
    pub requested: u32,
    pub created: Vec<CreatedInstance>,
    pub regions_available: usize,
    pub regions_attempted: usize,
    pub zones_attempted: usize,
}

impl ProvisionOutcome {
    pub fn is_complete(&self) -> bool {
        self.created.len() as u64 >= u64::from(self.requested)
    }
}

impl From<(RunContext, usize)> for ProvisionOutcome {
    fn from((ctx, regions_available): (RunContext, usize)) -> Self {
        Self {
            requested: ctx.target,
            created: ctx.created,
            regions_available,
            regions_attempted: ctx.regions_attempted,
            zones_attempted: ctx.zones_attempted,
        }
    }
}

/// `<prefix>-<sequence>-<zone>`
pub fn instance_name(prefix: &str, sequence: u32, zone: &str) -> String {
    format!("{}-{}-{}", prefix, sequence, zone)
}

/// Whether `machine_type` brings its own GPUs in the candidate's zone
///
/// The catalog answer applies when the candidate was discovered for this
/// machine type. A mapped override was never looked up, so only the
/// machine family decides for it.
pub fn bundles_gpus(candidate: &AcceleratorAvailability, machine_type: &str) -> bool {
    if candidate.machine_type == machine_type {
        candidate.bundles_gpus
    } else {
        is_high_gpu_family(machine_type)
    }
}

/// Insert body for one GPU instance
///
/// Machine types with built-in GPUs take no `guestAccelerators` entry.
pub fn build_instance(
    config: &InstanceConfig,
    zone: &str,
    machine_type: &str,
    bundles_gpus: bool,
    name: &str,
) -> InstanceResource {
    let guest_accelerators = if bundles_gpus {
        Vec::new()
    } else {
        vec![AcceleratorConfig {
            accelerator_type: format!("zones/{}/acceleratorTypes/{}", zone, config.gpu_type),
            accelerator_count: config.number_of_gpus,
        }]
    };

    InstanceResource {
        name: name.to_string(),
        machine_type: format!("zones/{}/machineTypes/{}", zone, machine_type),
        disks: vec![AttachedDisk {
            boot: true,
            auto_delete: true,
            initialize_params: DiskInitializeParams {
                source_image: config.source_image(),
                disk_size_gb: config.disk_size_gb.to_string(),
            },
        }],
        network_interfaces: vec![NetworkInterface {
            network: config.network.clone(),
            access_configs: vec![AccessConfig::external_nat()],
        }],
        guest_accelerators,
        scheduling: Scheduling::gpu(),
    }
}

/// First record of each zone in `region`, in first-seen order
fn zones_in_region<'c>(
    candidates: &'c [AcceleratorAvailability],
    region: &str,
) -> Vec<&'c AcceleratorAvailability> {
    let mut zones: Vec<&AcceleratorAvailability> = Vec::new();
    for candidate in candidates.iter().filter(|c| c.region == region) {
        if !zones.iter().any(|z| z.zone == candidate.zone) {
            zones.push(candidate);
        }
    }
    zones
}

/// Drives discovery, provisioning and teardown for one configuration
pub struct Provisioner<'a> {
    api: &'a dyn ComputeApi,
    config: &'a GpuConfig,
    poll_interval: Duration,
}

impl<'a> Provisioner<'a> {
    pub fn new(api: &'a dyn ComputeApi, config: &'a GpuConfig) -> Self {
        Self {
            api,
            config,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn project(&self) -> &str {
        &self.config.project_id
    }

    fn instance_config(&self) -> &InstanceConfig {
        &self.config.instance_config
    }

    /// Validate the configuration, then run zone discovery and both filters
    ///
    /// Configuration errors surface before any API call.
    pub async fn find_capacity(&self) -> Result<Vec<AcceleratorAvailability>> {
        self.config.validate()?;
        let ic = self.instance_config();

        let zones = discover_zones(self.api, self.project(), &ic.zone).await?;
        let machines = find_machine_availability(
            self.api,
            self.project(),
            &ic.machine_type,
            &ic.gpu_type,
            &zones,
        )
        .await?;

        let regions = distinct_in_order(machines.iter().map(|m| m.region.as_str()));
        tracing::info!(
            "Machine type {} is available in the following regions: {:?}",
            ic.machine_type,
            regions
        );

        find_accelerator_quota(
            self.api,
            self.project(),
            &ic.gpu_type,
            ic.number_of_gpus,
            &machines,
        )
        .await
    }

    /// Create up to `number_of_instances` instances across the candidate zones
    ///
    /// Returns whatever was created; a shortfall after trying every region is
    /// reported, not raised.
    pub async fn provision(&self, candidates: &[AcceleratorAvailability]) -> Result<ProvisionOutcome> {
        let ic = self.instance_config();
        let mut ctx = RunContext::new(ic.number_of_instances);

        let regions = distinct_in_order(candidates.iter().map(|c| c.region.as_str()));
        tracing::info!(
            "There are {} regions to try that match the GPU type and machine type configuration.",
            regions.len()
        );

        for region in &regions {
            tracing::info!("Attempting to create instances in {}", region);

            let zones = zones_in_region(candidates, region);
            tracing::info!("There are {} zones to try in {}", zones.len(), region);

            let machine_type = ic.effective_machine_type();
            ctx.move_regions = false;

            for candidate in zones {
                self.fill_zone(&mut ctx, candidate, machine_type).await?;
                ctx.zones_attempted += 1;

                if ctx.target_reached() {
                    tracing::info!("Reached the desired number of instances");
                    break;
                }
                if ctx.move_regions {
                    tracing::warn!("Quota exceeded in region {}, moving to next region", region);
                    break;
                }
            }

            ctx.regions_attempted += 1;
            if ctx.target_reached() {
                break;
            }
        }

        if !ctx.target_reached() {
            tracing::warn!(
                "All regions attempted, there are not enough resources to create the desired {} instances, {} created",
                ctx.target,
                ctx.instances_created
            );
        }

        Ok(ProvisionOutcome::from((ctx, regions.len())))
    }

    /// Create instances in one zone until the target is met or quota runs out
    async fn fill_zone(
        &self,
        ctx: &mut RunContext,
        candidate: &AcceleratorAvailability,
        machine_type: &str,
    ) -> Result<()> {
        let ic = self.instance_config();
        let zone = candidate.zone.as_str();
        let bundled = bundles_gpus(candidate, machine_type);

        for _slot in 0..ctx.target {
            if ctx.target_reached() {
                break;
            }

            let name = instance_name(&ic.name, ctx.instances_created + 1, zone);
            if name.trim().is_empty() {
                tracing::error!("Invalid instance name. Skipping this iteration.");
                continue;
            }

            match self.create_instance(zone, machine_type, bundled, &name).await {
                Ok(()) => {
                    ctx.record(CreatedInstance {
                        name: name.clone(),
                        zone: zone.to_string(),
                    });
                    tracing::info!("Success: {} created", name);
                    tracing::info!(
                        "{} created, {} more to create",
                        ctx.instances_created,
                        ctx.remaining()
                    );
                }
                Err(e) if e.is_quota_exceeded() => {
                    tracing::warn!("Error creating instance {}: {}", name, e);
                    ctx.move_regions = true;
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    async fn create_instance(
        &self,
        zone: &str,
        machine_type: &str,
        bundles_gpus: bool,
        name: &str,
    ) -> Result<()> {
        tracing::info!("Creating instance {}.", name);
        let body = build_instance(self.instance_config(), zone, machine_type, bundles_gpus, name);

        let operation = self.api.insert_instance(self.project(), zone, &body).await?;
        wait_for_operation(
            self.api,
            self.project(),
            zone,
            &operation.name,
            self.poll_interval,
        )
        .await?;
        Ok(())
    }

    /// Delete every created instance, in order
    pub async fn teardown(&self, instances: Vec<CreatedInstance>) -> Result<usize> {
        teardown(self.api, self.project(), instances, self.poll_interval).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProvisionError;
    use crate::mock::{Call, InsertOutcome, MockCompute, accelerator, machine, zone};
    use std::collections::HashMap;

    fn test_config(machine_type: &str, gpus: u32, instances: u32) -> GpuConfig {
        GpuConfig {
            project_id: "test-project".into(),
            instance_config: InstanceConfig {
                name: "gpu".into(),
                machine_type: machine_type.into(),
                gpu_type: "nvidia-tesla-t4".into(),
                number_of_gpus: gpus,
                number_of_instances: instances,
                zone: Vec::new(),
                gpu_machine_type_mapping: HashMap::new(),
                image_project: "debian-cloud".into(),
                image_family: "debian-12".into(),
                disk_size_gb: 50,
                network: "global/networks/default".into(),
            },
        }
    }

    fn candidate(zone_name: &str) -> AcceleratorAvailability {
        let info = crate::discovery::ZoneInfo::from_zone_name(zone_name);
        AcceleratorAvailability {
            region: info.region,
            zone: info.zone,
            machine_type: "n1-standard-8".into(),
            guest_cpus: 8,
            name: "nvidia-tesla-t4".into(),
            description: "NVIDIA T4".into(),
            maximum_cards_per_instance: 4,
            bundles_gpus: false,
            accelerators: None,
        }
    }

    fn names(instances: &[CreatedInstance]) -> Vec<&str> {
        instances.iter().map(|i| i.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_quota_moves_to_next_region() {
        let mock = MockCompute::new().script_inserts(
            "us-central1-a",
            vec![InsertOutcome::Success, InsertOutcome::QuotaExceeded],
        );
        let config = test_config("n1-standard-8", 1, 3);
        let provisioner = Provisioner::new(&mock, &config).with_poll_interval(Duration::ZERO);

        let outcome = provisioner
            .provision(&[candidate("us-central1-a"), candidate("us-west1-b")])
            .await
            .unwrap();

        assert_eq!(
            names(&outcome.created),
            vec![
                "gpu-1-us-central1-a",
                "gpu-2-us-west1-b",
                "gpu-3-us-west1-b"
            ]
        );
        assert_eq!(
            outcome
                .created
                .iter()
                .filter(|i| i.zone == "us-central1-a")
                .count(),
            1
        );
        assert!(outcome.is_complete());
        assert_eq!(outcome.regions_attempted, 2);
        assert_eq!(
            mock.insert_attempts(),
            vec![
                "gpu-1-us-central1-a",
                "gpu-2-us-central1-a",
                "gpu-2-us-west1-b",
                "gpu-3-us-west1-b"
            ]
        );
    }

    #[tokio::test]
    async fn test_quota_abandons_remaining_zones_in_region() {
        let mock = MockCompute::new()
            .script_inserts("us-central1-a", vec![InsertOutcome::QuotaExceeded]);
        let config = test_config("n1-standard-8", 1, 1);
        let provisioner = Provisioner::new(&mock, &config).with_poll_interval(Duration::ZERO);

        let outcome = provisioner
            .provision(&[
                candidate("us-central1-a"),
                candidate("us-central1-b"),
                candidate("us-west1-b"),
            ])
            .await
            .unwrap();

        assert_eq!(names(&outcome.created), vec!["gpu-1-us-west1-b"]);
        assert!(
            !mock
                .insert_attempts()
                .iter()
                .any(|n| n.ends_with("us-central1-b"))
        );
    }

    #[tokio::test]
    async fn test_stops_at_target() {
        let mock = MockCompute::new();
        let config = test_config("n1-standard-8", 1, 1);
        let provisioner = Provisioner::new(&mock, &config).with_poll_interval(Duration::ZERO);

        let outcome = provisioner
            .provision(&[candidate("us-central1-a"), candidate("us-west1-b")])
            .await
            .unwrap();

        assert_eq!(names(&outcome.created), vec!["gpu-1-us-central1-a"]);
        assert_eq!(mock.insert_attempts().len(), 1);
        assert_eq!(outcome.regions_attempted, 1);
    }

    #[tokio::test]
    async fn test_partial_success_when_regions_exhausted() {
        let mock = MockCompute::new()
            .script_inserts(
                "us-central1-a",
                vec![InsertOutcome::Success, InsertOutcome::QuotaExceeded],
            )
            .script_inserts("us-west1-b", vec![InsertOutcome::QuotaExceeded]);
        let config = test_config("n1-standard-8", 1, 4);
        let provisioner = Provisioner::new(&mock, &config).with_poll_interval(Duration::ZERO);

        let outcome = provisioner
            .provision(&[candidate("us-central1-a"), candidate("us-west1-b")])
            .await
            .unwrap();

        assert_eq!(outcome.created.len(), 1);
        assert_eq!(outcome.requested, 4);
        assert!(!outcome.is_complete());
        assert_eq!(outcome.regions_attempted, 2);
        assert_eq!(outcome.regions_available, 2);
    }

    #[tokio::test]
    async fn test_other_http_error_is_fatal() {
        let mock = MockCompute::new().script_inserts(
            "us-central1-a",
            vec![InsertOutcome::HttpError(403, "Permission denied".into())],
        );
        let config = test_config("n1-standard-8", 1, 2);
        let provisioner = Provisioner::new(&mock, &config).with_poll_interval(Duration::ZERO);

        let err = provisioner
            .provision(&[candidate("us-central1-a"), candidate("us-west1-b")])
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::Cloud(ref e) if e.status() == Some(403)));
        assert_eq!(mock.insert_attempts().len(), 1);
    }

    #[tokio::test]
    async fn test_operation_error_is_fatal() {
        let mock = MockCompute::new().script_inserts(
            "us-central1-a",
            vec![InsertOutcome::OperationError("ZONE_RESOURCE_POOL_EXHAUSTED".into())],
        );
        let config = test_config("n1-standard-8", 1, 2);
        let provisioner = Provisioner::new(&mock, &config).with_poll_interval(Duration::ZERO);

        let err = provisioner
            .provision(&[candidate("us-central1-a"), candidate("us-west1-b")])
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::OperationFailed { .. }));
        assert_eq!(mock.insert_attempts(), vec!["gpu-1-us-central1-a"]);
    }

    #[tokio::test]
    async fn test_machine_type_override() {
        let mock = MockCompute::new();
        let mut config = test_config("n1-standard-8", 1, 1);
        config
            .instance_config
            .gpu_machine_type_mapping
            .insert("nvidia-tesla-t4".into(), "n1-highmem-8".into());
        let provisioner = Provisioner::new(&mock, &config).with_poll_interval(Duration::ZERO);

        provisioner
            .provision(&[candidate("us-central1-a")])
            .await
            .unwrap();

        let inserts: Vec<Call> = mock
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Insert { .. }))
            .collect();
        assert_eq!(
            inserts,
            vec![Call::Insert {
                zone: "us-central1-a".into(),
                name: "gpu-1-us-central1-a".into(),
                machine_type: "zones/us-central1-a/machineTypes/n1-highmem-8".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_round_trip_single_zone() {
        let mock = MockCompute::new()
            .with_zones(vec![zone("us-central1-a", "UP"), zone("us-west1-b", "UP")])
            .with_machine_types(
                "us-central1-a",
                vec![machine("n1-standard-8", 8, None)],
            )
            .with_machine_types("us-west1-b", vec![machine("n1-standard-4", 4, None)])
            .with_accelerators("us-central1-a", vec![accelerator("nvidia-tesla-t4", 4)]);
        let config = test_config("n1-standard-8", 2, 2);
        let provisioner = Provisioner::new(&mock, &config).with_poll_interval(Duration::ZERO);

        let candidates = provisioner.find_capacity().await.unwrap();
        assert_eq!(candidates.len(), 1);

        let outcome = provisioner.provision(&candidates).await.unwrap();
        assert_eq!(
            outcome.created,
            vec![
                CreatedInstance {
                    name: "gpu-1-us-central1-a".into(),
                    zone: "us-central1-a".into()
                },
                CreatedInstance {
                    name: "gpu-2-us-central1-a".into(),
                    zone: "us-central1-a".into()
                },
            ]
        );

        let deleted = provisioner.teardown(outcome.created).await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(
            mock.deletes(),
            vec!["gpu-1-us-central1-a", "gpu-2-us-central1-a"]
        );
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_api_calls() {
        let mock = MockCompute::new().with_zones(vec![zone("us-central1-a", "UP")]);
        let config = test_config("a2-highgpu-8g", 4, 1);
        let provisioner = Provisioner::new(&mock, &config);

        let err = provisioner.find_capacity().await.unwrap_err();

        assert!(matches!(err, ProvisionError::Config(_)));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_build_instance_attaches_accelerators() {
        let config = test_config("n1-standard-8", 2, 1);
        let body = build_instance(
            &config.instance_config,
            "us-central1-a",
            "n1-standard-8",
            false,
            "gpu-1-us-central1-a",
        );

        assert_eq!(body.guest_accelerators.len(), 1);
        assert_eq!(
            body.guest_accelerators[0].accelerator_type,
            "zones/us-central1-a/acceleratorTypes/nvidia-tesla-t4"
        );
        assert_eq!(body.guest_accelerators[0].accelerator_count, 2);
        assert_eq!(body.disks[0].initialize_params.disk_size_gb, "50");
    }

    #[test]
    fn test_build_instance_bundled_gpus() {
        let config = test_config("a2-highgpu-1g", 1, 1);
        let body = build_instance(
            &config.instance_config,
            "us-central1-a",
            "a2-highgpu-1g",
            true,
            "gpu-1-us-central1-a",
        );

        assert!(body.guest_accelerators.is_empty());
        assert_eq!(body.machine_type, "zones/us-central1-a/machineTypes/a2-highgpu-1g");
    }

    #[tokio::test]
    async fn test_built_in_gpus_outside_a2_family_are_not_attached() {
        let mock = MockCompute::new()
            .with_zones(vec![zone("us-central1-a", "UP")])
            .with_machine_types(
                "us-central1-a",
                vec![machine("g2-standard-4", 4, Some(("nvidia-l4", 1)))],
            )
            .with_accelerators("us-central1-a", vec![accelerator("nvidia-l4", 8)]);
        let mut config = test_config("g2-standard-4", 1, 1);
        config.instance_config.gpu_type = "nvidia-l4".into();
        let provisioner = Provisioner::new(&mock, &config).with_poll_interval(Duration::ZERO);

        let candidates = provisioner.find_capacity().await.unwrap();
        provisioner.provision(&candidates).await.unwrap();

        let bodies = mock.insert_bodies();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0].machine_type, "zones/us-central1-a/machineTypes/g2-standard-4");
        assert!(bodies[0].guest_accelerators.is_empty());
    }

    #[test]
    fn test_bundles_gpus_for_mapped_machine_type() {
        let mut bundled = candidate("us-central1-a");
        bundled.machine_type = "g2-standard-4".into();
        bundled.bundles_gpus = true;

        assert!(bundles_gpus(&bundled, "g2-standard-4"));
        assert!(!bundles_gpus(&bundled, "n1-standard-8"));
        assert!(bundles_gpus(&candidate("us-central1-a"), "a2-highgpu-1g"));
        assert!(!bundles_gpus(&candidate("us-central1-a"), "n1-standard-8"));
    }

    #[test]
    fn test_instance_name() {
        assert_eq!(instance_name("gpu", 3, "us-east1-c"), "gpu-3-us-east1-c");
    }
}
