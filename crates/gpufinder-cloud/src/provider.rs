//! Compute provider trait definition

use crate::error::Result;
use crate::model::{AcceleratorType, InstanceResource, MachineType, Operation, Zone};
use crate::page::Page;
use async_trait::async_trait;

/// Compute service abstraction trait
///
/// Mirrors the handful of Compute Engine endpoints the provisioner needs.
/// List calls return a single page; pass the previous page's
/// `next_page_token` to get the following one.
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// Returns the provider name (e.g., "gce")
    fn name(&self) -> &str;

    /// `zones.list`
    async fn list_zones(&self, project: &str, page_token: Option<&str>) -> Result<Page<Zone>>;

    /// `machineTypes.list` for one zone
    async fn list_machine_types(
        &self,
        project: &str,
        zone: &str,
        page_token: Option<&str>,
    ) -> Result<Page<MachineType>>;

    /// `acceleratorTypes.list` for one zone
    async fn list_accelerator_types(
        &self,
        project: &str,
        zone: &str,
        page_token: Option<&str>,
    ) -> Result<Page<AcceleratorType>>;

    /// `instances.insert`; returns the pending operation
    async fn insert_instance(
        &self,
        project: &str,
        zone: &str,
        instance: &InstanceResource,
    ) -> Result<Operation>;

    /// `instances.delete`; returns the pending operation
    async fn delete_instance(&self, project: &str, zone: &str, instance: &str)
    -> Result<Operation>;

    /// `zoneOperations.get`
    async fn get_zone_operation(
        &self,
        project: &str,
        zone: &str,
        operation: &str,
    ) -> Result<Operation>;
}
