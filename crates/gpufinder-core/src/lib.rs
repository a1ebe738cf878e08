//! GPU Finder core
//!
//! Finds the zones that can host the configured GPU machine and creates
//! instances across them with region/zone fallback:
//!
//! 1. [`discovery::discover_zones`] lists `UP` zones, optionally filtered
//! 2. [`discovery::find_machine_availability`] keeps zones offering the machine type
//! 3. [`discovery::find_accelerator_quota`] keeps zones whose per-instance GPU limit fits
//! 4. [`Provisioner::provision`] creates instances, moving regions on quota errors
//! 5. [`Provisioner::teardown`] deletes what was created
//!
//! Everything runs sequentially against a [`gpufinder_cloud::ComputeApi`].

pub mod discovery;
pub mod error;
pub mod operation;
pub mod provision;
pub mod teardown;

#[cfg(test)]
mod mock;

pub use discovery::{
    AcceleratorAvailability, MachineAvailability, ZoneAccelerator, ZoneInfo, discover_zones,
    distinct_in_order, find_accelerator_quota, find_machine_availability, list_accelerators,
    region_of,
};
pub use error::{ProvisionError, Result};
pub use operation::{DEFAULT_POLL_INTERVAL, wait_for_operation};
pub use provision::{
    CreatedInstance, ProvisionOutcome, Provisioner, RunContext, build_instance, bundles_gpus,
    instance_name,
};
pub use teardown::teardown;
