//! GPU Finder compute abstraction
//!
//! This crate defines the seam between the provisioning logic and the cloud
//! compute service it drives. The provisioner only ever talks to a
//! [`ComputeApi`]; the concrete REST client lives in `gpufinder-cloud-gcp`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 gpu-finder CLI                   │
//! │            (run / find / accelerators)           │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                gpufinder-core                    │
//! │   discovery → capability → quota → provision     │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               gpufinder-cloud                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │        trait ComputeApi { ... }          │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │  Wire models │  │  Pagination  │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────┐
//! │ compute engine│
//! │  REST client  │
//! └───────────────┘
//! ```

pub mod error;
pub mod model;
pub mod page;
pub mod provider;

// Re-exports
pub use error::{CloudError, Result};
pub use model::{
    AcceleratorConfig, AcceleratorType, AccessConfig, AttachedDisk, DiskInitializeParams,
    InstanceResource, MachineAccelerator, MachineType, NetworkInterface, Operation,
    OperationStatus, Scheduling, Zone,
};
pub use page::{Page, collect_pages};
pub use provider::ComputeApi;
