use gpufinder_cloud::CloudError;
use gpufinder_config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("No machine types of {0} are available")]
    NoMachineType(String),

    #[error(
        "No accelerator types of {gpu_type} are available with {machine_type} in any zone, \
        or wrong number of GPUs requested"
    )]
    NoAccelerator {
        gpu_type: String,
        machine_type: String,
    },

    #[error("Operation {operation} in {zone} failed: {error}")]
    OperationFailed {
        operation: String,
        zone: String,
        error: String,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Compute API error: {0}")]
    Cloud(#[from] CloudError),
}

impl ProvisionError {
    /// True when the underlying API call was rejected for quota
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, ProvisionError::Cloud(e) if e.is_quota_exceeded())
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
