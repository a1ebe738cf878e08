//! Long-running operation waiter
//!
//! Polls `zoneOperations.get` at a fixed interval until the operation
//! reports `DONE`. There is no backoff and no deadline; the service is
//! expected to finish every operation it accepted.

use crate::error::{ProvisionError, Result};
use gpufinder_cloud::{ComputeApi, Operation};
use std::time::Duration;
use tokio::time::sleep;

/// Pause between status checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Wait for a zonal operation to finish
///
/// # Returns
/// * `Ok(Operation)` - the finished operation
/// * `Err(ProvisionError::OperationFailed)` - the operation finished with an error payload
/// * `Err(ProvisionError::Cloud)` - a status check itself failed
pub async fn wait_for_operation(
    api: &dyn ComputeApi,
    project: &str,
    zone: &str,
    operation: &str,
    poll_interval: Duration,
) -> Result<Operation> {
    tracing::info!("Waiting for operation {} to finish...", operation);

    let mut polls = 0u32;
    loop {
        let result = api.get_zone_operation(project, zone, operation).await?;
        polls += 1;

        if result.is_done() {
            tracing::debug!("Operation {} done after {} polls", operation, polls);

            if let Some(error) = result.error {
                return Err(ProvisionError::OperationFailed {
                    operation: operation.to_string(),
                    zone: zone.to_string(),
                    error: error.to_string(),
                });
            }
            return Ok(result);
        }

        tracing::trace!("Operation {} is {}", operation, result.status);
        if !poll_interval.is_zero() {
            sleep(poll_interval).await;
        }
    }
}
