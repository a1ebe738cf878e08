//! Deletion of the instances created by a run

use crate::error::Result;
use crate::operation::wait_for_operation;
use crate::provision::CreatedInstance;
use gpufinder_cloud::ComputeApi;
use std::time::Duration;

/// Delete each instance in creation order, waiting for every delete to finish
///
/// Stops at the first failure; instances after it are left running.
/// Returns the number of instances deleted.
pub async fn teardown(
    api: &dyn ComputeApi,
    project: &str,
    instances: Vec<CreatedInstance>,
    poll_interval: Duration,
) -> Result<usize> {
    let total = instances.len();
    tracing::info!("Deleting {} instances", total);

    for (deleted, instance) in instances.into_iter().enumerate() {
        tracing::info!("Deleting {} from {}", instance.name, instance.zone);
        let operation = api
            .delete_instance(project, &instance.zone, &instance.name)
            .await?;
        wait_for_operation(api, project, &instance.zone, &operation.name, poll_interval)
            .await
            .inspect_err(|_| {
                tracing::error!(
                    "Teardown stopped after {} of {} deletions",
                    deleted,
                    total
                )
            })?;
        tracing::info!("Deleted {}", instance.name);
    }

    Ok(total)
}
