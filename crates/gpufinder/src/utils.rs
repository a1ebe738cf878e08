use anyhow::Context;
use colored::Colorize;
use gpufinder_cloud::ComputeApi;
use gpufinder_cloud_gcp::{Gcloud, GceClient, resolve_access_token};
use gpufinder_config::GpuConfig;
use std::path::Path;

/// Load the configuration, printing where it came from
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<GpuConfig> {
    let (path, config) =
        gpufinder_config::load(explicit).context("failed to load the GPU configuration")?;
    println!("📄 Configuration: {}", path.display().to_string().cyan());
    Ok(config)
}

pub fn load_validated_config(explicit: Option<&Path>) -> anyhow::Result<GpuConfig> {
    let config = load_config(explicit)?;
    config.validate()?;
    Ok(config)
}

/// Build the Compute Engine client for the resolved access token
pub async fn connect(access_token: Option<&str>) -> anyhow::Result<GceClient> {
    let token = resolve_access_token(access_token)
        .await
        .context("no Compute Engine credentials; pass --access-token or run `gcloud auth login`")?;

    if access_token.is_none() {
        if let Ok(Some(account)) = Gcloud::new().active_account().await {
            println!("🔑 Account: {}", account.cyan());
        }
    }

    let client = GceClient::new(token);
    tracing::debug!("Using the {} compute backend", client.name());
    Ok(client)
}

/// One-line summary of the instance the configuration asks for
pub fn print_request(config: &GpuConfig) {
    let ic = &config.instance_config;
    println!(
        "🎯 {} × {} with {} × {} in project {}",
        ic.number_of_instances,
        ic.effective_machine_type().cyan(),
        ic.number_of_gpus,
        ic.gpu_type.cyan(),
        config.project_id.cyan()
    );
    if ic.has_zone_filter() {
        println!("   zones: {}", ic.zone.join(", "));
    }
}
