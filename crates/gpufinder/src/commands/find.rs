use crate::progress::StepProgress;
use crate::utils;
use colored::Colorize;
use gpufinder_core::{Provisioner, distinct_in_order};
use std::path::Path;

pub async fn handle(config_path: Option<&Path>, access_token: Option<&str>) -> anyhow::Result<()> {
    let config = utils::load_validated_config(config_path)?;
    utils::print_request(&config);
    let client = utils::connect(access_token).await?;

    let progress = StepProgress::new("Searching zones...");
    let candidates = match Provisioner::new(&client, &config).find_capacity().await {
        Ok(candidates) => {
            progress.finish_success(&format!("{} zones qualify", candidates.len()));
            candidates
        }
        Err(e) => {
            progress.finish_error(&e.to_string());
            return Err(e.into());
        }
    };

    println!();
    for c in &candidates {
        println!(
            "  {} {} ({} vCPUs) · {} × up to {} per instance",
            c.zone.cyan(),
            c.machine_type,
            c.guest_cpus,
            c.name,
            c.maximum_cards_per_instance
        );
    }

    let regions = distinct_in_order(candidates.iter().map(|c| c.region.as_str()));
    println!();
    println!(
        "{} {}",
        format!("{} regions:", regions.len()).bold(),
        regions.join(", ")
    );

    Ok(())
}
