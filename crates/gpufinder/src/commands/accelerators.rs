use crate::progress::StepProgress;
use crate::utils;
use colored::Colorize;
use std::path::Path;

pub async fn handle(config_path: Option<&Path>, access_token: Option<&str>) -> anyhow::Result<()> {
    let config = utils::load_config(config_path)?;
    let client = utils::connect(access_token).await?;
    let project = &config.project_id;

    let progress = StepProgress::new("Listing accelerator types...");
    let result = async {
        let zones =
            gpufinder_core::discover_zones(&client, project, &config.instance_config.zone).await?;
        gpufinder_core::list_accelerators(&client, project, &zones).await
    }
    .await;

    let accelerators = match result {
        Ok(accelerators) => {
            progress.finish_success(&format!("{} accelerator offerings", accelerators.len()));
            accelerators
        }
        Err(e) => {
            progress.finish_error(&e.to_string());
            return Err(e.into());
        }
    };

    let mut current_zone = "";
    for entry in &accelerators {
        if entry.zone != current_zone {
            println!();
            println!("{}", entry.zone.cyan().bold());
            current_zone = entry.zone.as_str();
        }
        println!(
            "  - {} (max {} per instance) {}",
            entry.accelerator.name,
            entry.accelerator.maximum_cards_per_instance,
            entry.accelerator.description.dimmed()
        );
    }

    Ok(())
}
