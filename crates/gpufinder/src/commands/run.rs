use crate::progress::StepProgress;
use crate::utils;
use colored::Colorize;
use gpufinder_core::{ProvisionOutcome, Provisioner};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

pub async fn handle(
    config_path: Option<&Path>,
    access_token: Option<&str>,
    poll_interval: Duration,
    yes: bool,
) -> anyhow::Result<()> {
    let config = utils::load_validated_config(config_path)?;
    utils::print_request(&config);
    let client = utils::connect(access_token).await?;
    let provisioner = Provisioner::new(&client, &config).with_poll_interval(poll_interval);

    let progress = StepProgress::new("Searching zones...");
    let candidates = match provisioner.find_capacity().await {
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
    println!("{}", "Creating instances...".blue());
    let outcome = provisioner.provision(&candidates).await?;
    print_outcome(&outcome);

    if outcome.created.is_empty() {
        return Ok(());
    }

    if !yes {
        println!();
        print!("Hit enter to delete instances ");
        std::io::stdout().flush()?;
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
    }

    println!();
    println!("{}", "Deleting instances...".blue());
    let deleted = provisioner.teardown(outcome.created).await?;
    println!(
        "{}",
        format!("✓ Deleted {} instances", deleted).green().bold()
    );

    Ok(())
}

fn print_outcome(outcome: &ProvisionOutcome) {
    println!();
    for instance in &outcome.created {
        println!("  ✓ {} ({})", instance.name.cyan(), instance.zone);
    }

    let summary = format!(
        "{} created out of {} requested, {} of {} regions and {} zones attempted",
        outcome.created.len(),
        outcome.requested,
        outcome.regions_attempted,
        outcome.regions_available,
        outcome.zones_attempted
    );
    if outcome.is_complete() {
        println!("{}", summary.green().bold());
    } else {
        println!(
            "{} {}",
            "⚠ Not enough capacity:".yellow().bold(),
            summary
        );
    }
}
