use colored::Colorize;
use std::path::Path;

pub fn handle(config_path: Option<&Path>) -> anyhow::Result<()> {
    println!("{}", "Validating configuration...".blue());

    let (path, config) = match gpufinder_config::load(config_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ Could not load the configuration".red().bold());
            eprintln!("  {}", e);
            eprintln!();
            eprintln!(
                "Pass --config, set {}, or create ./{}",
                gpufinder_config::CONFIG_PATH_ENV,
                gpufinder_config::CONFIG_FILE_NAME
            );
            std::process::exit(1);
        }
    };
    println!("File: {}", path.display().to_string().cyan());

    if let Err(e) = config.validate() {
        eprintln!();
        eprintln!("{}", "✗ Configuration error".red().bold());
        eprintln!("  {}", e);
        std::process::exit(1);
    }

    let ic = &config.instance_config;
    println!("{}", "✓ Configuration is valid".green().bold());
    println!();
    println!("Summary:");
    println!("  project:      {}", config.project_id.cyan());
    println!("  name prefix:  {}", ic.name);
    println!("  machine type: {}", ic.machine_type);
    if ic.effective_machine_type() != ic.machine_type {
        println!(
            "    - {} (override for {})",
            ic.effective_machine_type().cyan(),
            ic.gpu_type
        );
    }
    println!("  GPUs:         {} × {}", ic.number_of_gpus, ic.gpu_type);
    println!("  instances:    {}", ic.number_of_instances);
    if ic.has_zone_filter() {
        println!("  zones:        {}", ic.zone.join(", "));
    } else {
        println!("  zones:        all");
    }
    println!("  boot image:   {}", ic.source_image());

    Ok(())
}
