use std::path::Path;

use clap::Parser;
use log::{error, info};

use timenotes::{App, Cli, Commands, Config, Result};

pub fn initialize_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    info!("Logger initialized");
}

fn handle_config(
    config_path: &Path,
    config: &mut Config,
    show: bool,
    set: Option<String>,
    reset: bool,
) -> Result<()> {
    // Bare `config` shows the current settings.
    let show = show || (set.is_none() && !reset);

    if reset {
        *config = Config::default();
        config.save(config_path)?;
        println!("Configuration reset to defaults.");
    }

    if let Some(assignment) = set {
        config.set(&assignment)?;
        config.save(config_path)?;
        println!("Updated {}", assignment);
    }

    if show {
        println!("# {}", config_path.display());
        println!("{}", serde_json::to_string_pretty(config)?);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load(&config_path)?;

    match cli.command {
        Commands::Config { show, set, reset } => {
            handle_config(&config_path, &mut config, show, set, reset)
        }
        command => {
            if let Some(notes_file) = cli.notes_file {
                config.notes_file = notes_file;
            }
            let mut app = App::new(config, cli.verbose)?;
            app.run(command).await
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    initialize_logger(cli.verbose);

    info!("Application starting up");

    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    info!("Application shutting down");
}
