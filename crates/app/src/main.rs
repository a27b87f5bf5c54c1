//! LeadFlow command line entry point

use std::process::ExitCode;

use clap::Parser;
use leadflow_domain::{Config, Result};
use leadflow_infra::config::{apply_env_overrides, load, load_from_file};
use leadflow_lib::cli::{self, Cli};
use leadflow_lib::utils::logging::init_tracing;
use leadflow_lib::AppContext;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv().ok();
    let args = Cli::parse();

    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("leadflow: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = init_tracing(&config.logging) {
        eprintln!("leadflow: {err}");
        return ExitCode::FAILURE;
    }
    if let Some(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    match run(config, args).await {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(rendered) => {
                println!("{rendered}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("leadflow: {err}");
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            error!(error_type = err.label(), "Command failed");
            eprintln!("leadflow: {err}");
            ExitCode::FAILURE
        }
    }
}

fn resolve_config(args: &Cli) -> Result<Config> {
    match &args.config {
        Some(path) => {
            let mut config = load_from_file(Some(path.clone()))?;
            apply_env_overrides(&mut config)?;
            config.validate()?;
            Ok(config)
        }
        None => load(),
    }
}

async fn run(config: Config, args: Cli) -> Result<serde_json::Value> {
    let ctx = AppContext::new(config)?;
    cli::execute(&ctx, args.command).await
}
