use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;

use vizzu_studio::logger::{self, LogLevel, LoggerConfig};
use vizzu_studio::{Config, Pipeline, PlanCatalog, StudioError, SupabasePlanSource, WorkflowOutput};

#[derive(Parser)]
#[command(name = "vizzu-studio", version, about = "Generate and publish multi-angle model shots")]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "VIZZU_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit JSON log lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one workflow record and print the result record on stdout
    Generate {
        /// Input record; stdin when omitted
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Print the resolved plan catalog
    Plans,
}

fn read_input(path: Option<&PathBuf>) -> Result<String, StudioError> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| StudioError::Request(format!("cannot read {}: {}", path.display(), e))),
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .map_err(|e| StudioError::Request(format!("cannot read stdin: {}", e)))?;
            Ok(raw)
        }
    }
}

fn emit(output: &WorkflowOutput) {
    match serde_json::to_string(output) {
        Ok(json) => println!("{}", json),
        Err(e) => println!(r#"{{"success":false,"error":"cannot encode result: {}"}}"#, e),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let cli = Cli::parse();

    let level = LogLevel::parse(&cli.log_level).unwrap_or(LogLevel::Info);
    let logger_config = if cli.json_logs {
        LoggerConfig::production().with_level(level)
    } else {
        LoggerConfig::development().with_level(level)
    };
    logger::init_with_config(logger_config)?;
    if !dotenv_loaded {
        log::debug!("No .env file found, using process environment");
    }

    let config = Config::from_env();
    logger::log_config_info(&config);

    let plans = match SupabasePlanSource::new(config.storage.clone()) {
        Ok(source) => PlanCatalog::resolve(&source).await,
        Err(e) => {
            log::warn!("Plan overrides disabled: {}", e);
            PlanCatalog::defaults()
        }
    };

    match cli.command {
        Command::Plans => {
            println!("{}", serde_json::to_string_pretty(&plans)?);
        }
        Command::Generate { input } => {
            log::debug!("{} plans available", plans.plans().len());
            let output = match read_input(input.as_ref()) {
                Ok(raw) => match Pipeline::from_config(&config) {
                    Ok(pipeline) => pipeline.run_json(&raw).await,
                    Err(e) => WorkflowOutput::failed(e),
                },
                Err(e) => WorkflowOutput::failed(e),
            };
            emit(&output);
        }
    }

    Ok(())
}
