//! Reclaim CLI - reclaim disk space and memory on a workstation.

use clap::Parser;
use reclaim_cli::cli::RunArgs;
use reclaim_cli::commands;
use reclaim_cli::{Cli, Command, Config, Formatter};

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run() -> reclaim_cli::Result<i32> {
    // Parse CLI arguments
    let cli = Cli::parse();
    reclaim_cli::init_tracing(cli.verbose);

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::path()?,
    };

    // `config init` must work even when the existing file is broken
    let config = match &cli.command {
        Some(Command::Config(_)) => Config::load_from(&config_path).unwrap_or_default(),
        _ => Config::load_from(&config_path)?,
    };

    // Determine output format
    let format = cli.format.map(Into::into).unwrap_or(config.output.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.output.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        None => commands::execute_run(RunArgs::default(), config, &formatter).await,
        Some(Command::Run(args)) => commands::execute_run(args, config, &formatter).await,
        Some(Command::Classify(args)) => commands::execute_classify(args, &config, &formatter).await,
        Some(Command::Targets) => commands::execute_targets(&config, &formatter),
        Some(Command::Watch(args)) => commands::execute_watch(args, config, &formatter).await,
        Some(Command::Config(args)) => commands::execute_config(args, &config, &config_path, &formatter),
    }
}
