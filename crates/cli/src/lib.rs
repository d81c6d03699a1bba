pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "quarry",
    about = "Quarry procurement matching CLI",
    long_about = "Run supplier search, quoting, and routing against the local mock catalog.",
    after_help = "Examples:\n  quarry demo --material cement --quantity 50\n  quarry materials\n  quarry config"
)]
pub struct Cli {
    /// Path to a quarry.toml config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run a search/quote/route round trip and print the JSON bundles")]
    Demo {
        #[arg(long, default_value = "cement", help = "Material id or alias to search for")]
        material: String,
        #[arg(long, default_value_t = 50.0, help = "Requested quantity in tons")]
        quantity: f64,
        #[arg(long, default_value_t = 17.3352, help = "Origin latitude")]
        latitude: f64,
        #[arg(long, default_value_t = 78.4537, help = "Origin longitude")]
        longitude: f64,
    },
    #[command(about = "List loadable materials and their supplier counts")]
    Materials,
    #[command(about = "Print the effective configuration")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Demo { material, quantity, latitude, longitude } => {
            commands::demo::run(cli.config, &material, quantity, latitude, longitude)
        }
        Command::Materials => commands::materials::run(cli.config),
        Command::Config => commands::config::run(cli.config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}
