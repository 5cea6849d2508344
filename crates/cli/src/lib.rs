pub mod commands;
pub mod trigger;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "rolodex",
    about = "Rolodex operator CLI",
    long_about = "Operate Rolodex migrations, demo seeds, config inspection, readiness checks, and the customer import trigger.",
    after_help = "Examples:\n  rolodex doctor --json\n  rolodex config\n  rolodex import"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo customer fixtures")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, import feed settings, and DB connectivity checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Trigger a customer import against a running server and redraw the list")]
    Import {
        #[arg(
            long,
            help = "Base URL of the rolodex server (defaults to the configured bind address and port)"
        )]
        server_url: Option<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Import { server_url } => commands::import::run(server_url),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
