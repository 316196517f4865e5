pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::split::SplitPolicyArg;

#[derive(Debug, Parser)]
#[command(
    name = "pelada",
    about = "Pelada operator CLI",
    long_about = "Inspect configuration, check readiness, list the poll roster, and balance teams offline.",
    after_help = "Examples:\n  pelada doctor --json\n  pelada roster\n  pelada split --policy optimal Caria Tiago Filipe Gui João Miguel Pedro Rodrigo Salvador Pipa"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, Slack token readiness, and rating coverage of the roster")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "List the poll order with each player's rating")]
    Roster {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Balance the given players into two teams of five using configured ratings")]
    Split {
        #[arg(long, value_enum, default_value_t = SplitPolicyArg::Optimal)]
        policy: SplitPolicyArg,
        #[arg(long, help = "Partition rank for the ranked policy (0 = fairest)")]
        rank: Option<usize>,
        #[arg(long, help = "Seed for reproducible random choices")]
        seed: Option<u64>,
        #[arg(required = true, help = "Confirmed players, in confirmation order")]
        players: Vec<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Roster { json } => commands::roster::run(json),
        Command::Split { policy, rank, seed, players } => {
            commands::split::run(policy, rank, seed, &players)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
