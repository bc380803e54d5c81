//! ksm CLI - versioned schema setup and migration for Cassandra keyspaces

use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::common::{exit_code_for, init_logger, ExitCode};
use commands::{create_keyspace, repair, setup, status, update};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logger(&cli.global);

    let result = match &cli.command {
        cli::Commands::SetupSchema(args) => setup::execute(args, &cli.global).await,
        cli::Commands::UpdateSchema(args) => update::execute(args, &cli.global).await,
        cli::Commands::CreateKeyspace(args) => create_keyspace::execute(args, &cli.global).await,
        cli::Commands::Status(args) => status::execute(args, &cli.global).await,
        cli::Commands::RepairVersion => repair::execute(&cli.global).await,
    };

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            if !err.is::<ExitCode>() {
                log::error!("{:#}", err);
            }
            std::process::ExitCode::from(exit_code_for(&err))
        }
    }
}
