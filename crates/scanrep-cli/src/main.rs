//! scanrep CLI - Main entry point

use clap::Parser;
use scanrep_cli::{commands, Cli, Commands, Config};
use scanrep_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // .env values feed both clap's env fallbacks and the config layer
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if cli.markdown_help {
        println!("{}", clap_markdown::help_markdown::<Cli>());
        return;
    }

    if cli.command.is_none() {
        eprintln!("Error: A subcommand is required");
        eprintln!();
        eprintln!("For more information, try '--help'.");
        process::exit(2);
    }

    // Verbose: debug to console. Otherwise warnings only.
    let log_config = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Warn })
        .output(LogOutput::Console)
        .log_file_prefix("scanrep")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The CLI works without logging, so a failed init is not fatal
    let _guard = init_logging(&log_config).ok();

    if let Err(e) = execute_command(cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Resolve configuration and execute the CLI command
async fn execute_command(cli: Cli) -> scanrep_cli::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.set_database(db);
    }
    if let Some(table) = cli.table {
        config.set_table(table);
    }

    // Progress bars and debug logs share stderr
    let quiet = cli.verbose;
    let Some(command) = cli.command else {
        return Err(scanrep_cli::CliError::config("a subcommand is required"));
    };

    match command {
        Commands::Load { csv, input } => commands::load::run(config, csv, input, quiet).await,

        Commands::Report { output } => commands::report::run(config, output, quiet).await,

        Commands::Run { csv, input, output } => {
            commands::run::run(config, csv, input, output, quiet).await
        },

        Commands::Schema => commands::schema::run(config).await,

        Commands::FillNulls => commands::fill_nulls::run(config).await,
    }
}
