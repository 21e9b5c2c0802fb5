// ABOUTME: Entry point for the casebook binary
// ABOUTME: Parses commands and dispatches to the server or the admin subcommands

use std::net::IpAddr;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use colored::*;

mod cli;

use casebook_cli::config::{Config, ConfigOverrides};
use cli::requirements::RequirementsCommands;
use cli::users::UsersCommands;

#[derive(Parser)]
#[command(name = "casebook")]
#[command(about = "Casebook - requirement review and acceptance service")]
#[command(version)]
struct Cli {
    /// Log filter, e.g. `debug` or `casebook_requirements=trace` (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// SQLite database file (overrides CASEBOOK_DB_PATH)
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        #[arg(long, help = "Port to listen on (overrides CASEBOOK_PORT)")]
        port: Option<u16>,
        #[arg(long, help = "Address to bind (overrides CASEBOOK_HOST)")]
        host: Option<IpAddr>,
        #[arg(long, help = "Allowed CORS origin (overrides CASEBOOK_CORS_ORIGIN)")]
        cors_origin: Option<String>,
    },
    /// Create the database if needed and apply pending migrations
    Migrate,
    /// Manage users and roles
    #[command(subcommand)]
    Users(UsersCommands),
    /// Inspect requirements
    #[command(subcommand)]
    Requirements(RequirementsCommands),
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    casebook_cli::init_tracing(cli.log_level.as_deref());

    if let Err(e) = handle_command(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

async fn handle_command(cli: Cli) -> anyhow::Result<()> {
    let overrides = ConfigOverrides {
        db_path: cli.db_path,
        ..Default::default()
    };

    match cli.command {
        Commands::Serve {
            port,
            host,
            cors_origin,
        } => {
            let config = Config::from_env()?.with_overrides(ConfigOverrides {
                port,
                host,
                cors_origin,
                ..overrides
            })?;
            casebook_cli::run_server(config).await
        }
        Commands::Migrate => {
            let config = Config::from_env()?.with_overrides(overrides)?;
            let pool = casebook_cli::open_database(&config.db_path).await?;
            pool.close().await;
            println!(
                "{} {}",
                "Database is up to date:".green(),
                config.db_path.display()
            );
            Ok(())
        }
        Commands::Users(command) => {
            let config = Config::from_env()?.with_overrides(overrides)?;
            let pool = casebook_cli::open_database(&config.db_path).await?;
            cli::users::handle_users_command(command, pool).await
        }
        Commands::Requirements(command) => {
            let config = Config::from_env()?.with_overrides(overrides)?;
            let pool = casebook_cli::open_database(&config.db_path).await?;
            cli::requirements::handle_requirements_command(command, pool).await
        }
    }
}
