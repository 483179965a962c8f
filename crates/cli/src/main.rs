//! Store ratings CLI - database migrations, fixtures and admin bootstrap.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! sr-cli migrate
//!
//! # Load the demo users, stores and ratings
//! sr-cli seed
//!
//! # Create the first administrator
//! sr-cli admin create -n "Platform Administrator" -e admin@example.com -p 'Secret!Pass1'
//! ```
//!
//! # Environment Variables
//!
//! - `STORERATE_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "sr-cli")]
#[command(author, version, about = "Store ratings CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database with demo users, stores and ratings
    Seed {
        /// Password given to every seeded account
        #[arg(long, default_value = commands::seed::DEFAULT_PASSWORD)]
        password: String,
    },
    /// Manage administrator accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Debug, Subcommand)]
enum AdminAction {
    /// Create a new administrator
    Create {
        /// Display name (20-60 characters)
        #[arg(short, long)]
        name: String,

        /// Login email address
        #[arg(short, long)]
        email: String,

        /// Password (8-16 characters, one uppercase letter, one special character)
        #[arg(short, long)]
        password: String,

        /// Postal address
        #[arg(short, long)]
        address: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sr_cli=info,storerate_api=info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { password } => commands::seed::run(&password).await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                name,
                email,
                password,
                address,
            } => {
                commands::admin::create_admin(&name, &email, &password, address).await?;
            }
        },
    }
    Ok(())
}
