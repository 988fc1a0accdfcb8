//! Cradlix CLI - migrations and operational tasks.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! cradlix-cli migrate
//!
//! # Create or promote an admin (password from CRADLIX_ADMIN_PASSWORD)
//! cradlix-cli admin create -e ops@cradlix.in -n "Ops Team"
//!
//! # Load categories, brands and products from YAML
//! cradlix-cli seed catalog seed/catalog.yaml
//!
//! # Cancel online orders left unpaid for over 30 minutes
//! cradlix-cli orders expire --older-than-minutes 30
//! ```
//!
//! Every command reads `DATABASE_URL` (or `STOREFRONT_DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "cradlix-cli")]
#[command(author, version, about = "Cradlix CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Load data from files
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Order maintenance
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create an admin, or promote an existing account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert categories, brands and products by slug
    Catalog {
        /// Path to the catalog YAML file
        file: String,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// Cancel stale `pending_payment` orders and release their stock
    Expire {
        /// Age after which an unpaid order is abandoned
        #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(i32).range(1..))]
        older_than_minutes: i32,
    },
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cradlix_cli=info,cradlix_admin=info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create { email, name } => {
                commands::admin::create(&email, &name).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file } => commands::seed::catalog(&file).await?,
        },
        Commands::Orders { action } => match action {
            OrdersAction::Expire { older_than_minutes } => {
                commands::orders::expire(older_than_minutes).await?;
            }
        },
    }
    Ok(())
}
