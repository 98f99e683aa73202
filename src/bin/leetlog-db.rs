// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database maintenance for leetlog.
//!
//! Resolves the target database exactly like the server does. Refuses to
//! touch production and asks for `--yes` before touching development.

use clap::{Parser, Subcommand};
use leetlog::config::DatabaseConfig;
use leetlog::db::Db;
use leetlog::services::maintenance::{self, Operation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "leetlog-db")]
#[command(about = "Seed or reset the leetlog database", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Confirm a destructive operation on the development database
    #[arg(long, global = true)]
    yes: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the standard categories, and sample problems for one user
    Seed {
        /// Identity-provider id that receives the sample problems
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Delete every user, problem and category
    Reset,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let config = DatabaseConfig::resolve(|key| std::env::var(key).ok())?;
    let operation = match cli.command {
        Commands::Seed { .. } => Operation::Seed,
        Commands::Reset => Operation::Reset,
    };

    if let Err(e) = maintenance::authorize(operation, config.mode, cli.yes) {
        tracing::error!(mode = %config.mode, "{e}");
        return Err(e.into());
    }

    let db = Db::connect(&config).await?;
    match cli.command {
        Commands::Seed { user } => {
            let report = maintenance::seed(&db, user.as_deref()).await?;
            tracing::info!(
                mode = %config.mode,
                categories = report.categories_created,
                problems = report.problems_created,
                "Seed complete"
            );
        }
        Commands::Reset => {
            let before = maintenance::reset(&db).await?;
            tracing::info!(
                mode = %config.mode,
                users = before.users,
                problems = before.problems,
                categories = before.categories,
                "Reset complete"
            );
        }
    }

    Ok(())
}
