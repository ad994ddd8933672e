//! Seed data script - populates the database with the demo data set
//!
//! Run with: cargo run --bin seed-data -- [--reset]
//!
//! This creates:
//! - 4 agencies
//! - 4 bins (BIN-001 .. BIN-004) with owners, sharers and withdrawal limits
//! - 4 sales reps and 2 contracts
//! - an initial dashboard snapshot

use anyhow::Context;
use clap::Parser;
use tracing::info;

use seedbin_api::{config, db, seed};

#[derive(Debug, Parser)]
#[command(name = "seed-data", about = "Load the demo agencies, bins and sales reps")]
struct Args {
    /// Database URL; defaults to the configured `database_url`
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Delete all existing rows before seeding
    #[arg(long)]
    reset: bool,

    /// Skip running migrations first
    #[arg(long)]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    config::init_tracing("info", false);

    let database_url = match args.database_url {
        Some(url) => url,
        None => config::load_config()
            .context("failed to load configuration")?
            .database_url,
    };

    info!("Connecting to database: {}", database_url);
    let conn = db::establish_connection(&database_url)
        .await
        .context("failed to connect to the database")?;

    if !args.skip_migrations {
        db::run_migrations(&conn).await?;
    }

    let summary = seed::seed_demo_data(&conn, args.reset).await?;

    info!("=== Seed Data Complete ===");
    info!(
        "Created {} agencies, {} bins, {} sales reps, {} contracts (dashboard snapshot {})",
        summary.agencies, summary.bins, summary.sales_reps, summary.contracts, summary.snapshot_id
    );
    info!("Try: curl http://localhost:5001/api/inventory/bins");
    Ok(())
}
