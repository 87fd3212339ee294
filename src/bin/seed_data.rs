//! Seed data script - populates reference data for a fresh installation
//!
//! Run with: cargo run --bin seed-data
//! Pass `--demo` to also create a sample vendor/client pipeline.
//!
//! This creates:
//! - Countries, states and cities for the main sourcing and export regions
//! - The commodity catalogue with HS codes
//! - Optionally one vendor, one client and a project with samples

use std::process::ExitCode;

use clap::{ArgAction, Parser};
use tradeflow::commands::{maintenance::SeedDataCommand, Command};
use tradeflow::ops;
use tradeflow::services::seeding::SeedOutcome;
use tracing::info;

#[derive(Parser)]
#[command(name = "seed-data", about = "Insert Tradeflow master data", version)]
struct Args {
    /// Also create a demo vendor/client pipeline
    #[arg(long, action = ArgAction::SetTrue)]
    demo: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let include_demo = Args::parse().demo;

    ops::run("seed-data", |ctx| async move {
        info!("=== Tradeflow Seed Data ===");
        let command = SeedDataCommand {
            admin_email: ctx.config.seed.admin_email.clone(),
            include_demo,
        };
        let result = command.execute(ctx.db, ctx.events).await?;

        info!(
            created = result.master.total_created(),
            skipped = result.master.total_skipped(),
            "Master data seeded"
        );
        match result.demo {
            Some(SeedOutcome::Seeded(pipeline)) => {
                info!(project = %pipeline.project_id, "Demo pipeline created")
            }
            Some(SeedOutcome::AlreadyPresent) => info!("Demo pipeline already present"),
            Some(SeedOutcome::PreconditionNotMet(reason)) => {
                info!(%reason, "Demo pipeline skipped")
            }
            None => {}
        }
        Ok(())
    })
    .await
}
