//! Reverts client-facing sample outcomes to internal approval.
//!
//! Run with: cargo run --bin rollback-sample-status
//! Safe to run repeatedly; a second run changes nothing.

use std::process::ExitCode;

use tradeflow::commands::{maintenance::RollbackSampleStatusCommand, Command};
use tradeflow::ops;
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    ops::run("rollback-sample-status", |ctx| async move {
        let report = RollbackSampleStatusCommand
            .execute(ctx.db, ctx.events)
            .await?;
        info!(
            samples = report.samples,
            submissions = report.submissions,
            "Rollback complete"
        );
        Ok(())
    })
    .await
}
