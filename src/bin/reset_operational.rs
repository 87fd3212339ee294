//! Clears the trading pipeline while keeping master data and counterparties.
//!
//! Run with: cargo run --bin reset-operational

use std::process::ExitCode;

use tradeflow::commands::{maintenance::ResetScopeCommand, Command};
use tradeflow::ops;
use tradeflow::services::cascade_reset::ResetScope;
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    ops::run("reset-operational", |ctx| async move {
        let command = ResetScopeCommand {
            scope: ResetScope::OperationalData,
            mode: ctx.config.reset.mode(),
            preserve_commodities: ctx.config.reset.preserve_commodities,
        };
        let report = command.execute(ctx.db, ctx.events).await?;
        info!(
            rows = report.total_deleted(),
            detached = report.detached.len(),
            "Operational reset complete"
        );
        Ok(())
    })
    .await
}
