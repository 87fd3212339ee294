//! Deletes financial transaction rows only.
//!
//! Run with: cargo run --bin reset-transactions

use std::process::ExitCode;

use tradeflow::commands::{maintenance::ResetScopeCommand, Command};
use tradeflow::ops;
use tradeflow::services::cascade_reset::ResetScope;
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    ops::run("reset-transactions", |ctx| async move {
        let command = ResetScopeCommand {
            scope: ResetScope::TransactionsOnly,
            mode: ctx.config.reset.mode(),
            preserve_commodities: ctx.config.reset.preserve_commodities,
        };
        let report = command.execute(ctx.db, ctx.events).await?;
        info!(rows = report.total_deleted(), "Transactions cleared");
        Ok(())
    })
    .await
}
