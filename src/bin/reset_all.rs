//! Wipes all business data, keeping users and geography.
//!
//! Run with: cargo run --bin reset-all
//! Set APP__RESET__PRESERVE_COMMODITIES=true to keep the commodity catalogue.

use std::process::ExitCode;

use tradeflow::commands::{maintenance::ResetScopeCommand, Command};
use tradeflow::ops;
use tradeflow::services::cascade_reset::ResetScope;
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    ops::run("reset-all", |ctx| async move {
        let command = ResetScopeCommand {
            scope: ResetScope::Full,
            mode: ctx.config.reset.mode(),
            preserve_commodities: ctx.config.reset.preserve_commodities,
        };
        let report = command.execute(ctx.db, ctx.events).await?;
        info!(rows = report.total_deleted(), "Full reset complete");
        Ok(())
    })
    .await
}
