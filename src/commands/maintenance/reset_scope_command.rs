use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    lifecycle::DependencyGraph,
    services::cascade_reset::{CascadeResetService, ResetMode, ResetReport, ResetScope},
};

#[derive(Debug, Clone)]
pub struct ResetScopeCommand {
    pub scope: ResetScope,
    pub mode: ResetMode,
    pub preserve_commodities: bool,
}

impl ResetScopeCommand {
    pub fn new(scope: ResetScope) -> Self {
        Self {
            scope,
            mode: ResetMode::default(),
            preserve_commodities: false,
        }
    }
}

#[async_trait]
impl Command for ResetScopeCommand {
    type Result = ResetReport;

    #[instrument(skip(self, db_pool, event_sender), fields(scope = self.scope.label()))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let graph = Arc::new(DependencyGraph::declared()?);
        let service = CascadeResetService::new(db_pool, graph)
            .with_mode(self.mode)
            .preserve_commodities(self.preserve_commodities)
            .with_event_sender((*event_sender).clone());

        let report = service.reset_scope(&self.scope).await?;
        for (kind, rows) in &report.deleted {
            info!(%kind, rows, "Deleted");
        }
        Ok(report)
    }
}
