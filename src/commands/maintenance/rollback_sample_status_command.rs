use async_trait::async_trait;
use std::sync::Arc;
use tracing::instrument;

use crate::{
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    services::samples::{RollbackReport, SampleService},
};

/// Reverts client-facing sample outcomes to internal approval.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollbackSampleStatusCommand;

#[async_trait]
impl Command for RollbackSampleStatusCommand {
    type Result = RollbackReport;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        SampleService::new(db_pool, Some((*event_sender).clone()))
            .rollback_sample_status()
            .await
    }
}
