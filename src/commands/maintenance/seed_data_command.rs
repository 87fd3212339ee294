use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, warn};
use validator::Validate;

use crate::{
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    services::seeding::{SeedOutcome, SeedReport, SeedingService},
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SeedDataCommand {
    #[validate(email)]
    pub admin_email: String,
    /// Also create the demo vendor/client pipeline.
    pub include_demo: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeedDataResult {
    pub master: SeedReport,
    pub demo: Option<SeedOutcome>,
}

#[async_trait]
impl Command for SeedDataCommand {
    type Result = SeedDataResult;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let service = SeedingService::new(db_pool, self.admin_email.clone())
            .with_event_sender((*event_sender).clone());

        let master = service.seed_master_data().await?;
        let demo = if self.include_demo {
            let outcome = service.seed_demo_pipeline().await?;
            if let SeedOutcome::PreconditionNotMet(reason) = &outcome {
                warn!(%reason, "Demo pipeline not seeded");
            }
            Some(outcome)
        } else {
            None
        };

        Ok(SeedDataResult { master, demo })
    }
}
