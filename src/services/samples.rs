use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{Expr, Query},
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::entities::{
    sales_opportunity, sample_record, sample_submission, SampleStatus, SubmissionStatus,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::lifecycle::{EntityKind, StateMachine};

/// Rows touched by [`SampleService::rollback_sample_status`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RollbackReport {
    pub samples: u64,
    pub submissions: u64,
}

/// Sample records, their client submissions, and the status repair job.
#[derive(Clone)]
pub struct SampleService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl SampleService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(event).await;
        }
    }

    #[instrument(skip(self))]
    pub async fn request_sample(
        &self,
        project_id: Uuid,
        vendor_id: Uuid,
        reference: String,
    ) -> Result<sample_record::Model, ServiceError> {
        let now = Utc::now();
        let sample = sample_record::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(project_id),
            vendor_id: Set(vendor_id),
            reference: Set(reference),
            status: Set(SampleStatus::Requested),
            received_at: Set(None),
            notes: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(sample_id = %sample.id, "Sample requested");
        Ok(sample)
    }

    /// Moves a sample record along its internal lifecycle.
    #[instrument(skip(self), fields(sample_id = %sample_id, next = %next))]
    pub async fn advance_sample(
        &self,
        sample_id: Uuid,
        next: SampleStatus,
    ) -> Result<sample_record::Model, ServiceError> {
        let db = &*self.db;
        let sample = find_sample(db, sample_id).await?;
        let previous = sample.status;
        previous.transition(next)?;
        if previous == next {
            return Ok(sample);
        }

        let now = Utc::now();
        let mut active: sample_record::ActiveModel = sample.into();
        active.status = Set(next);
        active.updated_at = Set(now);
        if next == SampleStatus::Received {
            active.received_at = Set(Some(now));
        }
        let updated = active.update(db).await?;

        self.emit(Event::SampleStatusChanged {
            sample_id,
            old_status: previous,
            new_status: next,
        })
        .await;
        Ok(updated)
    }

    /// Puts an internally approved sample in front of the opportunity's client.
    #[instrument(skip(self))]
    pub async fn submit_to_client(
        &self,
        sample_id: Uuid,
        opportunity_id: Uuid,
    ) -> Result<sample_submission::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let sample = find_sample(&txn, sample_id).await?;
        if !sample.status.is_submittable() {
            return Err(ServiceError::InvalidOperation(format!(
                "Sample {} cannot be submitted to a client while {}",
                sample.reference, sample.status
            )));
        }
        sales_opportunity::Entity::find_by_id(opportunity_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::SalesOpportunity, opportunity_id))?;

        let now = Utc::now();
        let submission = sample_submission::ActiveModel {
            id: Set(Uuid::new_v4()),
            sample_id: Set(sample_id),
            opportunity_id: Set(opportunity_id),
            status: Set(SubmissionStatus::Pending),
            submitted_at: Set(now),
            decided_at: Set(None),
            feedback: Set(None),
        }
        .insert(&txn)
        .await?;

        if sample.status != SampleStatus::SentToClient {
            let mut active: sample_record::ActiveModel = sample.into();
            active.status = Set(SampleStatus::SentToClient);
            active.updated_at = Set(now);
            active.update(&txn).await?;
        }

        txn.commit().await?;

        info!(submission_id = %submission.id, "Sample submitted to client");
        self.emit(Event::SampleSubmitted {
            submission_id: submission.id,
            sample_id,
            opportunity_id,
        })
        .await;
        Ok(submission)
    }

    /// Records the client's verdict on a submission and mirrors it onto the
    /// sample record when the record is still awaiting one.
    #[instrument(skip(self, feedback))]
    pub async fn record_client_decision(
        &self,
        submission_id: Uuid,
        decision: SubmissionStatus,
        feedback: Option<String>,
    ) -> Result<sample_submission::Model, ServiceError> {
        if decision == SubmissionStatus::Pending {
            return Err(ServiceError::InvalidOperation(
                "A client decision must approve or reject".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let submission = sample_submission::Entity::find_by_id(submission_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::SampleSubmission, submission_id))?;
        submission.status.transition(decision)?;
        if submission.status == decision {
            return Ok(submission);
        }

        let sample_id = submission.sample_id;
        let now = Utc::now();
        let mut active: sample_submission::ActiveModel = submission.into();
        active.status = Set(decision);
        active.decided_at = Set(Some(now));
        active.feedback = Set(feedback);
        let updated = active.update(&txn).await?;

        let sample = find_sample(&txn, sample_id).await?;
        let mirrored = decision.mirrored_sample_status();
        if sample.status == SampleStatus::SentToClient {
            let mut active: sample_record::ActiveModel = sample.into();
            active.status = Set(mirrored);
            active.updated_at = Set(now);
            active.update(&txn).await?;
        } else if sample.status != mirrored {
            warn!(
                %sample_id,
                status = %sample.status,
                "Sample already carries a different client outcome; record left unchanged"
            );
        }

        txn.commit().await?;

        self.emit(Event::SubmissionDecided {
            submission_id,
            status: decision,
        })
        .await;
        Ok(updated)
    }

    /// Reverts every client-facing sample outcome back to internal approval
    /// and reopens the client decisions on those samples' submissions.
    /// Running it again changes nothing.
    #[instrument(skip(self))]
    pub async fn rollback_sample_status(&self) -> Result<RollbackReport, ServiceError> {
        let txn = self.db.begin().await?;

        let client_facing = [
            SampleStatus::SentToClient,
            SampleStatus::ClientApproved,
            SampleStatus::ClientRejected,
        ];

        // Submissions first: the subquery must still see the client-facing samples.
        let submissions = sample_submission::Entity::update_many()
            .col_expr(
                sample_submission::Column::Status,
                Expr::value(SubmissionStatus::Pending),
            )
            .col_expr(
                sample_submission::Column::DecidedAt,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .filter(
                sample_submission::Column::SampleId.in_subquery(
                    Query::select()
                        .column(sample_record::Column::Id)
                        .from(sample_record::Entity)
                        .and_where(sample_record::Column::Status.is_in(client_facing))
                        .to_owned(),
                ),
            )
            .filter(sample_submission::Column::Status.is_in([
                SubmissionStatus::ClientApproved,
                SubmissionStatus::ClientRejected,
            ]))
            .exec(&txn)
            .await?
            .rows_affected;

        let samples = sample_record::Entity::update_many()
            .col_expr(
                sample_record::Column::Status,
                Expr::value(SampleStatus::ResultApprovedInternal),
            )
            .col_expr(sample_record::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(sample_record::Column::Status.is_in(client_facing))
            .exec(&txn)
            .await?
            .rows_affected;

        txn.commit().await?;

        if samples == 0 && submissions == 0 {
            info!("No client-facing samples to roll back");
            return Ok(RollbackReport::default());
        }

        info!(samples, submissions, "Sample statuses rolled back");
        self.emit(Event::SampleStatusRolledBack {
            samples,
            submissions,
        })
        .await;

        Ok(RollbackReport {
            samples,
            submissions,
        })
    }
}

async fn find_sample<C: ConnectionTrait>(
    conn: &C,
    sample_id: Uuid,
) -> Result<sample_record::Model, ServiceError> {
    sample_record::Entity::find_by_id(sample_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found(EntityKind::SampleRecord, sample_id))
}
