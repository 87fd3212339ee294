use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::entities::{
    procurement_project, sales_opportunity, sales_order, sample_submission, OpportunityStatus,
    ProjectStatus, SalesOrderStatus, SubmissionStatus,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::lifecycle::{EntityKind, StateMachine};
use crate::services::activity;

/// Events that may cause derived entities to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedTrigger {
    SalesOrderStatusChanged {
        sales_order_id: Uuid,
        status: SalesOrderStatus,
    },
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewSalesOrder {
    pub opportunity_id: Uuid,
    /// Generated from the order id when absent.
    #[validate(length(min = 1, max = 64))]
    pub order_number: Option<String>,
    #[validate(custom = "validate_positive")]
    pub quantity: Decimal,
    #[validate(custom = "validate_positive")]
    pub unit_price: Decimal,
    #[validate(length(equal = 3))]
    pub currency: String,
}

fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_positive() && !value.is_zero() {
        Ok(())
    } else {
        let mut err = ValidationError::new("positive");
        err.message = Some("Must be greater than zero".into());
        Err(err)
    }
}

/// Result of a sales order transition, including any project it produced.
#[derive(Debug, Clone, Serialize)]
pub struct SalesOrderTransition {
    pub order: sales_order::Model,
    pub previous_status: SalesOrderStatus,
    pub created_project: Option<procurement_project::Model>,
}

/// Drives the opportunity → sales order → procurement project flow.
#[derive(Clone)]
pub struct FulfillmentService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl FulfillmentService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(event).await;
        }
    }

    /// Closes an open opportunity as won or lost.
    #[instrument(skip(self))]
    pub async fn close_opportunity(
        &self,
        opportunity_id: Uuid,
        won: bool,
    ) -> Result<sales_opportunity::Model, ServiceError> {
        let db = &*self.db;
        let opportunity = find_opportunity(db, opportunity_id).await?;
        let target = if won {
            OpportunityStatus::ClosedWon
        } else {
            OpportunityStatus::ClosedLost
        };

        if opportunity.status == target {
            return Ok(opportunity);
        }
        opportunity.status.transition(target)?;

        let mut active: sales_opportunity::ActiveModel = opportunity.into();
        active.status = Set(target);
        active.updated_at = Set(Utc::now());
        let updated = active.update(db).await?;

        info!(%opportunity_id, status = %target, "Opportunity closed");
        self.emit(Event::OpportunityClosed {
            opportunity_id,
            won,
        })
        .await;

        Ok(updated)
    }

    /// Creates a pending sales order for a won opportunity.
    #[instrument(skip(self, input), fields(opportunity_id = %input.opportunity_id))]
    pub async fn create_sales_order(
        &self,
        input: NewSalesOrder,
    ) -> Result<sales_order::Model, ServiceError> {
        input.validate()?;

        let db = &*self.db;
        let opportunity = find_opportunity(db, input.opportunity_id).await?;
        require_won(&opportunity, "create a sales order")?;

        let id = Uuid::new_v4();
        let now = Utc::now();
        let order_number = input
            .order_number
            .unwrap_or_else(|| format!("SO-{}", &id.simple().to_string()[..8].to_uppercase()));

        let order = sales_order::ActiveModel {
            id: Set(id),
            order_number: Set(order_number),
            opportunity_id: Set(opportunity.id),
            client_id: Set(opportunity.client_id),
            status: Set(SalesOrderStatus::Pending),
            quantity: Set(input.quantity),
            unit_price: Set(input.unit_price),
            currency: Set(input.currency.to_uppercase()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!(sales_order_id = %order.id, order_number = %order.order_number, "Sales order created");
        Ok(order)
    }

    /// Links an existing procurement project to a won opportunity.
    #[instrument(skip(self))]
    pub async fn link_project(
        &self,
        opportunity_id: Uuid,
        project_id: Uuid,
    ) -> Result<sales_opportunity::Model, ServiceError> {
        let db = &*self.db;
        let opportunity = find_opportunity(db, opportunity_id).await?;
        require_won(&opportunity, "link a procurement project")?;

        match opportunity.procurement_project_id {
            Some(existing) if existing == project_id => return Ok(opportunity),
            Some(existing) => {
                return Err(ServiceError::InvalidOperation(format!(
                    "Opportunity {} is already linked to project {}",
                    opportunity_id, existing
                )))
            }
            None => {}
        }

        procurement_project::Entity::find_by_id(project_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::ProcurementProject, project_id))?;

        let mut active: sales_opportunity::ActiveModel = opportunity.into();
        active.procurement_project_id = Set(Some(project_id));
        active.updated_at = Set(Utc::now());
        Ok(active.update(db).await?)
    }

    /// Moves a sales order through its state machine, then lets the new
    /// status create any derived entities.
    #[instrument(skip(self), fields(sales_order_id = %sales_order_id, new_status = %new_status))]
    pub async fn transition_sales_order(
        &self,
        sales_order_id: Uuid,
        new_status: SalesOrderStatus,
    ) -> Result<SalesOrderTransition, ServiceError> {
        let db = &*self.db;
        let order = sales_order::Entity::find_by_id(sales_order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::SalesOrder, sales_order_id))?;

        let previous_status = order.status;
        previous_status.transition(new_status)?;

        let order = if previous_status == new_status {
            debug!("Sales order already in requested status");
            order
        } else {
            // Approval gates entry into procurement only; later moves keep it.
            if new_status.implies_procurement()
                && !previous_status.implies_procurement()
                && approved_submissions(db, order.opportunity_id).await? == 0
            {
                return Err(ServiceError::InvalidOperation(format!(
                    "Sales order {} cannot move to {} before a sample submission is client-approved",
                    order.order_number, new_status
                )));
            }

            let mut active: sales_order::ActiveModel = order.into();
            active.status = Set(new_status);
            active.updated_at = Set(Utc::now());
            let updated = active.update(db).await?;

            info!(old_status = %previous_status, "Sales order status changed");
            self.emit(Event::SalesOrderStatusChanged {
                sales_order_id,
                old_status: previous_status,
                new_status,
            })
            .await;
            updated
        };

        let created_project = self
            .auto_create_derived(DerivedTrigger::SalesOrderStatusChanged {
                sales_order_id,
                status: new_status,
            })
            .await?;

        Ok(SalesOrderTransition {
            order,
            previous_status,
            created_project,
        })
    }

    /// Creates the procurement project for an in-progress sales order whose
    /// won opportunity has an approved sample but no project yet. Returns
    /// `None` whenever any of those conditions does not hold.
    #[instrument(skip(self))]
    pub async fn auto_create_derived(
        &self,
        trigger: DerivedTrigger,
    ) -> Result<Option<procurement_project::Model>, ServiceError> {
        let DerivedTrigger::SalesOrderStatusChanged {
            sales_order_id,
            status,
        } = trigger;

        if status != SalesOrderStatus::InProgress {
            debug!(%status, "Status does not trigger project creation");
            return Ok(None);
        }

        let txn = self.db.begin().await?;
        let result = create_project_for_order(&txn, sales_order_id).await;

        match result {
            Ok(Some((project, opportunity_id))) => {
                txn.commit().await?;
                info!(
                    project_id = %project.id,
                    %opportunity_id,
                    "Procurement project auto-created"
                );
                self.emit(Event::ProcurementProjectCreated {
                    project_id: project.id,
                    opportunity_id,
                    sales_order_id,
                })
                .await;
                Ok(Some(project))
            }
            Ok(None) => {
                txn.rollback().await?;
                Ok(None)
            }
            Err(e) => {
                if let Err(rb) = txn.rollback().await {
                    error!("Rollback after failed project creation failed: {}", rb);
                }
                Err(e)
            }
        }
    }
}

async fn create_project_for_order(
    txn: &DatabaseTransaction,
    sales_order_id: Uuid,
) -> Result<Option<(procurement_project::Model, Uuid)>, ServiceError> {
    let order = sales_order::Entity::find_by_id(sales_order_id)
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::not_found(EntityKind::SalesOrder, sales_order_id))?;
    let opportunity = find_opportunity(txn, order.opportunity_id).await?;

    if opportunity.status != OpportunityStatus::ClosedWon {
        info!(status = %opportunity.status, "Opportunity not won; no project created");
        return Ok(None);
    }
    if let Some(project_id) = opportunity.procurement_project_id {
        debug!(%project_id, "Opportunity already linked to a project");
        return Ok(None);
    }
    if approved_submissions(txn, opportunity.id).await? == 0 {
        info!(opportunity_id = %opportunity.id, "No client-approved submission; no project created");
        return Ok(None);
    }

    let admin = activity::find_admin(txn).await?;
    let now = Utc::now();
    let project = procurement_project::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(format!("Procurement: {}", opportunity.title)),
        commodity_id: Set(opportunity.commodity_id),
        created_by_id: Set(admin.map(|u| u.id)),
        status: Set(ProjectStatus::Active),
        target_quantity: Set(Some(order.quantity)),
        notes: Set(Some(format!(
            "Created when sales order {} moved to {}",
            order.order_number, order.status
        ))),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(txn)
    .await?;

    let opportunity_id = opportunity.id;
    let client_id = opportunity.client_id;
    let mut active: sales_opportunity::ActiveModel = opportunity.into();
    active.procurement_project_id = Set(Some(project.id));
    active.updated_at = Set(now);
    active.update(txn).await?;

    activity::record_system_activity(
        txn,
        "procurement_project.auto_created",
        EntityKind::ProcurementProject,
        project.id,
        Some(client_id),
    )
    .await?;

    Ok(Some((project, opportunity_id)))
}

async fn find_opportunity<C: ConnectionTrait>(
    conn: &C,
    opportunity_id: Uuid,
) -> Result<sales_opportunity::Model, ServiceError> {
    sales_opportunity::Entity::find_by_id(opportunity_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found(EntityKind::SalesOpportunity, opportunity_id))
}

fn require_won(opportunity: &sales_opportunity::Model, action: &str) -> Result<(), ServiceError> {
    if opportunity.status == OpportunityStatus::ClosedWon {
        Ok(())
    } else {
        Err(ServiceError::InvalidOperation(format!(
            "Cannot {} for opportunity {} in status {}",
            action, opportunity.id, opportunity.status
        )))
    }
}

async fn approved_submissions<C: ConnectionTrait>(
    conn: &C,
    opportunity_id: Uuid,
) -> Result<u64, ServiceError> {
    Ok(sample_submission::Entity::find()
        .filter(sample_submission::Column::OpportunityId.eq(opportunity_id))
        .filter(sample_submission::Column::Status.eq(SubmissionStatus::ClientApproved))
        .count(conn)
        .await?)
}
