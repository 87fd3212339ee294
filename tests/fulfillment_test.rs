//! Opportunity → sales order → procurement project automation.

mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use tradeflow::{
    entities::{
        activity_log, procurement_project, sales_opportunity, CompanyType, OpportunityStatus,
        SalesOrderStatus, SampleStatus, SubmissionStatus,
    },
    errors::ServiceError,
    events::Event,
    lifecycle::EntityKind,
    services::{
        fulfillment::{DerivedTrigger, FulfillmentService, NewSalesOrder},
        samples::{RollbackReport, SampleService},
    },
};
use uuid::Uuid;

use common::{
    drain_events, event_channel, insert_admin, insert_commodity, insert_company,
    insert_opportunity, insert_project, insert_sales_order, insert_sample, insert_submission,
    setup_db,
};

struct Deal {
    opportunity: sales_opportunity::Model,
    sales_order_id: Uuid,
}

/// A won opportunity with one sample submission in the given status and a
/// pending sales order. No procurement project is linked.
async fn won_deal(db: &sea_orm::DatabaseConnection, submission: SubmissionStatus) -> Deal {
    let commodity = insert_commodity(db, "Black Pepper").await;
    let vendor = insert_company(db, "Wayanad Spice Farms", CompanyType::Vendor, None).await;
    let client = insert_company(db, "Hamburg Gewuerz GmbH", CompanyType::Client, None).await;
    let sourcing = insert_project(db, &commodity, None).await;
    let sample = insert_sample(db, &sourcing, &vendor, "SMP-P1", SampleStatus::SentToClient).await;
    let opportunity =
        insert_opportunity(db, &client, &commodity, OpportunityStatus::ClosedWon).await;
    insert_submission(db, &sample, &opportunity, submission).await;
    let order = insert_sales_order(db, &opportunity, "SO-P1").await;

    Deal {
        opportunity,
        sales_order_id: order.id,
    }
}

#[tokio::test]
async fn in_progress_order_creates_exactly_one_project() {
    let db = setup_db().await;
    insert_admin(&db).await;
    let deal = won_deal(&db, SubmissionStatus::ClientApproved).await;
    let (sender, mut rx) = event_channel();
    let service = FulfillmentService::new(db.clone(), Some(sender));
    let projects_before = procurement_project::Entity::find().count(&*db).await.unwrap();

    let first = service
        .transition_sales_order(deal.sales_order_id, SalesOrderStatus::InProgress)
        .await
        .unwrap();
    let project = first.created_project.expect("project created");
    assert_eq!(first.previous_status, SalesOrderStatus::Pending);
    assert_eq!(first.order.status, SalesOrderStatus::InProgress);
    assert_eq!(project.commodity_id, deal.opportunity.commodity_id);
    assert_eq!(project.target_quantity, Some(deal.opportunity.quantity));

    let opportunity = sales_opportunity::Entity::find_by_id(deal.opportunity.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(opportunity.procurement_project_id, Some(project.id));

    let again = service
        .transition_sales_order(deal.sales_order_id, SalesOrderStatus::InProgress)
        .await
        .unwrap();
    assert!(again.created_project.is_none());
    assert_eq!(
        procurement_project::Entity::find().count(&*db).await.unwrap(),
        projects_before + 1
    );

    assert_eq!(activity_log::Entity::find().count(&*db).await.unwrap(), 1);
    let events = drain_events(&mut rx);
    let created: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, Event::ProcurementProjectCreated { .. }))
        .collect();
    assert_eq!(created.len(), 1);
}

#[tokio::test]
async fn no_approved_submission_means_no_project() {
    let db = setup_db().await;
    let deal = won_deal(&db, SubmissionStatus::Pending).await;
    let service = FulfillmentService::new(db.clone(), None);
    let projects_before = procurement_project::Entity::find().count(&*db).await.unwrap();

    let err = service
        .transition_sales_order(deal.sales_order_id, SalesOrderStatus::InProgress)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));

    let created = service
        .auto_create_derived(DerivedTrigger::SalesOrderStatusChanged {
            sales_order_id: deal.sales_order_id,
            status: SalesOrderStatus::InProgress,
        })
        .await
        .unwrap();
    assert!(created.is_none());
    assert_eq!(
        procurement_project::Entity::find().count(&*db).await.unwrap(),
        projects_before
    );
}

#[tokio::test]
async fn project_creation_without_admin_skips_the_activity_log() {
    let db = setup_db().await;
    let deal = won_deal(&db, SubmissionStatus::ClientApproved).await;
    let service = FulfillmentService::new(db.clone(), None);

    let transition = service
        .transition_sales_order(deal.sales_order_id, SalesOrderStatus::InProgress)
        .await
        .unwrap();

    let project = transition.created_project.expect("project created");
    assert_eq!(project.created_by_id, None);
    assert_eq!(activity_log::Entity::find().count(&*db).await.unwrap(), 0);
}

#[tokio::test]
async fn already_linked_opportunity_gets_no_second_project() {
    let db = setup_db().await;
    let deal = won_deal(&db, SubmissionStatus::ClientApproved).await;
    let commodity = insert_commodity(&db, "Turmeric").await;
    let existing = insert_project(&db, &commodity, None).await;
    let service = FulfillmentService::new(db.clone(), None);

    service
        .link_project(deal.opportunity.id, existing.id)
        .await
        .unwrap();
    let transition = service
        .transition_sales_order(deal.sales_order_id, SalesOrderStatus::InProgress)
        .await
        .unwrap();
    assert!(transition.created_project.is_none());

    let err = service
        .link_project(deal.opportunity.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));
}

#[tokio::test]
async fn illegal_sales_order_transition_is_rejected() {
    let db = setup_db().await;
    let deal = won_deal(&db, SubmissionStatus::ClientApproved).await;
    let service = FulfillmentService::new(db.clone(), None);

    let err = service
        .transition_sales_order(deal.sales_order_id, SalesOrderStatus::Delivered)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        ServiceError::InvalidTransition { entity: EntityKind::SalesOrder, .. }
    );

    service
        .transition_sales_order(deal.sales_order_id, SalesOrderStatus::Cancelled)
        .await
        .unwrap();
    let err = service
        .transition_sales_order(deal.sales_order_id, SalesOrderStatus::InProgress)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidTransition { .. });
}

#[tokio::test]
async fn sales_orders_require_a_won_opportunity() {
    let db = setup_db().await;
    let commodity = insert_commodity(&db, "Robusta Coffee").await;
    let client = insert_company(&db, "Trieste Roasters", CompanyType::Client, None).await;
    let opportunity = insert_opportunity(&db, &client, &commodity, OpportunityStatus::Open).await;
    let service = FulfillmentService::new(db.clone(), None);

    let input = NewSalesOrder {
        opportunity_id: opportunity.id,
        order_number: None,
        quantity: dec!(18),
        unit_price: dec!(2150.00),
        currency: "usd".to_string(),
    };
    let err = service.create_sales_order(input.clone()).await.unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));

    service.close_opportunity(opportunity.id, true).await.unwrap();
    let order = service.create_sales_order(input).await.unwrap();
    assert!(order.order_number.starts_with("SO-"));
    assert_eq!(order.currency, "USD");
    assert_eq!(order.status, SalesOrderStatus::Pending);
    assert_eq!(order.client_id, client.id);
}

#[tokio::test]
async fn closed_opportunity_cannot_be_reopened_as_the_other_outcome() {
    let db = setup_db().await;
    let commodity = insert_commodity(&db, "Sesame Seeds").await;
    let client = insert_company(&db, "Osaka Foods", CompanyType::Client, None).await;
    let opportunity = insert_opportunity(&db, &client, &commodity, OpportunityStatus::Open).await;
    let service = FulfillmentService::new(db.clone(), None);

    let lost = service.close_opportunity(opportunity.id, false).await.unwrap();
    assert_eq!(lost.status, OpportunityStatus::ClosedLost);

    let err = service.close_opportunity(opportunity.id, true).await.unwrap_err();
    assert_matches!(
        err,
        ServiceError::InvalidTransition { entity: EntityKind::SalesOpportunity, .. }
    );
}

#[tokio::test]
async fn order_in_procurement_still_ships_after_sample_rollback() {
    let db = setup_db().await;
    let deal = won_deal(&db, SubmissionStatus::ClientApproved).await;
    let service = FulfillmentService::new(db.clone(), None);

    service
        .transition_sales_order(deal.sales_order_id, SalesOrderStatus::InProgress)
        .await
        .unwrap();

    let rolled_back = SampleService::new(db.clone(), None)
        .rollback_sample_status()
        .await
        .unwrap();
    assert_eq!(
        rolled_back,
        RollbackReport {
            samples: 1,
            submissions: 1
        }
    );

    let shipped = service
        .transition_sales_order(deal.sales_order_id, SalesOrderStatus::Shipped)
        .await
        .unwrap();
    assert_eq!(shipped.previous_status, SalesOrderStatus::InProgress);
    assert_eq!(shipped.order.status, SalesOrderStatus::Shipped);

    let delivered = service
        .transition_sales_order(deal.sales_order_id, SalesOrderStatus::Delivered)
        .await
        .unwrap();
    assert_eq!(delivered.order.status, SalesOrderStatus::Delivered);
}

#[tokio::test]
async fn pending_order_cannot_enter_procurement_after_sample_rollback() {
    let db = setup_db().await;
    let deal = won_deal(&db, SubmissionStatus::ClientApproved).await;
    SampleService::new(db.clone(), None)
        .rollback_sample_status()
        .await
        .unwrap();

    let err = FulfillmentService::new(db.clone(), None)
        .transition_sales_order(deal.sales_order_id, SalesOrderStatus::InProgress)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));
}
