#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection};
use tradeflow::{
    db::{self, DbConfig},
    entities::{
        activity_log, bill, city, commodity, company, company_commodity, country, grn, interaction_log,
        invoice, procurement_project, project_vendor, purchase_order, sales_opportunity, sales_order,
        sample_record, sample_submission, shipment, state, todo, transaction, user, CompanyType,
        OpportunityStatus, ProjectStatus, PurchaseOrderStatus, SalesOrderStatus, SampleStatus,
        SubmissionStatus, TransactionDirection, UserRole,
    },
    events::{Event, EventSender},
};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Fresh in-memory SQLite database with every migration applied.
///
/// A single pooled connection keeps the in-memory database alive for the
/// whole test.
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let cfg = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..DbConfig::default()
    };
    let pool = db::establish_connection_with_config(&cfg)
        .await
        .expect("failed to create test database");
    db::run_migrations(&pool)
        .await
        .expect("failed to run migrations");
    Arc::new(pool)
}

pub fn event_channel() -> (EventSender, mpsc::Receiver<Event>) {
    EventSender::channel(64)
}

/// Drains whatever events are currently buffered.
pub fn drain_events(rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub async fn insert_admin(db: &DatabaseConnection) -> user::Model {
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(format!("admin-{}@tradeflow.test", Uuid::new_v4().simple())),
        name: Set("Test Admin".to_string()),
        role: Set(UserRole::Admin),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert admin")
}

pub async fn insert_commodity(db: &DatabaseConnection, name: &str) -> commodity::Model {
    commodity::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        hs_code: Set(Some("080131".to_string())),
        unit: Set("MT".to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert commodity")
}

pub async fn insert_company(
    db: &DatabaseConnection,
    name: &str,
    company_type: CompanyType,
    city: Option<&city::Model>,
) -> company::Model {
    let now = Utc::now();
    company::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        company_type: Set(company_type),
        email: Set(None),
        country_id: Set(None),
        state_id: Set(None),
        city_id: Set(city.map(|c| c.id)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert company")
}

pub async fn insert_project(
    db: &DatabaseConnection,
    commodity: &commodity::Model,
    owner: Option<&user::Model>,
) -> procurement_project::Model {
    let now = Utc::now();
    procurement_project::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(format!("{} sourcing", commodity.name)),
        commodity_id: Set(commodity.id),
        created_by_id: Set(owner.map(|u| u.id)),
        status: Set(ProjectStatus::Active),
        target_quantity: Set(Some(dec!(40))),
        notes: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert project")
}

pub async fn insert_sample(
    db: &DatabaseConnection,
    project: &procurement_project::Model,
    vendor: &company::Model,
    reference: &str,
    status: SampleStatus,
) -> sample_record::Model {
    let now = Utc::now();
    sample_record::ActiveModel {
        id: Set(Uuid::new_v4()),
        project_id: Set(project.id),
        vendor_id: Set(vendor.id),
        reference: Set(reference.to_string()),
        status: Set(status),
        received_at: Set(None),
        notes: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert sample")
}

pub async fn insert_opportunity(
    db: &DatabaseConnection,
    client: &company::Model,
    commodity: &commodity::Model,
    status: OpportunityStatus,
) -> sales_opportunity::Model {
    let now = Utc::now();
    sales_opportunity::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(format!("{} for {}", commodity.name, client.name)),
        client_id: Set(client.id),
        commodity_id: Set(commodity.id),
        procurement_project_id: Set(None),
        status: Set(status),
        quantity: Set(dec!(25)),
        target_price: Set(Some(dec!(1380.00))),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert opportunity")
}

pub async fn insert_submission(
    db: &DatabaseConnection,
    sample: &sample_record::Model,
    opportunity: &sales_opportunity::Model,
    status: SubmissionStatus,
) -> sample_submission::Model {
    let decided_at = (status != SubmissionStatus::Pending).then(Utc::now);
    sample_submission::ActiveModel {
        id: Set(Uuid::new_v4()),
        sample_id: Set(sample.id),
        opportunity_id: Set(opportunity.id),
        status: Set(status),
        submitted_at: Set(Utc::now()),
        decided_at: Set(decided_at),
        feedback: Set(None),
    }
    .insert(db)
    .await
    .expect("insert submission")
}

pub async fn insert_sales_order(
    db: &DatabaseConnection,
    opportunity: &sales_opportunity::Model,
    number: &str,
) -> sales_order::Model {
    let now = Utc::now();
    sales_order::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_number: Set(number.to_string()),
        opportunity_id: Set(opportunity.id),
        client_id: Set(opportunity.client_id),
        status: Set(SalesOrderStatus::Pending),
        quantity: Set(opportunity.quantity),
        unit_price: Set(dec!(1400.00)),
        currency: Set("USD".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert sales order")
}

/// Ids of a pipeline with one row in every entity kind.
pub struct Pipeline {
    pub admin: user::Model,
    pub commodity: commodity::Model,
    pub vendor: company::Model,
    pub client: company::Model,
    pub project: procurement_project::Model,
    pub sample: sample_record::Model,
    pub opportunity: sales_opportunity::Model,
    pub submission: sample_submission::Model,
    pub sales_order: sales_order::Model,
    pub purchase_order: purchase_order::Model,
    pub invoice: invoice::Model,
    pub bill: bill::Model,
    pub transactions: Vec<transaction::Model>,
}

/// Populates every table: geography, users, commodities, counterparties and
/// the full procurement, sales, finance and logistics chain.
pub async fn populate_pipeline(db: &DatabaseConnection) -> Pipeline {
    let now = Utc::now();

    let india = country::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("India".to_string()),
        iso_code: Set("IND".to_string()),
        created_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert country");
    let kerala = state::ActiveModel {
        id: Set(Uuid::new_v4()),
        country_id: Set(india.id),
        name: Set("Kerala".to_string()),
        created_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert state");
    let kochi = city::ActiveModel {
        id: Set(Uuid::new_v4()),
        state_id: Set(kerala.id),
        name: Set("Kochi".to_string()),
        created_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert city");

    let admin = insert_admin(db).await;
    let commodity = insert_commodity(db, "Raw Cashew Nuts").await;
    let vendor = insert_company(db, "Kochi Cashew Co", CompanyType::Vendor, Some(&kochi)).await;
    let client = insert_company(db, "Dubai Dry Fruits", CompanyType::Client, None).await;

    company_commodity::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_id: Set(vendor.id),
        commodity_id: Set(commodity.id),
        created_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert company commodity");

    let project = insert_project(db, &commodity, Some(&admin)).await;
    project_vendor::ActiveModel {
        id: Set(Uuid::new_v4()),
        project_id: Set(project.id),
        vendor_id: Set(vendor.id),
        created_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert project vendor");

    let sample = insert_sample(db, &project, &vendor, "SMP-T1", SampleStatus::ClientApproved).await;
    let opportunity =
        insert_opportunity(db, &client, &commodity, OpportunityStatus::ClosedWon).await;
    let opportunity = {
        let mut active: sales_opportunity::ActiveModel = opportunity.into();
        active.procurement_project_id = Set(Some(project.id));
        active.update(db).await.expect("link project")
    };
    let submission =
        insert_submission(db, &sample, &opportunity, SubmissionStatus::ClientApproved).await;
    let sales_order = insert_sales_order(db, &opportunity, "SO-T1").await;

    let purchase_order = purchase_order::ActiveModel {
        id: Set(Uuid::new_v4()),
        po_number: Set("PO-T1".to_string()),
        project_id: Set(project.id),
        vendor_id: Set(vendor.id),
        status: Set(PurchaseOrderStatus::Issued),
        quantity: Set(dec!(25)),
        unit_price: Set(dec!(1100.00)),
        currency: Set("USD".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert purchase order");

    let invoice = invoice::ActiveModel {
        id: Set(Uuid::new_v4()),
        invoice_number: Set("INV-T1".to_string()),
        sales_order_id: Set(sales_order.id),
        amount: Set(dec!(35000.00)),
        currency: Set("USD".to_string()),
        is_paid: Set(false),
        issued_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert invoice");

    let bill = bill::ActiveModel {
        id: Set(Uuid::new_v4()),
        bill_number: Set("BILL-T1".to_string()),
        purchase_order_id: Set(purchase_order.id),
        amount: Set(dec!(27500.00)),
        currency: Set("USD".to_string()),
        is_paid: Set(true),
        received_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert bill");

    let mut transactions = Vec::new();
    for (invoice_id, bill_id, direction, amount) in [
        (Some(invoice.id), None, TransactionDirection::Inflow, dec!(35000.00)),
        (None, Some(bill.id), TransactionDirection::Outflow, dec!(27500.00)),
    ] {
        let txn = transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_id: Set(invoice_id),
            bill_id: Set(bill_id),
            direction: Set(direction),
            amount: Set(amount),
            currency: Set("USD".to_string()),
            occurred_at: Set(now),
        }
        .insert(db)
        .await
        .expect("insert transaction");
        transactions.push(txn);
    }

    shipment::ActiveModel {
        id: Set(Uuid::new_v4()),
        purchase_order_id: Set(purchase_order.id),
        carrier: Set(Some("Maersk".to_string())),
        tracking_number: Set(Some("MSKU1234567".to_string())),
        shipped_at: Set(Some(now)),
        created_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert shipment");

    grn::ActiveModel {
        id: Set(Uuid::new_v4()),
        grn_number: Set("GRN-T1".to_string()),
        purchase_order_id: Set(purchase_order.id),
        received_quantity: Set(dec!(25)),
        received_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert grn");

    interaction_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_id: Set(client.id),
        user_id: Set(admin.id),
        channel: Set("call".to_string()),
        summary: Set("Discussed W320 grading".to_string()),
        occurred_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert interaction log");

    activity_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(admin.id),
        company_id: Set(Some(client.id)),
        action: Set("sales_order.created".to_string()),
        entity_kind: Set("sales_order".to_string()),
        entity_id: Set(Some(sales_order.id)),
        created_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert activity log");

    todo::ActiveModel {
        id: Set(Uuid::new_v4()),
        assignee_id: Set(admin.id),
        company_id: Set(Some(vendor.id)),
        title: Set("Chase GRN paperwork".to_string()),
        done: Set(false),
        due_at: Set(None),
        created_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert todo");

    Pipeline {
        admin,
        commodity,
        vendor,
        client,
        project,
        sample,
        opportunity,
        submission,
        sales_order,
        purchase_order,
        invoice,
        bill,
        transactions,
    }
}
