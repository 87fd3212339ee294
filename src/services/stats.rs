use std::sync::Arc;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde::Serialize;
use tracing::instrument;

use crate::entities::{
    company, procurement_project, sales_opportunity, sales_order, sample_submission, transaction,
    CompanyType, OpportunityStatus, ProjectStatus, SalesOrderStatus, SubmissionStatus,
};
use crate::errors::ServiceError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub companies: u64,
    pub vendors: u64,
    pub clients: u64,
    pub open_opportunities: u64,
    pub won_opportunities: u64,
    pub active_projects: u64,
    pub pending_submissions: u64,
    pub open_sales_orders: u64,
    pub transactions: u64,
}

#[derive(Clone)]
pub struct StatsService {
    db: Arc<DatabaseConnection>,
}

impl StatsService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Read-only aggregates for the dashboard, fetched concurrently.
    #[instrument(skip(self))]
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ServiceError> {
        let db = &*self.db;

        let (
            companies,
            vendors,
            clients,
            open_opportunities,
            won_opportunities,
            active_projects,
            pending_submissions,
            open_sales_orders,
            transactions,
        ) = tokio::try_join!(
            company::Entity::find().count(db),
            company::Entity::find()
                .filter(company::Column::CompanyType.eq(CompanyType::Vendor))
                .count(db),
            company::Entity::find()
                .filter(company::Column::CompanyType.eq(CompanyType::Client))
                .count(db),
            sales_opportunity::Entity::find()
                .filter(sales_opportunity::Column::Status.eq(OpportunityStatus::Open))
                .count(db),
            sales_opportunity::Entity::find()
                .filter(sales_opportunity::Column::Status.eq(OpportunityStatus::ClosedWon))
                .count(db),
            procurement_project::Entity::find()
                .filter(procurement_project::Column::Status.eq(ProjectStatus::Active))
                .count(db),
            sample_submission::Entity::find()
                .filter(sample_submission::Column::Status.eq(SubmissionStatus::Pending))
                .count(db),
            sales_order::Entity::find()
                .filter(sales_order::Column::Status.is_in([
                    SalesOrderStatus::Pending,
                    SalesOrderStatus::InProgress,
                    SalesOrderStatus::Shipped,
                ]))
                .count(db),
            transaction::Entity::find().count(db),
        )?;

        Ok(DashboardStats {
            companies,
            vendors,
            clients,
            open_opportunities,
            won_opportunities,
            active_projects,
            pending_submissions,
            open_sales_orders,
            transactions,
        })
    }
}
