use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A client-facing sales opportunity for a commodity.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales_opportunities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(indexed)]
    pub client_id: Uuid,
    #[sea_orm(indexed)]
    pub commodity_id: Uuid,
    /// Back-reference to the project sourcing this opportunity, if any.
    #[sea_orm(nullable)]
    pub procurement_project_id: Option<Uuid>,
    pub status: OpportunityStatus,
    pub quantity: Decimal,
    #[sea_orm(nullable)]
    pub target_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::ClientId",
        to = "super::company::Column::Id"
    )]
    Client,
    #[sea_orm(
        belongs_to = "super::commodity::Entity",
        from = "Column::CommodityId",
        to = "super::commodity::Column::Id"
    )]
    Commodity,
    #[sea_orm(
        belongs_to = "super::procurement_project::Entity",
        from = "Column::ProcurementProjectId",
        to = "super::procurement_project::Column::Id"
    )]
    ProcurementProject,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::commodity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Commodity.def()
    }
}

impl Related<super::procurement_project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProcurementProject.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OpportunityStatus {
    #[sea_orm(string_value = "OPEN")]
    Open,
    #[sea_orm(string_value = "CLOSED_WON")]
    ClosedWon,
    #[sea_orm(string_value = "CLOSED_LOST")]
    ClosedLost,
}
