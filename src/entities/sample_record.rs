use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A physical sample requested from a vendor for a procurement project.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sample_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub project_id: Uuid,
    #[sea_orm(indexed)]
    pub vendor_id: Uuid,
    pub reference: String,
    pub status: SampleStatus,
    #[sea_orm(nullable)]
    pub received_at: Option<DateTime<Utc>>,
    #[sea_orm(nullable)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::procurement_project::Entity",
        from = "Column::ProjectId",
        to = "super::procurement_project::Column::Id"
    )]
    Project,
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::VendorId",
        to = "super::company::Column::Id"
    )]
    Vendor,
}

impl Related<super::procurement_project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vendor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Sample lifecycle. Transitions live in `lifecycle::status`.
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
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SampleStatus {
    #[sea_orm(string_value = "REQUESTED")]
    Requested,
    #[sea_orm(string_value = "SENT")]
    Sent,
    #[sea_orm(string_value = "RECEIVED")]
    Received,
    #[sea_orm(string_value = "RESULT_APPROVED_INTERNAL")]
    ResultApprovedInternal,
    #[sea_orm(string_value = "RESULT_REJECTED")]
    ResultRejected,
    #[sea_orm(string_value = "SENT_TO_CLIENT")]
    SentToClient,
    #[sea_orm(string_value = "CLIENT_APPROVED")]
    ClientApproved,
    #[sea_orm(string_value = "CLIENT_REJECTED")]
    ClientRejected,
}
