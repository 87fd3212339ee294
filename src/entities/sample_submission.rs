use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Links a vendor sample to a sales opportunity and carries the client's
/// decision on it. An approved submission gates procurement for the
/// opportunity's sales orders.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sample_submissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub sample_id: Uuid,
    #[sea_orm(indexed)]
    pub opportunity_id: Uuid,
    pub status: SubmissionStatus,
    pub submitted_at: DateTime<Utc>,
    #[sea_orm(nullable)]
    pub decided_at: Option<DateTime<Utc>>,
    #[sea_orm(nullable)]
    pub feedback: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sample_record::Entity",
        from = "Column::SampleId",
        to = "super::sample_record::Column::Id"
    )]
    Sample,
    #[sea_orm(
        belongs_to = "super::sales_opportunity::Entity",
        from = "Column::OpportunityId",
        to = "super::sales_opportunity::Column::Id"
    )]
    Opportunity,
}

impl Related<super::sample_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sample.def()
    }
}

impl Related<super::sales_opportunity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Opportunity.def()
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
pub enum SubmissionStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "CLIENT_APPROVED")]
    ClientApproved,
    #[sea_orm(string_value = "CLIENT_REJECTED")]
    ClientRejected,
}
