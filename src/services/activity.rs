use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter, QueryOrder,
};
use tracing::warn;
use uuid::Uuid;

use crate::entities::{activity_log, user, UserRole};
use crate::lifecycle::EntityKind;

/// Oldest admin account, used to attribute automated changes.
pub(crate) async fn find_admin<C: ConnectionTrait>(conn: &C) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find()
        .filter(user::Column::Role.eq(UserRole::Admin))
        .order_by_asc(user::Column::CreatedAt)
        .one(conn)
        .await
}

/// Writes an activity log row attributed to the admin account. Without an
/// admin the entry is skipped with a warning; returns whether it was written.
pub(crate) async fn record_system_activity<C: ConnectionTrait>(
    conn: &C,
    action: &str,
    kind: EntityKind,
    entity_id: Uuid,
    company_id: Option<Uuid>,
) -> Result<bool, DbErr> {
    let Some(admin) = find_admin(conn).await? else {
        warn!(action, %entity_id, "No admin user exists; skipping activity log");
        return Ok(false);
    };

    activity_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(admin.id),
        company_id: Set(company_id),
        action: Set(action.to_string()),
        entity_kind: Set(kind.to_string()),
        entity_id: Set(Some(entity_id)),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await?;

    Ok(true)
}
