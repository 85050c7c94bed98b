use diesel::prelude::*;
use serde_json::json;
use uuid::Uuid;

use crate::models::{NewNotification, Notification};
use crate::schema::notifications;

/// Inserts a notification unless notifications are switched off, in which
/// case nothing is written and `None` comes back.
pub fn create(
    conn: &mut PgConnection,
    enabled: bool,
    notification: &NewNotification,
) -> QueryResult<Option<Notification>> {
    if !enabled {
        tracing::debug!(user_id = %notification.user_id, "notifications disabled, skipping");
        return Ok(None);
    }

    let created = diesel::insert_into(notifications::table)
        .values(notification)
        .get_result::<Notification>(conn)?;

    tracing::debug!(
        notification_id = %created.id,
        user_id = %created.user_id,
        notification_type = %created.notification_type,
        "notification created"
    );

    Ok(Some(created))
}

/// Batch form of [`create`]; returns the number of rows written.
pub fn insert_many(
    conn: &mut PgConnection,
    enabled: bool,
    batch: Vec<NewNotification>,
) -> QueryResult<usize> {
    if !enabled || batch.is_empty() {
        return Ok(0);
    }
    diesel::insert_into(notifications::table)
        .values(&batch)
        .execute(conn)
}

pub fn message_received(receiver: Uuid, sender: Uuid, match_id: Uuid, message_id: Uuid) -> NewNotification {
    NewNotification {
        user_id: receiver,
        notification_type: "message".into(),
        title: "New message".into(),
        message: "You have a new message".into(),
        data: Some(json!({
            "match_id": match_id,
            "sender_id": sender,
            "message_id": message_id,
        })),
    }
}

pub fn list(
    conn: &mut PgConnection,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> QueryResult<(Vec<Notification>, i64)> {
    let total: i64 = notifications::table
        .filter(notifications::user_id.eq(user_id))
        .count()
        .get_result(conn)?;

    let items = notifications::table
        .filter(notifications::user_id.eq(user_id))
        .order(notifications::created_at.desc())
        .limit(limit)
        .offset(offset)
        .load::<Notification>(conn)?;

    Ok((items, total))
}

pub fn count_unread(conn: &mut PgConnection, user_id: Uuid) -> QueryResult<i64> {
    notifications::table
        .filter(notifications::user_id.eq(user_id))
        .filter(notifications::is_read.eq(false))
        .count()
        .get_result(conn)
}

/// Marks one of the user's notifications read. `None` when it does not exist
/// or belongs to someone else; already-read notifications come back as-is.
pub fn mark_read(
    conn: &mut PgConnection,
    user_id: Uuid,
    notification_id: Uuid,
) -> QueryResult<Option<Notification>> {
    diesel::update(
        notifications::table
            .filter(notifications::id.eq(notification_id))
            .filter(notifications::user_id.eq(user_id)),
    )
    .set(notifications::is_read.eq(true))
    .get_result::<Notification>(conn)
    .optional()
}

pub fn mark_all_read(conn: &mut PgConnection, user_id: Uuid) -> QueryResult<usize> {
    diesel::update(
        notifications::table
            .filter(notifications::user_id.eq(user_id))
            .filter(notifications::is_read.eq(false)),
    )
    .set(notifications::is_read.eq(true))
    .execute(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_notification_points_back_to_conversation() {
        let (receiver, sender, m, msg) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let n = message_received(receiver, sender, m, msg);
        assert_eq!(n.user_id, receiver);
        assert_eq!(n.notification_type, "message");
        let data = n.data.unwrap();
        assert_eq!(data["match_id"], json!(m));
        assert_eq!(data["sender_id"], json!(sender));
        assert_eq!(data["message_id"], json!(msg));
    }
}
