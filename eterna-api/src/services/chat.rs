use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use eterna_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{Message, NewMessage};
use crate::schema::messages;
use crate::services::notification_service;

pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Trimmed message body, or an error when it is empty or too long.
pub fn validate_content(raw: &str) -> AppResult<String> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(AppError::new(ErrorCode::InvalidMessage, "message cannot be empty"));
    }
    if content.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::new(
            ErrorCode::InvalidMessage,
            format!("message cannot exceed {MAX_MESSAGE_CHARS} characters"),
        ));
    }
    Ok(content.to_string())
}

/// Every message exchanged under either row of a match pair, oldest first.
pub fn conversation(conn: &mut PgConnection, pair_ids: &[Uuid]) -> QueryResult<Vec<Message>> {
    messages::table
        .filter(messages::match_id.eq_any(pair_ids))
        .order(messages::created_at.asc())
        .load::<Message>(conn)
}

pub fn last_message(conn: &mut PgConnection, pair_ids: &[Uuid]) -> QueryResult<Option<Message>> {
    messages::table
        .filter(messages::match_id.eq_any(pair_ids))
        .order(messages::created_at.desc())
        .first::<Message>(conn)
        .optional()
}

pub fn unread_count(conn: &mut PgConnection, pair_ids: &[Uuid], reader: Uuid) -> QueryResult<i64> {
    messages::table
        .filter(messages::match_id.eq_any(pair_ids))
        .filter(messages::receiver_id.eq(reader))
        .filter(messages::is_read.eq(false))
        .count()
        .get_result(conn)
}

pub fn send(conn: &mut PgConnection, message: &NewMessage) -> QueryResult<Message> {
    diesel::insert_into(messages::table)
        .values(message)
        .get_result::<Message>(conn)
}

/// Stores the message and the receiver's notification together; neither is
/// kept when the other fails.
pub fn send_with_notification(
    conn: &mut PgConnection,
    message: &NewMessage,
    notifications_enabled: bool,
) -> QueryResult<Message> {
    conn.transaction(|conn| {
        let sent = send(conn, message)?;
        notification_service::create(
            conn,
            notifications_enabled,
            &notification_service::message_received(
                message.receiver_id,
                message.sender_id,
                message.match_id,
                sent.id,
            ),
        )?;
        Ok(sent)
    })
}

/// Marks the listed messages read, limited to unread ones in this
/// conversation that `reader` received.
pub fn mark_read(
    conn: &mut PgConnection,
    pair_ids: &[Uuid],
    reader: Uuid,
    message_ids: &[Uuid],
) -> QueryResult<usize> {
    if message_ids.is_empty() {
        return Ok(0);
    }
    diesel::update(
        messages::table
            .filter(messages::id.eq_any(message_ids))
            .filter(messages::match_id.eq_any(pair_ids))
            .filter(messages::receiver_id.eq(reader))
            .filter(messages::is_read.eq(false)),
    )
    .set((messages::is_read.eq(true), messages::read_at.eq(Some(Utc::now()))))
    .execute(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_is_trimmed() {
        assert_eq!(validate_content("  hi there \n").unwrap(), "hi there");
    }

    #[test]
    fn blank_content_is_rejected() {
        let err = validate_content("   ").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidMessage);
    }

    #[test]
    fn length_is_counted_in_characters() {
        let exact = "é".repeat(MAX_MESSAGE_CHARS);
        assert!(validate_content(&exact).is_ok());
        let over = "a".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(validate_content(&over).is_err());
    }

    fn matched_pair(conn: &mut PgConnection) -> NewMessage {
        use crate::models::{Match, NewMatch};
        use crate::schema::matches;

        let a = crate::test_support::insert_user(conn, "gia");
        let b = crate::test_support::insert_user(conn, "hal");
        let pair: Match = diesel::insert_into(matches::table)
            .values(&NewMatch { user_id: a, target_id: b })
            .get_result(conn)
            .unwrap();
        NewMessage { match_id: pair.id, sender_id: a, receiver_id: b, content: "hello".into() }
    }

    #[test]
    fn message_and_notification_commit_together() {
        use crate::models::Notification;
        use crate::schema::notifications;

        let Some(mut conn) = crate::test_support::db_conn() else { return };
        conn.test_transaction::<_, diesel::result::Error, _>(|conn| {
            let new = matched_pair(conn);
            let sent = send_with_notification(conn, &new, true)?;

            let notes: Vec<Notification> = notifications::table
                .filter(notifications::user_id.eq(new.receiver_id))
                .load(conn)?;
            assert_eq!(notes.len(), 1);
            assert_eq!(notes[0].notification_type, "message");
            assert_eq!(notes[0].data.as_ref().unwrap()["message_id"], sent.id.to_string());
            Ok(())
        });
    }

    #[test]
    fn failed_send_leaves_no_message_behind() {
        let Some(mut conn) = crate::test_support::db_conn() else { return };
        conn.test_transaction::<_, diesel::result::Error, _>(|conn| {
            let new = matched_pair(conn);
            // Rolled back with the test transaction.
            diesel::sql_query(
                "ALTER TABLE notifications ADD CONSTRAINT reject_message_notes \
                 CHECK (notification_type <> 'message')",
            )
            .execute(conn)?;

            assert!(send_with_notification(conn, &new, true).is_err());
            let stored: i64 = messages::table
                .filter(messages::match_id.eq(new.match_id))
                .count()
                .get_result(conn)?;
            assert_eq!(stored, 0);
            Ok(())
        });
    }
}
