use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use eterna_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{Match, NewLike, NewMatch, NewNotification};
use crate::schema::{likes, matches};
use crate::services::notification_service;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeOutcome {
    Passed,
    Liked,
    Matched { match_id: Uuid },
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SwipeResult {
    pub is_match: bool,
    pub match_id: Option<Uuid>,
}

impl From<SwipeOutcome> for SwipeResult {
    fn from(outcome: SwipeOutcome) -> Self {
        match outcome {
            SwipeOutcome::Matched { match_id } => Self { is_match: true, match_id: Some(match_id) },
            SwipeOutcome::Passed | SwipeOutcome::Liked => Self { is_match: false, match_id: None },
        }
    }
}

/// Notifications a swipe produces: none for a pass, one for the receiver of
/// a like, one for each side of a new match.
pub fn swipe_notifications(sender: Uuid, receiver: Uuid, outcome: SwipeOutcome) -> Vec<NewNotification> {
    match outcome {
        SwipeOutcome::Passed => Vec::new(),
        SwipeOutcome::Liked => vec![NewNotification {
            user_id: receiver,
            notification_type: "like".into(),
            title: "Someone likes you!".into(),
            message: "You received a new like".into(),
            data: Some(json!({ "user_id": sender })),
        }],
        SwipeOutcome::Matched { match_id } => [(sender, receiver), (receiver, sender)]
            .into_iter()
            .map(|(user_id, other)| NewNotification {
                user_id,
                notification_type: "match".into(),
                title: "It's a Match!".into(),
                message: "You have a new match".into(),
                data: Some(json!({ "match_id": match_id, "user_id": other })),
            })
            .collect(),
    }
}

/// Records a like or pass and, on a reciprocal like, the mirrored match pair.
/// Everything runs in one transaction; a concurrent duplicate trips the
/// unique (sender, receiver) index and is reported as already responded.
pub fn record_swipe(
    conn: &mut PgConnection,
    sender: Uuid,
    receiver: Uuid,
    is_like: bool,
    notifications_enabled: bool,
) -> AppResult<SwipeOutcome> {
    if sender == receiver {
        return Err(AppError::new(ErrorCode::CannotLikeSelf, "cannot like yourself"));
    }

    let result = conn.transaction::<SwipeOutcome, DieselError, _>(|conn| {
        diesel::insert_into(likes::table)
            .values(&NewLike { sender_id: sender, receiver_id: receiver, is_like })
            .execute(conn)?;

        let outcome = if !is_like {
            SwipeOutcome::Passed
        } else {
            let reciprocal: i64 = likes::table
                .filter(likes::sender_id.eq(receiver))
                .filter(likes::receiver_id.eq(sender))
                .filter(likes::is_like.eq(true))
                .count()
                .get_result(conn)?;

            if reciprocal > 0 {
                let created: Match = diesel::insert_into(matches::table)
                    .values(&NewMatch { user_id: sender, target_id: receiver })
                    .get_result(conn)?;
                diesel::insert_into(matches::table)
                    .values(&NewMatch { user_id: receiver, target_id: sender })
                    .execute(conn)?;
                SwipeOutcome::Matched { match_id: created.id }
            } else {
                SwipeOutcome::Liked
            }
        };

        notification_service::insert_many(
            conn,
            notifications_enabled,
            swipe_notifications(sender, receiver, outcome),
        )?;

        Ok(outcome)
    });

    match result {
        Ok(outcome) => Ok(outcome),
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => Err(AppError::new(
            ErrorCode::AlreadyResponded,
            "already responded to this profile",
        )),
        Err(e) => Err(e.into()),
    }
}

pub fn already_responded(conn: &mut PgConnection, sender: Uuid, receiver: Uuid) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(
        likes::table
            .filter(likes::sender_id.eq(sender))
            .filter(likes::receiver_id.eq(receiver)),
    ))
    .get_result(conn)
}

/// Both rows of the mirrored pair that `match_id` belongs to, provided
/// `user_id` is one of its participants.
pub fn resolve_pair(conn: &mut PgConnection, match_id: Uuid, user_id: Uuid) -> AppResult<(Match, Vec<Uuid>)> {
    let found = matches::table
        .find(match_id)
        .first::<Match>(conn)
        .optional()?
        .filter(|m| m.user_id == user_id || m.target_id == user_id)
        .ok_or_else(|| AppError::new(ErrorCode::MatchNotFound, "match not found"))?;

    let pair_ids: Vec<Uuid> = matches::table
        .filter(
            matches::user_id
                .eq(found.user_id)
                .and(matches::target_id.eq(found.target_id))
                .or(matches::user_id
                    .eq(found.target_id)
                    .and(matches::target_id.eq(found.user_id))),
        )
        .select(matches::id)
        .load(conn)?;

    Ok((found, pair_ids))
}

/// Deactivates both rows of a pair.
pub fn unmatch(conn: &mut PgConnection, pair_ids: &[Uuid]) -> QueryResult<usize> {
    diesel::update(matches::table.filter(matches::id.eq_any(pair_ids)))
        .set(matches::is_active.eq(false))
        .execute(conn)
}
