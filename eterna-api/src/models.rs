use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{
    likes, matches, messages, notifications, photos, profiles, push_subscriptions, reports,
    system_settings, users,
};

// --- User ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub verified: bool,
    pub is_banned: bool,
    pub premium_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_premium_at(&self, now: DateTime<Utc>) -> bool {
        self.premium_until.is_some_and(|until| until > now)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
}

// --- Profile ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = profiles)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    pub bio: Option<String>,
    pub age: i32,
    pub gender: String,
    pub location: String,
    pub interests: serde_json::Value,
    pub looking_for: serde_json::Value,
    pub age_min: i32,
    pub age_max: i32,
    pub max_distance: i32,
    pub is_visible: bool,
    pub last_active: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn interest_list(&self) -> Vec<String> {
        string_list(&self.interests)
    }

    pub fn looking_for_list(&self) -> Vec<String> {
        string_list(&self.looking_for)
    }
}

/// Reads a JSON array of strings, skipping anything that is not a string.
pub fn string_list(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = profiles)]
pub struct ProfileFields {
    pub display_name: String,
    pub bio: Option<String>,
    pub age: i32,
    pub gender: String,
    pub location: String,
    pub interests: serde_json::Value,
    pub looking_for: serde_json::Value,
    pub age_min: i32,
    pub age_max: i32,
    pub max_distance: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = profiles)]
pub struct NewProfile {
    pub user_id: Uuid,
    #[diesel(embed)]
    pub fields: ProfileFields,
}

// --- Photo ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = photos)]
pub struct Photo {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub url: String,
    pub position: i32,
    pub is_main: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = photos)]
pub struct NewPhoto {
    pub profile_id: Uuid,
    pub url: String,
    pub position: i32,
    pub is_main: bool,
}

// --- Like ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = likes)]
pub struct Like {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub is_like: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = likes)]
pub struct NewLike {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub is_like: bool,
}

// --- Match ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = matches)]
pub struct Match {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Match {
    /// The participant that is not `user_id`.
    pub fn other_side(&self, user_id: Uuid) -> Uuid {
        if self.user_id == user_id {
            self.target_id
        } else {
            self.user_id
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = matches)]
pub struct NewMatch {
    pub user_id: Uuid,
    pub target_id: Uuid,
}

// --- Message ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = messages)]
pub struct Message {
    pub id: Uuid,
    pub match_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage {
    pub match_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
}

// --- Notification ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = notifications)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub data: Option<serde_json::Value>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable, Clone, PartialEq)]
#[diesel(table_name = notifications)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

// --- Report ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = reports)]
pub struct Report {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub target_id: Uuid,
    pub reason: String,
    pub details: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reports)]
pub struct NewReport {
    pub sender_id: Uuid,
    pub target_id: Uuid,
    pub reason: String,
    pub details: Option<String>,
}

// --- Push subscription ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = push_subscriptions)]
pub struct PushSubscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub endpoint: String,
    pub subscription_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = push_subscriptions)]
pub struct NewPushSubscription {
    pub user_id: Uuid,
    pub endpoint: String,
    pub subscription_data: serde_json::Value,
}

// --- System settings ---

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = system_settings)]
pub struct SettingsRow {
    pub id: i32,
    pub settings: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_list_ignores_non_strings() {
        assert_eq!(string_list(&json!(["hiking", 3, "jazz"])), vec!["hiking", "jazz"]);
        assert!(string_list(&json!({"a": 1})).is_empty());
        assert!(string_list(&serde_json::Value::Null).is_empty());
    }

    #[test]
    fn match_other_side_works_from_either_participant() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let m = Match { id: Uuid::now_v7(), user_id: a, target_id: b, is_active: true, created_at: Utc::now() };
        assert_eq!(m.other_side(a), b);
        assert_eq!(m.other_side(b), a);
    }

    #[test]
    fn premium_requires_future_expiry() {
        let now = Utc::now();
        let mut user = User {
            id: Uuid::now_v7(),
            email: "a@b.c".into(),
            name: None,
            password_hash: "x".into(),
            role: "user".into(),
            verified: false,
            is_banned: false,
            premium_until: None,
            created_at: now,
            updated_at: now,
        };
        assert!(!user.is_premium_at(now));
        user.premium_until = Some(now + chrono::Duration::days(1));
        assert!(user.is_premium_at(now));
        user.premium_until = Some(now - chrono::Duration::seconds(1));
        assert!(!user.is_premium_at(now));

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
