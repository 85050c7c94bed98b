use std::sync::{Arc, RwLock};

use chrono::Utc;
use diesel::prelude::*;
use diesel::upsert::excluded;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use eterna_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::SettingsRow;
use crate::schema::system_settings;

const SETTINGS_ROW_ID: i32 = 1;

/// Admin-editable runtime settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemSettings {
    pub app_name: String,
    pub description: String,
    pub max_matches_per_day: u32,
    pub max_messages_per_hour: u32,
    pub enable_notifications: bool,
    pub enable_push_notifications: bool,
    pub require_profile_verification: bool,
    pub allow_guest_browsing: bool,
    pub maintenance_mode: bool,
    pub maintenance_message: String,
    pub email_notifications: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            app_name: "Eterna".into(),
            description: "Find your perfect match. Connect with people who share your interests and values.".into(),
            max_matches_per_day: 50,
            max_messages_per_hour: 100,
            enable_notifications: true,
            enable_push_notifications: false,
            require_profile_verification: false,
            allow_guest_browsing: false,
            maintenance_mode: false,
            maintenance_message: "We're currently performing maintenance. Please check back soon!".into(),
            email_notifications: false,
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_user: String::new(),
        }
    }
}

impl SystemSettings {
    /// Applies a partial update: known keys (snake_case or camelCase) replace
    /// the current value, unknown keys are ignored, and a value of the wrong
    /// type rejects the whole update.
    pub fn merged(&self, patch: &Value) -> AppResult<Self> {
        let patch = patch
            .as_object()
            .ok_or_else(|| AppError::bad_request("settings update must be a JSON object"))?;

        let mut current = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => return Err(AppError::internal("settings are not serializable")),
        };

        let mut ignored = Vec::new();
        for (key, value) in patch {
            let key = snake_case(key);
            match current.get_mut(&key) {
                Some(slot) => *slot = value.clone(),
                None => ignored.push(key),
            }
        }
        if !ignored.is_empty() {
            tracing::debug!(keys = ?ignored, "ignoring unknown settings keys");
        }

        serde_json::from_value(Value::Object(current)).map_err(|e| {
            AppError::with_details(
                ErrorCode::ValidationError,
                "invalid settings value",
                serde_json::json!({ "reason": e.to_string() }),
            )
        })
    }
}

fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// In-process copy of the persisted settings, shared by handlers and
/// middleware.
#[derive(Clone, Default)]
pub struct SettingsStore {
    inner: Arc<RwLock<SystemSettings>>,
}

impl SettingsStore {
    pub fn new(initial: SystemSettings) -> Self {
        Self { inner: Arc::new(RwLock::new(initial)) }
    }

    pub fn snapshot(&self) -> SystemSettings {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn replace(&self, settings: SystemSettings) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = settings;
    }
}

/// Stored settings, or defaults when none were ever saved. Keys missing from
/// the stored document take their default value.
pub fn load(conn: &mut PgConnection) -> QueryResult<SystemSettings> {
    let row = system_settings::table
        .find(SETTINGS_ROW_ID)
        .first::<SettingsRow>(conn)
        .optional()?;

    Ok(match row {
        Some(row) => serde_json::from_value(row.settings).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "stored settings unreadable, using defaults");
            SystemSettings::default()
        }),
        None => SystemSettings::default(),
    })
}

pub fn save(conn: &mut PgConnection, settings: &SystemSettings) -> AppResult<()> {
    let row = SettingsRow {
        id: SETTINGS_ROW_ID,
        settings: serde_json::to_value(settings).map_err(|e| AppError::internal(e.to_string()))?,
        updated_at: Utc::now(),
    };

    diesel::insert_into(system_settings::table)
        .values(&row)
        .on_conflict(system_settings::id)
        .do_update()
        .set((
            system_settings::settings.eq(excluded(system_settings::settings)),
            system_settings::updated_at.eq(excluded(system_settings::updated_at)),
        ))
        .execute(conn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_replaces_known_keys_only() {
        let current = SystemSettings::default();
        let next = current
            .merged(&json!({ "maintenance_mode": true, "unknown": 1, "smtpPort": 2525 }))
            .unwrap();
        assert!(next.maintenance_mode);
        assert_eq!(next.smtp_port, 2525);
        assert_eq!(next.app_name, current.app_name);
    }

    #[test]
    fn wrong_type_rejects_the_update() {
        let err = SystemSettings::default()
            .merged(&json!({ "max_messages_per_hour": "lots" }))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[test]
    fn non_object_patch_is_a_bad_request() {
        let err = SystemSettings::default().merged(&json!([1, 2])).unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadRequest);
    }

    #[test]
    fn partial_documents_fill_in_defaults() {
        let stored: SystemSettings = serde_json::from_value(json!({ "app_name": "Other" })).unwrap();
        assert_eq!(stored.app_name, "Other");
        assert_eq!(stored.max_messages_per_hour, 100);
        assert!(stored.enable_notifications);
    }

    #[test]
    fn camel_case_keys_are_normalised() {
        assert_eq!(snake_case("requireProfileVerification"), "require_profile_verification");
        assert_eq!(snake_case("app_name"), "app_name");
    }

    #[test]
    fn store_hands_out_copies() {
        let store = SettingsStore::default();
        let mut copy = store.snapshot();
        copy.maintenance_mode = true;
        assert!(!store.snapshot().maintenance_mode);

        store.replace(copy);
        assert!(store.snapshot().maintenance_mode);
    }
}
