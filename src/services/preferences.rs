use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

use crate::db::DbConn;
use crate::error::{AppError, Result};
use crate::models::prelude::*;

/// Per-user notification opt-outs stored as JSON on the profile.
///
/// A missing flag means "enabled"; only an explicit `false` opts out.
/// Keys this service does not know about are preserved on update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct NotificationPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_reminders: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_reminders: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab_results: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NotificationPreferences {
    /// Lenient parse: absent or malformed JSON yields the all-enabled default.
    ///
    /// Flags are read one by one, so a known key holding a non-boolean value
    /// only unsets that key and never hides an explicit opt-out next to it.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };

        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(mut map)) => Self {
                medication_reminders: flag(&mut map, "medication_reminders"),
                appointment_reminders: flag(&mut map, "appointment_reminders"),
                lab_results: flag(&mut map, "lab_results"),
                messages: flag(&mut map, "messages"),
                extra: map,
            },
            Ok(_) => {
                tracing::warn!("Ignoring notification preferences that are not a JSON object");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed notification preferences");
                Self::default()
            }
        }
    }

    pub fn allows_medication_reminders(&self) -> bool {
        self.medication_reminders != Some(false)
    }

    /// Apply the flags present in `patch`, keeping everything else
    pub fn merge(&mut self, patch: NotificationPreferences) {
        if patch.medication_reminders.is_some() {
            self.medication_reminders = patch.medication_reminders;
        }
        if patch.appointment_reminders.is_some() {
            self.appointment_reminders = patch.appointment_reminders;
        }
        if patch.lab_results.is_some() {
            self.lab_results = patch.lab_results;
        }
        if patch.messages.is_some() {
            self.messages = patch.messages;
        }
        self.extra.extend(patch.extra);
    }
}

fn flag(map: &mut Map<String, Value>, key: &str) -> Option<bool> {
    match map.remove(key)? {
        Value::Bool(enabled) => Some(enabled),
        other => {
            tracing::warn!(key, value = %other, "Ignoring non-boolean notification preference");
            None
        }
    }
}

#[derive(Clone)]
pub struct PreferenceService {
    db: DbConn,
}

impl PreferenceService {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn get(&self, user_id: Uuid) -> Result<NotificationPreferences> {
        let profile = Profile::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

        Ok(NotificationPreferences::parse(
            profile.notification_preferences.as_deref(),
        ))
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        patch: NotificationPreferences,
    ) -> Result<NotificationPreferences> {
        let profile = Profile::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

        let mut preferences =
            NotificationPreferences::parse(profile.notification_preferences.as_deref());
        preferences.merge(patch);

        let mut active = profile.into_active_model();
        active.notification_preferences = Set(Some(serde_json::to_string(&preferences)?));
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await?;

        Ok(preferences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{create_test_db, create_test_profile};
    use serde_json::json;

    #[test]
    fn test_missing_flag_means_enabled() {
        assert!(NotificationPreferences::parse(None).allows_medication_reminders());
        assert!(NotificationPreferences::parse(Some("{}")).allows_medication_reminders());
        assert!(NotificationPreferences::parse(Some("not json")).allows_medication_reminders());
        assert!(
            !NotificationPreferences::parse(Some(r#"{"medication_reminders": false}"#))
                .allows_medication_reminders()
        );
    }

    #[test]
    fn test_bad_sibling_flag_keeps_opt_out() {
        let prefs = NotificationPreferences::parse(Some(
            r#"{"medication_reminders": false, "lab_results": "weekly", "theme": "dark"}"#,
        ));

        assert!(!prefs.allows_medication_reminders());
        assert_eq!(prefs.lab_results, None);
        assert_eq!(prefs.extra.get("theme"), Some(&json!("dark")));
        assert!(!prefs.extra.contains_key("lab_results"));
    }

    #[test]
    fn test_non_object_preferences_are_default() {
        assert_eq!(
            NotificationPreferences::parse(Some("[false]")),
            NotificationPreferences::default()
        );
    }

    #[test]
    fn test_unknown_keys_survive_roundtrip() {
        let prefs = NotificationPreferences::parse(Some(r#"{"lab_results": true, "theme": "dark"}"#));
        let value = serde_json::to_value(&prefs).unwrap();

        assert_eq!(value, json!({"lab_results": true, "theme": "dark"}));
    }

    #[tokio::test]
    async fn test_update_merges_flags() {
        let db = create_test_db().await;
        let user = create_test_profile(&db, "patient@example.com").await;
        let service = PreferenceService::new(db);

        service
            .update(
                user.id,
                NotificationPreferences {
                    lab_results: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let prefs = service
            .update(
                user.id,
                NotificationPreferences {
                    medication_reminders: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(prefs.lab_results, Some(false));
        assert!(!prefs.allows_medication_reminders());
        assert_eq!(service.get(user.id).await.unwrap(), prefs);
    }

    #[tokio::test]
    async fn test_unknown_profile_is_not_found() {
        let db = create_test_db().await;
        let service = PreferenceService::new(db);

        let err = service.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
