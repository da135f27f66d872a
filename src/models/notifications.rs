// src/models/notifications.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "notification_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    WorkOrder,
    Dispatch,
    Inventory,
    Purchasing,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, FromRow, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreference {
    pub in_app: bool,
    pub email: bool,
    pub sms: bool,
}

impl Default for NotificationPreference {
    fn default() -> Self {
        Self {
            in_app: true,
            email: false,
            sms: false,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePreferencePayload {
    pub in_app: Option<bool>,
    pub email: Option<bool>,
    pub sms: Option<bool>,
}

impl NotificationPreference {
    pub fn merge(self, payload: &UpdatePreferencePayload) -> Self {
        Self {
            in_app: payload.in_app.unwrap_or(self.in_app),
            email: payload.email.unwrap_or(self.email),
            sms: payload.sms.unwrap_or(self.sms),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NotificationFilter {
    /// Apenas não lidas
    #[serde(default)]
    pub unread_only: bool,
}

/// Resultado de uma entrega: a linha persistida e se algum cliente conectado a recebeu.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub notification: Notification,
    pub pushed: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkedRead {
    pub updated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preference_is_in_app_only() {
        let pref = NotificationPreference::default();
        assert!(pref.in_app && !pref.email && !pref.sms);
    }

    #[test]
    fn merge_keeps_unspecified_channels() {
        let pref = NotificationPreference::default().merge(&UpdatePreferencePayload {
            in_app: None,
            email: Some(true),
            sms: None,
        });
        assert_eq!(
            pref,
            NotificationPreference {
                in_app: true,
                email: true,
                sms: false
            }
        );
    }
}
