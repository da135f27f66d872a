// src/models/dispatch.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "dispatch_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchStatus {
    Scheduled,
    EnRoute,
    OnSite,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSlot {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub work_order_id: Uuid,
    pub technician_id: Option<Uuid>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: DispatchStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A janela precisa começar antes de terminar.
pub fn validate_window(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Result<(), ValidationError> {
    if starts_at >= ends_at {
        let mut err = ValidationError::new("window");
        err.message = Some("startsAt deve ser anterior a endsAt.".into());
        return Err(err);
    }
    Ok(())
}

fn validate_create_window(payload: &CreateDispatchSlotPayload) -> Result<(), ValidationError> {
    validate_window(payload.starts_at, payload.ends_at)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_create_window", skip_on_field_errors = false))]
pub struct CreateDispatchSlotPayload {
    pub work_order_id: Uuid,
    pub technician_id: Option<Uuid>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDispatchSlotPayload {
    pub technician_id: Option<Uuid>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DispatchStatusPayload {
    pub status: DispatchStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DispatchFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub technician_id: Option<Uuid>,
    pub work_order_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn window_must_be_forward() {
        let now = Utc::now();
        assert!(validate_window(now, now + Duration::hours(2)).is_ok());
        assert!(validate_window(now, now).is_err());
        assert!(validate_window(now, now - Duration::minutes(1)).is_err());
    }

    #[test]
    fn create_payload_checks_window() {
        let now = Utc::now();
        let payload = CreateDispatchSlotPayload {
            work_order_id: Uuid::new_v4(),
            technician_id: None,
            starts_at: now,
            ends_at: now - Duration::hours(1),
            notes: None,
        };
        assert!(payload.validate().is_err());
    }
}
