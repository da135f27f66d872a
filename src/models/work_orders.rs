// src/models/work_orders.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "work_order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkOrderStatus {
    New,
    Scheduled,
    InProgress,
    OnHold,
    Completed,
    Cancelled,
}

impl WorkOrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkOrderStatus::Completed | WorkOrderStatus::Cancelled)
    }

    pub fn can_transition_to(self, next: WorkOrderStatus) -> bool {
        use WorkOrderStatus::*;
        match self {
            New => matches!(next, Scheduled | InProgress | Cancelled),
            Scheduled => matches!(next, InProgress | OnHold | Cancelled),
            InProgress => matches!(next, OnHold | Completed | Cancelled),
            OnHold => matches!(next, InProgress | Cancelled),
            Completed | Cancelled => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "work_order_priority", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkOrderPriority {
    Low,
    Normal,
    High,
    Emergency,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub account_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    #[schema(example = "No cooling - rooftop unit 3")]
    pub title: String,
    pub description: Option<String>,
    pub site_address: Option<String>,
    pub priority: WorkOrderPriority,
    pub status: WorkOrderStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkOrderPayload {
    #[validate(length(min = 1, max = 200, message = "O título é obrigatório."))]
    pub title: String,
    pub description: Option<String>,
    pub site_address: Option<String>,
    pub account_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub priority: Option<WorkOrderPriority>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkOrderPayload {
    #[validate(length(min = 1, max = 200, message = "O título não pode ser vazio."))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub site_address: Option<String>,
    pub account_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub priority: Option<WorkOrderPriority>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WorkOrderStatusPayload {
    pub status: WorkOrderStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct WorkOrderFilter {
    pub status: Option<WorkOrderStatus>,
    pub assigned_to: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::WorkOrderStatus::*;

    #[test]
    fn happy_path_reaches_completed() {
        assert!(New.can_transition_to(Scheduled));
        assert!(Scheduled.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
    }

    #[test]
    fn cannot_skip_straight_to_completed() {
        assert!(!New.can_transition_to(Completed));
        assert!(!OnHold.can_transition_to(Completed));
    }

    #[test]
    fn terminal_states_are_frozen() {
        for next in [New, Scheduled, InProgress, OnHold, Completed, Cancelled] {
            assert!(!Completed.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
        assert!(Completed.is_terminal());
        assert!(!OnHold.is_terminal());
    }
}
