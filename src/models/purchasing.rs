// src/models/purchasing.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::inventory::{validate_quantity, validate_unit_cost};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "purchase_order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseOrderStatus {
    Open,
    Received,
    Cancelled,
}

impl PurchaseOrderStatus {
    /// OPEN → RECEIVED | CANCELLED. Os outros estados são finais.
    pub fn can_transition_to(self, next: PurchaseOrderStatus) -> bool {
        matches!(
            (self, next),
            (PurchaseOrderStatus::Open, PurchaseOrderStatus::Received)
                | (PurchaseOrderStatus::Open, PurchaseOrderStatus::Cancelled)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub sku_id: Uuid,
    pub vendor_id: Option<Uuid>,
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub status: PurchaseOrderStatus,
    pub expected_at: Option<NaiveDate>,
    pub received_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchaseOrderPayload {
    pub sku_id: Uuid,
    pub vendor_id: Option<Uuid>,
    #[validate(custom(function = "validate_quantity"))]
    pub quantity: Decimal,
    #[validate(custom(function = "validate_unit_cost"))]
    pub unit_cost: Option<Decimal>,
    #[schema(value_type = Option<String>, format = Date, example = "2026-11-02")]
    pub expected_at: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceivePurchaseOrderPayload {
    /// Posição onde o material será guardado.
    pub bin_id: Uuid,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PurchaseOrderFilter {
    pub status: Option<PurchaseOrderStatus>,
}

#[cfg(test)]
mod tests {
    use super::PurchaseOrderStatus::*;

    #[test]
    fn only_open_orders_move() {
        assert!(Open.can_transition_to(Received));
        assert!(Open.can_transition_to(Cancelled));
        assert!(!Open.can_transition_to(Open));
        assert!(!Received.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Received));
    }
}
