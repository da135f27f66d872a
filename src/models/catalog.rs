// src/models/catalog.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::inventory::{validate_hours, validate_money};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "AC-TUNEUP")]
    pub code: String,
    #[schema(example = "A/C seasonal tune-up")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "Maintenance")]
    pub category: Option<String>,
    pub base_price: Decimal,
    pub labor_hours: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntryPayload {
    #[validate(length(min = 1, max = 64, message = "O código é obrigatório."))]
    pub code: String,
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    #[validate(custom(function = "validate_money"))]
    #[schema(value_type = f64, example = 129)]
    pub base_price: Decimal,
    #[serde(default)]
    #[validate(custom(function = "validate_hours"))]
    #[schema(value_type = f64, example = 1.5)]
    pub labor_hours: Decimal,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCatalogEntryPayload {
    #[validate(length(min = 1, max = 64, message = "O código não pode ser vazio."))]
    pub code: Option<String>,
    #[validate(length(min = 1, message = "O nome não pode ser vazio."))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[validate(custom(function = "validate_money"))]
    pub base_price: Option<Decimal>,
    #[validate(custom(function = "validate_hours"))]
    pub labor_hours: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CatalogFilter {
    /// Apenas serviços ativos
    #[serde(default)]
    pub active_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn new_entries_default_to_active() {
        let payload: CatalogEntryPayload =
            serde_json::from_str(r#"{"code":"AC-TUNEUP","name":"Tune-up","basePrice":129}"#).unwrap();
        assert!(payload.is_active);
        assert_eq!(payload.labor_hours, Decimal::ZERO);
        assert_eq!(payload.base_price, dec!(129));
    }

    #[test]
    fn negative_price_is_rejected() {
        let payload = CatalogEntryPayload {
            code: "X".into(),
            name: "X".into(),
            description: None,
            category: None,
            base_price: dec!(-1),
            labor_hours: Decimal::ZERO,
            is_active: true,
        };
        assert!(payload.validate().is_err());
    }
}
