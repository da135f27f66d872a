// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

// ---
// Validação Customizada
// ---
pub fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor deve ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

/// Recusa valores que, arredondados para `scale` casas, não cabem em
/// `NUMERIC(precision, scale)`.
fn validate_fits_numeric(val: &Decimal, precision: u32, scale: u32) -> Result<(), ValidationError> {
    let limit = Decimal::from(10i64.pow(precision - scale));
    let rounded = val.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    if rounded.abs() >= limit {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor excede o limite suportado.".into());
        return Err(err);
    }
    Ok(())
}

/// Quantidades de estoque, compra e itens: NUMERIC(14, 4), maiores que zero.
pub fn validate_quantity(val: &Decimal) -> Result<(), ValidationError> {
    validate_positive(val)?;
    validate_fits_numeric(val, 14, 4)
}

/// Custos unitários de SKU, compra e acordo de preço: NUMERIC(14, 4).
pub fn validate_unit_cost(val: &Decimal) -> Result<(), ValidationError> {
    validate_not_negative(val)?;
    validate_fits_numeric(val, 14, 4)
}

/// Valores monetários de estimativas, propostas e catálogo: NUMERIC(14, 2).
pub fn validate_money(val: &Decimal) -> Result<(), ValidationError> {
    validate_not_negative(val)?;
    validate_fits_numeric(val, 14, 2)
}

/// Horas de mão de obra do catálogo: NUMERIC(8, 2).
pub fn validate_hours(val: &Decimal) -> Result<(), ValidationError> {
    validate_not_negative(val)?;
    validate_fits_numeric(val, 8, 2)
}

// --- 1. Armazéns e Posições ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Main Depot")]
    pub name: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WarehousePayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Bin {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub warehouse_id: Uuid,
    #[schema(example = "A-01-03")]
    pub code: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWarehousePayload {
    #[validate(length(min = 1, message = "O nome não pode ser vazio."))]
    pub name: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BinPayload {
    pub warehouse_id: Uuid,
    #[validate(length(min = 1, message = "O código é obrigatório."))]
    pub code: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBinPayload {
    #[validate(length(min = 1, message = "O código não pode ser vazio."))]
    pub code: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BinFilter {
    pub warehouse_id: Option<Uuid>,
}

// --- 2. SKUs (o "catálogo" de peças) ---
// O saldo NÃO fica aqui: é derivado do livro-razão.

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sku {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "CAP-45-5")]
    pub code: String,
    #[schema(example = "Dual run capacitor 45/5 MFD")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "EA")]
    pub unit: String,
    pub unit_cost: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// SKU + saldo calculado + última posição conhecida.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkuWithStock {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub sku: Sku,
    pub on_hand: Decimal,
    pub latest_bin_id: Option<Uuid>,
    pub latest_bin_code: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkuPayload {
    #[validate(length(min = 1, max = 64, message = "O código é obrigatório."))]
    pub code: String,
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub description: Option<String>,
    pub unit: Option<String>,
    #[validate(custom(function = "validate_unit_cost"))]
    pub unit_cost: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSkuPayload {
    #[validate(length(min = 1, message = "O nome não pode ser vazio."))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    #[validate(custom(function = "validate_unit_cost"))]
    pub unit_cost: Option<Decimal>,
}

// --- 3. Livro-razão de estoque ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "ledger_direction", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerDirection {
    In,
    Out,
}

impl LedgerDirection {
    /// Quantidade com sinal: IN soma, OUT subtrai.
    pub fn signed(self, quantity: Decimal) -> Decimal {
        match self {
            LedgerDirection::In => quantity,
            LedgerDirection::Out => -quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockLedgerEntry {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub sku_id: Uuid,
    pub bin_id: Uuid,
    pub direction: LedgerDirection,
    pub quantity: Decimal,
    pub reference: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostLedgerPayload {
    pub sku_id: Uuid,
    pub bin_id: Uuid,
    pub direction: LedgerDirection,
    #[validate(custom(function = "validate_quantity"))]
    #[schema(value_type = f64, example = 10)]
    pub quantity: Decimal,
    #[validate(length(max = 255, message = "A referência é longa demais."))]
    #[schema(example = "WO-1042")]
    pub reference: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LedgerFilter {
    pub sku_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OnHand {
    pub sku_id: Uuid,
    pub on_hand: Decimal,
}

/// Saldo = Σ IN − Σ OUT.
pub fn on_hand<'a, I>(entries: I) -> Decimal
where
    I: IntoIterator<Item = &'a StockLedgerEntry>,
{
    entries
        .into_iter()
        .map(|e| e.direction.signed(e.quantity))
        .sum()
}

// --- 4. Previsão de demanda ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub sku_id: Uuid,
    pub avg_daily_demand: Decimal,
    pub lead_time_days: i32,
    pub safety_factor: Decimal,
    pub reorder_point: Decimal,
    pub suggested_order_qty: Decimal,
    pub computed_at: DateTime<Utc>,
}

/// Linha do livro-razão reduzida ao que a previsão precisa.
#[derive(Debug, Clone, FromRow)]
pub struct DemandSample {
    pub sku_id: Uuid,
    pub direction: LedgerDirection,
    pub quantity: Decimal,
}

/// SKU abaixo (ou no) ponto de pedido.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LowStockEntry {
    pub sku_id: Uuid,
    pub code: String,
    pub name: String,
    pub on_hand: Decimal,
    pub reorder_point: Decimal,
    pub suggested_order_qty: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(direction: LedgerDirection, quantity: Decimal) -> StockLedgerEntry {
        StockLedgerEntry {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            sku_id: Uuid::nil(),
            bin_id: Uuid::nil(),
            direction,
            quantity,
            reference: None,
            created_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn in_ten_then_out_three_leaves_seven() {
        let rows = vec![entry(LedgerDirection::In, dec!(10)), entry(LedgerDirection::Out, dec!(3))];
        assert_eq!(on_hand(&rows), dec!(7));
    }

    #[test]
    fn empty_ledger_has_zero_on_hand() {
        assert_eq!(on_hand(&Vec::<StockLedgerEntry>::new()), Decimal::ZERO);
    }

    #[test]
    fn on_hand_may_go_negative() {
        let rows = vec![entry(LedgerDirection::Out, dec!(2.5))];
        assert_eq!(on_hand(&rows), dec!(-2.5));
    }

    #[test]
    fn ledger_payload_requires_positive_quantity() {
        let payload = PostLedgerPayload {
            sku_id: Uuid::new_v4(),
            bin_id: Uuid::new_v4(),
            direction: LedgerDirection::Out,
            quantity: Decimal::ZERO,
            reference: None,
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn ledger_payload_rejects_quantity_beyond_column() {
        let payload = PostLedgerPayload {
            sku_id: Uuid::new_v4(),
            bin_id: Uuid::new_v4(),
            direction: LedgerDirection::In,
            quantity: dec!(10000000000000),
            reference: None,
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("quantity"));
    }

    #[test]
    fn numeric_bounds_follow_column_scale() {
        assert!(validate_quantity(&dec!(9999999999.9999)).is_ok());
        // arredonda para 10000000000.0000 no banco
        assert!(validate_quantity(&dec!(9999999999.99999)).is_err());
        assert!(validate_money(&dec!(999999999999.99)).is_ok());
        assert!(validate_money(&dec!(1000000000000)).is_err());
        assert!(validate_unit_cost(&dec!(-0.01)).is_err());
        assert!(validate_hours(&dec!(1000000)).is_err());
    }
}
