// src/models/vendors.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::inventory::validate_unit_cost;

/// Quantas avaliações recentes entram na nota do fornecedor.
pub const RATING_WINDOW: usize = 5;

// --- FORNECEDORES ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Ferguson HVAC Supply")]
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    /// Média das avaliações mais recentes (1..5). Nulo enquanto não houver avaliação.
    pub rating: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(email(message = "E-mail inválido."))]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(url(message = "URL inválida."))]
    pub website: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVendorPayload {
    #[validate(length(min = 1, message = "O nome não pode ser vazio."))]
    pub name: Option<String>,
    #[validate(email(message = "E-mail inválido."))]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(url(message = "URL inválida."))]
    pub website: Option<String>,
    pub is_active: Option<bool>,
}

// --- CONTATOS ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorContact {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub vendor_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "Account manager")]
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorContactPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(email(message = "E-mail inválido."))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
}

// --- ACORDOS DE PREÇO ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceAgreement {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub vendor_id: Uuid,
    pub sku_id: Option<Uuid>,
    pub unit_price: Decimal,
    pub valid_from: NaiveDate,
    pub valid_to: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn validate_agreement_dates(payload: &PriceAgreementPayload) -> Result<(), ValidationError> {
    match payload.valid_to {
        Some(valid_to) if valid_to < payload.valid_from => {
            let mut err = ValidationError::new("valid_to");
            err.message = Some("validTo não pode ser anterior a validFrom.".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_agreement_dates", skip_on_field_errors = false))]
pub struct PriceAgreementPayload {
    pub sku_id: Option<Uuid>,
    #[validate(custom(function = "validate_unit_cost"))]
    #[schema(value_type = f64, example = 18.75)]
    pub unit_price: Decimal,
    pub valid_from: NaiveDate,
    pub valid_to: Option<NaiveDate>,
    pub notes: Option<String>,
}

// --- AVALIAÇÕES ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReview {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub vendor_id: Uuid,
    pub reviewer_id: Option<Uuid>,
    pub score: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReviewPayload {
    #[validate(range(min = 1, max = 5, message = "A nota vai de 1 a 5."))]
    #[schema(example = 4)]
    pub score: i32,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

/// Avaliação gravada + nota recalculada do fornecedor.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub review: PerformanceReview,
    pub vendor_rating: Option<Decimal>,
}

/// Média das notas (as mais recentes primeiro), limitada à janela, com 2 casas.
pub fn rolling_rating(scores_newest_first: &[i32]) -> Option<Decimal> {
    let window: Vec<i32> = scores_newest_first.iter().take(RATING_WINDOW).copied().collect();
    if window.is_empty() {
        return None;
    }
    let sum: i64 = window.iter().map(|s| i64::from(*s)).sum();
    let avg = Decimal::from(sum) / Decimal::from(window.len() as i64);
    Some(avg.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rating_uses_only_the_five_latest_reviews() {
        // a nota 1 mais antiga fica fora da janela
        assert_eq!(rolling_rating(&[5, 5, 4, 4, 5, 1]), Some(dec!(4.6)));
    }

    #[test]
    fn rating_rounds_to_two_places() {
        assert_eq!(rolling_rating(&[5, 4, 4]), Some(dec!(4.33)));
    }

    #[test]
    fn no_reviews_means_no_rating() {
        assert_eq!(rolling_rating(&[]), None);
    }

    #[test]
    fn agreement_cannot_end_before_it_starts() {
        let payload = PriceAgreementPayload {
            sku_id: None,
            unit_price: dec!(10),
            valid_from: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            valid_to: NaiveDate::from_ymd_opt(2025, 5, 31),
            notes: None,
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn review_score_is_bounded() {
        let payload = PerformanceReviewPayload {
            score: 6,
            comment: None,
        };
        assert!(payload.validate().is_err());
    }
}
