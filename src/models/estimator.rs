// src/models/estimator.rs

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    models::inventory::{validate_money, validate_quantity},
};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Arredonda como o NUMERIC do Postgres (meio para longe do zero).
pub fn round_to(val: Decimal, scale: u32) -> Decimal {
    val.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

fn validate_percentage(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() || *val > HUNDRED {
        let mut err = ValidationError::new("range");
        err.message = Some("O percentual deve estar entre 0 e 100.".into());
        return Err(err);
    }
    Ok(())
}

// --- ENUMS ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "estimate_mode", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstimateMode {
    LineItems,
    CostBuckets,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "estimate_source", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstimateSource {
    Manual,
    Ai,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "proposal_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalStatus {
    Draft,
    Sent,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    pub fn can_transition_to(self, next: ProposalStatus) -> bool {
        use ProposalStatus::*;
        matches!(
            (self, next),
            (Draft, Sent) | (Sent, Accepted) | (Sent, Rejected) | (Rejected, Draft)
        )
    }
}

// --- ESTIMATES ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub account_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub title: String,
    pub source: EstimateSource,
    pub mode: EstimateMode,
    pub labor_cost: Decimal,
    pub materials_cost: Decimal,
    pub permits_cost: Decimal,
    pub overhead_cost: Decimal,
    pub profit_margin: Decimal,
    pub tax_rate: Decimal,
    pub subtotal: Decimal,
    pub subtotal_with_profit: Decimal,
    pub final_price: Decimal,
    /// Entrada enviada ao modelo (apenas estimativas de IA), guardada sem alteração.
    pub ai_input: Option<Value>,
    /// Resposta do modelo, guardada sem alteração.
    pub ai_output: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EstimateLineItem {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub estimate_id: Uuid,
    pub position: i32,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EstimateDetail {
    #[serde(flatten)]
    pub estimate: Estimate,
    pub line_items: Vec<EstimateLineItem>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    #[validate(length(min = 1, max = 500, message = "A descrição é obrigatória."))]
    #[schema(example = "3-ton condenser, 16 SEER")]
    pub description: String,
    #[validate(custom(function = "validate_quantity"))]
    pub quantity: Decimal,
    #[validate(custom(function = "validate_money"))]
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostBuckets {
    #[serde(default)]
    #[validate(custom(function = "validate_money"))]
    pub labor: Decimal,
    #[serde(default)]
    #[validate(custom(function = "validate_money"))]
    pub materials: Decimal,
    #[serde(default)]
    #[validate(custom(function = "validate_money"))]
    pub permits: Decimal,
    #[serde(default)]
    #[validate(custom(function = "validate_money"))]
    pub overhead: Decimal,
}

impl CostBuckets {
    /// Cada balde na escala da coluna (2 casas).
    pub fn rounded(&self) -> Self {
        Self {
            labor: round_to(self.labor, 2),
            materials: round_to(self.materials, 2),
            permits: round_to(self.permits, 2),
            overhead: round_to(self.overhead, 2),
        }
    }

    pub fn total(&self) -> Result<Decimal, AppError> {
        sum_money([self.labor, self.materials, self.permits, self.overhead])
    }
}

fn validate_manual_estimate(payload: &CreateEstimatePayload) -> Result<(), ValidationError> {
    match payload.mode {
        EstimateMode::LineItems if payload.line_items.is_empty() => {
            let mut err = ValidationError::new("line_items");
            err.message = Some("O modo LINE_ITEMS exige ao menos um item.".into());
            Err(err)
        }
        EstimateMode::CostBuckets if payload.cost_buckets.is_none() => {
            let mut err = ValidationError::new("cost_buckets");
            err.message = Some("O modo COST_BUCKETS exige costBuckets.".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_manual_estimate", skip_on_field_errors = false))]
pub struct CreateEstimatePayload {
    #[validate(length(min = 1, max = 200, message = "O título é obrigatório."))]
    pub title: String,
    pub account_id: Option<Uuid>,
    pub mode: EstimateMode,
    #[serde(default)]
    #[validate(nested)]
    pub line_items: Vec<LineItemInput>,
    #[validate(nested)]
    pub cost_buckets: Option<CostBuckets>,
    #[serde(default)]
    #[validate(custom(function = "validate_percentage"))]
    #[schema(example = 20)]
    pub profit_margin: Decimal,
    #[serde(default)]
    #[validate(custom(function = "validate_percentage"))]
    #[schema(example = 8.25)]
    pub tax_rate: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AiEstimatePayload {
    #[validate(length(min = 10, max = 4000, message = "Descreva o serviço com pelo menos 10 caracteres."))]
    #[schema(example = "Replace a 3-ton split system in a 1,800 sq ft single-story home, existing ductwork OK")]
    pub prompt: String,
    pub account_id: Option<Uuid>,
    /// Impostos locais que o modelo deve considerar, se o usuário souber.
    #[validate(custom(function = "validate_percentage"))]
    pub tax_rate: Option<Decimal>,
}

/// Formato exigido da resposta do modelo.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AiEstimateOutput {
    #[validate(length(min = 1, max = 200, message = "title ausente"))]
    pub title: String,
    #[validate(length(min = 1, message = "lineItems vazio"), nested)]
    pub line_items: Vec<LineItemInput>,
    #[serde(default)]
    #[validate(custom(function = "validate_percentage"))]
    pub profit_margin: Decimal,
    #[serde(default)]
    #[validate(custom(function = "validate_percentage"))]
    pub tax_rate: Decimal,
    pub notes: Option<String>,
}

// --- CÁLCULO ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub subtotal: Decimal,
    pub subtotal_with_profit: Decimal,
    pub final_price: Decimal,
}

fn amount_too_large() -> AppError {
    AppError::BadRequest("O valor calculado excede o limite suportado.".to_string())
}

/// Valores monetários são gravados em NUMERIC(14, 2).
fn fits_money(val: Decimal) -> Result<Decimal, AppError> {
    if val.abs() >= Decimal::from(1_000_000_000_000i64) {
        return Err(amount_too_large());
    }
    Ok(val)
}

fn scale_by_percentage(val: Decimal, percentage: Decimal) -> Result<Decimal, AppError> {
    let factor = Decimal::ONE
        .checked_add(percentage / HUNDRED)
        .ok_or_else(amount_too_large)?;
    let scaled = val.checked_mul(factor).ok_or_else(amount_too_large)?;
    fits_money(round_to(scaled, 2))
}

pub fn line_total(quantity: Decimal, unit_price: Decimal) -> Result<Decimal, AppError> {
    let total = quantity.checked_mul(unit_price).ok_or_else(amount_too_large)?;
    fits_money(round_to(total, 2))
}

pub fn sum_money<I>(values: I) -> Result<Decimal, AppError>
where
    I: IntoIterator<Item = Decimal>,
{
    let total = values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
        .ok_or_else(amount_too_large)?;
    fits_money(total)
}

/// Margem e imposto aplicados em sequência:
/// subtotal × (1 + margem%) × (1 + imposto%).
pub fn apply_markups(subtotal: Decimal, profit_margin: Decimal, tax_rate: Decimal) -> Result<PriceBreakdown, AppError> {
    let subtotal = fits_money(round_to(subtotal, 2))?;
    let subtotal_with_profit = scale_by_percentage(subtotal, profit_margin)?;
    let final_price = scale_by_percentage(subtotal_with_profit, tax_rate)?;
    Ok(PriceBreakdown {
        subtotal,
        subtotal_with_profit,
        final_price,
    })
}

/// `lines` são as linhas já precificadas por `priced_lines` (modo LINE_ITEMS);
/// `buckets` já vêm arredondados (modo COST_BUCKETS).
pub fn price_estimate(
    mode: EstimateMode,
    lines: &[PricedLine],
    buckets: &CostBuckets,
    profit_margin: Decimal,
    tax_rate: Decimal,
) -> Result<PriceBreakdown, AppError> {
    let subtotal = match mode {
        EstimateMode::LineItems => sum_money(lines.iter().map(|l| l.line_total))?,
        EstimateMode::CostBuckets => buckets.total()?,
    };
    apply_markups(subtotal, profit_margin, tax_rate)
}

// --- PROPOSALS ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub account_id: Option<Uuid>,
    pub estimate_id: Option<Uuid>,
    pub title: String,
    pub status: ProposalStatus,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProposalLineItem {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub proposal_id: Uuid,
    pub position: i32,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProposalDetail {
    #[serde(flatten)]
    pub proposal: Proposal,
    pub line_items: Vec<ProposalLineItem>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProposalPayload {
    #[validate(length(min = 1, max = 200, message = "O título é obrigatório."))]
    pub title: String,
    pub account_id: Option<Uuid>,
    #[validate(length(min = 1, message = "A proposta precisa de ao menos um item."), nested)]
    pub line_items: Vec<LineItemInput>,
    #[serde(default)]
    #[validate(custom(function = "validate_percentage"))]
    pub tax_rate: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProposalStatusPayload {
    pub status: ProposalStatus,
}

/// Linha já precificada, pronta para virar item de proposta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Linhas da proposta derivadas de uma estimativa.
/// Os itens são copiados como estão; estimativas por "baldes" viram uma linha por balde
/// não-zero; a margem de lucro vira uma linha própria, para que o total da proposta
/// bata com o preço final da estimativa.
pub fn proposal_lines_from_estimate(estimate: &Estimate, items: &[EstimateLineItem]) -> Vec<PricedLine> {
    let mut lines: Vec<PricedLine> = match estimate.mode {
        EstimateMode::LineItems => items
            .iter()
            .map(|li| PricedLine {
                description: li.description.clone(),
                quantity: li.quantity,
                unit_price: li.unit_price,
                line_total: li.line_total,
            })
            .collect(),
        EstimateMode::CostBuckets => [
            ("Labor", estimate.labor_cost),
            ("Materials", estimate.materials_cost),
            ("Permits", estimate.permits_cost),
            ("Overhead", estimate.overhead_cost),
        ]
        .into_iter()
        .filter(|(_, amount)| !amount.is_zero())
        .map(|(label, amount)| PricedLine {
            description: label.to_string(),
            quantity: Decimal::ONE,
            unit_price: amount,
            line_total: amount,
        })
        .collect(),
    };

    let markup = estimate.subtotal_with_profit - estimate.subtotal;
    if markup > Decimal::ZERO {
        lines.push(PricedLine {
            description: "Project management & warranty".to_string(),
            quantity: Decimal::ONE,
            unit_price: markup,
            line_total: markup,
        });
    }
    lines
}

/// Itens informados pelo usuário (ou pelo modelo), com o total de cada linha.
/// Quantidade e preço são levados à escala das colunas (4 e 2 casas) antes do
/// cálculo, para que `quantity × unitPrice = lineTotal` valha também no que é gravado.
pub fn priced_lines(items: &[LineItemInput]) -> Result<Vec<PricedLine>, AppError> {
    items
        .iter()
        .map(|li| {
            let quantity = round_to(li.quantity, 4);
            let unit_price = round_to(li.unit_price, 2);
            Ok(PricedLine {
                description: li.description.trim().to_string(),
                quantity,
                unit_price,
                line_total: line_total(quantity, unit_price)?,
            })
        })
        .collect()
}

pub fn proposal_total(subtotal: Decimal, tax_rate: Decimal) -> Result<Decimal, AppError> {
    scale_by_percentage(subtotal, tax_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(description: &str, quantity: Decimal, unit_price: Decimal) -> LineItemInput {
        LineItemInput {
            description: description.into(),
            quantity,
            unit_price,
        }
    }

    #[test]
    fn line_item_mode_sums_quantity_times_price() {
        let items = vec![item("Condenser", dec!(1), dec!(2400)), item("Line set", dec!(25), dec!(12.50))];
        let lines = priced_lines(&items).unwrap();
        let price = price_estimate(
            EstimateMode::LineItems,
            &lines,
            &CostBuckets::default(),
            dec!(0),
            dec!(0),
        )
        .unwrap();
        assert_eq!(price.subtotal, dec!(2712.50));
        assert_eq!(price.final_price, dec!(2712.50));
    }

    #[test]
    fn bucket_mode_sums_four_buckets() {
        let buckets = CostBuckets {
            labor: dec!(800),
            materials: dec!(1500),
            permits: dec!(150),
            overhead: dec!(50),
        };
        let price = price_estimate(EstimateMode::CostBuckets, &[], &buckets, dec!(0), dec!(0)).unwrap();
        assert_eq!(price.subtotal, dec!(2500));
    }

    #[test]
    fn margin_then_tax_are_sequential_markups() {
        let price = apply_markups(dec!(1000), dec!(20), dec!(10)).unwrap();
        assert_eq!(price.subtotal_with_profit, dec!(1200));
        // 1200 × 1.10, não 1000 × 1.30
        assert_eq!(price.final_price, dec!(1320));
    }

    #[test]
    fn manual_payload_requires_items_for_line_mode() {
        let payload = CreateEstimatePayload {
            title: "Tune-up".into(),
            account_id: None,
            mode: EstimateMode::LineItems,
            line_items: vec![],
            cost_buckets: None,
            profit_margin: dec!(0),
            tax_rate: dec!(0),
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn rejects_margin_above_one_hundred_percent() {
        let payload = CreateEstimatePayload {
            title: "Tune-up".into(),
            account_id: None,
            mode: EstimateMode::CostBuckets,
            line_items: vec![],
            cost_buckets: Some(CostBuckets::default()),
            profit_margin: dec!(150),
            tax_rate: dec!(0),
        };
        assert!(payload.validate().is_err());
    }

    fn estimate_from(price: PriceBreakdown, mode: EstimateMode, margin: Decimal, tax: Decimal) -> Estimate {
        Estimate {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            account_id: None,
            created_by: None,
            title: "Split system".into(),
            source: EstimateSource::Manual,
            mode,
            labor_cost: dec!(800),
            materials_cost: dec!(1500),
            permits_cost: dec!(0),
            overhead_cost: dec!(200),
            profit_margin: margin,
            tax_rate: tax,
            subtotal: price.subtotal,
            subtotal_with_profit: price.subtotal_with_profit,
            final_price: price.final_price,
            ai_input: None,
            ai_output: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn converted_proposal_keeps_the_estimate_price() {
        let inputs = vec![item("Condenser", dec!(1), dec!(2400)), item("Line set", dec!(25), dec!(12.50))];
        let priced = priced_lines(&inputs).unwrap();
        let price =
            price_estimate(EstimateMode::LineItems, &priced, &CostBuckets::default(), dec!(15), dec!(8.25)).unwrap();
        let estimate = estimate_from(price, EstimateMode::LineItems, dec!(15), dec!(8.25));

        let stored: Vec<EstimateLineItem> = priced
            .into_iter()
            .enumerate()
            .map(|(idx, line)| EstimateLineItem {
                id: Uuid::new_v4(),
                tenant_id: estimate.tenant_id,
                estimate_id: estimate.id,
                position: idx as i32 + 1,
                description: line.description,
                quantity: line.quantity,
                unit_price: line.unit_price,
                line_total: line.line_total,
            })
            .collect();

        let lines = proposal_lines_from_estimate(&estimate, &stored);
        assert_eq!(lines[0].line_total, dec!(2400));
        assert_eq!(lines[1].unit_price, dec!(12.50));

        let subtotal: Decimal = lines.iter().map(|l| l.line_total).sum();
        assert_eq!(subtotal, estimate.subtotal_with_profit);
        assert_eq!(proposal_total(subtotal, estimate.tax_rate).unwrap(), estimate.final_price);
    }

    #[test]
    fn bucket_estimates_become_one_line_per_bucket() {
        let buckets = CostBuckets {
            labor: dec!(800),
            materials: dec!(1500),
            permits: dec!(0),
            overhead: dec!(200),
        };
        let price = price_estimate(EstimateMode::CostBuckets, &[], &buckets, dec!(0), dec!(0)).unwrap();
        let estimate = estimate_from(price, EstimateMode::CostBuckets, dec!(0), dec!(0));

        let lines = proposal_lines_from_estimate(&estimate, &[]);
        let labels: Vec<&str> = lines.iter().map(|l| l.description.as_str()).collect();
        assert_eq!(labels, vec!["Labor", "Materials", "Overhead"]);
    }

    #[test]
    fn proposal_transitions() {
        use ProposalStatus::*;
        assert!(Draft.can_transition_to(Sent));
        assert!(Sent.can_transition_to(Accepted));
        assert!(!Draft.can_transition_to(Accepted));
        assert!(!Accepted.can_transition_to(Draft));
    }

    #[test]
    fn line_total_overflow_is_a_bad_request() {
        let huge = Decimal::MAX;
        assert!(matches!(line_total(huge, dec!(2)), Err(AppError::BadRequest(_))));
        // cabe em Decimal mas não em NUMERIC(14, 2)
        assert!(matches!(
            line_total(dec!(9999999999), dec!(999999999999)),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn oversized_line_items_fail_validation() {
        let payload = CreateProposalPayload {
            title: "Rooftop unit".into(),
            account_id: None,
            line_items: vec![item("RTU", dec!(1000000000000000), dec!(1000000000000000))],
            tax_rate: dec!(0),
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.errors().contains_key("line_items"));
    }

    #[test]
    fn subtotal_beyond_column_limit_is_rejected() {
        let items: Vec<LineItemInput> = (0..3)
            .map(|_| item("Chiller", dec!(1), dec!(400000000000)))
            .collect();
        let lines = priced_lines(&items).unwrap();
        let price = price_estimate(EstimateMode::LineItems, &lines, &CostBuckets::default(), dec!(0), dec!(0));
        assert!(matches!(price, Err(AppError::BadRequest(_))));

        let near_limit = apply_markups(dec!(900000000000), dec!(50), dec!(0));
        assert!(matches!(near_limit, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn priced_lines_use_the_stored_precision() {
        let items = vec![item("Refrigerant (oz)", dec!(100), dec!(0.125)), item("Fitting", dec!(2.00004), dec!(10))];
        let lines = priced_lines(&items).unwrap();

        assert_eq!(lines[0].unit_price, dec!(0.13));
        assert_eq!(lines[0].line_total, dec!(13.00));
        assert_eq!(lines[1].quantity, dec!(2.0000));
        for line in &lines {
            assert_eq!(round_to(line.quantity * line.unit_price, 2), line.line_total);
        }
    }

    #[test]
    fn converted_lines_keep_quantity_times_price() {
        let inputs = vec![item("Refrigerant (oz)", dec!(100), dec!(0.125))];
        let priced = priced_lines(&inputs).unwrap();
        let price =
            price_estimate(EstimateMode::LineItems, &priced, &CostBuckets::default(), dec!(0), dec!(0)).unwrap();
        let estimate = estimate_from(price, EstimateMode::LineItems, dec!(0), dec!(0));
        let stored: Vec<EstimateLineItem> = priced
            .into_iter()
            .enumerate()
            .map(|(idx, line)| EstimateLineItem {
                id: Uuid::new_v4(),
                tenant_id: estimate.tenant_id,
                estimate_id: estimate.id,
                position: idx as i32 + 1,
                description: line.description,
                quantity: line.quantity,
                unit_price: line.unit_price,
                line_total: line.line_total,
            })
            .collect();

        let lines = proposal_lines_from_estimate(&estimate, &stored);
        assert_eq!(lines[0].quantity * lines[0].unit_price, lines[0].line_total);
        assert_eq!(estimate.subtotal, dec!(13.00));
    }
}
