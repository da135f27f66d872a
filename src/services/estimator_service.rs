// src/services/estimator_service.rs

use std::sync::Arc;

use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        pagination::{PageQuery, Paginated},
    },
    db::{estimator_repo::NewEstimate, CrmRepository, EstimatorRepository},
    models::estimator::{
        price_estimate, priced_lines, proposal_lines_from_estimate, proposal_total, sum_money, AiEstimateOutput,
        AiEstimatePayload, CostBuckets, CreateEstimatePayload, CreateProposalPayload, Estimate, EstimateDetail,
        EstimateMode, EstimateSource, PricedLine, Proposal, ProposalDetail, ProposalStatus,
    },
    services::llm::LlmClient,
};

const SYSTEM_PROMPT: &str = r#"You are an estimator for an HVAC contractor.
Reply with a single JSON object and nothing else, using exactly this shape:
{"title": string, "lineItems": [{"description": string, "quantity": number > 0, "unitPrice": number >= 0}],
 "profitMargin": number 0-100, "taxRate": number 0-100, "notes": string}
Prices are in USD. Include labor as its own line item."#;

/// Converte o texto do modelo no formato esperado, validando cada campo.
pub fn parse_ai_output(raw: &str) -> Result<(Value, AiEstimateOutput), AppError> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|e| AppError::LlmError(format!("Resposta do modelo não é JSON: {}", e)))?;
    let output: AiEstimateOutput = serde_json::from_value(value.clone())
        .map_err(|e| AppError::LlmError(format!("Resposta do modelo fora do formato: {}", e)))?;
    output
        .validate()
        .map_err(|e| AppError::LlmError(format!("Resposta do modelo inválida: {}", e)))?;
    Ok((value, output))
}

#[derive(Clone)]
pub struct EstimatorService {
    repo: EstimatorRepository,
    crm_repo: CrmRepository,
    llm: Arc<dyn LlmClient>,
    pool: PgPool,
}

impl EstimatorService {
    pub fn new(repo: EstimatorRepository, crm_repo: CrmRepository, llm: Arc<dyn LlmClient>, pool: PgPool) -> Self {
        Self {
            repo,
            crm_repo,
            llm,
            pool,
        }
    }

    // =========================================================================
    //  ESTIMATIVAS
    // =========================================================================

    pub async fn create_manual(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        payload: &CreateEstimatePayload,
    ) -> Result<EstimateDetail, AppError> {
        self.ensure_account(tenant_id, payload.account_id).await?;

        let buckets = match payload.mode {
            EstimateMode::CostBuckets => payload.cost_buckets.unwrap_or_default().rounded(),
            EstimateMode::LineItems => CostBuckets::default(),
        };
        let lines = match payload.mode {
            EstimateMode::LineItems => priced_lines(&payload.line_items)?,
            EstimateMode::CostBuckets => Vec::new(),
        };
        let price = price_estimate(payload.mode, &lines, &buckets, payload.profit_margin, payload.tax_rate)?;

        let new = NewEstimate {
            account_id: payload.account_id,
            created_by: user_id,
            title: payload.title.trim(),
            source: EstimateSource::Manual,
            mode: payload.mode,
            buckets,
            profit_margin: payload.profit_margin,
            tax_rate: payload.tax_rate,
            price,
            ai_input: None,
            ai_output: None,
        };
        self.persist(tenant_id, &new, &lines).await
    }

    /// Pede ao modelo, valida a resposta e grava entrada e saída como vieram.
    pub async fn create_with_ai(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        payload: &AiEstimatePayload,
    ) -> Result<EstimateDetail, AppError> {
        self.ensure_account(tenant_id, payload.account_id).await?;

        let mut user_prompt = payload.prompt.trim().to_string();
        if let Some(tax) = payload.tax_rate {
            user_prompt.push_str(&format!("\nUse a tax rate of {}%.", tax));
        }

        let raw = self.llm.complete_json(SYSTEM_PROMPT, &user_prompt).await?;
        let (raw_value, output) = parse_ai_output(&raw)?;

        let tax_rate = payload.tax_rate.unwrap_or(output.tax_rate);
        let lines = priced_lines(&output.line_items)?;
        let price = price_estimate(
            EstimateMode::LineItems,
            &lines,
            &CostBuckets::default(),
            output.profit_margin,
            tax_rate,
        )?;

        let ai_input = json!({ "prompt": payload.prompt, "taxRate": payload.tax_rate });
        let new = NewEstimate {
            account_id: payload.account_id,
            created_by: user_id,
            title: output.title.trim(),
            source: EstimateSource::Ai,
            mode: EstimateMode::LineItems,
            buckets: CostBuckets::default(),
            profit_margin: output.profit_margin,
            tax_rate,
            price,
            ai_input: Some(&ai_input),
            ai_output: Some(&raw_value),
        };
        let detail = self.persist(tenant_id, &new, &lines).await?;

        tracing::info!(%tenant_id, estimate_id = %detail.estimate.id, lines = lines.len(), "Estimativa gerada por IA");
        Ok(detail)
    }

    pub async fn list_estimates(&self, tenant_id: Uuid, query: &PageQuery) -> Result<Paginated<Estimate>, AppError> {
        let search = query.search_pattern();
        let mut tx = self.pool.begin().await?;
        let rows = self
            .repo
            .list_estimates(&mut *tx, tenant_id, search.as_deref(), query.page_size(), query.offset())
            .await?;
        let total = self.repo.count_estimates(&mut *tx, tenant_id, search.as_deref()).await?;
        tx.commit().await?;
        Ok(Paginated::new(rows, total, query))
    }

    pub async fn get_estimate(&self, tenant_id: Uuid, id: Uuid) -> Result<EstimateDetail, AppError> {
        let estimate = self
            .repo
            .find_estimate(&self.pool, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Estimativa"))?;
        let line_items = self.repo.estimate_lines(&self.pool, tenant_id, estimate.id).await?;
        Ok(EstimateDetail { estimate, line_items })
    }

    pub async fn delete_estimate(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let affected = self.repo.delete_estimate(&self.pool, tenant_id, id).await?;
        if affected == 0 {
            return Err(AppError::not_found("Estimativa"));
        }
        Ok(())
    }

    // =========================================================================
    //  PROPOSTAS
    // =========================================================================

    /// Estimativa -> proposta em rascunho, com o mesmo preço final.
    pub async fn convert_to_proposal(&self, tenant_id: Uuid, estimate_id: Uuid) -> Result<ProposalDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let estimate = self
            .repo
            .find_estimate(&mut *tx, tenant_id, estimate_id)
            .await?
            .ok_or_else(|| AppError::not_found("Estimativa"))?;
        let items = self.repo.estimate_lines(&mut *tx, tenant_id, estimate.id).await?;

        let lines = proposal_lines_from_estimate(&estimate, &items);
        let subtotal = sum_money(lines.iter().map(|l| l.line_total))?;
        let total = proposal_total(subtotal, estimate.tax_rate)?;

        let proposal = self
            .repo
            .create_proposal(
                &mut *tx,
                tenant_id,
                estimate.account_id,
                Some(estimate.id),
                &estimate.title,
                subtotal,
                estimate.tax_rate,
                total,
            )
            .await?;
        let line_items = self.repo.insert_proposal_lines(&mut *tx, tenant_id, proposal.id, &lines).await?;
        tx.commit().await?;

        tracing::info!(%tenant_id, %estimate_id, proposal_id = %proposal.id, "Estimativa convertida em proposta");
        Ok(ProposalDetail { proposal, line_items })
    }

    pub async fn create_proposal(
        &self,
        tenant_id: Uuid,
        payload: &CreateProposalPayload,
    ) -> Result<ProposalDetail, AppError> {
        self.ensure_account(tenant_id, payload.account_id).await?;

        let lines: Vec<PricedLine> = priced_lines(&payload.line_items)?;
        let subtotal = sum_money(lines.iter().map(|l| l.line_total))?;
        let total = proposal_total(subtotal, payload.tax_rate)?;

        let mut tx = self.pool.begin().await?;
        let proposal = self
            .repo
            .create_proposal(
                &mut *tx,
                tenant_id,
                payload.account_id,
                None,
                payload.title.trim(),
                subtotal,
                payload.tax_rate,
                total,
            )
            .await?;
        let line_items = self.repo.insert_proposal_lines(&mut *tx, tenant_id, proposal.id, &lines).await?;
        tx.commit().await?;

        Ok(ProposalDetail { proposal, line_items })
    }

    pub async fn list_proposals(&self, tenant_id: Uuid, query: &PageQuery) -> Result<Paginated<Proposal>, AppError> {
        let search = query.search_pattern();
        let mut tx = self.pool.begin().await?;
        let rows = self
            .repo
            .list_proposals(&mut *tx, tenant_id, search.as_deref(), query.page_size(), query.offset())
            .await?;
        let total = self.repo.count_proposals(&mut *tx, tenant_id, search.as_deref()).await?;
        tx.commit().await?;
        Ok(Paginated::new(rows, total, query))
    }

    pub async fn get_proposal(&self, tenant_id: Uuid, id: Uuid) -> Result<ProposalDetail, AppError> {
        let proposal = self
            .repo
            .find_proposal(&self.pool, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Proposta"))?;
        let line_items = self.repo.proposal_lines(&self.pool, tenant_id, proposal.id).await?;
        Ok(ProposalDetail { proposal, line_items })
    }

    pub async fn change_proposal_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        next: ProposalStatus,
    ) -> Result<Proposal, AppError> {
        let mut tx = self.pool.begin().await?;
        let current = self
            .repo
            .find_proposal(&mut *tx, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Proposta"))?;

        if !current.status.can_transition_to(next) {
            return Err(AppError::BadRequest(format!(
                "Transição inválida: {:?} -> {:?}.",
                current.status, next
            )));
        }

        let proposal = self.repo.set_proposal_status(&mut *tx, tenant_id, id, next).await?;
        tx.commit().await?;
        Ok(proposal)
    }

    pub async fn delete_proposal(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let affected = self.repo.delete_proposal(&self.pool, tenant_id, id).await?;
        if affected == 0 {
            return Err(AppError::not_found("Proposta"));
        }
        Ok(())
    }

    // --- auxiliares ---

    async fn persist(
        &self,
        tenant_id: Uuid,
        new: &NewEstimate<'_>,
        lines: &[PricedLine],
    ) -> Result<EstimateDetail, AppError> {
        let mut tx = self.pool.begin().await?;
        let estimate = self.repo.create_estimate(&mut *tx, tenant_id, new).await?;
        let line_items = self.repo.insert_estimate_lines(&mut *tx, tenant_id, estimate.id, lines).await?;
        tx.commit().await?;
        Ok(EstimateDetail { estimate, line_items })
    }

    async fn ensure_account(&self, tenant_id: Uuid, account_id: Option<Uuid>) -> Result<(), AppError> {
        if let Some(account_id) = account_id {
            if !self.crm_repo.account_exists(&self.pool, tenant_id, account_id).await? {
                return Err(AppError::BadRequest("Conta inválida para esta empresa.".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_well_formed_model_output() {
        let raw = r#"{
            "title": "Replace 3-ton split system",
            "lineItems": [
                {"description": "3-ton condenser", "quantity": 1, "unitPrice": 2400},
                {"description": "Labor", "quantity": 8, "unitPrice": 95}
            ],
            "profitMargin": 20,
            "taxRate": 8.25,
            "notes": "Existing ductwork reused"
        }"#;

        let (value, output) = parse_ai_output(raw).unwrap();
        assert_eq!(value["title"], "Replace 3-ton split system");
        assert_eq!(output.line_items.len(), 2);
        assert_eq!(output.profit_margin, dec!(20));
        assert_eq!(output.tax_rate, dec!(8.25));
    }

    #[test]
    fn rejects_non_json_output() {
        assert!(matches!(parse_ai_output("Sure! Here is your estimate"), Err(AppError::LlmError(_))));
    }

    #[test]
    fn rejects_output_with_negative_price() {
        let raw = r#"{"title": "X", "lineItems": [{"description": "Coil", "quantity": 1, "unitPrice": -5}]}"#;
        assert!(matches!(parse_ai_output(raw), Err(AppError::LlmError(_))));
    }

    #[test]
    fn rejects_output_with_amounts_beyond_storage() {
        let raw = r#"{"title": "X", "lineItems": [{"description": "Coil", "quantity": 1e15, "unitPrice": 1e15}]}"#;
        assert!(matches!(parse_ai_output(raw), Err(AppError::LlmError(_))));
    }

    #[test]
    fn rejects_output_without_line_items() {
        let raw = r#"{"title": "X", "lineItems": [], "profitMargin": 10, "taxRate": 5}"#;
        assert!(matches!(parse_ai_output(raw), Err(AppError::LlmError(_))));
    }
}
