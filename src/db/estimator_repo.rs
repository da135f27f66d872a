// src/db/estimator_repo.rs

use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::estimator::{
        CostBuckets, Estimate, EstimateLineItem, EstimateMode, EstimateSource, PriceBreakdown, PricedLine,
        Proposal, ProposalLineItem, ProposalStatus,
    },
};

/// Dados de cabeçalho de uma estimativa nova.
pub struct NewEstimate<'a> {
    pub account_id: Option<Uuid>,
    pub created_by: Uuid,
    pub title: &'a str,
    pub source: EstimateSource,
    pub mode: EstimateMode,
    pub buckets: CostBuckets,
    pub profit_margin: Decimal,
    pub tax_rate: Decimal,
    pub price: PriceBreakdown,
    pub ai_input: Option<&'a Value>,
    pub ai_output: Option<&'a Value>,
}

// Colunas em paralelo para o INSERT ... SELECT unnest(...)
struct LineColumns {
    positions: Vec<i32>,
    descriptions: Vec<String>,
    quantities: Vec<Decimal>,
    unit_prices: Vec<Decimal>,
    totals: Vec<Decimal>,
}

impl LineColumns {
    fn from_lines(lines: &[PricedLine]) -> Self {
        let mut cols = LineColumns {
            positions: Vec::with_capacity(lines.len()),
            descriptions: Vec::with_capacity(lines.len()),
            quantities: Vec::with_capacity(lines.len()),
            unit_prices: Vec::with_capacity(lines.len()),
            totals: Vec::with_capacity(lines.len()),
        };
        for (idx, line) in lines.iter().enumerate() {
            cols.positions.push(idx as i32 + 1);
            cols.descriptions.push(line.description.clone());
            cols.quantities.push(line.quantity);
            cols.unit_prices.push(line.unit_price);
            cols.totals.push(line.line_total);
        }
        cols
    }
}

#[derive(Clone)]
pub struct EstimatorRepository {
    #[allow(dead_code)]
    pool: PgPool,
}

impl EstimatorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  ESTIMATIVAS
    // =========================================================================

    pub async fn create_estimate<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        new: &NewEstimate<'_>,
    ) -> Result<Estimate, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let estimate = sqlx::query_as::<_, Estimate>(
            r#"
            INSERT INTO estimates (
                tenant_id, account_id, created_by, title, source, mode,
                labor_cost, materials_cost, permits_cost, overhead_cost,
                profit_margin, tax_rate, subtotal, subtotal_with_profit, final_price,
                ai_input, ai_output
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(new.account_id)
        .bind(new.created_by)
        .bind(new.title)
        .bind(new.source)
        .bind(new.mode)
        .bind(new.buckets.labor)
        .bind(new.buckets.materials)
        .bind(new.buckets.permits)
        .bind(new.buckets.overhead)
        .bind(new.profit_margin)
        .bind(new.tax_rate)
        .bind(new.price.subtotal)
        .bind(new.price.subtotal_with_profit)
        .bind(new.price.final_price)
        .bind(new.ai_input)
        .bind(new.ai_output)
        .fetch_one(executor)
        .await?;
        Ok(estimate)
    }

    pub async fn insert_estimate_lines<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        estimate_id: Uuid,
        lines: &[PricedLine],
    ) -> Result<Vec<EstimateLineItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if lines.is_empty() {
            return Ok(Vec::new());
        }
        let cols = LineColumns::from_lines(lines);
        let items = sqlx::query_as::<_, EstimateLineItem>(
            r#"
            INSERT INTO estimate_line_items (
                tenant_id, estimate_id, position, description, quantity, unit_price, line_total
            )
            SELECT $1, $2, * FROM unnest($3::int4[], $4::text[], $5::numeric[], $6::numeric[], $7::numeric[])
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(estimate_id)
        .bind(&cols.positions)
        .bind(&cols.descriptions)
        .bind(&cols.quantities)
        .bind(&cols.unit_prices)
        .bind(&cols.totals)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn list_estimates<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Estimate>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, Estimate>(
            r#"
            SELECT * FROM estimates
            WHERE tenant_id = $1 AND ($2::text IS NULL OR title ILIKE $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(tenant_id)
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn count_estimates<'e, E>(&self, executor: E, tenant_id: Uuid, search: Option<&str>) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM estimates WHERE tenant_id = $1 AND ($2::text IS NULL OR title ILIKE $2)")
                .bind(tenant_id)
                .bind(search)
                .fetch_one(executor)
                .await?;
        Ok(total)
    }

    pub async fn find_estimate<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<Estimate>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let estimate = sqlx::query_as::<_, Estimate>("SELECT * FROM estimates WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;
        Ok(estimate)
    }

    pub async fn estimate_lines<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        estimate_id: Uuid,
    ) -> Result<Vec<EstimateLineItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, EstimateLineItem>(
            "SELECT * FROM estimate_line_items WHERE estimate_id = $1 AND tenant_id = $2 ORDER BY position ASC",
        )
        .bind(estimate_id)
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn delete_estimate<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM estimates WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    //  PROPOSTAS
    // =========================================================================

    pub async fn create_proposal<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        account_id: Option<Uuid>,
        estimate_id: Option<Uuid>,
        title: &str,
        subtotal: Decimal,
        tax_rate: Decimal,
        total: Decimal,
    ) -> Result<Proposal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let proposal = sqlx::query_as::<_, Proposal>(
            r#"
            INSERT INTO proposals (tenant_id, account_id, estimate_id, title, subtotal, tax_rate, total)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(account_id)
        .bind(estimate_id)
        .bind(title)
        .bind(subtotal)
        .bind(tax_rate)
        .bind(total)
        .fetch_one(executor)
        .await?;
        Ok(proposal)
    }

    pub async fn insert_proposal_lines<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        proposal_id: Uuid,
        lines: &[PricedLine],
    ) -> Result<Vec<ProposalLineItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if lines.is_empty() {
            return Ok(Vec::new());
        }
        let cols = LineColumns::from_lines(lines);
        let items = sqlx::query_as::<_, ProposalLineItem>(
            r#"
            INSERT INTO proposal_line_items (
                tenant_id, proposal_id, position, description, quantity, unit_price, line_total
            )
            SELECT $1, $2, * FROM unnest($3::int4[], $4::text[], $5::numeric[], $6::numeric[], $7::numeric[])
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(proposal_id)
        .bind(&cols.positions)
        .bind(&cols.descriptions)
        .bind(&cols.quantities)
        .bind(&cols.unit_prices)
        .bind(&cols.totals)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn list_proposals<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Proposal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, Proposal>(
            r#"
            SELECT * FROM proposals
            WHERE tenant_id = $1 AND ($2::text IS NULL OR title ILIKE $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(tenant_id)
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn count_proposals<'e, E>(&self, executor: E, tenant_id: Uuid, search: Option<&str>) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM proposals WHERE tenant_id = $1 AND ($2::text IS NULL OR title ILIKE $2)")
                .bind(tenant_id)
                .bind(search)
                .fetch_one(executor)
                .await?;
        Ok(total)
    }

    pub async fn find_proposal<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<Proposal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let proposal = sqlx::query_as::<_, Proposal>("SELECT * FROM proposals WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;
        Ok(proposal)
    }

    pub async fn proposal_lines<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        proposal_id: Uuid,
    ) -> Result<Vec<ProposalLineItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, ProposalLineItem>(
            "SELECT * FROM proposal_line_items WHERE proposal_id = $1 AND tenant_id = $2 ORDER BY position ASC",
        )
        .bind(proposal_id)
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn set_proposal_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        status: ProposalStatus,
    ) -> Result<Proposal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let proposal = sqlx::query_as::<_, Proposal>(
            "UPDATE proposals SET status = $3, updated_at = NOW() WHERE id = $1 AND tenant_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(status)
        .fetch_one(executor)
        .await?;
        Ok(proposal)
    }

    pub async fn delete_proposal<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM proposals WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
