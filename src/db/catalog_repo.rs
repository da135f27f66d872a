// src/db/catalog_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::catalog::{CatalogEntry, CatalogEntryPayload, UpdateCatalogEntryPayload},
};

const DUPLICATE_CODE: &str = "Já existe um serviço com este código.";

#[derive(Clone)]
pub struct CatalogRepository {
    #[allow(dead_code)]
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payload: &CatalogEntryPayload,
    ) -> Result<CatalogEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, CatalogEntry>(
            r#"
            INSERT INTO service_catalog_entries (
                tenant_id, code, name, description, category, base_price, labor_hours, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&payload.code)
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(&payload.category)
        .bind(payload.base_price)
        .bind(payload.labor_hours)
        .bind(payload.is_active)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_db(e, DUPLICATE_CODE))
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        active_only: bool,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CatalogEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entries = sqlx::query_as::<_, CatalogEntry>(
            r#"
            SELECT * FROM service_catalog_entries
            WHERE tenant_id = $1
              AND (NOT $2 OR is_active)
              AND ($3::text IS NULL OR code ILIKE $3 OR name ILIKE $3 OR category ILIKE $3)
            ORDER BY category ASC NULLS LAST, name ASC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(tenant_id)
        .bind(active_only)
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;
        Ok(entries)
    }

    pub async fn count<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        active_only: bool,
        search: Option<&str>,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM service_catalog_entries
            WHERE tenant_id = $1
              AND (NOT $2 OR is_active)
              AND ($3::text IS NULL OR code ILIKE $3 OR name ILIKE $3 OR category ILIKE $3)
            "#,
        )
        .bind(tenant_id)
        .bind(active_only)
        .bind(search)
        .fetch_one(executor)
        .await?;
        Ok(total)
    }

    pub async fn find<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<CatalogEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entry = sqlx::query_as::<_, CatalogEntry>(
            "SELECT * FROM service_catalog_entries WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(entry)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        payload: &UpdateCatalogEntryPayload,
    ) -> Result<Option<CatalogEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, CatalogEntry>(
            r#"
            UPDATE service_catalog_entries SET
                code = COALESCE($3, code),
                name = COALESCE($4, name),
                description = COALESCE($5, description),
                category = COALESCE($6, category),
                base_price = COALESCE($7, base_price),
                labor_hours = COALESCE($8, labor_hours),
                is_active = COALESCE($9, is_active),
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(&payload.code)
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(&payload.category)
        .bind(payload.base_price)
        .bind(payload.labor_hours)
        .bind(payload.is_active)
        .fetch_optional(executor)
        .await
        .map_err(|e| AppError::from_db(e, DUPLICATE_CODE))
    }

    pub async fn delete<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM service_catalog_entries WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
