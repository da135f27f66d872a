// src/db/dispatch_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::dispatch::{CreateDispatchSlotPayload, DispatchFilter, DispatchSlot, DispatchStatus},
};

#[derive(Clone)]
pub struct DispatchRepository {
    #[allow(dead_code)]
    pool: PgPool,
}

impl DispatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payload: &CreateDispatchSlotPayload,
    ) -> Result<DispatchSlot, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let slot = sqlx::query_as::<_, DispatchSlot>(
            r#"
            INSERT INTO dispatch_slots (tenant_id, work_order_id, technician_id, starts_at, ends_at, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(payload.work_order_id)
        .bind(payload.technician_id)
        .bind(payload.starts_at)
        .bind(payload.ends_at)
        .bind(&payload.notes)
        .fetch_one(executor)
        .await?;
        Ok(slot)
    }

    /// Janela [from, to): slots que começam dentro do intervalo.
    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filter: &DispatchFilter,
    ) -> Result<Vec<DispatchSlot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let slots = sqlx::query_as::<_, DispatchSlot>(
            r#"
            SELECT * FROM dispatch_slots
            WHERE tenant_id = $1
              AND ($2::timestamptz IS NULL OR starts_at >= $2)
              AND ($3::timestamptz IS NULL OR starts_at < $3)
              AND ($4::uuid IS NULL OR technician_id = $4)
              AND ($5::uuid IS NULL OR work_order_id = $5)
            ORDER BY starts_at ASC
            "#,
        )
        .bind(tenant_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.technician_id)
        .bind(filter.work_order_id)
        .fetch_all(executor)
        .await?;
        Ok(slots)
    }

    pub async fn find<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<DispatchSlot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let slot = sqlx::query_as::<_, DispatchSlot>("SELECT * FROM dispatch_slots WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;
        Ok(slot)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        technician_id: Option<Uuid>,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        notes: Option<&str>,
    ) -> Result<Option<DispatchSlot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let slot = sqlx::query_as::<_, DispatchSlot>(
            r#"
            UPDATE dispatch_slots SET
                technician_id = COALESCE($3, technician_id),
                starts_at = $4,
                ends_at = $5,
                notes = COALESCE($6, notes),
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(technician_id)
        .bind(starts_at)
        .bind(ends_at)
        .bind(notes)
        .fetch_optional(executor)
        .await?;
        Ok(slot)
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        status: DispatchStatus,
    ) -> Result<Option<DispatchSlot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let slot = sqlx::query_as::<_, DispatchSlot>(
            r#"
            UPDATE dispatch_slots SET status = $3, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(status)
        .fetch_optional(executor)
        .await?;
        Ok(slot)
    }

    pub async fn delete<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM dispatch_slots WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
