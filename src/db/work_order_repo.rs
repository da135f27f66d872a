// src/db/work_order_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::work_orders::{
        CreateWorkOrderPayload, UpdateWorkOrderPayload, WorkOrder, WorkOrderFilter, WorkOrderPriority,
        WorkOrderStatus,
    },
};

#[derive(Clone)]
pub struct WorkOrderRepository {
    #[allow(dead_code)]
    pool: PgPool,
}

impl WorkOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payload: &CreateWorkOrderPayload,
    ) -> Result<WorkOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let work_order = sqlx::query_as::<_, WorkOrder>(
            r#"
            INSERT INTO work_orders (tenant_id, account_id, assigned_to, title, description, site_address, priority)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(payload.account_id)
        .bind(payload.assigned_to)
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(&payload.site_address)
        .bind(payload.priority.unwrap_or(WorkOrderPriority::Normal))
        .fetch_one(executor)
        .await?;
        Ok(work_order)
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filter: &WorkOrderFilter,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WorkOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, WorkOrder>(
            r#"
            SELECT * FROM work_orders
            WHERE tenant_id = $1
              AND ($2::work_order_status IS NULL OR status = $2)
              AND ($3::uuid IS NULL OR assigned_to = $3)
              AND ($4::text IS NULL OR title ILIKE $4 OR site_address ILIKE $4)
            ORDER BY created_at DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(tenant_id)
        .bind(filter.status)
        .bind(filter.assigned_to)
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn count<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filter: &WorkOrderFilter,
        search: Option<&str>,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM work_orders
            WHERE tenant_id = $1
              AND ($2::work_order_status IS NULL OR status = $2)
              AND ($3::uuid IS NULL OR assigned_to = $3)
              AND ($4::text IS NULL OR title ILIKE $4 OR site_address ILIKE $4)
            "#,
        )
        .bind(tenant_id)
        .bind(filter.status)
        .bind(filter.assigned_to)
        .bind(search)
        .fetch_one(executor)
        .await?;
        Ok(total)
    }

    pub async fn find<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<WorkOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let work_order = sqlx::query_as::<_, WorkOrder>("SELECT * FROM work_orders WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;
        Ok(work_order)
    }

    pub async fn find_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<WorkOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let work_order = sqlx::query_as::<_, WorkOrder>(
            "SELECT * FROM work_orders WHERE id = $1 AND tenant_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(work_order)
    }

    pub async fn exists<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM work_orders WHERE id = $1 AND tenant_id = $2)")
                .bind(id)
                .bind(tenant_id)
                .fetch_one(executor)
                .await?;
        Ok(exists)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        payload: &UpdateWorkOrderPayload,
    ) -> Result<Option<WorkOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let work_order = sqlx::query_as::<_, WorkOrder>(
            r#"
            UPDATE work_orders SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                site_address = COALESCE($5, site_address),
                account_id = COALESCE($6, account_id),
                assigned_to = COALESCE($7, assigned_to),
                priority = COALESCE($8, priority),
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(&payload.site_address)
        .bind(payload.account_id)
        .bind(payload.assigned_to)
        .bind(payload.priority)
        .fetch_optional(executor)
        .await?;
        Ok(work_order)
    }

    /// Troca o status; COMPLETED carimba `completed_at`.
    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        status: WorkOrderStatus,
    ) -> Result<WorkOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let work_order = sqlx::query_as::<_, WorkOrder>(
            r#"
            UPDATE work_orders SET
                status = $3,
                completed_at = CASE WHEN $3 = 'COMPLETED'::work_order_status THEN NOW() ELSE completed_at END,
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(status)
        .fetch_one(executor)
        .await?;
        Ok(work_order)
    }

    pub async fn delete<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM work_orders WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
