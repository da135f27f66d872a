// src/db/inventory_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::inventory::{
        Bin, DemandSample, Forecast, LedgerDirection, LowStockEntry, Sku, SkuPayload, SkuWithStock,
        StockLedgerEntry, UpdateSkuPayload, Warehouse,
    },
};

// Saldo por SKU, sempre derivado do livro-razão.
const ON_HAND_SQL: &str = r#"
    COALESCE(SUM(CASE WHEN l.direction = 'IN' THEN l.quantity ELSE -l.quantity END), 0)
"#;

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Armazéns
    // ---

    pub async fn create_warehouse<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        name: &str,
        address: Option<&str>,
    ) -> Result<Warehouse, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Warehouse>(
            r#"
            INSERT INTO warehouses (tenant_id, name, address)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(name)
        .bind(address)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_db(e, "Já existe um armazém com este nome."))
    }

    pub async fn list_warehouses<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<Warehouse>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let warehouses =
            sqlx::query_as::<_, Warehouse>("SELECT * FROM warehouses WHERE tenant_id = $1 ORDER BY name ASC")
                .bind(tenant_id)
                .fetch_all(executor)
                .await?;
        Ok(warehouses)
    }

    pub async fn find_warehouse<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Warehouse>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let warehouse = sqlx::query_as::<_, Warehouse>("SELECT * FROM warehouses WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;
        Ok(warehouse)
    }

    pub async fn update_warehouse<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        name: Option<&str>,
        address: Option<&str>,
    ) -> Result<Option<Warehouse>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Warehouse>(
            r#"
            UPDATE warehouses SET
                name = COALESCE($3, name),
                address = COALESCE($4, address),
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(name)
        .bind(address)
        .fetch_optional(executor)
        .await
        .map_err(|e| AppError::from_db(e, "Já existe um armazém com este nome."))
    }

    pub async fn delete_warehouse<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM warehouses WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(executor)
            .await
            .map_err(|e| AppError::from_db(e, "Armazém em uso."))?;
        Ok(result.rows_affected())
    }

    // ---
    // Posições (bins)
    // ---

    pub async fn create_bin<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        warehouse_id: Uuid,
        code: &str,
        description: Option<&str>,
    ) -> Result<Bin, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Bin>(
            r#"
            INSERT INTO bins (tenant_id, warehouse_id, code, description)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(warehouse_id)
        .bind(code)
        .bind(description)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_db(e, &format!("A posição '{}' já existe neste armazém.", code)))
    }

    pub async fn list_bins<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        warehouse_id: Option<Uuid>,
    ) -> Result<Vec<Bin>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let bins = sqlx::query_as::<_, Bin>(
            r#"
            SELECT * FROM bins
            WHERE tenant_id = $1 AND ($2::uuid IS NULL OR warehouse_id = $2)
            ORDER BY code ASC
            "#,
        )
        .bind(tenant_id)
        .bind(warehouse_id)
        .fetch_all(executor)
        .await?;
        Ok(bins)
    }

    pub async fn find_bin<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<Bin>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let bin = sqlx::query_as::<_, Bin>("SELECT * FROM bins WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;
        Ok(bin)
    }

    pub async fn update_bin<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        code: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Bin>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Bin>(
            r#"
            UPDATE bins SET
                code = COALESCE($3, code),
                description = COALESCE($4, description)
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(code)
        .bind(description)
        .fetch_optional(executor)
        .await
        .map_err(|e| AppError::from_db(e, "Já existe uma posição com este código."))
    }

    pub async fn delete_bin<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM bins WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(executor)
            .await
            .map_err(|e| AppError::from_db(e, "Posição em uso."))?;
        Ok(result.rows_affected())
    }

    // ---
    // SKUs
    // ---

    pub async fn create_sku<'e, E>(&self, executor: E, tenant_id: Uuid, payload: &SkuPayload) -> Result<Sku, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Sku>(
            r#"
            INSERT INTO skus (tenant_id, code, name, description, unit, unit_cost)
            VALUES ($1, $2, $3, $4, COALESCE($5, 'EA'), $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&payload.code)
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(&payload.unit)
        .bind(payload.unit_cost)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_db(e, &format!("O SKU '{}' já existe.", payload.code)))
    }

    /// SKUs com saldo e última posição, numa só consulta.
    pub async fn list_skus_with_stock<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SkuWithStock>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT s.*,
                   oh.on_hand,
                   lb.bin_id AS latest_bin_id,
                   b.code AS latest_bin_code
            FROM skus s
            LEFT JOIN LATERAL (
                SELECT {on_hand} AS on_hand
                FROM stock_ledger l
                WHERE l.tenant_id = s.tenant_id AND l.sku_id = s.id
            ) oh ON TRUE
            LEFT JOIN LATERAL (
                SELECT l.bin_id FROM stock_ledger l
                WHERE l.tenant_id = s.tenant_id AND l.sku_id = s.id
                ORDER BY l.created_at DESC
                LIMIT 1
            ) lb ON TRUE
            LEFT JOIN bins b ON b.id = lb.bin_id
            WHERE s.tenant_id = $1
              AND ($2::text IS NULL OR s.code ILIKE $2 OR s.name ILIKE $2)
            ORDER BY s.code ASC
            LIMIT $3 OFFSET $4
            "#,
            on_hand = ON_HAND_SQL
        );
        let skus = sqlx::query_as::<_, SkuWithStock>(&sql)
            .bind(tenant_id)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(executor)
            .await?;
        Ok(skus)
    }

    pub async fn count_skus<'e, E>(&self, executor: E, tenant_id: Uuid, search: Option<&str>) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM skus WHERE tenant_id = $1 AND ($2::text IS NULL OR code ILIKE $2 OR name ILIKE $2)",
        )
        .bind(tenant_id)
        .bind(search)
        .fetch_one(executor)
        .await?;
        Ok(total)
    }

    pub async fn find_sku<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<Sku>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sku = sqlx::query_as::<_, Sku>("SELECT * FROM skus WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;
        Ok(sku)
    }

    pub async fn sku_exists<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM skus WHERE id = $1 AND tenant_id = $2)")
            .bind(id)
            .bind(tenant_id)
            .fetch_one(executor)
            .await?;
        Ok(exists)
    }

    pub async fn list_sku_ids<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM skus WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_all(executor)
            .await?;
        Ok(ids)
    }

    pub async fn update_sku<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        payload: &UpdateSkuPayload,
    ) -> Result<Option<Sku>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sku = sqlx::query_as::<_, Sku>(
            r#"
            UPDATE skus SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                unit = COALESCE($5, unit),
                unit_cost = COALESCE($6, unit_cost),
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(&payload.unit)
        .bind(payload.unit_cost)
        .fetch_optional(executor)
        .await?;
        Ok(sku)
    }

    pub async fn delete_sku<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM skus WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(executor)
            .await
            .map_err(|e| AppError::from_db(e, "SKU em uso."))?;
        Ok(result.rows_affected())
    }

    // ---
    // Livro-razão (somente INSERT)
    // ---

    pub async fn insert_ledger_entry<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        sku_id: Uuid,
        bin_id: Uuid,
        direction: LedgerDirection,
        quantity: Decimal,
        reference: Option<&str>,
        created_by: Option<Uuid>,
    ) -> Result<StockLedgerEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entry = sqlx::query_as::<_, StockLedgerEntry>(
            r#"
            INSERT INTO stock_ledger (tenant_id, sku_id, bin_id, direction, quantity, reference, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(sku_id)
        .bind(bin_id)
        .bind(direction)
        .bind(quantity)
        .bind(reference)
        .bind(created_by)
        .fetch_one(executor)
        .await?;
        Ok(entry)
    }

    pub async fn list_ledger<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        sku_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StockLedgerEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, StockLedgerEntry>(
            r#"
            SELECT * FROM stock_ledger
            WHERE tenant_id = $1 AND ($2::uuid IS NULL OR sku_id = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(tenant_id)
        .bind(sku_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn count_ledger<'e, E>(&self, executor: E, tenant_id: Uuid, sku_id: Option<Uuid>) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM stock_ledger WHERE tenant_id = $1 AND ($2::uuid IS NULL OR sku_id = $2)",
        )
        .bind(tenant_id)
        .bind(sku_id)
        .fetch_one(executor)
        .await?;
        Ok(total)
    }

    /// Σ IN − Σ OUT de um SKU. Sem movimentos = 0.
    pub async fn on_hand<'e, E>(&self, executor: E, tenant_id: Uuid, sku_id: Uuid) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {} FROM stock_ledger l WHERE l.tenant_id = $1 AND l.sku_id = $2",
            ON_HAND_SQL
        );
        let total: Decimal = sqlx::query_scalar(&sql)
            .bind(tenant_id)
            .bind(sku_id)
            .fetch_one(executor)
            .await?;
        Ok(total)
    }

    // ---
    // Previsão
    // ---

    /// Até `per_sku` movimentos mais recentes de cada SKU dentro da janela de dias.
    pub async fn recent_demand_samples<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        window_days: i32,
        per_sku: i64,
    ) -> Result<Vec<DemandSample>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, DemandSample>(
            r#"
            SELECT sku_id, direction, quantity FROM (
                SELECT sku_id, direction, quantity,
                       ROW_NUMBER() OVER (PARTITION BY sku_id ORDER BY created_at DESC) AS rn
                FROM stock_ledger
                WHERE tenant_id = $1
                  AND created_at >= NOW() - make_interval(days => $2)
            ) recent
            WHERE rn <= $3
            "#,
        )
        .bind(tenant_id)
        .bind(window_days)
        .bind(per_sku)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn upsert_forecast<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        sku_id: Uuid,
        avg_daily_demand: Decimal,
        lead_time_days: i32,
        safety_factor: Decimal,
        reorder_point: Decimal,
        suggested_order_qty: Decimal,
    ) -> Result<Forecast, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let forecast = sqlx::query_as::<_, Forecast>(
            r#"
            INSERT INTO forecasts (
                tenant_id, sku_id, avg_daily_demand, lead_time_days,
                safety_factor, reorder_point, suggested_order_qty, computed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            ON CONFLICT (tenant_id, sku_id) DO UPDATE SET
                avg_daily_demand = EXCLUDED.avg_daily_demand,
                lead_time_days = EXCLUDED.lead_time_days,
                safety_factor = EXCLUDED.safety_factor,
                reorder_point = EXCLUDED.reorder_point,
                suggested_order_qty = EXCLUDED.suggested_order_qty,
                computed_at = NOW()
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(sku_id)
        .bind(avg_daily_demand)
        .bind(lead_time_days)
        .bind(safety_factor)
        .bind(reorder_point)
        .bind(suggested_order_qty)
        .fetch_one(executor)
        .await?;
        Ok(forecast)
    }

    pub async fn list_forecasts<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<Forecast>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, Forecast>(
            "SELECT * FROM forecasts WHERE tenant_id = $1 ORDER BY reorder_point DESC",
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn low_stock<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<LowStockEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT s.id AS sku_id, s.code, s.name,
                   oh.on_hand, f.reorder_point, f.suggested_order_qty
            FROM forecasts f
            JOIN skus s ON s.id = f.sku_id AND s.tenant_id = f.tenant_id
            CROSS JOIN LATERAL (
                SELECT {on_hand} AS on_hand
                FROM stock_ledger l
                WHERE l.tenant_id = s.tenant_id AND l.sku_id = s.id
            ) oh
            WHERE f.tenant_id = $1
              AND oh.on_hand <= f.reorder_point
            ORDER BY (f.reorder_point - oh.on_hand) DESC
            "#,
            on_hand = ON_HAND_SQL
        );
        let rows = sqlx::query_as::<_, LowStockEntry>(&sql)
            .bind(tenant_id)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    /// Tenants que possuem SKUs (job em lote da previsão).
    pub async fn tenants_with_skus(&self) -> Result<Vec<Uuid>, AppError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT s.tenant_id FROM skus s
            JOIN tenants t ON t.id = s.tenant_id
            WHERE t.is_active
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}
