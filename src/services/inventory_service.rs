// src/services/inventory_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageQuery, Paginated},
    },
    db::InventoryRepository,
    models::inventory::{
        Bin, BinFilter, BinPayload, LedgerFilter, LowStockEntry, OnHand, PostLedgerPayload, Sku, SkuPayload,
        SkuWithStock, StockLedgerEntry, UpdateBinPayload, UpdateSkuPayload, UpdateWarehousePayload, Warehouse,
        WarehousePayload,
    },
};

#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: InventoryRepository,
    pool: PgPool,
}

impl InventoryService {
    pub fn new(inventory_repo: InventoryRepository, pool: PgPool) -> Self {
        Self { inventory_repo, pool }
    }

    // --- ARMAZÉNS ---

    pub async fn create_warehouse(&self, tenant_id: Uuid, payload: &WarehousePayload) -> Result<Warehouse, AppError> {
        self.inventory_repo
            .create_warehouse(&self.pool, tenant_id, payload.name.trim(), payload.address.as_deref())
            .await
    }

    pub async fn list_warehouses(&self, tenant_id: Uuid) -> Result<Vec<Warehouse>, AppError> {
        self.inventory_repo.list_warehouses(&self.pool, tenant_id).await
    }

    pub async fn get_warehouse(&self, tenant_id: Uuid, id: Uuid) -> Result<Warehouse, AppError> {
        self.inventory_repo
            .find_warehouse(&self.pool, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Armazém"))
    }

    pub async fn update_warehouse(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        payload: &UpdateWarehousePayload,
    ) -> Result<Warehouse, AppError> {
        self.inventory_repo
            .update_warehouse(
                &self.pool,
                tenant_id,
                id,
                payload.name.as_deref().map(str::trim),
                payload.address.as_deref(),
            )
            .await?
            .ok_or_else(|| AppError::not_found("Armazém"))
    }

    pub async fn delete_warehouse(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let affected = self.inventory_repo.delete_warehouse(&self.pool, tenant_id, id).await?;
        if affected == 0 {
            return Err(AppError::not_found("Armazém"));
        }
        Ok(())
    }

    // --- POSIÇÕES (BINS) ---

    pub async fn create_bin(&self, tenant_id: Uuid, payload: &BinPayload) -> Result<Bin, AppError> {
        let warehouse = self
            .inventory_repo
            .find_warehouse(&self.pool, tenant_id, payload.warehouse_id)
            .await?;
        if warehouse.is_none() {
            return Err(AppError::BadRequest("Armazém inválido para esta empresa.".into()));
        }

        self.inventory_repo
            .create_bin(
                &self.pool,
                tenant_id,
                payload.warehouse_id,
                payload.code.trim(),
                payload.description.as_deref(),
            )
            .await
    }

    pub async fn list_bins(&self, tenant_id: Uuid, filter: &BinFilter) -> Result<Vec<Bin>, AppError> {
        self.inventory_repo.list_bins(&self.pool, tenant_id, filter.warehouse_id).await
    }

    pub async fn get_bin(&self, tenant_id: Uuid, id: Uuid) -> Result<Bin, AppError> {
        self.inventory_repo
            .find_bin(&self.pool, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Posição"))
    }

    pub async fn update_bin(&self, tenant_id: Uuid, id: Uuid, payload: &UpdateBinPayload) -> Result<Bin, AppError> {
        self.inventory_repo
            .update_bin(
                &self.pool,
                tenant_id,
                id,
                payload.code.as_deref().map(str::trim),
                payload.description.as_deref(),
            )
            .await?
            .ok_or_else(|| AppError::not_found("Posição"))
    }

    pub async fn delete_bin(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let affected = self.inventory_repo.delete_bin(&self.pool, tenant_id, id).await?;
        if affected == 0 {
            return Err(AppError::not_found("Posição"));
        }
        Ok(())
    }

    // --- SKUs ---

    pub async fn create_sku(&self, tenant_id: Uuid, payload: &SkuPayload) -> Result<Sku, AppError> {
        self.inventory_repo.create_sku(&self.pool, tenant_id, payload).await
    }

    /// Lista com saldo derivado e última posição usada.
    pub async fn list_skus(&self, tenant_id: Uuid, query: &PageQuery) -> Result<Paginated<SkuWithStock>, AppError> {
        let search = query.search_pattern();
        let mut tx = self.pool.begin().await?;
        let rows = self
            .inventory_repo
            .list_skus_with_stock(&mut *tx, tenant_id, search.as_deref(), query.page_size(), query.offset())
            .await?;
        let total = self.inventory_repo.count_skus(&mut *tx, tenant_id, search.as_deref()).await?;
        tx.commit().await?;
        Ok(Paginated::new(rows, total, query))
    }

    pub async fn get_sku(&self, tenant_id: Uuid, id: Uuid) -> Result<Sku, AppError> {
        self.inventory_repo
            .find_sku(&self.pool, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("SKU"))
    }

    pub async fn update_sku(&self, tenant_id: Uuid, id: Uuid, payload: &UpdateSkuPayload) -> Result<Sku, AppError> {
        self.inventory_repo
            .update_sku(&self.pool, tenant_id, id, payload)
            .await?
            .ok_or_else(|| AppError::not_found("SKU"))
    }

    pub async fn delete_sku(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let affected = self.inventory_repo.delete_sku(&self.pool, tenant_id, id).await?;
        if affected == 0 {
            return Err(AppError::not_found("SKU"));
        }
        Ok(())
    }

    // --- LIVRO-RAZÃO ---

    /// Lança um movimento. Não há trava: dois OUT simultâneos podem deixar o saldo negativo.
    pub async fn post_ledger(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        payload: &PostLedgerPayload,
    ) -> Result<StockLedgerEntry, AppError> {
        let mut tx = self.pool.begin().await?;

        if !self.inventory_repo.sku_exists(&mut *tx, tenant_id, payload.sku_id).await? {
            return Err(AppError::BadRequest("SKU inválido para esta empresa.".into()));
        }
        if self.inventory_repo.find_bin(&mut *tx, tenant_id, payload.bin_id).await?.is_none() {
            return Err(AppError::BadRequest("Posição inválida para esta empresa.".into()));
        }

        let entry = self
            .inventory_repo
            .insert_ledger_entry(
                &mut *tx,
                tenant_id,
                payload.sku_id,
                payload.bin_id,
                payload.direction,
                payload.quantity,
                payload.reference.as_deref(),
                Some(user_id),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            %tenant_id,
            sku_id = %entry.sku_id,
            direction = ?entry.direction,
            quantity = %entry.quantity,
            "Movimento de estoque lançado"
        );

        Ok(entry)
    }

    pub async fn list_ledger(
        &self,
        tenant_id: Uuid,
        filter: &LedgerFilter,
        query: &PageQuery,
    ) -> Result<Paginated<StockLedgerEntry>, AppError> {
        let mut tx = self.pool.begin().await?;
        let rows = self
            .inventory_repo
            .list_ledger(&mut *tx, tenant_id, filter.sku_id, query.page_size(), query.offset())
            .await?;
        let total = self.inventory_repo.count_ledger(&mut *tx, tenant_id, filter.sku_id).await?;
        tx.commit().await?;
        Ok(Paginated::new(rows, total, query))
    }

    pub async fn on_hand(&self, tenant_id: Uuid, sku_id: Uuid) -> Result<OnHand, AppError> {
        if !self.inventory_repo.sku_exists(&self.pool, tenant_id, sku_id).await? {
            return Err(AppError::not_found("SKU"));
        }
        let on_hand = self.inventory_repo.on_hand(&self.pool, tenant_id, sku_id).await?;
        Ok(OnHand { sku_id, on_hand })
    }

    pub async fn low_stock(&self, tenant_id: Uuid) -> Result<Vec<LowStockEntry>, AppError> {
        self.inventory_repo.low_stock(&self.pool, tenant_id).await
    }
}
