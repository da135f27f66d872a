// src/services/catalog_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageQuery, Paginated},
    },
    db::CatalogRepository,
    models::catalog::{CatalogEntry, CatalogEntryPayload, CatalogFilter, UpdateCatalogEntryPayload},
};

#[derive(Clone)]
pub struct CatalogService {
    repo: CatalogRepository,
    pool: PgPool,
}

impl CatalogService {
    pub fn new(repo: CatalogRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn create(&self, tenant_id: Uuid, payload: &CatalogEntryPayload) -> Result<CatalogEntry, AppError> {
        self.repo.create(&self.pool, tenant_id, payload).await
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &CatalogFilter,
        query: &PageQuery,
    ) -> Result<Paginated<CatalogEntry>, AppError> {
        let search = query.search_pattern();
        let mut tx = self.pool.begin().await?;
        let rows = self
            .repo
            .list(
                &mut *tx,
                tenant_id,
                filter.active_only,
                search.as_deref(),
                query.page_size(),
                query.offset(),
            )
            .await?;
        let total = self
            .repo
            .count(&mut *tx, tenant_id, filter.active_only, search.as_deref())
            .await?;
        tx.commit().await?;
        Ok(Paginated::new(rows, total, query))
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<CatalogEntry, AppError> {
        self.repo
            .find(&self.pool, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Serviço"))
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        payload: &UpdateCatalogEntryPayload,
    ) -> Result<CatalogEntry, AppError> {
        self.repo
            .update(&self.pool, tenant_id, id, payload)
            .await?
            .ok_or_else(|| AppError::not_found("Serviço"))
    }

    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let affected = self.repo.delete(&self.pool, tenant_id, id).await?;
        if affected == 0 {
            return Err(AppError::not_found("Serviço"));
        }
        Ok(())
    }
}
