// src/services/vendor_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageQuery, Paginated},
    },
    db::{InventoryRepository, VendorRepository},
    models::vendors::{
        rolling_rating, PerformanceReview, PerformanceReviewPayload, PriceAgreement, PriceAgreementPayload,
        ReviewOutcome, UpdateVendorPayload, Vendor, VendorContact, VendorContactPayload, VendorPayload,
        RATING_WINDOW,
    },
};

#[derive(Clone)]
pub struct VendorService {
    repo: VendorRepository,
    inventory_repo: InventoryRepository,
    pool: PgPool,
}

impl VendorService {
    pub fn new(repo: VendorRepository, inventory_repo: InventoryRepository, pool: PgPool) -> Self {
        Self {
            repo,
            inventory_repo,
            pool,
        }
    }

    // --- FORNECEDORES ---

    pub async fn create(&self, tenant_id: Uuid, payload: &VendorPayload) -> Result<Vendor, AppError> {
        self.repo.create(&self.pool, tenant_id, payload).await
    }

    pub async fn list(&self, tenant_id: Uuid, query: &PageQuery) -> Result<Paginated<Vendor>, AppError> {
        let search = query.search_pattern();
        let mut tx = self.pool.begin().await?;
        let rows = self
            .repo
            .list(&mut *tx, tenant_id, search.as_deref(), query.page_size(), query.offset())
            .await?;
        let total = self.repo.count(&mut *tx, tenant_id, search.as_deref()).await?;
        tx.commit().await?;
        Ok(Paginated::new(rows, total, query))
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<Vendor, AppError> {
        self.repo
            .find(&self.pool, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Fornecedor"))
    }

    pub async fn update(&self, tenant_id: Uuid, id: Uuid, payload: &UpdateVendorPayload) -> Result<Vendor, AppError> {
        self.repo
            .update(&self.pool, tenant_id, id, payload)
            .await?
            .ok_or_else(|| AppError::not_found("Fornecedor"))
    }

    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let affected = self.repo.delete(&self.pool, tenant_id, id).await?;
        if affected == 0 {
            return Err(AppError::not_found("Fornecedor"));
        }
        Ok(())
    }

    // --- CONTATOS ---

    pub async fn add_contact(
        &self,
        tenant_id: Uuid,
        vendor_id: Uuid,
        payload: &VendorContactPayload,
    ) -> Result<VendorContact, AppError> {
        self.ensure_vendor(tenant_id, vendor_id).await?;
        self.repo.create_contact(&self.pool, tenant_id, vendor_id, payload).await
    }

    pub async fn list_contacts(&self, tenant_id: Uuid, vendor_id: Uuid) -> Result<Vec<VendorContact>, AppError> {
        self.ensure_vendor(tenant_id, vendor_id).await?;
        self.repo.list_contacts(&self.pool, tenant_id, vendor_id).await
    }

    pub async fn remove_contact(&self, tenant_id: Uuid, vendor_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let affected = self.repo.delete_contact(&self.pool, tenant_id, vendor_id, id).await?;
        if affected == 0 {
            return Err(AppError::not_found("Contato do fornecedor"));
        }
        Ok(())
    }

    // --- ACORDOS DE PREÇO ---

    pub async fn add_agreement(
        &self,
        tenant_id: Uuid,
        vendor_id: Uuid,
        payload: &PriceAgreementPayload,
    ) -> Result<PriceAgreement, AppError> {
        self.ensure_vendor(tenant_id, vendor_id).await?;
        if let Some(sku_id) = payload.sku_id {
            if !self.inventory_repo.sku_exists(&self.pool, tenant_id, sku_id).await? {
                return Err(AppError::BadRequest("SKU inválido para esta empresa.".into()));
            }
        }
        self.repo.create_agreement(&self.pool, tenant_id, vendor_id, payload).await
    }

    pub async fn list_agreements(&self, tenant_id: Uuid, vendor_id: Uuid) -> Result<Vec<PriceAgreement>, AppError> {
        self.ensure_vendor(tenant_id, vendor_id).await?;
        self.repo.list_agreements(&self.pool, tenant_id, vendor_id).await
    }

    pub async fn remove_agreement(&self, tenant_id: Uuid, vendor_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let affected = self.repo.delete_agreement(&self.pool, tenant_id, vendor_id, id).await?;
        if affected == 0 {
            return Err(AppError::not_found("Acordo de preço"));
        }
        Ok(())
    }

    // --- AVALIAÇÕES ---

    /// Grava a avaliação e recalcula a nota do fornecedor (média das 5 últimas).
    pub async fn add_review(
        &self,
        tenant_id: Uuid,
        reviewer_id: Uuid,
        vendor_id: Uuid,
        payload: &PerformanceReviewPayload,
    ) -> Result<ReviewOutcome, AppError> {
        let mut tx = self.pool.begin().await?;

        if !self.repo.exists(&mut *tx, tenant_id, vendor_id).await? {
            return Err(AppError::not_found("Fornecedor"));
        }

        let review = self
            .repo
            .create_review(
                &mut *tx,
                tenant_id,
                vendor_id,
                reviewer_id,
                payload.score,
                payload.comment.as_deref(),
            )
            .await?;

        let scores = self
            .repo
            .recent_scores(&mut *tx, tenant_id, vendor_id, RATING_WINDOW as i64)
            .await?;
        let vendor = self
            .repo
            .set_rating(&mut *tx, tenant_id, vendor_id, rolling_rating(&scores))
            .await?;

        tx.commit().await?;

        Ok(ReviewOutcome {
            review,
            vendor_rating: vendor.rating,
        })
    }

    pub async fn list_reviews(&self, tenant_id: Uuid, vendor_id: Uuid) -> Result<Vec<PerformanceReview>, AppError> {
        self.ensure_vendor(tenant_id, vendor_id).await?;
        self.repo.list_reviews(&self.pool, tenant_id, vendor_id).await
    }

    async fn ensure_vendor(&self, tenant_id: Uuid, vendor_id: Uuid) -> Result<(), AppError> {
        if !self.repo.exists(&self.pool, tenant_id, vendor_id).await? {
            return Err(AppError::not_found("Fornecedor"));
        }
        Ok(())
    }
}
