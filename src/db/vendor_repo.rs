// src/db/vendor_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::vendors::{
        PerformanceReview, PriceAgreement, PriceAgreementPayload, UpdateVendorPayload, Vendor, VendorContact,
        VendorContactPayload, VendorPayload,
    },
};

#[derive(Clone)]
pub struct VendorRepository {
    #[allow(dead_code)]
    pool: PgPool,
}

impl VendorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  FORNECEDORES
    // =========================================================================

    pub async fn create<'e, E>(&self, executor: E, tenant_id: Uuid, payload: &VendorPayload) -> Result<Vendor, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let vendor = sqlx::query_as::<_, Vendor>(
            r#"
            INSERT INTO vendors (tenant_id, name, email, phone, website)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(&payload.website)
        .fetch_one(executor)
        .await?;
        Ok(vendor)
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Vendor>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let vendors = sqlx::query_as::<_, Vendor>(
            r#"
            SELECT * FROM vendors
            WHERE tenant_id = $1 AND ($2::text IS NULL OR name ILIKE $2 OR email ILIKE $2)
            ORDER BY name ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(tenant_id)
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;
        Ok(vendors)
    }

    pub async fn count<'e, E>(&self, executor: E, tenant_id: Uuid, search: Option<&str>) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM vendors WHERE tenant_id = $1 AND ($2::text IS NULL OR name ILIKE $2 OR email ILIKE $2)",
        )
        .bind(tenant_id)
        .bind(search)
        .fetch_one(executor)
        .await?;
        Ok(total)
    }

    pub async fn find<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<Vendor>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let vendor = sqlx::query_as::<_, Vendor>("SELECT * FROM vendors WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;
        Ok(vendor)
    }

    pub async fn exists<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM vendors WHERE id = $1 AND tenant_id = $2)")
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
        payload: &UpdateVendorPayload,
    ) -> Result<Option<Vendor>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let vendor = sqlx::query_as::<_, Vendor>(
            r#"
            UPDATE vendors SET
                name = COALESCE($3, name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                website = COALESCE($6, website),
                is_active = COALESCE($7, is_active),
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(&payload.website)
        .bind(payload.is_active)
        .fetch_optional(executor)
        .await?;
        Ok(vendor)
    }

    pub async fn set_rating<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        rating: Option<Decimal>,
    ) -> Result<Vendor, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let vendor = sqlx::query_as::<_, Vendor>(
            "UPDATE vendors SET rating = $3, updated_at = NOW() WHERE id = $1 AND tenant_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(rating)
        .fetch_one(executor)
        .await?;
        Ok(vendor)
    }

    pub async fn delete<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM vendors WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    //  CONTATOS
    // =========================================================================

    pub async fn create_contact<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        vendor_id: Uuid,
        payload: &VendorContactPayload,
    ) -> Result<VendorContact, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contact = sqlx::query_as::<_, VendorContact>(
            r#"
            INSERT INTO vendor_contacts (tenant_id, vendor_id, name, email, phone, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(vendor_id)
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(&payload.role)
        .fetch_one(executor)
        .await?;
        Ok(contact)
    }

    pub async fn list_contacts<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        vendor_id: Uuid,
    ) -> Result<Vec<VendorContact>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contacts = sqlx::query_as::<_, VendorContact>(
            "SELECT * FROM vendor_contacts WHERE tenant_id = $1 AND vendor_id = $2 ORDER BY name ASC",
        )
        .bind(tenant_id)
        .bind(vendor_id)
        .fetch_all(executor)
        .await?;
        Ok(contacts)
    }

    pub async fn delete_contact<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        vendor_id: Uuid,
        id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM vendor_contacts WHERE id = $1 AND vendor_id = $2 AND tenant_id = $3")
            .bind(id)
            .bind(vendor_id)
            .bind(tenant_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    //  ACORDOS DE PREÇO
    // =========================================================================

    pub async fn create_agreement<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        vendor_id: Uuid,
        payload: &PriceAgreementPayload,
    ) -> Result<PriceAgreement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let agreement = sqlx::query_as::<_, PriceAgreement>(
            r#"
            INSERT INTO vendor_price_agreements (tenant_id, vendor_id, sku_id, unit_price, valid_from, valid_to, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(vendor_id)
        .bind(payload.sku_id)
        .bind(payload.unit_price)
        .bind(payload.valid_from)
        .bind(payload.valid_to)
        .bind(&payload.notes)
        .fetch_one(executor)
        .await?;
        Ok(agreement)
    }

    pub async fn list_agreements<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        vendor_id: Uuid,
    ) -> Result<Vec<PriceAgreement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let agreements = sqlx::query_as::<_, PriceAgreement>(
            r#"
            SELECT * FROM vendor_price_agreements
            WHERE tenant_id = $1 AND vendor_id = $2
            ORDER BY valid_from DESC
            "#,
        )
        .bind(tenant_id)
        .bind(vendor_id)
        .fetch_all(executor)
        .await?;
        Ok(agreements)
    }

    pub async fn delete_agreement<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        vendor_id: Uuid,
        id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "DELETE FROM vendor_price_agreements WHERE id = $1 AND vendor_id = $2 AND tenant_id = $3",
        )
        .bind(id)
        .bind(vendor_id)
        .bind(tenant_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    //  AVALIAÇÕES
    // =========================================================================

    pub async fn create_review<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        vendor_id: Uuid,
        reviewer_id: Uuid,
        score: i32,
        comment: Option<&str>,
    ) -> Result<PerformanceReview, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let review = sqlx::query_as::<_, PerformanceReview>(
            r#"
            INSERT INTO vendor_performance_reviews (tenant_id, vendor_id, reviewer_id, score, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(vendor_id)
        .bind(reviewer_id)
        .bind(score)
        .bind(comment)
        .fetch_one(executor)
        .await?;
        Ok(review)
    }

    pub async fn list_reviews<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        vendor_id: Uuid,
    ) -> Result<Vec<PerformanceReview>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reviews = sqlx::query_as::<_, PerformanceReview>(
            r#"
            SELECT * FROM vendor_performance_reviews
            WHERE tenant_id = $1 AND vendor_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(tenant_id)
        .bind(vendor_id)
        .fetch_all(executor)
        .await?;
        Ok(reviews)
    }

    /// Notas mais recentes primeiro, até `limit`.
    pub async fn recent_scores<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        vendor_id: Uuid,
        limit: i64,
    ) -> Result<Vec<i32>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let scores: Vec<i32> = sqlx::query_scalar(
            r#"
            SELECT score FROM vendor_performance_reviews
            WHERE tenant_id = $1 AND vendor_id = $2
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(tenant_id)
        .bind(vendor_id)
        .bind(limit)
        .fetch_all(executor)
        .await?;
        Ok(scores)
    }
}
