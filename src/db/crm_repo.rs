// src/db/crm_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::crm::{
        Account, AccountPayload, Contact, ContactPayload, Lead, LeadPayload, LeadStatus, Note,
        UpdateAccountPayload, UpdateContactPayload, UpdateLeadPayload,
    },
};

#[derive(Clone)]
pub struct CrmRepository {
    #[allow(dead_code)]
    pool: PgPool,
}

impl CrmRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  ACCOUNTS
    // =========================================================================

    pub async fn create_account<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payload: &AccountPayload,
    ) -> Result<Account, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (tenant_id, name, email, phone, industry, address)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(&payload.industry)
        .bind(&payload.address)
        .fetch_one(executor)
        .await?;
        Ok(account)
    }

    pub async fn list_accounts<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let accounts = sqlx::query_as::<_, Account>(
            r#"
            SELECT * FROM accounts
            WHERE tenant_id = $1
              AND ($2::text IS NULL OR name ILIKE $2 OR email ILIKE $2)
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
        Ok(accounts)
    }

    pub async fn count_accounts<'e, E>(&self, executor: E, tenant_id: Uuid, search: Option<&str>) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM accounts
            WHERE tenant_id = $1
              AND ($2::text IS NULL OR name ILIKE $2 OR email ILIKE $2)
            "#,
        )
        .bind(tenant_id)
        .bind(search)
        .fetch_one(executor)
        .await?;
        Ok(total)
    }

    pub async fn find_account<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<Account>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;
        Ok(account)
    }

    pub async fn account_exists<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM accounts WHERE id = $1 AND tenant_id = $2)")
                .bind(id)
                .bind(tenant_id)
                .fetch_one(executor)
                .await?;
        Ok(exists)
    }

    pub async fn update_account<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        payload: &UpdateAccountPayload,
    ) -> Result<Option<Account>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts SET
                name = COALESCE($3, name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                industry = COALESCE($6, industry),
                address = COALESCE($7, address),
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
        .bind(&payload.industry)
        .bind(&payload.address)
        .fetch_optional(executor)
        .await?;
        Ok(account)
    }

    pub async fn delete_account<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(executor)
            .await
            .map_err(|e| AppError::from_db(e, "Conta em uso."))?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    //  CONTACTS
    // =========================================================================

    pub async fn create_contact<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payload: &ContactPayload,
    ) -> Result<Contact, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contact = sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts (tenant_id, account_id, first_name, last_name, email, phone)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(payload.account_id)
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(&payload.email)
        .bind(&payload.phone)
        .fetch_one(executor)
        .await?;
        Ok(contact)
    }

    pub async fn list_contacts<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Contact>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contacts = sqlx::query_as::<_, Contact>(
            r#"
            SELECT * FROM contacts
            WHERE tenant_id = $1
              AND ($2::text IS NULL
                   OR first_name || ' ' || coalesce(last_name, '') ILIKE $2
                   OR email ILIKE $2)
            ORDER BY first_name ASC, last_name ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(tenant_id)
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;
        Ok(contacts)
    }

    pub async fn count_contacts<'e, E>(&self, executor: E, tenant_id: Uuid, search: Option<&str>) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM contacts
            WHERE tenant_id = $1
              AND ($2::text IS NULL
                   OR first_name || ' ' || coalesce(last_name, '') ILIKE $2
                   OR email ILIKE $2)
            "#,
        )
        .bind(tenant_id)
        .bind(search)
        .fetch_one(executor)
        .await?;
        Ok(total)
    }

    pub async fn find_contact<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<Contact>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contact = sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;
        Ok(contact)
    }

    pub async fn contact_exists<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM contacts WHERE id = $1 AND tenant_id = $2)")
                .bind(id)
                .bind(tenant_id)
                .fetch_one(executor)
                .await?;
        Ok(exists)
    }

    pub async fn update_contact<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        payload: &UpdateContactPayload,
    ) -> Result<Option<Contact>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contact = sqlx::query_as::<_, Contact>(
            r#"
            UPDATE contacts SET
                account_id = COALESCE($3, account_id),
                first_name = COALESCE($4, first_name),
                last_name = COALESCE($5, last_name),
                email = COALESCE($6, email),
                phone = COALESCE($7, phone),
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(payload.account_id)
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(&payload.email)
        .bind(&payload.phone)
        .fetch_optional(executor)
        .await?;
        Ok(contact)
    }

    pub async fn delete_contact<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    //  LEADS
    // =========================================================================

    pub async fn create_lead<'e, E>(&self, executor: E, tenant_id: Uuid, payload: &LeadPayload) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (tenant_id, account_id, company_name, contact_name, email, phone, source)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(payload.account_id)
        .bind(&payload.company_name)
        .bind(&payload.contact_name)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(&payload.source)
        .fetch_one(executor)
        .await?;
        Ok(lead)
    }

    pub async fn list_leads<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let leads = sqlx::query_as::<_, Lead>(
            r#"
            SELECT * FROM leads
            WHERE tenant_id = $1
              AND ($2::text IS NULL OR company_name ILIKE $2 OR contact_name ILIKE $2 OR email ILIKE $2)
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
        Ok(leads)
    }

    pub async fn count_leads<'e, E>(&self, executor: E, tenant_id: Uuid, search: Option<&str>) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM leads
            WHERE tenant_id = $1
              AND ($2::text IS NULL OR company_name ILIKE $2 OR contact_name ILIKE $2 OR email ILIKE $2)
            "#,
        )
        .bind(tenant_id)
        .bind(search)
        .fetch_one(executor)
        .await?;
        Ok(total)
    }

    pub async fn find_lead<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;
        Ok(lead)
    }

    /// Trava a linha até o fim da transação (conversão).
    pub async fn find_lead_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1 AND tenant_id = $2 FOR UPDATE")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;
        Ok(lead)
    }

    pub async fn update_lead<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        payload: &UpdateLeadPayload,
    ) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            UPDATE leads SET
                account_id = COALESCE($3, account_id),
                company_name = COALESCE($4, company_name),
                contact_name = COALESCE($5, contact_name),
                email = COALESCE($6, email),
                phone = COALESCE($7, phone),
                source = COALESCE($8, source),
                status = COALESCE($9, status),
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(payload.account_id)
        .bind(&payload.company_name)
        .bind(&payload.contact_name)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(&payload.source)
        .bind(payload.status)
        .fetch_optional(executor)
        .await?;
        Ok(lead)
    }

    pub async fn mark_lead_converted<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        account_id: Uuid,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            UPDATE leads SET status = $3, account_id = $4, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(LeadStatus::Converted)
        .bind(account_id)
        .fetch_one(executor)
        .await?;
        Ok(lead)
    }

    pub async fn delete_lead<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    //  NOTES
    // =========================================================================

    pub async fn create_note<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        contact_id: Uuid,
        author_id: Uuid,
        body: &str,
    ) -> Result<Note, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (tenant_id, contact_id, author_id, body)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(contact_id)
        .bind(author_id)
        .bind(body)
        .fetch_one(executor)
        .await?;
        Ok(note)
    }

    pub async fn list_notes<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        contact_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Note>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let notes = sqlx::query_as::<_, Note>(
            r#"
            SELECT * FROM notes
            WHERE tenant_id = $1 AND ($2::uuid IS NULL OR contact_id = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(tenant_id)
        .bind(contact_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;
        Ok(notes)
    }

    pub async fn count_notes<'e, E>(&self, executor: E, tenant_id: Uuid, contact_id: Option<Uuid>) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notes WHERE tenant_id = $1 AND ($2::uuid IS NULL OR contact_id = $2)",
        )
        .bind(tenant_id)
        .bind(contact_id)
        .fetch_one(executor)
        .await?;
        Ok(total)
    }

    pub async fn find_note<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<Note>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let note = sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;
        Ok(note)
    }

    pub async fn update_note<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        body: &str,
    ) -> Result<Option<Note>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let note = sqlx::query_as::<_, Note>(
            "UPDATE notes SET body = $3 WHERE id = $1 AND tenant_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(body)
        .fetch_optional(executor)
        .await?;
        Ok(note)
    }

    pub async fn delete_note<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
