// src/services/crm_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageQuery, Paginated},
    },
    db::CrmRepository,
    models::crm::{
        split_full_name, Account, AccountPayload, Contact, ContactPayload, Lead, LeadConversion, LeadPayload,
        LeadStatus, Note, NoteFilter, NotePayload, UpdateAccountPayload, UpdateContactPayload, UpdateLeadPayload,
        UpdateNotePayload,
    },
};

#[derive(Clone)]
pub struct CrmService {
    repo: CrmRepository,
    pool: PgPool,
}

impl CrmService {
    pub fn new(repo: CrmRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    // =========================================================================
    //  1. CONTAS
    // =========================================================================

    pub async fn list_accounts(&self, tenant_id: Uuid, query: &PageQuery) -> Result<Paginated<Account>, AppError> {
        let search = query.search_pattern();
        let mut tx = self.pool.begin().await?;
        let rows = self
            .repo
            .list_accounts(&mut *tx, tenant_id, search.as_deref(), query.page_size(), query.offset())
            .await?;
        let total = self.repo.count_accounts(&mut *tx, tenant_id, search.as_deref()).await?;
        tx.commit().await?;
        Ok(Paginated::new(rows, total, query))
    }

    pub async fn create_account(&self, tenant_id: Uuid, payload: &AccountPayload) -> Result<Account, AppError> {
        self.repo.create_account(&self.pool, tenant_id, payload).await
    }

    pub async fn get_account(&self, tenant_id: Uuid, id: Uuid) -> Result<Account, AppError> {
        self.repo
            .find_account(&self.pool, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Conta"))
    }

    pub async fn update_account(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        payload: &UpdateAccountPayload,
    ) -> Result<Account, AppError> {
        self.repo
            .update_account(&self.pool, tenant_id, id, payload)
            .await?
            .ok_or_else(|| AppError::not_found("Conta"))
    }

    pub async fn delete_account(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let affected = self.repo.delete_account(&self.pool, tenant_id, id).await?;
        if affected == 0 {
            return Err(AppError::not_found("Conta"));
        }
        Ok(())
    }

    // =========================================================================
    //  2. CONTATOS
    // =========================================================================

    pub async fn list_contacts(&self, tenant_id: Uuid, query: &PageQuery) -> Result<Paginated<Contact>, AppError> {
        let search = query.search_pattern();
        let mut tx = self.pool.begin().await?;
        let rows = self
            .repo
            .list_contacts(&mut *tx, tenant_id, search.as_deref(), query.page_size(), query.offset())
            .await?;
        let total = self.repo.count_contacts(&mut *tx, tenant_id, search.as_deref()).await?;
        tx.commit().await?;
        Ok(Paginated::new(rows, total, query))
    }

    pub async fn create_contact(&self, tenant_id: Uuid, payload: &ContactPayload) -> Result<Contact, AppError> {
        self.ensure_account(tenant_id, payload.account_id).await?;
        self.repo.create_contact(&self.pool, tenant_id, payload).await
    }

    pub async fn get_contact(&self, tenant_id: Uuid, id: Uuid) -> Result<Contact, AppError> {
        self.repo
            .find_contact(&self.pool, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Contato"))
    }

    pub async fn update_contact(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        payload: &UpdateContactPayload,
    ) -> Result<Contact, AppError> {
        self.ensure_account(tenant_id, payload.account_id).await?;
        self.repo
            .update_contact(&self.pool, tenant_id, id, payload)
            .await?
            .ok_or_else(|| AppError::not_found("Contato"))
    }

    pub async fn delete_contact(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let affected = self.repo.delete_contact(&self.pool, tenant_id, id).await?;
        if affected == 0 {
            return Err(AppError::not_found("Contato"));
        }
        Ok(())
    }

    // =========================================================================
    //  3. LEADS
    // =========================================================================

    pub async fn list_leads(&self, tenant_id: Uuid, query: &PageQuery) -> Result<Paginated<Lead>, AppError> {
        let search = query.search_pattern();
        let mut tx = self.pool.begin().await?;
        let rows = self
            .repo
            .list_leads(&mut *tx, tenant_id, search.as_deref(), query.page_size(), query.offset())
            .await?;
        let total = self.repo.count_leads(&mut *tx, tenant_id, search.as_deref()).await?;
        tx.commit().await?;
        Ok(Paginated::new(rows, total, query))
    }

    pub async fn create_lead(&self, tenant_id: Uuid, payload: &LeadPayload) -> Result<Lead, AppError> {
        self.ensure_account(tenant_id, payload.account_id).await?;
        self.repo.create_lead(&self.pool, tenant_id, payload).await
    }

    pub async fn get_lead(&self, tenant_id: Uuid, id: Uuid) -> Result<Lead, AppError> {
        self.repo
            .find_lead(&self.pool, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Lead"))
    }

    pub async fn update_lead(&self, tenant_id: Uuid, id: Uuid, payload: &UpdateLeadPayload) -> Result<Lead, AppError> {
        if payload.status == Some(LeadStatus::Converted) {
            return Err(AppError::BadRequest(
                "Use a conversão do lead para marcá-lo como CONVERTED.".into(),
            ));
        }
        self.ensure_account(tenant_id, payload.account_id).await?;
        self.repo
            .update_lead(&self.pool, tenant_id, id, payload)
            .await?
            .ok_or_else(|| AppError::not_found("Lead"))
    }

    pub async fn delete_lead(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let affected = self.repo.delete_lead(&self.pool, tenant_id, id).await?;
        if affected == 0 {
            return Err(AppError::not_found("Lead"));
        }
        Ok(())
    }

    /// Lead -> Conta (+ Contato quando há nome). Um lead só converte uma vez.
    pub async fn convert_lead(&self, tenant_id: Uuid, id: Uuid) -> Result<LeadConversion, AppError> {
        let mut tx = self.pool.begin().await?;

        let lead = self
            .repo
            .find_lead_for_update(&mut *tx, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Lead"))?;

        if lead.status == LeadStatus::Converted {
            return Err(AppError::BadRequest("Este lead já foi convertido.".into()));
        }

        // Lead já vinculado a uma conta reaproveita a conta existente.
        let account = match lead.account_id {
            Some(account_id) => self
                .repo
                .find_account(&mut *tx, tenant_id, account_id)
                .await?
                .ok_or_else(|| AppError::not_found("Conta"))?,
            None => {
                let payload = AccountPayload {
                    name: lead.company_name.clone(),
                    email: lead.email.clone(),
                    phone: lead.phone.clone(),
                    industry: None,
                    address: None,
                };
                self.repo.create_account(&mut *tx, tenant_id, &payload).await?
            }
        };

        let contact = match lead.contact_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            Some(full_name) => {
                let (first_name, last_name) = split_full_name(full_name);
                let payload = ContactPayload {
                    account_id: Some(account.id),
                    first_name,
                    last_name,
                    email: lead.email.clone(),
                    phone: lead.phone.clone(),
                };
                Some(self.repo.create_contact(&mut *tx, tenant_id, &payload).await?)
            }
            None => None,
        };

        let lead = self.repo.mark_lead_converted(&mut *tx, tenant_id, lead.id, account.id).await?;
        tx.commit().await?;

        tracing::info!(%tenant_id, lead_id = %lead.id, account_id = %account.id, "Lead convertido");

        Ok(LeadConversion { lead, account, contact })
    }

    // =========================================================================
    //  4. NOTAS
    // =========================================================================

    pub async fn list_notes(
        &self,
        tenant_id: Uuid,
        filter: &NoteFilter,
        query: &PageQuery,
    ) -> Result<Paginated<Note>, AppError> {
        let mut tx = self.pool.begin().await?;
        let rows = self
            .repo
            .list_notes(&mut *tx, tenant_id, filter.contact_id, query.page_size(), query.offset())
            .await?;
        let total = self.repo.count_notes(&mut *tx, tenant_id, filter.contact_id).await?;
        tx.commit().await?;
        Ok(Paginated::new(rows, total, query))
    }

    pub async fn create_note(&self, tenant_id: Uuid, author_id: Uuid, payload: &NotePayload) -> Result<Note, AppError> {
        if !self.repo.contact_exists(&self.pool, tenant_id, payload.contact_id).await? {
            return Err(AppError::BadRequest("Contato inválido para esta empresa.".into()));
        }
        self.repo
            .create_note(&self.pool, tenant_id, payload.contact_id, author_id, &payload.body)
            .await
    }

    pub async fn get_note(&self, tenant_id: Uuid, id: Uuid) -> Result<Note, AppError> {
        self.repo
            .find_note(&self.pool, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Nota"))
    }

    pub async fn update_note(&self, tenant_id: Uuid, id: Uuid, payload: &UpdateNotePayload) -> Result<Note, AppError> {
        self.repo
            .update_note(&self.pool, tenant_id, id, &payload.body)
            .await?
            .ok_or_else(|| AppError::not_found("Nota"))
    }

    pub async fn delete_note(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let affected = self.repo.delete_note(&self.pool, tenant_id, id).await?;
        if affected == 0 {
            return Err(AppError::not_found("Nota"));
        }
        Ok(())
    }

    async fn ensure_account(&self, tenant_id: Uuid, account_id: Option<Uuid>) -> Result<(), AppError> {
        if let Some(account_id) = account_id {
            if !self.repo.account_exists(&self.pool, tenant_id, account_id).await? {
                return Err(AppError::BadRequest("Conta inválida para esta empresa.".into()));
            }
        }
        Ok(())
    }
}
