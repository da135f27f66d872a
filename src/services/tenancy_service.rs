// src/services/tenancy_service.rs

use uuid::Uuid;

use crate::{common::error::AppError, db::TenantRepository, models::tenancy::Tenant};

#[derive(Clone)]
pub struct TenantService {
    tenant_repo: TenantRepository,
}

impl TenantService {
    pub fn new(tenant_repo: TenantRepository) -> Self {
        Self { tenant_repo }
    }

    /// A empresa do usuário logado.
    pub async fn current(&self, tenant_id: Uuid) -> Result<Tenant, AppError> {
        self.tenant_repo
            .find_by_id(tenant_id)
            .await?
            .ok_or_else(|| AppError::not_found("Tenant"))
    }

    /// Visão da plataforma (apenas SUPER_ADMIN chega aqui).
    pub async fn list_all(&self) -> Result<Vec<Tenant>, AppError> {
        self.tenant_repo.list_all().await
    }
}
