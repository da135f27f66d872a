// src/services/rbac_service.rs

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::RbacRepository,
    models::rbac::{CreateRolePayload, Permission, Role, RoleResponse, UpdateRolePayload},
};

#[derive(Clone)]
pub struct RbacService {
    repo: RbacRepository,
    pool: PgPool,
}

impl RbacService {
    pub fn new(repo: RbacRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn list_roles(&self, tenant_id: Uuid) -> Result<Vec<RoleResponse>, AppError> {
        let mut tx = self.pool.begin().await?;
        let roles = self.repo.list_roles(&mut *tx, tenant_id).await?;
        let pairs = self.repo.role_permission_pairs(&mut *tx, tenant_id).await?;
        tx.commit().await?;

        let mut by_role: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (role_id, slug) in pairs {
            by_role.entry(role_id).or_default().push(slug);
        }

        Ok(roles
            .into_iter()
            .map(|role| {
                let permissions = by_role.remove(&role.id).unwrap_or_default();
                RoleResponse { role, permissions }
            })
            .collect())
    }

    pub async fn create_role_with_permissions(
        &self,
        tenant_id: Uuid,
        payload: &CreateRolePayload,
    ) -> Result<RoleResponse, AppError> {
        // 1. Inicia Transação
        let mut tx = self.pool.begin().await?;

        // 2. Cria o Cargo
        let role = self
            .repo
            .create_role(&mut *tx, tenant_id, payload.name.trim(), payload.description.as_deref(), false)
            .await?;

        // 3. Resolve Slugs ("crm:read") para IDs e salva o vínculo
        let permissions = self.resolve_slugs(&mut tx, &payload.permissions).await?;
        let permission_ids: Vec<Uuid> = permissions.iter().map(|p| p.id).collect();
        if !permission_ids.is_empty() {
            self.repo.assign_permissions(&mut *tx, role.id, &permission_ids).await?;
        }

        // 4. Commit
        tx.commit().await?;

        Ok(RoleResponse {
            role,
            permissions: permissions.into_iter().map(|p| p.slug).collect(),
        })
    }

    pub async fn update_role(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
        payload: &UpdateRolePayload,
    ) -> Result<RoleResponse, AppError> {
        let mut tx = self.pool.begin().await?;

        let existing = self.find_editable(&mut tx, tenant_id, role_id).await?;

        let role = self
            .repo
            .update_role(
                &mut *tx,
                tenant_id,
                existing.id,
                payload.name.as_deref().map(str::trim),
                payload.description.as_deref(),
            )
            .await?
            .ok_or_else(|| AppError::not_found("Cargo"))?;

        if let Some(slugs) = &payload.permissions {
            let permissions = self.resolve_slugs(&mut tx, slugs).await?;
            let ids: Vec<Uuid> = permissions.iter().map(|p| p.id).collect();
            self.repo.clear_permissions(&mut *tx, role.id).await?;
            if !ids.is_empty() {
                self.repo.assign_permissions(&mut *tx, role.id, &ids).await?;
            }
        }

        let permissions = self.repo.role_permission_slugs(&mut *tx, role.id).await?;
        tx.commit().await?;

        Ok(RoleResponse { role, permissions })
    }

    pub async fn delete_role(&self, tenant_id: Uuid, role_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let role = self.find_editable(&mut tx, tenant_id, role_id).await?;
        self.repo.delete_role(&mut *tx, tenant_id, role.id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn list_system_permissions(&self) -> Result<Vec<Permission>, AppError> {
        self.repo.list_all_permissions().await
    }

    pub async fn user_has_permission(&self, user_id: Uuid, tenant_id: Uuid, slug: &str) -> Result<bool, AppError> {
        self.repo.user_has_permission(user_id, tenant_id, slug).await
    }

    pub async fn is_super_admin(&self, user_id: Uuid) -> Result<bool, AppError> {
        self.repo.user_is_super_admin(user_id).await
    }

    // Cargo do tenant que ainda pode ser alterado (is_system = false).
    async fn find_editable(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        tenant_id: Uuid,
        role_id: Uuid,
    ) -> Result<Role, AppError> {
        let role = self
            .repo
            .find_role(&mut **tx, tenant_id, role_id)
            .await?
            .ok_or_else(|| AppError::not_found("Cargo"))?;
        if role.is_system {
            return Err(AppError::BadRequest(
                "Cargos de sistema não podem ser alterados nem removidos.".into(),
            ));
        }
        Ok(role)
    }

    // Todo slug precisa existir no catálogo global.
    async fn resolve_slugs(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        slugs: &[String],
    ) -> Result<Vec<Permission>, AppError> {
        if slugs.is_empty() {
            return Ok(Vec::new());
        }
        let permissions = self.repo.find_permissions_by_slugs(&mut **tx, slugs).await?;
        let unknown = unknown_slugs(slugs, &permissions);
        if !unknown.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Permissões desconhecidas: {}",
                unknown.join(", ")
            )));
        }
        Ok(permissions)
    }
}

fn unknown_slugs(requested: &[String], found: &[Permission]) -> Vec<String> {
    let mut unknown: Vec<String> = requested
        .iter()
        .filter(|slug| !found.iter().any(|p| &p.slug == *slug))
        .cloned()
        .collect();
    unknown.sort();
    unknown.dedup();
    unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perm(slug: &str) -> Permission {
        Permission {
            id: Uuid::new_v4(),
            slug: slug.into(),
            description: String::new(),
            module: "CRM".into(),
        }
    }

    #[test]
    fn reports_each_unknown_slug_once() {
        let requested = vec!["crm:read".to_string(), "crm:fly".to_string(), "crm:fly".to_string()];
        let found = vec![perm("crm:read")];
        assert_eq!(unknown_slugs(&requested, &found), vec!["crm:fly".to_string()]);
    }
}
