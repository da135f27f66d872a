// src/services/user_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageQuery, Paginated},
    },
    db::{RbacRepository, UserRepository},
    models::auth::{CreateUserPayload, MeResponse, UpdateUserPayload, User},
    services::auth::hash_password,
};

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    rbac_repo: RbacRepository,
    pool: PgPool,
}

impl UserService {
    pub fn new(user_repo: UserRepository, rbac_repo: RbacRepository, pool: PgPool) -> Self {
        Self { user_repo, rbac_repo, pool }
    }

    pub async fn list(&self, tenant_id: Uuid, query: &PageQuery) -> Result<Paginated<User>, AppError> {
        let search = query.search_pattern();
        let mut tx = self.pool.begin().await?;
        let users = self
            .user_repo
            .list(&mut *tx, tenant_id, search.as_deref(), query.page_size(), query.offset())
            .await?;
        let total = self.user_repo.count(&mut *tx, tenant_id, search.as_deref()).await?;
        tx.commit().await?;
        Ok(Paginated::new(users, total, query))
    }

    pub async fn create(&self, tenant_id: Uuid, payload: &CreateUserPayload) -> Result<MeResponse, AppError> {
        let hashed = hash_password(&payload.password).await?;

        let mut tx = self.pool.begin().await?;
        let user = self
            .user_repo
            .create_user(
                &mut *tx,
                tenant_id,
                &payload.email,
                &hashed,
                payload.first_name.as_deref(),
                payload.last_name.as_deref(),
                payload.phone.as_deref(),
            )
            .await?;

        if !payload.role_ids.is_empty() {
            self.ensure_tenant_roles(&mut tx, tenant_id, &payload.role_ids).await?;
            self.rbac_repo.assign_user_roles(&mut *tx, user.id, &payload.role_ids).await?;
        }
        tx.commit().await?;

        tracing::info!(%tenant_id, user_id = %user.id, "Usuário criado");
        self.detail(user).await
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<MeResponse, AppError> {
        let user = self
            .user_repo
            .find_in_tenant(&self.pool, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Usuário"))?;
        self.detail(user).await
    }

    pub async fn update(&self, tenant_id: Uuid, id: Uuid, payload: &UpdateUserPayload) -> Result<User, AppError> {
        let password_hash = match &payload.password {
            Some(p) => Some(hash_password(p).await?),
            None => None,
        };

        self.user_repo
            .update(
                &self.pool,
                tenant_id,
                id,
                payload.first_name.as_deref(),
                payload.last_name.as_deref(),
                payload.phone.as_deref(),
                payload.is_active,
                password_hash.as_deref(),
            )
            .await?
            .ok_or_else(|| AppError::not_found("Usuário"))
    }

    pub async fn delete(&self, tenant_id: Uuid, acting_user: Uuid, id: Uuid) -> Result<(), AppError> {
        if acting_user == id {
            return Err(AppError::BadRequest("Você não pode remover o próprio usuário.".into()));
        }
        let affected = self.user_repo.delete(&self.pool, tenant_id, id).await?;
        if affected == 0 {
            return Err(AppError::not_found("Usuário"));
        }
        Ok(())
    }

    /// Substitui os cargos do usuário.
    pub async fn assign_roles(&self, tenant_id: Uuid, id: Uuid, role_ids: &[Uuid]) -> Result<MeResponse, AppError> {
        let mut tx = self.pool.begin().await?;

        let user = self
            .user_repo
            .find_in_tenant(&mut *tx, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Usuário"))?;

        self.ensure_tenant_roles(&mut tx, tenant_id, role_ids).await?;
        self.rbac_repo.clear_user_roles(&mut *tx, tenant_id, user.id).await?;
        if !role_ids.is_empty() {
            self.rbac_repo.assign_user_roles(&mut *tx, user.id, role_ids).await?;
        }
        tx.commit().await?;

        self.detail(user).await
    }

    async fn ensure_tenant_roles(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        tenant_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<(), AppError> {
        let mut unique = role_ids.to_vec();
        unique.sort();
        unique.dedup();

        let found = self.rbac_repo.count_tenant_roles(&mut **tx, tenant_id, &unique).await?;
        if found != unique.len() as i64 {
            return Err(AppError::BadRequest("Um ou mais cargos não pertencem a esta empresa.".into()));
        }
        Ok(())
    }

    async fn detail(&self, user: User) -> Result<MeResponse, AppError> {
        let roles = self.rbac_repo.user_role_names(user.id).await?;
        let permissions = self.rbac_repo.user_permission_slugs(user.id).await?;
        Ok(MeResponse { user, roles, permissions })
    }
}
