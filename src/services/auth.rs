// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{RbacRepository, TenantRepository, UserRepository},
    models::{
        auth::{AuthResponse, Claims, LoginPayload, MeResponse, RegisterPayload},
        rbac::ADMIN_ROLE,
        tenancy::slugify,
    },
};

/// Validade do token de acesso, em segundos.
pub const TOKEN_TTL_SECS: i64 = 3600;

/// Gera o JWT (HS256) com `sub`, `tenantId`, `iat` e `exp`.
pub fn issue_token(secret: &str, user_id: Uuid, tenant_id: Uuid, now: DateTime<Utc>) -> Result<String, AppError> {
    let expires_at = now + Duration::seconds(TOKEN_TTL_SECS);
    let claims = Claims {
        sub: user_id,
        tenant_id,
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?)
}

/// Assinatura inválida, token expirado ou malformado viram `InvalidToken`.
pub fn decode_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|_| AppError::InvalidToken)?;
    Ok(token_data.claims)
}

pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    tenant_repo: TenantRepository,
    rbac_repo: RbacRepository,
    jwt_secret: String,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        tenant_repo: TenantRepository,
        rbac_repo: RbacRepository,
        jwt_secret: String,
        pool: PgPool,
    ) -> Self {
        Self {
            user_repo,
            tenant_repo,
            rbac_repo,
            jwt_secret,
            pool,
        }
    }

    /// Cria empresa + primeiro usuário + cargo ADMIN com todas as permissões.
    pub async fn register(&self, payload: &RegisterPayload) -> Result<AuthResponse, AppError> {
        // 1. Hashing (fora da transação, não toca no banco)
        let hashed_password = hash_password(&payload.password).await?;

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        // 2. Tenant com slug único ("acme", "acme-2", ...)
        let mut slug = slugify(&payload.tenant_name);
        if slug.is_empty() {
            slug = "tenant".to_string();
        }
        let taken = self.tenant_repo.count_slugs_like(&mut *tx, &slug).await?;
        if taken > 0 {
            slug = format!("{}-{}", slug, taken + 1);
        }
        let tenant = self
            .tenant_repo
            .create_tenant(&mut *tx, payload.tenant_name.trim(), &slug)
            .await?;

        // 3. Usuário
        let user = self
            .user_repo
            .create_user(
                &mut *tx,
                tenant.id,
                &payload.email,
                &hashed_password,
                payload.first_name.as_deref(),
                payload.last_name.as_deref(),
                None,
            )
            .await?;

        // 4. Cargo ADMIN de sistema, com o catálogo inteiro de permissões
        let admin = self
            .rbac_repo
            .create_role(&mut *tx, tenant.id, ADMIN_ROLE, Some("Administrador da empresa"), true)
            .await?;
        let all_permissions = self.rbac_repo.list_all_permission_ids(&mut *tx).await?;
        self.rbac_repo
            .assign_permissions(&mut *tx, admin.id, &all_permissions)
            .await?;
        self.rbac_repo
            .assign_user_roles(&mut *tx, user.id, &[admin.id])
            .await?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!(tenant_id = %tenant.id, slug = %tenant.slug, "Nova empresa registrada");

        self.token_response(user.id, tenant.id)
    }

    pub async fn login(&self, payload: &LoginPayload) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(&payload.email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password = payload.password.clone();
        let password_hash = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid || !user.is_active {
            return Err(AppError::InvalidCredentials);
        }

        self.token_response(user.id, user.tenant_id)
    }

    pub async fn me(&self, user_id: Uuid) -> Result<MeResponse, AppError> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Usuário"))?;
        let roles = self.rbac_repo.user_role_names(user_id).await?;
        let permissions = self.rbac_repo.user_permission_slugs(user_id).await?;

        Ok(MeResponse {
            user,
            roles,
            permissions,
        })
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        decode_token(&self.jwt_secret, token)
    }

    fn token_response(&self, user_id: Uuid, tenant_id: Uuid) -> Result<AuthResponse, AppError> {
        let access_token = issue_token(&self.jwt_secret, user_id, tenant_id, Utc::now())?;
        Ok(AuthResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: TOKEN_TTL_SECS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn token_carries_user_and_tenant() {
        let user = Uuid::new_v4();
        let tenant = Uuid::new_v4();
        let token = issue_token(SECRET, user, tenant, Utc::now()).unwrap();

        let claims = decode_token(SECRET, &token).unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.tenant_id, tenant);
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS as usize);
    }

    #[test]
    fn expired_token_is_rejected() {
        let issued = Utc::now() - Duration::hours(3);
        let token = issue_token(SECRET, Uuid::new_v4(), Uuid::new_v4(), issued).unwrap();
        assert!(matches!(decode_token(SECRET, &token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(SECRET, Uuid::new_v4(), Uuid::new_v4(), Utc::now()).unwrap();
        assert!(matches!(decode_token("other", &token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(decode_token(SECRET, "not.a.jwt"), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn hashed_password_verifies() {
        let hashed = hash_password("s3cret-pass").await.unwrap();
        assert!(verify("s3cret-pass", &hashed).unwrap());
        assert!(!verify("wrong", &hashed).unwrap());
    }
}
