// src/middleware/auth.rs

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use uuid::Uuid;

use crate::{common::error::AppError, config::AppState};

/// Quem está chamando, extraído do JWT.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
}

// O middleware só anexa o contexto. Quem exige login são os extratores abaixo.
pub async fn attach_auth(State(app_state): State<AppState>, mut request: Request, next: Next) -> Response {
    let bearer = request.headers().typed_get::<Authorization<Bearer>>();

    if let Some(Authorization(bearer)) = bearer {
        match app_state.auth_service.validate_token(bearer.token()) {
            Ok(claims) => {
                request.extensions_mut().insert(AuthContext {
                    user_id: claims.sub,
                    tenant_id: claims.tenant_id,
                });
            }
            Err(_) => tracing::debug!("Token ignorado: assinatura inválida ou expirado"),
        }
    }

    next.run(request).await
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub AuthContext);

impl AuthenticatedUser {
    pub fn user_id(&self) -> Uuid {
        self.0.user_id
    }

    pub fn tenant_id(&self) -> Uuid {
        self.0.tenant_id
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .map(AuthenticatedUser)
            .ok_or(AppError::InvalidToken)
    }
}

/// Exige o cargo global SUPER_ADMIN (consultado no banco a cada requisição).
pub struct RequireSuperAdmin(pub AuthContext);

impl<S> FromRequestParts<S> for RequireSuperAdmin
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(ctx) = AuthenticatedUser::from_request_parts(parts, state).await?;
        let app_state = AppState::from_ref(state);

        if !app_state.rbac_service.is_super_admin(ctx.user_id).await? {
            return Err(AppError::Forbidden(
                "Acesso restrito ao administrador da plataforma.".into(),
            ));
        }

        Ok(RequireSuperAdmin(ctx))
    }
}
