// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{common::error::AppError, config::AppState, middleware::auth::AuthenticatedUser};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// 2. O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // A. Usuário (401 se não houver token válido)
        let AuthenticatedUser(ctx) = AuthenticatedUser::from_request_parts(parts, state).await?;
        let app_state = AppState::from_ref(state);

        // B. Permissão exigida pelo handler
        let required_perm = T::slug();

        // C. Verifica no banco
        let has_permission = app_state
            .rbac_service
            .user_has_permission(ctx.user_id, ctx.tenant_id, required_perm)
            .await?;

        if !has_permission {
            tracing::debug!(user_id = %ctx.user_id, permission = required_perm, "Acesso negado");
            return Err(AppError::Forbidden(format!(
                "Você precisa da permissão '{}' para realizar esta ação.",
                required_perm
            )));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

macro_rules! permission {
    ($name:ident, $slug:literal) => {
        pub struct $name;
        impl PermissionDef for $name {
            fn slug() -> &'static str {
                $slug
            }
        }
    };
}

permission!(PermUsersManage, "users:manage");
permission!(PermRolesManage, "roles:manage");
permission!(PermCrmRead, "crm:read");
permission!(PermCrmWrite, "crm:write");
permission!(PermInventoryRead, "inventory:read");
permission!(PermInventoryWrite, "inventory:write");
permission!(PermPurchasingWrite, "purchasing:write");
permission!(PermWorkOrdersWrite, "work_orders:write");
permission!(PermDispatchWrite, "dispatch:write");
permission!(PermEstimatesWrite, "estimates:write");
permission!(PermVendorsWrite, "vendors:write");
permission!(PermCatalogWrite, "catalog:write");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_types_carry_seeded_slugs() {
        assert_eq!(PermUsersManage::slug(), "users:manage");
        assert_eq!(PermWorkOrdersWrite::slug(), "work_orders:write");
        assert_eq!(PermCatalogWrite::slug(), "catalog:write");
    }
}
