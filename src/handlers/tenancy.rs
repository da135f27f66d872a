// src/handlers/tenancy.rs

use axum::{extract::State, Json};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{AuthenticatedUser, RequireSuperAdmin},
    models::tenancy::Tenant,
};

// GET /api/v1/tenants/current
#[utoipa::path(
    get,
    path = "/api/v1/tenants/current",
    tag = "Tenancy",
    responses(
        (status = 200, description = "Empresa do usuário logado", body = Tenant)
    ),
    security(("api_jwt" = []))
)]
pub async fn current_tenant(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Tenant>, AppError> {
    let tenant = app_state.tenant_service.current(user.tenant_id()).await?;
    Ok(Json(tenant))
}

// GET /api/v1/admin/tenants
#[utoipa::path(
    get,
    path = "/api/v1/admin/tenants",
    tag = "Admin",
    responses(
        (status = 200, description = "Todas as empresas da plataforma", body = Vec<Tenant>),
        (status = 403, description = "Apenas SUPER_ADMIN")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_all_tenants(
    State(app_state): State<AppState>,
    _admin: RequireSuperAdmin,
) -> Result<Json<Vec<Tenant>>, AppError> {
    let tenants = app_state.tenant_service.list_all().await?;
    Ok(Json(tenants))
}
