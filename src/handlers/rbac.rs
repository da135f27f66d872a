// src/handlers/rbac.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{PermRolesManage, RequirePermission},
    },
    models::rbac::{CreateRolePayload, Permission, RoleResponse, UpdateRolePayload},
};

// GET /api/v1/roles
#[utoipa::path(
    get,
    path = "/api/v1/roles",
    tag = "RBAC",
    responses(
        (status = 200, description = "Cargos do tenant com suas permissões", body = Vec<RoleResponse>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_roles(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let roles = app_state.rbac_service.list_roles(user.tenant_id()).await?;
    Ok(Json(roles))
}

// POST /api/v1/roles
#[utoipa::path(
    post,
    path = "/api/v1/roles",
    tag = "RBAC",
    request_body = CreateRolePayload,
    responses(
        (status = 201, description = "Cargo criado", body = RoleResponse),
        (status = 400, description = "Permissão desconhecida"),
        (status = 409, description = "Nome já utilizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_role(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermRolesManage>,
    Json(payload): Json<CreateRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let response = app_state
        .rbac_service
        .create_role_with_permissions(user.tenant_id(), &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

// PATCH /api/v1/roles/{id}
#[utoipa::path(
    patch,
    path = "/api/v1/roles/{id}",
    tag = "RBAC",
    request_body = UpdateRolePayload,
    params(("id" = Uuid, Path, description = "ID do cargo")),
    responses(
        (status = 200, description = "Cargo atualizado", body = RoleResponse),
        (status = 400, description = "Cargos de sistema não podem ser editados")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_role(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermRolesManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let response = app_state
        .rbac_service
        .update_role(user.tenant_id(), id, &payload)
        .await?;

    Ok(Json(response))
}

// DELETE /api/v1/roles/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/roles/{id}",
    tag = "RBAC",
    params(("id" = Uuid, Path, description = "ID do cargo")),
    responses(
        (status = 204, description = "Cargo removido"),
        (status = 400, description = "Cargos de sistema não podem ser removidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_role(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermRolesManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.rbac_service.delete_role(user.tenant_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/v1/permissions (Para o frontend saber o que mostrar na tela de criação)
#[utoipa::path(
    get,
    path = "/api/v1/permissions",
    tag = "RBAC",
    responses(
        (status = 200, description = "Catálogo global de permissões", body = Vec<Permission>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_permissions(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let permissions = app_state.rbac_service.list_system_permissions().await?;
    Ok(Json(permissions))
}
