// src/handlers/users.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        pagination::{PageQuery, Paginated},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{PermUsersManage, RequirePermission},
    },
    models::auth::{AssignRolesPayload, CreateUserPayload, MeResponse, UpdateUserPayload, User},
};

// GET /api/v1/users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    params(PageQuery),
    responses(
        (status = 200, description = "Usuários do tenant", body = Paginated<User>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;
    let page = app_state.user_service.list(user.tenant_id(), &query).await?;
    Ok(Json(page))
}

// POST /api/v1/users
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Usuário criado", body = MeResponse),
        (status = 400, description = "Dados inválidos ou cargo de outra empresa"),
        (status = 409, description = "E-mail já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermUsersManage>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let created = app_state.user_service.create(user.tenant_id(), &payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/v1/users/{id}
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário com cargos e permissões", body = MeResponse),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_user(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let found = app_state.user_service.get(user.tenant_id(), id).await?;
    Ok(Json(found))
}

// PATCH /api/v1/users/{id}
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    tag = "Users",
    request_body = UpdateUserPayload,
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário atualizado", body = User)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermUsersManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let updated = app_state.user_service.update(user.tenant_id(), id, &payload).await?;
    Ok(Json(updated))
}

// DELETE /api/v1/users/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 204, description = "Usuário removido"),
        (status = 400, description = "Não é possível remover a si mesmo")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_user(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermUsersManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .user_service
        .delete(user.tenant_id(), user.user_id(), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// PUT /api/v1/users/{id}/roles
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/roles",
    tag = "Users",
    request_body = AssignRolesPayload,
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Cargos substituídos", body = MeResponse),
        (status = 400, description = "Cargo de outra empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_roles(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermUsersManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignRolesPayload>,
) -> Result<impl IntoResponse, AppError> {
    let updated = app_state
        .user_service
        .assign_roles(user.tenant_id(), id, &payload.role_ids)
        .await?;
    Ok(Json(updated))
}
