// src/handlers/catalog.rs

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
        rbac::{PermCatalogWrite, RequirePermission},
    },
    models::catalog::{CatalogEntry, CatalogEntryPayload, CatalogFilter, UpdateCatalogEntryPayload},
};

// GET /api/v1/catalog
#[utoipa::path(
    get,
    path = "/api/v1/catalog",
    tag = "Catalog",
    params(CatalogFilter, PageQuery),
    responses(
        (status = 200, description = "Listagem", body = Paginated<CatalogEntry>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_entries(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(filter): Query<CatalogFilter>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;
    let rows = app_state.catalog_service.list(user.tenant_id(), &filter, &query).await?;
    Ok(Json(rows))
}

// POST /api/v1/catalog
#[utoipa::path(
    post,
    path = "/api/v1/catalog",
    tag = "Catalog",
    request_body = CatalogEntryPayload,
    responses(
        (status = 201, description = "Registro criado", body = CatalogEntry),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_entry(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCatalogWrite>,
    Json(payload): Json<CatalogEntryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let created = app_state.catalog_service.create(user.tenant_id(), &payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/v1/catalog/{id}
#[utoipa::path(
    get,
    path = "/api/v1/catalog/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID do serviço")),
    responses(
        (status = 200, description = "Registro encontrado", body = CatalogEntry),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_entry(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let found = app_state.catalog_service.get(user.tenant_id(), id).await?;
    Ok(Json(found))
}

// PATCH /api/v1/catalog/{id}
#[utoipa::path(
    patch,
    path = "/api/v1/catalog/{id}",
    tag = "Catalog",
    request_body = UpdateCatalogEntryPayload,
    params(("id" = Uuid, Path, description = "ID do serviço")),
    responses(
        (status = 200, description = "Registro atualizado", body = CatalogEntry),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_entry(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCatalogWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCatalogEntryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let updated = app_state.catalog_service.update(user.tenant_id(), id, &payload).await?;
    Ok(Json(updated))
}

// DELETE /api/v1/catalog/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/catalog/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID do serviço")),
    responses(
        (status = 204, description = "Registro removido"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_entry(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCatalogWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.catalog_service.delete(user.tenant_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
