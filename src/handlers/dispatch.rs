// src/handlers/dispatch.rs

use axum::{
    extract::{Path, Query, State},
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
        rbac::{PermDispatchWrite, RequirePermission},
    },
    models::dispatch::{
        CreateDispatchSlotPayload, DispatchFilter, DispatchSlot, DispatchStatusPayload, UpdateDispatchSlotPayload,
    },
};

// GET /api/v1/dispatch/slots
#[utoipa::path(
    get,
    path = "/api/v1/dispatch/slots",
    tag = "Dispatch",
    params(DispatchFilter),
    responses(
        (status = 200, description = "Listagem", body = Vec<DispatchSlot>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_slots(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(filter): Query<DispatchFilter>,
) -> Result<impl IntoResponse, AppError> {
    let rows = app_state.dispatch_service.list(user.tenant_id(), &filter).await?;
    Ok(Json(rows))
}

// POST /api/v1/dispatch/slots
#[utoipa::path(
    post,
    path = "/api/v1/dispatch/slots",
    tag = "Dispatch",
    request_body = CreateDispatchSlotPayload,
    responses(
        (status = 201, description = "Registro criado", body = DispatchSlot),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_slot(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermDispatchWrite>,
    Json(payload): Json<CreateDispatchSlotPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let created = app_state.dispatch_service.create(user.tenant_id(), &payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/v1/dispatch/slots/{id}
#[utoipa::path(
    get,
    path = "/api/v1/dispatch/slots/{id}",
    tag = "Dispatch",
    params(("id" = Uuid, Path, description = "ID do agendamento")),
    responses(
        (status = 200, description = "Registro encontrado", body = DispatchSlot),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_slot(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let found = app_state.dispatch_service.get(user.tenant_id(), id).await?;
    Ok(Json(found))
}

// PATCH /api/v1/dispatch/slots/{id}
#[utoipa::path(
    patch,
    path = "/api/v1/dispatch/slots/{id}",
    tag = "Dispatch",
    request_body = UpdateDispatchSlotPayload,
    params(("id" = Uuid, Path, description = "ID do agendamento")),
    responses(
        (status = 200, description = "Registro atualizado", body = DispatchSlot),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_slot(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermDispatchWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDispatchSlotPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let updated = app_state.dispatch_service.update(user.tenant_id(), id, &payload).await?;
    Ok(Json(updated))
}

// DELETE /api/v1/dispatch/slots/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/dispatch/slots/{id}",
    tag = "Dispatch",
    params(("id" = Uuid, Path, description = "ID do agendamento")),
    responses(
        (status = 204, description = "Registro removido"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_slot(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermDispatchWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.dispatch_service.delete(user.tenant_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/v1/dispatch/slots/{id}/status
#[utoipa::path(
    post,
    path = "/api/v1/dispatch/slots/{id}/status",
    tag = "Dispatch",
    request_body = DispatchStatusPayload,
    params(("id" = Uuid, Path, description = "ID do agendamento")),
    responses(
        (status = 200, description = "Status alterado", body = DispatchSlot),
        (status = 400, description = "Agendamento já encerrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_slot_status(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermDispatchWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DispatchStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let slot = app_state
        .dispatch_service
        .change_status(user.tenant_id(), id, payload.status)
        .await?;
    Ok(Json(slot))
}
