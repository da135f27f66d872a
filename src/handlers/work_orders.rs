// src/handlers/work_orders.rs

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
        rbac::{PermWorkOrdersWrite, RequirePermission},
    },
    models::work_orders::{
        CreateWorkOrderPayload, UpdateWorkOrderPayload, WorkOrder, WorkOrderFilter, WorkOrderStatusPayload,
    },
};

// GET /api/v1/work-orders
#[utoipa::path(
    get,
    path = "/api/v1/work-orders",
    tag = "Work Orders",
    params(WorkOrderFilter, PageQuery),
    responses(
        (status = 200, description = "Listagem", body = Paginated<WorkOrder>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_work_orders(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(filter): Query<WorkOrderFilter>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;
    let rows = app_state
        .work_order_service
        .list(user.tenant_id(), &filter, &query)
        .await?;
    Ok(Json(rows))
}

// POST /api/v1/work-orders
#[utoipa::path(
    post,
    path = "/api/v1/work-orders",
    tag = "Work Orders",
    request_body = CreateWorkOrderPayload,
    responses(
        (status = 201, description = "Registro criado", body = WorkOrder),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_work_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermWorkOrdersWrite>,
    Json(payload): Json<CreateWorkOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let created = app_state.work_order_service.create(user.tenant_id(), &payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/v1/work-orders/{id}
#[utoipa::path(
    get,
    path = "/api/v1/work-orders/{id}",
    tag = "Work Orders",
    params(("id" = Uuid, Path, description = "ID da ordem de serviço")),
    responses(
        (status = 200, description = "Registro encontrado", body = WorkOrder),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_work_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let found = app_state.work_order_service.get(user.tenant_id(), id).await?;
    Ok(Json(found))
}

// PATCH /api/v1/work-orders/{id}
#[utoipa::path(
    patch,
    path = "/api/v1/work-orders/{id}",
    tag = "Work Orders",
    request_body = UpdateWorkOrderPayload,
    params(("id" = Uuid, Path, description = "ID da ordem de serviço")),
    responses(
        (status = 200, description = "Registro atualizado", body = WorkOrder),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_work_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermWorkOrdersWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWorkOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let updated = app_state.work_order_service.update(user.tenant_id(), id, &payload).await?;
    Ok(Json(updated))
}

// DELETE /api/v1/work-orders/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/work-orders/{id}",
    tag = "Work Orders",
    params(("id" = Uuid, Path, description = "ID da ordem de serviço")),
    responses(
        (status = 204, description = "Registro removido"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_work_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermWorkOrdersWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.work_order_service.delete(user.tenant_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/v1/work-orders/{id}/status
#[utoipa::path(
    post,
    path = "/api/v1/work-orders/{id}/status",
    tag = "Work Orders",
    request_body = WorkOrderStatusPayload,
    params(("id" = Uuid, Path, description = "ID da ordem de serviço")),
    responses(
        (status = 200, description = "Status alterado", body = WorkOrder),
        (status = 400, description = "Transição não permitida")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_work_order_status(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermWorkOrdersWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<WorkOrderStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let work_order = app_state
        .work_order_service
        .change_status(user.tenant_id(), id, payload.status)
        .await?;
    Ok(Json(work_order))
}
