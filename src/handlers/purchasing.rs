// src/handlers/purchasing.rs

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
        rbac::{PermPurchasingWrite, RequirePermission},
    },
    models::purchasing::{
        CreatePurchaseOrderPayload, PurchaseOrder, PurchaseOrderFilter, ReceivePurchaseOrderPayload,
    },
};

// POST /api/v1/purchase-orders
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders",
    tag = "Purchasing",
    request_body = CreatePurchaseOrderPayload,
    responses(
        (status = 201, description = "Pedido de compra aberto", body = PurchaseOrder),
        (status = 400, description = "SKU ou fornecedor inválidos para esta empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_purchase_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermPurchasingWrite>,
    Json(payload): Json<CreatePurchaseOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let order = app_state.purchasing_service.create(user.tenant_id(), &payload).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

// GET /api/v1/purchase-orders
#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders",
    tag = "Purchasing",
    params(PurchaseOrderFilter, PageQuery),
    responses(
        (status = 200, description = "Pedidos de compra", body = Paginated<PurchaseOrder>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_purchase_orders(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(filter): Query<PurchaseOrderFilter>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;
    let page = app_state
        .purchasing_service
        .list(user.tenant_id(), &filter, &query)
        .await?;
    Ok(Json(page))
}

// GET /api/v1/purchase-orders/{id}
#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/{id}",
    tag = "Purchasing",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido encontrado", body = PurchaseOrder),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_purchase_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state.purchasing_service.get(user.tenant_id(), id).await?;
    Ok(Json(order))
}

// POST /api/v1/purchase-orders/{id}/receive
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/receive",
    tag = "Purchasing",
    request_body = ReceivePurchaseOrderPayload,
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Recebido; entrada lançada no razão", body = PurchaseOrder),
        (status = 400, description = "Pedido não está aberto ou posição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn receive_purchase_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermPurchasingWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReceivePurchaseOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state
        .purchasing_service
        .receive(user.tenant_id(), user.user_id(), id, payload.bin_id)
        .await?;
    Ok(Json(order))
}

// POST /api/v1/purchase-orders/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/cancel",
    tag = "Purchasing",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido cancelado", body = PurchaseOrder),
        (status = 400, description = "Pedido não está aberto")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_purchase_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermPurchasingWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state
        .purchasing_service
        .cancel(user.tenant_id(), user.user_id(), id)
        .await?;
    Ok(Json(order))
}
