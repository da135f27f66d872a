// src/handlers/inventory.rs

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
        rbac::{PermInventoryRead, PermInventoryWrite, RequirePermission},
    },
    models::inventory::{
        Bin, BinFilter, BinPayload, Forecast, LedgerFilter, LowStockEntry, OnHand, PostLedgerPayload, Sku,
        SkuPayload, SkuWithStock, StockLedgerEntry, UpdateBinPayload, UpdateSkuPayload, UpdateWarehousePayload,
        Warehouse, WarehousePayload,
    },
};

// =============================================================================
//  ÁREA 1: DEPÓSITOS E POSIÇÕES
// =============================================================================

// GET /api/v1/inventory/warehouses
#[utoipa::path(
    get,
    path = "/api/v1/inventory/warehouses",
    tag = "Inventory",
    responses(
        (status = 200, description = "Listagem", body = Vec<Warehouse>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_warehouses(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryRead>,
) -> Result<impl IntoResponse, AppError> {
    let rows = app_state.inventory_service.list_warehouses(user.tenant_id()).await?;
    Ok(Json(rows))
}

// POST /api/v1/inventory/warehouses
#[utoipa::path(
    post,
    path = "/api/v1/inventory/warehouses",
    tag = "Inventory",
    request_body = WarehousePayload,
    responses(
        (status = 201, description = "Registro criado", body = Warehouse),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_warehouse(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryWrite>,
    Json(payload): Json<WarehousePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let created = app_state.inventory_service.create_warehouse(user.tenant_id(), &payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/v1/inventory/warehouses/{id}
#[utoipa::path(
    get,
    path = "/api/v1/inventory/warehouses/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do depósito")),
    responses(
        (status = 200, description = "Registro encontrado", body = Warehouse),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_warehouse(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let found = app_state.inventory_service.get_warehouse(user.tenant_id(), id).await?;
    Ok(Json(found))
}

// PATCH /api/v1/inventory/warehouses/{id}
#[utoipa::path(
    patch,
    path = "/api/v1/inventory/warehouses/{id}",
    tag = "Inventory",
    request_body = UpdateWarehousePayload,
    params(("id" = Uuid, Path, description = "ID do depósito")),
    responses(
        (status = 200, description = "Registro atualizado", body = Warehouse),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_warehouse(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWarehousePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let updated = app_state.inventory_service.update_warehouse(user.tenant_id(), id, &payload).await?;
    Ok(Json(updated))
}

// DELETE /api/v1/inventory/warehouses/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/inventory/warehouses/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do depósito")),
    responses(
        (status = 204, description = "Registro removido"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_warehouse(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.inventory_service.delete_warehouse(user.tenant_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/v1/inventory/bins
#[utoipa::path(
    get,
    path = "/api/v1/inventory/bins",
    tag = "Inventory",
    params(BinFilter),
    responses(
        (status = 200, description = "Listagem", body = Vec<Bin>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_bins(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryRead>,
    Query(filter): Query<BinFilter>,
) -> Result<impl IntoResponse, AppError> {
    let rows = app_state.inventory_service.list_bins(user.tenant_id(), &filter).await?;
    Ok(Json(rows))
}

// POST /api/v1/inventory/bins
#[utoipa::path(
    post,
    path = "/api/v1/inventory/bins",
    tag = "Inventory",
    request_body = BinPayload,
    responses(
        (status = 201, description = "Registro criado", body = Bin),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_bin(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryWrite>,
    Json(payload): Json<BinPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let created = app_state.inventory_service.create_bin(user.tenant_id(), &payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/v1/inventory/bins/{id}
#[utoipa::path(
    get,
    path = "/api/v1/inventory/bins/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID da posição")),
    responses(
        (status = 200, description = "Registro encontrado", body = Bin),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_bin(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let found = app_state.inventory_service.get_bin(user.tenant_id(), id).await?;
    Ok(Json(found))
}

// PATCH /api/v1/inventory/bins/{id}
#[utoipa::path(
    patch,
    path = "/api/v1/inventory/bins/{id}",
    tag = "Inventory",
    request_body = UpdateBinPayload,
    params(("id" = Uuid, Path, description = "ID da posição")),
    responses(
        (status = 200, description = "Registro atualizado", body = Bin),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_bin(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBinPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let updated = app_state.inventory_service.update_bin(user.tenant_id(), id, &payload).await?;
    Ok(Json(updated))
}

// DELETE /api/v1/inventory/bins/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/inventory/bins/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID da posição")),
    responses(
        (status = 204, description = "Registro removido"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_bin(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.inventory_service.delete_bin(user.tenant_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  ÁREA 2: SKUS
// =============================================================================

// GET /api/v1/inventory/skus
#[utoipa::path(
    get,
    path = "/api/v1/inventory/skus",
    tag = "Inventory",
    params(PageQuery),
    responses(
        (status = 200, description = "Listagem", body = Paginated<SkuWithStock>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_skus(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryRead>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;
    let rows = app_state.inventory_service.list_skus(user.tenant_id(), &query).await?;
    Ok(Json(rows))
}

// POST /api/v1/inventory/skus
#[utoipa::path(
    post,
    path = "/api/v1/inventory/skus",
    tag = "Inventory",
    request_body = SkuPayload,
    responses(
        (status = 201, description = "Registro criado", body = Sku),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_sku(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryWrite>,
    Json(payload): Json<SkuPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let created = app_state.inventory_service.create_sku(user.tenant_id(), &payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/v1/inventory/skus/{id}
#[utoipa::path(
    get,
    path = "/api/v1/inventory/skus/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do SKU")),
    responses(
        (status = 200, description = "Registro encontrado", body = Sku),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_sku(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let found = app_state.inventory_service.get_sku(user.tenant_id(), id).await?;
    Ok(Json(found))
}

// PATCH /api/v1/inventory/skus/{id}
#[utoipa::path(
    patch,
    path = "/api/v1/inventory/skus/{id}",
    tag = "Inventory",
    request_body = UpdateSkuPayload,
    params(("id" = Uuid, Path, description = "ID do SKU")),
    responses(
        (status = 200, description = "Registro atualizado", body = Sku),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_sku(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSkuPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let updated = app_state.inventory_service.update_sku(user.tenant_id(), id, &payload).await?;
    Ok(Json(updated))
}

// DELETE /api/v1/inventory/skus/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/inventory/skus/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do SKU")),
    responses(
        (status = 204, description = "Registro removido"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_sku(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.inventory_service.delete_sku(user.tenant_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/v1/inventory/skus/{id}/on-hand
#[utoipa::path(
    get,
    path = "/api/v1/inventory/skus/{id}/on-hand",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do SKU")),
    responses(
        (status = 200, description = "Saldo derivado do razão", body = OnHand),
        (status = 404, description = "SKU não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_on_hand(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let on_hand = app_state.inventory_service.on_hand(user.tenant_id(), id).await?;
    Ok(Json(on_hand))
}

// =============================================================================
//  ÁREA 3: RAZÃO DE ESTOQUE
// =============================================================================

// POST /api/v1/inventory/ledger
#[utoipa::path(
    post,
    path = "/api/v1/inventory/ledger",
    tag = "Inventory",
    request_body = PostLedgerPayload,
    responses(
        (status = 201, description = "Movimento lançado", body = StockLedgerEntry),
        (status = 400, description = "SKU ou posição inválidos para esta empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn post_ledger(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryWrite>,
    Json(payload): Json<PostLedgerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let entry = app_state
        .inventory_service
        .post_ledger(user.tenant_id(), user.user_id(), &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

// GET /api/v1/inventory/ledger
#[utoipa::path(
    get,
    path = "/api/v1/inventory/ledger",
    tag = "Inventory",
    params(LedgerFilter, PageQuery),
    responses(
        (status = 200, description = "Movimentos, mais recentes primeiro", body = Paginated<StockLedgerEntry>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_ledger(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryRead>,
    Query(filter): Query<LedgerFilter>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;
    let page = app_state
        .inventory_service
        .list_ledger(user.tenant_id(), &filter, &query)
        .await?;
    Ok(Json(page))
}

// GET /api/v1/inventory/low-stock
#[utoipa::path(
    get,
    path = "/api/v1/inventory/low-stock",
    tag = "Inventory",
    responses(
        (status = 200, description = "SKUs no ponto de pedido ou abaixo", body = Vec<LowStockEntry>)
    ),
    security(("api_jwt" = []))
)]
pub async fn low_stock(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryRead>,
) -> Result<impl IntoResponse, AppError> {
    let rows = app_state.inventory_service.low_stock(user.tenant_id()).await?;
    Ok(Json(rows))
}

// =============================================================================
//  ÁREA 4: PREVISÃO DE DEMANDA
// =============================================================================

// POST /api/v1/inventory/forecasts/run
#[utoipa::path(
    post,
    path = "/api/v1/inventory/forecasts/run",
    tag = "Inventory",
    responses(
        (status = 200, description = "Previsões recalculadas para todos os SKUs", body = Vec<Forecast>)
    ),
    security(("api_jwt" = []))
)]
pub async fn run_forecasts(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryWrite>,
) -> Result<impl IntoResponse, AppError> {
    let forecasts = app_state.forecast_service.run_for_tenant(user.tenant_id()).await?;
    Ok(Json(forecasts))
}

// GET /api/v1/inventory/forecasts
#[utoipa::path(
    get,
    path = "/api/v1/inventory/forecasts",
    tag = "Inventory",
    responses(
        (status = 200, description = "Previsões gravadas", body = Vec<Forecast>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_forecasts(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryRead>,
) -> Result<impl IntoResponse, AppError> {
    let forecasts = app_state.forecast_service.list_forecasts(user.tenant_id()).await?;
    Ok(Json(forecasts))
}
