// src/handlers/vendors.rs

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
        rbac::{PermVendorsWrite, RequirePermission},
    },
    models::vendors::{
        PerformanceReview, PerformanceReviewPayload, PriceAgreement, PriceAgreementPayload, ReviewOutcome,
        UpdateVendorPayload, Vendor, VendorContact, VendorContactPayload, VendorPayload,
    },
};

// GET /api/v1/vendors
#[utoipa::path(
    get,
    path = "/api/v1/vendors",
    tag = "Vendors",
    params(PageQuery),
    responses(
        (status = 200, description = "Listagem", body = Paginated<Vendor>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_vendors(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;
    let rows = app_state.vendor_service.list(user.tenant_id(), &query).await?;
    Ok(Json(rows))
}

// POST /api/v1/vendors
#[utoipa::path(
    post,
    path = "/api/v1/vendors",
    tag = "Vendors",
    request_body = VendorPayload,
    responses(
        (status = 201, description = "Registro criado", body = Vendor),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_vendor(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermVendorsWrite>,
    Json(payload): Json<VendorPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let created = app_state.vendor_service.create(user.tenant_id(), &payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/v1/vendors/{id}
#[utoipa::path(
    get,
    path = "/api/v1/vendors/{id}",
    tag = "Vendors",
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses(
        (status = 200, description = "Registro encontrado", body = Vendor),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_vendor(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let found = app_state.vendor_service.get(user.tenant_id(), id).await?;
    Ok(Json(found))
}

// PATCH /api/v1/vendors/{id}
#[utoipa::path(
    patch,
    path = "/api/v1/vendors/{id}",
    tag = "Vendors",
    request_body = UpdateVendorPayload,
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses(
        (status = 200, description = "Registro atualizado", body = Vendor),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_vendor(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermVendorsWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVendorPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let updated = app_state.vendor_service.update(user.tenant_id(), id, &payload).await?;
    Ok(Json(updated))
}

// DELETE /api/v1/vendors/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/vendors/{id}",
    tag = "Vendors",
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses(
        (status = 204, description = "Registro removido"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_vendor(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermVendorsWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.vendor_service.delete(user.tenant_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  CONTATOS E ACORDOS DE PREÇO
// =============================================================================

// GET /api/v1/vendors/{id}/contacts
#[utoipa::path(
    get,
    path = "/api/v1/vendors/{id}/contacts",
    tag = "Vendors",
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses(
        (status = 200, description = "Contatos do fornecedor", body = Vec<VendorContact>),
        (status = 404, description = "Fornecedor não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_contacts(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(vendor_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let rows = app_state.vendor_service.list_contacts(user.tenant_id(), vendor_id).await?;
    Ok(Json(rows))
}

// POST /api/v1/vendors/{id}/contacts
#[utoipa::path(
    post,
    path = "/api/v1/vendors/{id}/contacts",
    tag = "Vendors",
    request_body = VendorContactPayload,
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses(
        (status = 201, description = "Contato criado", body = VendorContact),
        (status = 404, description = "Fornecedor não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_contact(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermVendorsWrite>,
    Path(vendor_id): Path<Uuid>,
    Json(payload): Json<VendorContactPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let created = app_state
        .vendor_service
        .add_contact(user.tenant_id(), vendor_id, &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// DELETE /api/v1/vendors/{id}/contacts/{item_id}
#[utoipa::path(
    delete,
    path = "/api/v1/vendors/{id}/contacts/{item_id}",
    tag = "Vendors",
    params(
        ("id" = Uuid, Path, description = "ID do fornecedor"),
        ("item_id" = Uuid, Path, description = "ID do contato")
    ),
    responses(
        (status = 204, description = "Removido"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_contact(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermVendorsWrite>,
    Path((vendor_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .vendor_service
        .remove_contact(user.tenant_id(), vendor_id, item_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/v1/vendors/{id}/agreements
#[utoipa::path(
    get,
    path = "/api/v1/vendors/{id}/agreements",
    tag = "Vendors",
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses(
        (status = 200, description = "Acordos de preço", body = Vec<PriceAgreement>),
        (status = 404, description = "Fornecedor não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_agreements(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(vendor_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let rows = app_state.vendor_service.list_agreements(user.tenant_id(), vendor_id).await?;
    Ok(Json(rows))
}

// POST /api/v1/vendors/{id}/agreements
#[utoipa::path(
    post,
    path = "/api/v1/vendors/{id}/agreements",
    tag = "Vendors",
    request_body = PriceAgreementPayload,
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses(
        (status = 201, description = "Acordo criado", body = PriceAgreement),
        (status = 400, description = "SKU inválido ou vigência invertida"),
        (status = 404, description = "Fornecedor não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_agreement(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermVendorsWrite>,
    Path(vendor_id): Path<Uuid>,
    Json(payload): Json<PriceAgreementPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let created = app_state
        .vendor_service
        .add_agreement(user.tenant_id(), vendor_id, &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// DELETE /api/v1/vendors/{id}/agreements/{item_id}
#[utoipa::path(
    delete,
    path = "/api/v1/vendors/{id}/agreements/{item_id}",
    tag = "Vendors",
    params(
        ("id" = Uuid, Path, description = "ID do fornecedor"),
        ("item_id" = Uuid, Path, description = "ID do acordo")
    ),
    responses(
        (status = 204, description = "Removido"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_agreement(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermVendorsWrite>,
    Path((vendor_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .vendor_service
        .remove_agreement(user.tenant_id(), vendor_id, item_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  AVALIAÇÕES DE DESEMPENHO
// =============================================================================

// GET /api/v1/vendors/{id}/reviews
#[utoipa::path(
    get,
    path = "/api/v1/vendors/{id}/reviews",
    tag = "Vendors",
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses(
        (status = 200, description = "Avaliações, mais recentes primeiro", body = Vec<PerformanceReview>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_reviews(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(vendor_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let reviews = app_state.vendor_service.list_reviews(user.tenant_id(), vendor_id).await?;
    Ok(Json(reviews))
}

// POST /api/v1/vendors/{id}/reviews
#[utoipa::path(
    post,
    path = "/api/v1/vendors/{id}/reviews",
    tag = "Vendors",
    request_body = PerformanceReviewPayload,
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses(
        (status = 201, description = "Avaliação gravada e nota recalculada", body = ReviewOutcome),
        (status = 400, description = "Nota fora de 1..5")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_review(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermVendorsWrite>,
    Path(vendor_id): Path<Uuid>,
    Json(payload): Json<PerformanceReviewPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let outcome = app_state
        .vendor_service
        .add_review(user.tenant_id(), user.user_id(), vendor_id, &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}
