// src/handlers/estimates.rs

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
        rbac::{PermEstimatesWrite, RequirePermission},
    },
    models::estimator::{
        AiEstimatePayload, CreateEstimatePayload, CreateProposalPayload, Estimate, EstimateDetail, Proposal,
        ProposalDetail, ProposalStatusPayload,
    },
};

// =============================================================================
//  ÁREA 1: ORÇAMENTOS
// =============================================================================

// POST /api/v1/estimates
#[utoipa::path(
    post,
    path = "/api/v1/estimates",
    tag = "Estimator",
    request_body = CreateEstimatePayload,
    responses(
        (status = 201, description = "Orçamento manual calculado e gravado", body = EstimateDetail),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_estimate(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermEstimatesWrite>,
    Json(payload): Json<CreateEstimatePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let detail = app_state
        .estimator_service
        .create_manual(user.tenant_id(), user.user_id(), &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

// POST /api/v1/estimates/ai
#[utoipa::path(
    post,
    path = "/api/v1/estimates/ai",
    tag = "Estimator",
    request_body = AiEstimatePayload,
    responses(
        (status = 201, description = "Orçamento gerado pelo modelo", body = EstimateDetail),
        (status = 502, description = "Resposta do provedor de IA inválida ou indisponível")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_ai_estimate(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermEstimatesWrite>,
    Json(payload): Json<AiEstimatePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let detail = app_state
        .estimator_service
        .create_with_ai(user.tenant_id(), user.user_id(), &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

// GET /api/v1/estimates
#[utoipa::path(
    get,
    path = "/api/v1/estimates",
    tag = "Estimator",
    params(PageQuery),
    responses(
        (status = 200, description = "Orçamentos", body = Paginated<Estimate>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_estimates(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;
    let page = app_state.estimator_service.list_estimates(user.tenant_id(), &query).await?;
    Ok(Json(page))
}

// GET /api/v1/estimates/{id}
#[utoipa::path(
    get,
    path = "/api/v1/estimates/{id}",
    tag = "Estimator",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    responses(
        (status = 200, description = "Orçamento com itens", body = EstimateDetail),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_estimate(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state.estimator_service.get_estimate(user.tenant_id(), id).await?;
    Ok(Json(detail))
}

// DELETE /api/v1/estimates/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/estimates/{id}",
    tag = "Estimator",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    responses(
        (status = 204, description = "Orçamento removido")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_estimate(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermEstimatesWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.estimator_service.delete_estimate(user.tenant_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/v1/estimates/{id}/convert
#[utoipa::path(
    post,
    path = "/api/v1/estimates/{id}/convert",
    tag = "Estimator",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    responses(
        (status = 201, description = "Proposta criada a partir do orçamento", body = ProposalDetail),
        (status = 404, description = "Orçamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn convert_estimate(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermEstimatesWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let proposal = app_state
        .estimator_service
        .convert_to_proposal(user.tenant_id(), id)
        .await?;
    Ok((StatusCode::CREATED, Json(proposal)))
}

// =============================================================================
//  ÁREA 2: PROPOSTAS
// =============================================================================

// POST /api/v1/proposals
#[utoipa::path(
    post,
    path = "/api/v1/proposals",
    tag = "Proposals",
    request_body = CreateProposalPayload,
    responses(
        (status = 201, description = "Proposta criada", body = ProposalDetail),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_proposal(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermEstimatesWrite>,
    Json(payload): Json<CreateProposalPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let proposal = app_state
        .estimator_service
        .create_proposal(user.tenant_id(), &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(proposal)))
}

// GET /api/v1/proposals
#[utoipa::path(
    get,
    path = "/api/v1/proposals",
    tag = "Proposals",
    params(PageQuery),
    responses(
        (status = 200, description = "Propostas", body = Paginated<Proposal>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_proposals(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;
    let page = app_state.estimator_service.list_proposals(user.tenant_id(), &query).await?;
    Ok(Json(page))
}

// GET /api/v1/proposals/{id}
#[utoipa::path(
    get,
    path = "/api/v1/proposals/{id}",
    tag = "Proposals",
    params(("id" = Uuid, Path, description = "ID da proposta")),
    responses(
        (status = 200, description = "Proposta com itens", body = ProposalDetail),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_proposal(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let proposal = app_state.estimator_service.get_proposal(user.tenant_id(), id).await?;
    Ok(Json(proposal))
}

// POST /api/v1/proposals/{id}/status
#[utoipa::path(
    post,
    path = "/api/v1/proposals/{id}/status",
    tag = "Proposals",
    request_body = ProposalStatusPayload,
    params(("id" = Uuid, Path, description = "ID da proposta")),
    responses(
        (status = 200, description = "Status alterado", body = Proposal),
        (status = 400, description = "Transição não permitida")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_proposal_status(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermEstimatesWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProposalStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let proposal = app_state
        .estimator_service
        .change_proposal_status(user.tenant_id(), id, payload.status)
        .await?;
    Ok(Json(proposal))
}

// DELETE /api/v1/proposals/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/proposals/{id}",
    tag = "Proposals",
    params(("id" = Uuid, Path, description = "ID da proposta")),
    responses(
        (status = 204, description = "Proposta removida")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_proposal(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermEstimatesWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.estimator_service.delete_proposal(user.tenant_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
