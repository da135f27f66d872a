// src/handlers/documents.rs

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{common::error::AppError, config::AppState, middleware::auth::AuthenticatedUser};

// GET /api/v1/proposals/{id}/pdf
#[utoipa::path(
    get,
    path = "/api/v1/proposals/{id}/pdf",
    tag = "Proposals",
    params(("id" = Uuid, Path, description = "ID da proposta")),
    responses(
        (status = 200, description = "PDF da proposta", content_type = "application/pdf"),
        (status = 404, description = "Proposta não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn proposal_pdf(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(proposal_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let pdf_bytes = app_state
        .document_service
        .proposal_pdf(user.tenant_id(), proposal_id)
        .await?;

    // Configura os Headers para o navegador baixar ou mostrar o PDF
    let disposition = format!("inline; filename=\"proposta_{}.pdf\"", proposal_id);
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, disposition),
    ];

    Ok((headers, pdf_bytes).into_response())
}
