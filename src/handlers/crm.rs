// src/handlers/crm.rs

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
        rbac::{PermCrmRead, PermCrmWrite, RequirePermission},
    },
    models::crm::{
        Account, AccountPayload, Contact, ContactPayload, Lead, LeadConversion, LeadPayload, Note, NoteFilter,
        NotePayload, UpdateAccountPayload, UpdateContactPayload, UpdateLeadPayload, UpdateNotePayload,
    },
};

// =============================================================================
//  CONTAS
// =============================================================================

// GET /api/v1/crm/accounts
#[utoipa::path(
    get,
    path = "/api/v1/crm/accounts",
    tag = "CRM",
    params(PageQuery),
    responses(
        (status = 200, description = "Listagem paginada", body = Paginated<Account>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_accounts(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCrmRead>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;
    let page = app_state.crm_service.list_accounts(user.tenant_id(), &query).await?;
    Ok(Json(page))
}

// POST /api/v1/crm/accounts
#[utoipa::path(
    post,
    path = "/api/v1/crm/accounts",
    tag = "CRM",
    request_body = AccountPayload,
    responses(
        (status = 201, description = "Registro criado", body = Account),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_account(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCrmWrite>,
    Json(payload): Json<AccountPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let created = app_state.crm_service.create_account(user.tenant_id(), &payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/v1/crm/accounts/{id}
#[utoipa::path(
    get,
    path = "/api/v1/crm/accounts/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID da conta")),
    responses(
        (status = 200, description = "Registro encontrado", body = Account),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_account(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCrmRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let found = app_state.crm_service.get_account(user.tenant_id(), id).await?;
    Ok(Json(found))
}

// PATCH /api/v1/crm/accounts/{id}
#[utoipa::path(
    patch,
    path = "/api/v1/crm/accounts/{id}",
    tag = "CRM",
    request_body = UpdateAccountPayload,
    params(("id" = Uuid, Path, description = "ID da conta")),
    responses(
        (status = 200, description = "Registro atualizado", body = Account),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_account(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCrmWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAccountPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let updated = app_state.crm_service.update_account(user.tenant_id(), id, &payload).await?;
    Ok(Json(updated))
}

// DELETE /api/v1/crm/accounts/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/crm/accounts/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID da conta")),
    responses(
        (status = 204, description = "Registro removido"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_account(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCrmWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.crm_service.delete_account(user.tenant_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  CONTATOS
// =============================================================================

// GET /api/v1/crm/contacts
#[utoipa::path(
    get,
    path = "/api/v1/crm/contacts",
    tag = "CRM",
    params(PageQuery),
    responses(
        (status = 200, description = "Listagem paginada", body = Paginated<Contact>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_contacts(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCrmRead>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;
    let page = app_state.crm_service.list_contacts(user.tenant_id(), &query).await?;
    Ok(Json(page))
}

// POST /api/v1/crm/contacts
#[utoipa::path(
    post,
    path = "/api/v1/crm/contacts",
    tag = "CRM",
    request_body = ContactPayload,
    responses(
        (status = 201, description = "Registro criado", body = Contact),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_contact(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCrmWrite>,
    Json(payload): Json<ContactPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let created = app_state.crm_service.create_contact(user.tenant_id(), &payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/v1/crm/contacts/{id}
#[utoipa::path(
    get,
    path = "/api/v1/crm/contacts/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID da contato")),
    responses(
        (status = 200, description = "Registro encontrado", body = Contact),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_contact(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCrmRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let found = app_state.crm_service.get_contact(user.tenant_id(), id).await?;
    Ok(Json(found))
}

// PATCH /api/v1/crm/contacts/{id}
#[utoipa::path(
    patch,
    path = "/api/v1/crm/contacts/{id}",
    tag = "CRM",
    request_body = UpdateContactPayload,
    params(("id" = Uuid, Path, description = "ID da contato")),
    responses(
        (status = 200, description = "Registro atualizado", body = Contact),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_contact(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCrmWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateContactPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let updated = app_state.crm_service.update_contact(user.tenant_id(), id, &payload).await?;
    Ok(Json(updated))
}

// DELETE /api/v1/crm/contacts/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/crm/contacts/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID da contato")),
    responses(
        (status = 204, description = "Registro removido"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_contact(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCrmWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.crm_service.delete_contact(user.tenant_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  LEADS
// =============================================================================

// GET /api/v1/crm/leads
#[utoipa::path(
    get,
    path = "/api/v1/crm/leads",
    tag = "CRM",
    params(PageQuery),
    responses(
        (status = 200, description = "Listagem paginada", body = Paginated<Lead>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCrmRead>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;
    let page = app_state.crm_service.list_leads(user.tenant_id(), &query).await?;
    Ok(Json(page))
}

// POST /api/v1/crm/leads
#[utoipa::path(
    post,
    path = "/api/v1/crm/leads",
    tag = "CRM",
    request_body = LeadPayload,
    responses(
        (status = 201, description = "Registro criado", body = Lead),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_lead(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCrmWrite>,
    Json(payload): Json<LeadPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let created = app_state.crm_service.create_lead(user.tenant_id(), &payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/v1/crm/leads/{id}
#[utoipa::path(
    get,
    path = "/api/v1/crm/leads/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Registro encontrado", body = Lead),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_lead(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCrmRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let found = app_state.crm_service.get_lead(user.tenant_id(), id).await?;
    Ok(Json(found))
}

// PATCH /api/v1/crm/leads/{id}
#[utoipa::path(
    patch,
    path = "/api/v1/crm/leads/{id}",
    tag = "CRM",
    request_body = UpdateLeadPayload,
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Registro atualizado", body = Lead),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_lead(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCrmWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLeadPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let updated = app_state.crm_service.update_lead(user.tenant_id(), id, &payload).await?;
    Ok(Json(updated))
}

// DELETE /api/v1/crm/leads/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/crm/leads/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 204, description = "Registro removido"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_lead(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCrmWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.crm_service.delete_lead(user.tenant_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/v1/crm/leads/{id}/convert
#[utoipa::path(
    post,
    path = "/api/v1/crm/leads/{id}/convert",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Lead convertido em conta (e contato)", body = LeadConversion),
        (status = 400, description = "Lead já convertido")
    ),
    security(("api_jwt" = []))
)]
pub async fn convert_lead(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCrmWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let conversion = app_state.crm_service.convert_lead(user.tenant_id(), id).await?;
    Ok(Json(conversion))
}

// =============================================================================
//  NOTAS
// =============================================================================

// GET /api/v1/crm/notes
#[utoipa::path(
    get,
    path = "/api/v1/crm/notes",
    tag = "CRM",
    params(NoteFilter, PageQuery),
    responses(
        (status = 200, description = "Notas (opcionalmente de um contato)", body = Paginated<Note>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_notes(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCrmRead>,
    Query(filter): Query<NoteFilter>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;
    let page = app_state
        .crm_service
        .list_notes(user.tenant_id(), &filter, &query)
        .await?;
    Ok(Json(page))
}

// POST /api/v1/crm/notes
#[utoipa::path(
    post,
    path = "/api/v1/crm/notes",
    tag = "CRM",
    request_body = NotePayload,
    responses(
        (status = 201, description = "Nota criada", body = Note),
        (status = 400, description = "Contato inválido para esta empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_note(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCrmWrite>,
    Json(payload): Json<NotePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let note = app_state
        .crm_service
        .create_note(user.tenant_id(), user.user_id(), &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(note)))
}

// GET /api/v1/crm/notes/{id}
#[utoipa::path(
    get,
    path = "/api/v1/crm/notes/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID da nota")),
    responses(
        (status = 200, description = "Nota encontrada", body = Note),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_note(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCrmRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let note = app_state.crm_service.get_note(user.tenant_id(), id).await?;
    Ok(Json(note))
}

// PATCH /api/v1/crm/notes/{id}
#[utoipa::path(
    patch,
    path = "/api/v1/crm/notes/{id}",
    tag = "CRM",
    request_body = UpdateNotePayload,
    params(("id" = Uuid, Path, description = "ID da nota")),
    responses(
        (status = 200, description = "Nota atualizada", body = Note)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_note(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCrmWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateNotePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let note = app_state.crm_service.update_note(user.tenant_id(), id, &payload).await?;
    Ok(Json(note))
}

// DELETE /api/v1/crm/notes/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/crm/notes/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID da nota")),
    responses(
        (status = 204, description = "Nota removida")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_note(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCrmWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.crm_service.delete_note(user.tenant_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
