// src/handlers/notifications.rs

use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    Stream, StreamExt,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        pagination::{PageQuery, Paginated},
    },
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::notifications::{
        MarkedRead, Notification, NotificationFilter, NotificationPreference, UpdatePreferencePayload,
    },
};

// GET /api/v1/notifications
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    tag = "Notifications",
    params(NotificationFilter, PageQuery),
    responses(
        (status = 200, description = "Notificações do usuário logado", body = Paginated<Notification>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_notifications(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(filter): Query<NotificationFilter>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;
    let page = app_state
        .notification_service
        .list(user.tenant_id(), user.user_id(), &filter, &query)
        .await?;
    Ok(Json(page))
}

// POST /api/v1/notifications/{id}/read
#[utoipa::path(
    post,
    path = "/api/v1/notifications/{id}/read",
    tag = "Notifications",
    params(("id" = Uuid, Path, description = "ID da notificação")),
    responses(
        (status = 200, description = "Notificação marcada como lida", body = Notification),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_read(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let notification = app_state
        .notification_service
        .mark_read(user.tenant_id(), user.user_id(), id)
        .await?;
    Ok(Json(notification))
}

// POST /api/v1/notifications/read-all
#[utoipa::path(
    post,
    path = "/api/v1/notifications/read-all",
    tag = "Notifications",
    responses(
        (status = 200, description = "Quantidade marcada como lida", body = MarkedRead)
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_all_read(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let marked = app_state
        .notification_service
        .mark_all_read(user.tenant_id(), user.user_id())
        .await?;
    Ok(Json(marked))
}

// GET /api/v1/notifications/preferences
#[utoipa::path(
    get,
    path = "/api/v1/notifications/preferences",
    tag = "Notifications",
    responses(
        (status = 200, description = "Canais habilitados", body = NotificationPreference)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_preferences(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let pref = app_state.notification_service.preferences(user.user_id()).await?;
    Ok(Json(pref))
}

// PUT /api/v1/notifications/preferences
#[utoipa::path(
    put,
    path = "/api/v1/notifications/preferences",
    tag = "Notifications",
    request_body = UpdatePreferencePayload,
    responses(
        (status = 200, description = "Preferências gravadas", body = NotificationPreference)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_preferences(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdatePreferencePayload>,
) -> Result<impl IntoResponse, AppError> {
    let pref = app_state
        .notification_service
        .update_preferences(user.tenant_id(), user.user_id(), &payload)
        .await?;
    Ok(Json(pref))
}

// GET /api/v1/notifications/stream
#[utoipa::path(
    get,
    path = "/api/v1/notifications/stream",
    tag = "Notifications",
    responses(
        (status = 200, description = "Canal Server-Sent Events (evento `notification`)", content_type = "text/event-stream")
    ),
    security(("api_jwt" = []))
)]
pub async fn stream_notifications(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let user_id = user.user_id();
    let receiver = app_state.notification_service.subscribe(user_id).await;
    tracing::debug!(%user_id, "Cliente conectado ao canal de notificações");

    let stream = BroadcastStream::new(receiver).filter_map(move |message| match message {
        Ok(notification) => Event::default()
            .event("notification")
            .json_data(&notification)
            .ok()
            .map(Ok),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            // o cliente pode recuperar o que perdeu via GET /notifications
            tracing::warn!(%user_id, skipped, "Cliente lento, notificações descartadas do canal");
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
