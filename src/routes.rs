// src/routes.rs

use std::path::PathBuf;

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
    Router,
};
use tower::ServiceExt;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    common::error::AppError, config::AppState, docs::ApiDoc, handlers, middleware::auth::attach_auth,
};

/// Monta a aplicação inteira: API em `/api/v1`, documentação e o front-end estático.
pub fn create_router(app_state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/me", get(handlers::auth::get_me));

    let user_routes = Router::new()
        .route("/", get(handlers::users::list_users).post(handlers::users::create_user))
        .route(
            "/{id}",
            get(handlers::users::get_user)
                .patch(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route("/{id}/roles", put(handlers::users::assign_roles));

    let role_routes = Router::new()
        .route("/", get(handlers::rbac::list_roles).post(handlers::rbac::create_role))
        .route(
            "/{id}",
            patch(handlers::rbac::update_role).delete(handlers::rbac::delete_role),
        );

    let crm_routes = Router::new()
        .route("/accounts", get(handlers::crm::list_accounts).post(handlers::crm::create_account))
        .route(
            "/accounts/{id}",
            get(handlers::crm::get_account)
                .patch(handlers::crm::update_account)
                .delete(handlers::crm::delete_account),
        )
        .route("/contacts", get(handlers::crm::list_contacts).post(handlers::crm::create_contact))
        .route(
            "/contacts/{id}",
            get(handlers::crm::get_contact)
                .patch(handlers::crm::update_contact)
                .delete(handlers::crm::delete_contact),
        )
        .route("/leads", get(handlers::crm::list_leads).post(handlers::crm::create_lead))
        .route(
            "/leads/{id}",
            get(handlers::crm::get_lead)
                .patch(handlers::crm::update_lead)
                .delete(handlers::crm::delete_lead),
        )
        .route("/leads/{id}/convert", post(handlers::crm::convert_lead))
        .route("/notes", get(handlers::crm::list_notes).post(handlers::crm::create_note))
        .route(
            "/notes/{id}",
            get(handlers::crm::get_note)
                .patch(handlers::crm::update_note)
                .delete(handlers::crm::delete_note),
        );

    let inventory_routes = Router::new()
        .route(
            "/warehouses",
            get(handlers::inventory::list_warehouses).post(handlers::inventory::create_warehouse),
        )
        .route(
            "/warehouses/{id}",
            get(handlers::inventory::get_warehouse)
                .patch(handlers::inventory::update_warehouse)
                .delete(handlers::inventory::delete_warehouse),
        )
        .route("/bins", get(handlers::inventory::list_bins).post(handlers::inventory::create_bin))
        .route(
            "/bins/{id}",
            get(handlers::inventory::get_bin)
                .patch(handlers::inventory::update_bin)
                .delete(handlers::inventory::delete_bin),
        )
        .route("/skus", get(handlers::inventory::list_skus).post(handlers::inventory::create_sku))
        .route(
            "/skus/{id}",
            get(handlers::inventory::get_sku)
                .patch(handlers::inventory::update_sku)
                .delete(handlers::inventory::delete_sku),
        )
        .route("/skus/{id}/on-hand", get(handlers::inventory::get_on_hand))
        .route(
            "/ledger",
            get(handlers::inventory::list_ledger).post(handlers::inventory::post_ledger),
        )
        .route("/low-stock", get(handlers::inventory::low_stock))
        .route("/forecasts", get(handlers::inventory::list_forecasts))
        .route("/forecasts/run", post(handlers::inventory::run_forecasts));

    let purchasing_routes = Router::new()
        .route(
            "/",
            get(handlers::purchasing::list_purchase_orders).post(handlers::purchasing::create_purchase_order),
        )
        .route("/{id}", get(handlers::purchasing::get_purchase_order))
        .route("/{id}/receive", post(handlers::purchasing::receive_purchase_order))
        .route("/{id}/cancel", post(handlers::purchasing::cancel_purchase_order));

    let work_order_routes = Router::new()
        .route(
            "/",
            get(handlers::work_orders::list_work_orders).post(handlers::work_orders::create_work_order),
        )
        .route(
            "/{id}",
            get(handlers::work_orders::get_work_order)
                .patch(handlers::work_orders::update_work_order)
                .delete(handlers::work_orders::delete_work_order),
        )
        .route("/{id}/status", post(handlers::work_orders::change_work_order_status));

    let dispatch_routes = Router::new()
        .route("/slots", get(handlers::dispatch::list_slots).post(handlers::dispatch::create_slot))
        .route(
            "/slots/{id}",
            get(handlers::dispatch::get_slot)
                .patch(handlers::dispatch::update_slot)
                .delete(handlers::dispatch::delete_slot),
        )
        .route("/slots/{id}/status", post(handlers::dispatch::change_slot_status));

    let estimate_routes = Router::new()
        .route(
            "/",
            get(handlers::estimates::list_estimates).post(handlers::estimates::create_estimate),
        )
        .route("/ai", post(handlers::estimates::create_ai_estimate))
        .route(
            "/{id}",
            get(handlers::estimates::get_estimate).delete(handlers::estimates::delete_estimate),
        )
        .route("/{id}/convert", post(handlers::estimates::convert_estimate));

    let proposal_routes = Router::new()
        .route(
            "/",
            get(handlers::estimates::list_proposals).post(handlers::estimates::create_proposal),
        )
        .route(
            "/{id}",
            get(handlers::estimates::get_proposal).delete(handlers::estimates::delete_proposal),
        )
        .route("/{id}/status", post(handlers::estimates::change_proposal_status))
        .route("/{id}/pdf", get(handlers::documents::proposal_pdf));

    let vendor_routes = Router::new()
        .route("/", get(handlers::vendors::list_vendors).post(handlers::vendors::create_vendor))
        .route(
            "/{id}",
            get(handlers::vendors::get_vendor)
                .patch(handlers::vendors::update_vendor)
                .delete(handlers::vendors::delete_vendor),
        )
        .route(
            "/{id}/contacts",
            get(handlers::vendors::list_contacts).post(handlers::vendors::add_contact),
        )
        .route(
            "/{id}/contacts/{item_id}",
            delete(handlers::vendors::remove_contact),
        )
        .route(
            "/{id}/agreements",
            get(handlers::vendors::list_agreements).post(handlers::vendors::add_agreement),
        )
        .route(
            "/{id}/agreements/{item_id}",
            delete(handlers::vendors::remove_agreement),
        )
        .route(
            "/{id}/reviews",
            get(handlers::vendors::list_reviews).post(handlers::vendors::add_review),
        );

    let catalog_routes = Router::new()
        .route("/", get(handlers::catalog::list_entries).post(handlers::catalog::create_entry))
        .route(
            "/{id}",
            get(handlers::catalog::get_entry)
                .patch(handlers::catalog::update_entry)
                .delete(handlers::catalog::delete_entry),
        );

    let notification_routes = Router::new()
        .route("/", get(handlers::notifications::list_notifications))
        .route("/read-all", post(handlers::notifications::mark_all_read))
        .route(
            "/preferences",
            get(handlers::notifications::get_preferences).put(handlers::notifications::update_preferences),
        )
        .route("/stream", get(handlers::notifications::stream_notifications))
        .route("/{id}/read", post(handlers::notifications::mark_read));

    // O token é lido uma vez aqui; cada handler decide se exige login/permissão.
    let api = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/metrics", get(handlers::health::metrics))
        .route("/permissions", get(handlers::rbac::list_permissions))
        .route("/tenants/current", get(handlers::tenancy::current_tenant))
        .route("/admin/tenants", get(handlers::tenancy::list_all_tenants))
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/roles", role_routes)
        .nest("/crm", crm_routes)
        .nest("/inventory", inventory_routes)
        .nest("/purchase-orders", purchasing_routes)
        .nest("/work-orders", work_order_routes)
        .nest("/dispatch", dispatch_routes)
        .nest("/estimates", estimate_routes)
        .nest("/proposals", proposal_routes)
        .nest("/vendors", vendor_routes)
        .nest("/catalog", catalog_routes)
        .nest("/notifications", notification_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), attach_auth));

    let cors = cors_layer(&app_state);

    Router::new()
        .nest("/api/v1", api)
        .merge(SwaggerUi::new("/api/v1/docs").url("/api/v1/openapi.json", ApiDoc::openapi()))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

fn cors_layer(app_state: &AppState) -> CorsLayer {
    if !app_state.config.is_production() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = app_state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Origem CORS inválida ignorada");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// `/api/...` sem rota vira o 404 em JSON; o resto é o SPA (arquivo estático ou index.html).
async fn fallback(State(app_state): State<AppState>, request: Request) -> Response {
    let path = request.uri().path();
    if path == "/api" || path.starts_with("/api/") {
        return AppError::RouteNotFound {
            method: request.method().to_string(),
            path: path.to_string(),
        }
        .into_response();
    }

    let dist = PathBuf::from(&app_state.config.frontend_dist);
    let spa = ServeDir::new(&dist).fallback(ServeFile::new(dist.join("index.html")));

    match spa.oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}
