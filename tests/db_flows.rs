// tests/db_flows.rs
//
// Fluxos ponta a ponta contra um Postgres real:
//   DATABASE_URL=postgres://... cargo test --test db_flows -- --ignored

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal_macros::dec;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use opsnex::{
    common::{error::AppError, pagination::PageQuery},
    config::{AppConfig, AppState},
    models::{
        crm::LeadStatus,
        notifications::{NotificationFilter, NotificationKind},
        purchasing::PurchaseOrderStatus,
        work_orders::WorkOrderStatus,
    },
    services::{auth::decode_token, llm::LlmClient},
};

const SECRET: &str = "db-flows-secret";

struct CannedLlm(&'static str);

#[async_trait]
impl LlmClient for CannedLlm {
    async fn complete_json(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String, AppError> {
        Ok(self.0.to_string())
    }
}

const AI_REPLY: &str = r#"{
    "title": "Troca de condensadora 3TR",
    "lineItems": [
        { "description": "Condensadora 3TR", "quantity": 1, "unitPrice": 2400 },
        { "description": "Mão de obra", "quantity": 6, "unitPrice": 95 }
    ],
    "profitMargin": 20,
    "taxRate": 5
}"#;

struct Ctx {
    state: AppState,
    tenant_id: Uuid,
    user_id: Uuid,
}

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL");
    let pool = PgPoolOptions::new().max_connections(5).connect(&url).await.unwrap();
    sqlx::migrate!().run(&pool).await.unwrap();
    pool
}

async fn setup() -> Ctx {
    let pool = pool().await;
    let vars = [
        ("DATABASE_URL".to_string(), std::env::var("DATABASE_URL").unwrap()),
        ("JWT_SECRET".to_string(), SECRET.to_string()),
    ]
    .into_iter()
    .collect();
    let config = AppConfig::from_vars(&vars).unwrap();
    let state = AppState::with_pool(pool, config, Arc::new(CannedLlm(AI_REPLY)));

    let register = payload(json!({
        "tenantName": format!("Polar Air {}", Uuid::new_v4()),
        "email": format!("owner+{}@polarair.test", Uuid::new_v4()),
        "password": "s3cret-pass",
        "firstName": "Ana"
    }));
    let auth = state.auth_service.register(&register).await.unwrap();
    let claims = decode_token(SECRET, &auth.access_token).unwrap();

    Ctx {
        state,
        tenant_id: claims.tenant_id,
        user_id: claims.sub,
    }
}

fn payload<T: DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).unwrap()
}

/// Depósito + posição + SKU prontos para movimentar.
async fn stock_fixture(ctx: &Ctx) -> (Uuid, Uuid) {
    let inventory = &ctx.state.inventory_service;
    let warehouse = inventory
        .create_warehouse(ctx.tenant_id, &payload(json!({ "name": "Central" })))
        .await
        .unwrap();
    let bin = inventory
        .create_bin(ctx.tenant_id, &payload(json!({ "warehouseId": warehouse.id, "code": "A-01" })))
        .await
        .unwrap();
    let sku = inventory
        .create_sku(
            ctx.tenant_id,
            &payload(json!({ "code": format!("FLT-{}", Uuid::new_v4()), "name": "Filtro 20x25" })),
        )
        .await
        .unwrap();
    (sku.id, bin.id)
}

async fn post(ctx: &Ctx, sku_id: Uuid, bin_id: Uuid, direction: &str, quantity: i64) {
    ctx.state
        .inventory_service
        .post_ledger(
            ctx.tenant_id,
            ctx.user_id,
            &payload(json!({ "skuId": sku_id, "binId": bin_id, "direction": direction, "quantity": quantity })),
        )
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn registered_admin_holds_every_permission() {
    let ctx = setup().await;
    let me = ctx.state.auth_service.me(ctx.user_id).await.unwrap();

    assert_eq!(me.roles, vec!["ADMIN".to_string()]);
    assert!(me.permissions.contains(&"users:manage".to_string()));
    assert!(me.permissions.contains(&"catalog:write".to_string()));
    assert!(
        ctx.state
            .rbac_service
            .user_has_permission(ctx.user_id, ctx.tenant_id, "dispatch:write")
            .await
            .unwrap()
    );
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn on_hand_and_forecast_follow_the_ledger() {
    let ctx = setup().await;
    let (sku_id, bin_id) = stock_fixture(&ctx).await;

    post(&ctx, sku_id, bin_id, "IN", 100).await;
    post(&ctx, sku_id, bin_id, "OUT", 30).await;

    let on_hand = ctx.state.inventory_service.on_hand(ctx.tenant_id, sku_id).await.unwrap();
    assert_eq!(on_hand.on_hand, dec!(70));

    let forecasts = ctx.state.forecast_service.run_for_tenant(ctx.tenant_id).await.unwrap();
    let forecast = forecasts.iter().find(|f| f.sku_id == sku_id).unwrap();
    assert_eq!(forecast.avg_daily_demand, dec!(1));
    assert_eq!(forecast.reorder_point, dec!(11.55));
    assert_eq!(forecast.suggested_order_qty, dec!(12));

    let low = ctx.state.inventory_service.low_stock(ctx.tenant_id).await.unwrap();
    assert!(low.iter().all(|entry| entry.sku_id != sku_id));

    post(&ctx, sku_id, bin_id, "OUT", 60).await;
    let low = ctx.state.inventory_service.low_stock(ctx.tenant_id).await.unwrap();
    assert!(low.iter().any(|entry| entry.sku_id == sku_id && entry.on_hand == dec!(10)));
}

/// Movimento com data retroativa, direto na tabela.
async fn post_backdated(ctx: &Ctx, sku_id: Uuid, bin_id: Uuid, quantity: i64, days_ago: i32) {
    sqlx::query(
        r#"
        INSERT INTO stock_ledger (tenant_id, sku_id, bin_id, direction, quantity, created_at)
        VALUES ($1, $2, $3, 'OUT', $4, NOW() - make_interval(days => $5))
        "#,
    )
    .bind(ctx.tenant_id)
    .bind(sku_id)
    .bind(bin_id)
    .bind(rust_decimal::Decimal::from(quantity))
    .bind(days_ago)
    .execute(&ctx.state.db_pool)
    .await
    .unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn forecast_uses_thirty_latest_rows_within_sixty_days() {
    let ctx = setup().await;
    let (busy_sku, bin_id) = stock_fixture(&ctx).await;

    // 35 saídas recentes: só as 30 últimas entram.
    post(&ctx, busy_sku, bin_id, "IN", 1000).await;
    for _ in 0..35 {
        post(&ctx, busy_sku, bin_id, "OUT", 1).await;
    }

    // Saídas antigas (61 dias) ficam fora da janela.
    let quiet_sku = ctx
        .state
        .inventory_service
        .create_sku(
            ctx.tenant_id,
            &payload(json!({ "code": format!("CAP-{}", Uuid::new_v4()), "name": "Capacitor 45/5" })),
        )
        .await
        .unwrap()
        .id;
    for _ in 0..5 {
        post_backdated(&ctx, quiet_sku, bin_id, 100, 61).await;
    }
    for _ in 0..3 {
        post(&ctx, quiet_sku, bin_id, "OUT", 2).await;
    }

    let forecasts = ctx.state.forecast_service.run_for_tenant(ctx.tenant_id).await.unwrap();

    let busy = forecasts.iter().find(|f| f.sku_id == busy_sku).unwrap();
    assert_eq!(busy.avg_daily_demand, dec!(1));
    assert_eq!(busy.reorder_point, dec!(11.55));

    let quiet = forecasts.iter().find(|f| f.sku_id == quiet_sku).unwrap();
    assert_eq!(quiet.avg_daily_demand, dec!(0.2));
    assert_eq!(quiet.reorder_point, dec!(2.31));
    assert_eq!(quiet.suggested_order_qty, dec!(3));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn system_admin_role_cannot_be_edited_or_deleted() {
    let ctx = setup().await;
    let rbac = &ctx.state.rbac_service;

    let roles = rbac.list_roles(ctx.tenant_id).await.unwrap();
    let admin = roles.iter().find(|r| r.role.name == "ADMIN").unwrap();
    assert!(admin.role.is_system);

    let rename = payload(json!({ "name": "Dono" }));
    let err = rbac.update_role(ctx.tenant_id, admin.role.id, &rename).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = rbac.delete_role(ctx.tenant_id, admin.role.id).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Continua lá, com todas as permissões.
    let roles = rbac.list_roles(ctx.tenant_id).await.unwrap();
    let admin_after = roles.iter().find(|r| r.role.id == admin.role.id).unwrap();
    assert_eq!(admin_after.role.name, "ADMIN");
    assert_eq!(admin_after.permissions.len(), admin.permissions.len());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn other_tenants_cannot_see_or_reference_rows() {
    let ours = setup().await;
    let theirs = setup().await;
    let (sku_id, bin_id) = stock_fixture(&ours).await;

    let err = theirs.state.inventory_service.get_sku(theirs.tenant_id, sku_id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = theirs
        .state
        .inventory_service
        .post_ledger(
            theirs.tenant_id,
            theirs.user_id,
            &payload(json!({ "skuId": sku_id, "binId": bin_id, "direction": "IN", "quantity": 5 })),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn receiving_a_purchase_order_books_stock_once() {
    let ctx = setup().await;
    let (sku_id, bin_id) = stock_fixture(&ctx).await;
    let purchasing = &ctx.state.purchasing_service;

    let order = purchasing
        .create(ctx.tenant_id, &payload(json!({ "skuId": sku_id, "quantity": 24, "unitCost": 7.5 })))
        .await
        .unwrap();
    assert_eq!(order.status, PurchaseOrderStatus::Open);

    let received = purchasing.receive(ctx.tenant_id, ctx.user_id, order.id, bin_id).await.unwrap();
    assert_eq!(received.status, PurchaseOrderStatus::Received);
    assert!(received.received_at.is_some());

    let on_hand = ctx.state.inventory_service.on_hand(ctx.tenant_id, sku_id).await.unwrap();
    assert_eq!(on_hand.on_hand, dec!(24));

    let again = purchasing.receive(ctx.tenant_id, ctx.user_id, order.id, bin_id).await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));
    let cancel = purchasing.cancel(ctx.tenant_id, ctx.user_id, order.id).await;
    assert!(matches!(cancel, Err(AppError::BadRequest(_))));

    let unread = ctx
        .state
        .notification_service
        .list(
            ctx.tenant_id,
            ctx.user_id,
            &NotificationFilter { unread_only: true },
            &PageQuery::default(),
        )
        .await
        .unwrap();
    assert!(unread.data.iter().any(|n| n.kind == NotificationKind::Purchasing));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn converting_a_lead_twice_is_rejected() {
    let ctx = setup().await;
    let crm = &ctx.state.crm_service;

    let lead = crm
        .create_lead(
            ctx.tenant_id,
            &payload(json!({ "companyName": "Hotel Miramar", "contactName": "Carlos Souza", "email": "carlos@miramar.test" })),
        )
        .await
        .unwrap();

    let conversion = crm.convert_lead(ctx.tenant_id, lead.id).await.unwrap();
    assert_eq!(conversion.lead.status, LeadStatus::Converted);
    assert_eq!(conversion.account.name, "Hotel Miramar");
    let contact = conversion.contact.unwrap();
    assert_eq!(contact.first_name, "Carlos");
    assert_eq!(contact.account_id, Some(conversion.account.id));

    let again = crm.convert_lead(ctx.tenant_id, lead.id).await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn work_order_lifecycle_stamps_completion() {
    let ctx = setup().await;
    let work_orders = &ctx.state.work_order_service;

    let order = work_orders
        .create(
            ctx.tenant_id,
            &payload(json!({ "title": "Manutenção preventiva", "assignedTo": ctx.user_id })),
        )
        .await
        .unwrap();
    assert_eq!(order.status, WorkOrderStatus::New);

    let skipped = work_orders.change_status(ctx.tenant_id, order.id, WorkOrderStatus::Completed).await;
    assert!(matches!(skipped, Err(AppError::BadRequest(_))));

    work_orders
        .change_status(ctx.tenant_id, order.id, WorkOrderStatus::InProgress)
        .await
        .unwrap();
    let done = work_orders
        .change_status(ctx.tenant_id, order.id, WorkOrderStatus::Completed)
        .await
        .unwrap();
    assert!(done.completed_at.is_some());

    let reopened = work_orders.change_status(ctx.tenant_id, order.id, WorkOrderStatus::InProgress).await;
    assert!(matches!(reopened, Err(AppError::BadRequest(_))));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn ai_estimate_persists_prompt_and_converts_to_a_proposal() {
    let ctx = setup().await;
    let estimator = &ctx.state.estimator_service;

    let detail = estimator
        .create_with_ai(
            ctx.tenant_id,
            ctx.user_id,
            &payload(json!({ "prompt": "Trocar condensadora de 3TR em residência" })),
        )
        .await
        .unwrap();

    // (2400 + 570) * 1.20 * 1.05
    assert_eq!(detail.estimate.subtotal, dec!(2970));
    assert_eq!(detail.estimate.final_price, dec!(3742.20));
    assert_eq!(
        detail.estimate.ai_input.as_ref().unwrap()["prompt"],
        "Trocar condensadora de 3TR em residência"
    );
    assert_eq!(detail.estimate.ai_output.as_ref().unwrap()["title"], "Troca de condensadora 3TR");

    let proposal = estimator.convert_to_proposal(ctx.tenant_id, detail.estimate.id).await.unwrap();
    assert_eq!(proposal.proposal.estimate_id, Some(detail.estimate.id));
    assert_eq!(proposal.proposal.total, detail.estimate.final_price);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn vendor_rating_tracks_the_five_latest_reviews() {
    let ctx = setup().await;
    let vendors = &ctx.state.vendor_service;

    let vendor = vendors
        .create(ctx.tenant_id, &payload(json!({ "name": "FrioSul Distribuidora" })))
        .await
        .unwrap();

    let mut last = None;
    for score in [1, 5, 4, 4, 5, 5] {
        let outcome = vendors
            .add_review(ctx.tenant_id, ctx.user_id, vendor.id, &payload(json!({ "score": score })))
            .await
            .unwrap();
        last = outcome.vendor_rating;
    }

    // a nota 1 (a mais antiga) já saiu da janela
    assert_eq!(last, Some(dec!(4.6)));
    let stored = vendors.get(ctx.tenant_id, vendor.id).await.unwrap();
    assert_eq!(stored.rating, Some(dec!(4.6)));
}
