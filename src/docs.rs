// src/docs.rs

use crate::handlers;
use crate::models;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "OpsNex API", description = "Backend multi-empresa para serviços de campo (HVAC)"),
    paths(
        // --- Health ---
        handlers::health::health,
        handlers::health::metrics,

        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Tenancy ---
        handlers::tenancy::current_tenant,
        handlers::tenancy::list_all_tenants,

        // --- Users ---
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::users::assign_roles,

        // --- RBAC ---
        handlers::rbac::list_roles,
        handlers::rbac::create_role,
        handlers::rbac::update_role,
        handlers::rbac::delete_role,
        handlers::rbac::list_permissions,

        // --- CRM ---
        handlers::crm::list_accounts,
        handlers::crm::create_account,
        handlers::crm::get_account,
        handlers::crm::update_account,
        handlers::crm::delete_account,
        handlers::crm::list_contacts,
        handlers::crm::create_contact,
        handlers::crm::get_contact,
        handlers::crm::update_contact,
        handlers::crm::delete_contact,
        handlers::crm::list_leads,
        handlers::crm::create_lead,
        handlers::crm::get_lead,
        handlers::crm::update_lead,
        handlers::crm::delete_lead,
        handlers::crm::convert_lead,
        handlers::crm::list_notes,
        handlers::crm::create_note,
        handlers::crm::get_note,
        handlers::crm::update_note,
        handlers::crm::delete_note,

        // --- Inventory ---
        handlers::inventory::list_warehouses,
        handlers::inventory::create_warehouse,
        handlers::inventory::get_warehouse,
        handlers::inventory::update_warehouse,
        handlers::inventory::delete_warehouse,
        handlers::inventory::list_bins,
        handlers::inventory::create_bin,
        handlers::inventory::get_bin,
        handlers::inventory::update_bin,
        handlers::inventory::delete_bin,
        handlers::inventory::list_skus,
        handlers::inventory::create_sku,
        handlers::inventory::get_sku,
        handlers::inventory::update_sku,
        handlers::inventory::delete_sku,
        handlers::inventory::get_on_hand,
        handlers::inventory::post_ledger,
        handlers::inventory::list_ledger,
        handlers::inventory::low_stock,
        handlers::inventory::run_forecasts,
        handlers::inventory::list_forecasts,

        // --- Purchasing ---
        handlers::purchasing::create_purchase_order,
        handlers::purchasing::list_purchase_orders,
        handlers::purchasing::get_purchase_order,
        handlers::purchasing::receive_purchase_order,
        handlers::purchasing::cancel_purchase_order,

        // --- Work Orders ---
        handlers::work_orders::list_work_orders,
        handlers::work_orders::create_work_order,
        handlers::work_orders::get_work_order,
        handlers::work_orders::update_work_order,
        handlers::work_orders::delete_work_order,
        handlers::work_orders::change_work_order_status,

        // --- Dispatch ---
        handlers::dispatch::list_slots,
        handlers::dispatch::create_slot,
        handlers::dispatch::get_slot,
        handlers::dispatch::update_slot,
        handlers::dispatch::delete_slot,
        handlers::dispatch::change_slot_status,

        // --- Estimator ---
        handlers::estimates::create_estimate,
        handlers::estimates::create_ai_estimate,
        handlers::estimates::list_estimates,
        handlers::estimates::get_estimate,
        handlers::estimates::delete_estimate,
        handlers::estimates::convert_estimate,
        handlers::estimates::create_proposal,
        handlers::estimates::list_proposals,
        handlers::estimates::get_proposal,
        handlers::estimates::change_proposal_status,
        handlers::estimates::delete_proposal,

        // --- Documents ---
        handlers::documents::proposal_pdf,

        // --- Vendors ---
        handlers::vendors::list_vendors,
        handlers::vendors::create_vendor,
        handlers::vendors::get_vendor,
        handlers::vendors::update_vendor,
        handlers::vendors::delete_vendor,
        handlers::vendors::list_contacts,
        handlers::vendors::add_contact,
        handlers::vendors::remove_contact,
        handlers::vendors::list_agreements,
        handlers::vendors::add_agreement,
        handlers::vendors::remove_agreement,
        handlers::vendors::list_reviews,
        handlers::vendors::add_review,

        // --- Catalog ---
        handlers::catalog::list_entries,
        handlers::catalog::create_entry,
        handlers::catalog::get_entry,
        handlers::catalog::update_entry,
        handlers::catalog::delete_entry,

        // --- Notifications ---
        handlers::notifications::list_notifications,
        handlers::notifications::mark_read,
        handlers::notifications::mark_all_read,
        handlers::notifications::get_preferences,
        handlers::notifications::update_preferences,
        handlers::notifications::stream_notifications,
    ),
    components(
        schemas(
            // --- auth ---
            models::auth::User,
            models::auth::RegisterPayload,
            models::auth::LoginPayload,
            models::auth::AuthResponse,
            models::auth::MeResponse,
            models::auth::CreateUserPayload,
            models::auth::UpdateUserPayload,
            models::auth::AssignRolesPayload,

            // --- tenancy ---
            models::tenancy::Tenant,

            // --- rbac ---
            models::rbac::Role,
            models::rbac::Permission,
            models::rbac::CreateRolePayload,
            models::rbac::UpdateRolePayload,
            models::rbac::RoleResponse,

            // --- crm ---
            models::crm::LeadStatus,
            models::crm::Account,
            models::crm::AccountPayload,
            models::crm::UpdateAccountPayload,
            models::crm::Contact,
            models::crm::ContactPayload,
            models::crm::UpdateContactPayload,
            models::crm::Lead,
            models::crm::LeadPayload,
            models::crm::UpdateLeadPayload,
            models::crm::LeadConversion,
            models::crm::Note,
            models::crm::NotePayload,
            models::crm::UpdateNotePayload,

            // --- inventory ---
            models::inventory::Warehouse,
            models::inventory::WarehousePayload,
            models::inventory::Bin,
            models::inventory::UpdateWarehousePayload,
            models::inventory::BinPayload,
            models::inventory::UpdateBinPayload,
            models::inventory::Sku,
            models::inventory::SkuWithStock,
            models::inventory::SkuPayload,
            models::inventory::UpdateSkuPayload,
            models::inventory::LedgerDirection,
            models::inventory::StockLedgerEntry,
            models::inventory::PostLedgerPayload,
            models::inventory::OnHand,
            models::inventory::Forecast,
            models::inventory::LowStockEntry,

            // --- purchasing ---
            models::purchasing::PurchaseOrderStatus,
            models::purchasing::PurchaseOrder,
            models::purchasing::CreatePurchaseOrderPayload,
            models::purchasing::ReceivePurchaseOrderPayload,

            // --- work_orders ---
            models::work_orders::WorkOrderStatus,
            models::work_orders::WorkOrderPriority,
            models::work_orders::WorkOrder,
            models::work_orders::CreateWorkOrderPayload,
            models::work_orders::UpdateWorkOrderPayload,
            models::work_orders::WorkOrderStatusPayload,

            // --- dispatch ---
            models::dispatch::DispatchStatus,
            models::dispatch::DispatchSlot,
            models::dispatch::CreateDispatchSlotPayload,
            models::dispatch::UpdateDispatchSlotPayload,
            models::dispatch::DispatchStatusPayload,

            // --- estimator ---
            models::estimator::EstimateMode,
            models::estimator::EstimateSource,
            models::estimator::ProposalStatus,
            models::estimator::Estimate,
            models::estimator::EstimateLineItem,
            models::estimator::EstimateDetail,
            models::estimator::LineItemInput,
            models::estimator::CostBuckets,
            models::estimator::CreateEstimatePayload,
            models::estimator::AiEstimatePayload,
            models::estimator::PriceBreakdown,
            models::estimator::Proposal,
            models::estimator::ProposalLineItem,
            models::estimator::ProposalDetail,
            models::estimator::CreateProposalPayload,
            models::estimator::ProposalStatusPayload,

            // --- vendors ---
            models::vendors::Vendor,
            models::vendors::VendorPayload,
            models::vendors::UpdateVendorPayload,
            models::vendors::VendorContact,
            models::vendors::VendorContactPayload,
            models::vendors::PriceAgreement,
            models::vendors::PriceAgreementPayload,
            models::vendors::PerformanceReview,
            models::vendors::PerformanceReviewPayload,
            models::vendors::ReviewOutcome,

            // --- catalog ---
            models::catalog::CatalogEntry,
            models::catalog::CatalogEntryPayload,
            models::catalog::UpdateCatalogEntryPayload,

            // --- notifications ---
            models::notifications::NotificationKind,
            models::notifications::Notification,
            models::notifications::NotificationPreference,
            models::notifications::UpdatePreferencePayload,
            models::notifications::MarkedRead,

            handlers::health::HealthStatus,
            handlers::health::RuntimeMetrics,
        )
    ),
    tags(
        (name = "Health", description = "Saúde e métricas do processo"),
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Tenancy", description = "Empresa do usuário logado"),
        (name = "Admin", description = "Administração da plataforma (SUPER_ADMIN)"),
        (name = "Users", description = "Usuários da empresa"),
        (name = "RBAC", description = "Controle de Acesso (Cargos e Permissões)"),
        (name = "CRM", description = "Contas, Contatos, Leads e Notas"),
        (name = "Inventory", description = "Depósitos, SKUs, Razão de Estoque e Previsões"),
        (name = "Purchasing", description = "Pedidos de Compra"),
        (name = "Work Orders", description = "Ordens de Serviço"),
        (name = "Dispatch", description = "Agenda de Técnicos"),
        (name = "Estimator", description = "Orçamentos manuais e com IA"),
        (name = "Proposals", description = "Propostas Comerciais e PDF"),
        (name = "Vendors", description = "Fornecedores, Acordos e Avaliações"),
        (name = "Catalog", description = "Catálogo de Serviços"),
        (name = "Notifications", description = "Notificações em tempo real")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme("api_jwt", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_declares_bearer_scheme_and_routes() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
        assert!(doc.paths.paths.contains_key("/api/v1/auth/login"));
        assert!(doc.paths.paths.contains_key("/api/v1/crm/leads/{id}/convert"));
        assert!(doc.paths.paths.contains_key("/api/v1/proposals/{id}/pdf"));
    }
}
