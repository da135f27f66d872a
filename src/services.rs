pub mod auth;
pub mod catalog_service;
pub mod crm_service;
pub mod dispatch_service;
pub mod document_service;
pub mod estimator_service;
pub mod forecast_service;
pub mod inventory_service;
pub mod llm;
pub mod notification_service;
pub mod purchasing_service;
pub mod rbac_service;
pub mod tenancy_service;
pub mod user_service;
pub mod vendor_service;
pub mod work_order_service;
