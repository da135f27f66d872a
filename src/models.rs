pub mod auth;
pub mod catalog;
pub mod crm;
pub mod dispatch;
pub mod estimator;
pub mod inventory;
pub mod notifications;
pub mod purchasing;
pub mod rbac;
pub mod tenancy;
pub mod vendors;
pub mod work_orders;
