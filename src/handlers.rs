pub mod auth;
pub mod catalog;
pub mod crm;
pub mod dispatch;
pub mod documents;
pub mod estimates;
pub mod health;
pub mod inventory;
pub mod notifications;
pub mod purchasing;
pub mod rbac;
pub mod tenancy;
pub mod users;
pub mod vendors;
pub mod work_orders;
