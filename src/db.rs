pub mod user_repo;
pub use user_repo::UserRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod crm_repo;
pub use crm_repo::CrmRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod purchasing_repo;
pub use purchasing_repo::PurchasingRepository;
pub mod work_order_repo;
pub use work_order_repo::WorkOrderRepository;
pub mod dispatch_repo;
pub use dispatch_repo::DispatchRepository;
pub mod estimator_repo;
pub use estimator_repo::EstimatorRepository;
pub mod vendor_repo;
pub use vendor_repo::VendorRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod notification_repo;
pub use notification_repo::NotificationRepository;
