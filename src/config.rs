// src/config.rs

use crate::{
    db::{
        CatalogRepository, CrmRepository, DispatchRepository, EstimatorRepository,
        InventoryRepository, NotificationRepository, PurchasingRepository, RbacRepository,
        TenantRepository, UserRepository, VendorRepository, WorkOrderRepository,
    },
    services::{
        auth::AuthService,
        catalog_service::CatalogService,
        crm_service::CrmService,
        dispatch_service::DispatchService,
        document_service::DocumentService,
        estimator_service::EstimatorService,
        forecast_service::ForecastService,
        inventory_service::InventoryService,
        llm::{LlmClient, OpenAiClient},
        notification_service::{NotificationHub, NotificationService},
        purchasing_service::PurchasingService,
        rbac_service::RbacService,
        tenancy_service::TenantService,
        user_service::UserService,
        vendor_service::VendorService,
        work_order_service::WorkOrderService,
    },
};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{collections::HashMap, env, sync::Arc, time::{Duration, Instant}};
use thiserror::Error;

const DEFAULT_OPENAI_KEY: &str = "sk-dummy";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} deve ser definida")]
    Missing(&'static str),

    #[error("Valor inválido para {0}: {1}")]
    Invalid(&'static str, String),

    #[error("ALLOWED_ORIGINS é obrigatória em produção")]
    MissingOrigins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

/// Tudo o que vem do ambiente, lido uma única vez na inicialização.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub environment: Environment,
    pub allowed_origins: Vec<String>,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub port: u16,
    pub frontend_dist: String,
    pub fonts_dir: String,
    pub forecast_interval: Option<Duration>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(&env::vars().collect())
    }

    /// Monta a configuração a partir de um mapa (facilita os testes).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| vars.get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let environment = match get("APP_ENV").or_else(|| get("NODE_ENV")).as_deref() {
            Some("production") => Environment::Production,
            _ => Environment::Development,
        };

        let allowed_origins: Vec<String> = get("ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        if environment == Environment::Production && allowed_origins.is_empty() {
            return Err(ConfigError::MissingOrigins);
        }

        let port = match get("PORT") {
            Some(p) => p.parse().map_err(|_| ConfigError::Invalid("PORT", p))?,
            None => 3000,
        };

        let database_max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(n) => n.parse().map_err(|_| ConfigError::Invalid("DATABASE_MAX_CONNECTIONS", n))?,
            None => 5,
        };

        let forecast_interval = match get("FORECAST_INTERVAL_SECS") {
            Some(s) => {
                let secs: u64 = s
                    .parse()
                    .map_err(|_| ConfigError::Invalid("FORECAST_INTERVAL_SECS", s.clone()))?;
                if secs == 0 {
                    return Err(ConfigError::Invalid("FORECAST_INTERVAL_SECS", s));
                }
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            database_url,
            database_max_connections,
            jwt_secret,
            environment,
            allowed_origins,
            openai_api_key: get("OPENAI_API_KEY").unwrap_or_else(|| DEFAULT_OPENAI_KEY.to_string()),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            port,
            frontend_dist: get("FRONTEND_DIST").unwrap_or_else(|| "frontend/dist".to_string()),
            fonts_dir: get("FONTS_DIR").unwrap_or_else(|| "./fonts".to_string()),
            forecast_interval,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<AppConfig>,
    pub started_at: Instant,

    pub auth_service: AuthService,
    pub tenant_service: TenantService,
    pub user_service: UserService,
    pub rbac_service: RbacService,
    pub crm_service: CrmService,
    pub inventory_service: InventoryService,
    pub forecast_service: ForecastService,
    pub purchasing_service: PurchasingService,
    pub work_order_service: WorkOrderService,
    pub dispatch_service: DispatchService,
    pub estimator_service: EstimatorService,
    pub document_service: DocumentService,
    pub vendor_service: VendorService,
    pub catalog_service: CatalogService,
    pub notification_service: NotificationService,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let llm: Arc<dyn LlmClient> = Arc::new(OpenAiClient::new(
            config.openai_base_url.clone(),
            config.openai_api_key.clone(),
            config.openai_model.clone(),
        ));

        Ok(Self::with_pool(db_pool, config, llm))
    }

    /// Monta o gráfico de dependências sobre uma pool já existente.
    pub fn with_pool(db_pool: PgPool, config: AppConfig, llm: Arc<dyn LlmClient>) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let tenant_repo = TenantRepository::new(db_pool.clone());
        let rbac_repo = RbacRepository::new(db_pool.clone());
        let crm_repo = CrmRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new(db_pool.clone());
        let purchasing_repo = PurchasingRepository::new(db_pool.clone());
        let work_order_repo = WorkOrderRepository::new(db_pool.clone());
        let dispatch_repo = DispatchRepository::new(db_pool.clone());
        let estimator_repo = EstimatorRepository::new(db_pool.clone());
        let vendor_repo = VendorRepository::new(db_pool.clone());
        let catalog_repo = CatalogRepository::new(db_pool.clone());
        let notification_repo = NotificationRepository::new(db_pool.clone());

        let notification_service = NotificationService::new(
            notification_repo,
            NotificationHub::default(),
        );

        let auth_service = AuthService::new(
            user_repo.clone(),
            tenant_repo.clone(),
            rbac_repo.clone(),
            config.jwt_secret.clone(),
            db_pool.clone(),
        );
        let tenant_service = TenantService::new(tenant_repo);
        let user_service = UserService::new(user_repo.clone(), rbac_repo.clone(), db_pool.clone());
        let rbac_service = RbacService::new(rbac_repo, db_pool.clone());
        let crm_service = CrmService::new(crm_repo.clone(), db_pool.clone());
        let inventory_service = InventoryService::new(inventory_repo.clone(), db_pool.clone());
        let forecast_service = ForecastService::new(inventory_repo.clone(), db_pool.clone());
        let purchasing_service = PurchasingService::new(
            purchasing_repo,
            inventory_repo.clone(),
            vendor_repo.clone(),
            notification_service.clone(),
            db_pool.clone(),
        );
        let work_order_service = WorkOrderService::new(
            work_order_repo.clone(),
            crm_repo.clone(),
            user_repo.clone(),
            notification_service.clone(),
            db_pool.clone(),
        );
        let dispatch_service = DispatchService::new(
            dispatch_repo,
            work_order_repo,
            user_repo,
            notification_service.clone(),
            db_pool.clone(),
        );
        let estimator_service = EstimatorService::new(
            estimator_repo.clone(),
            crm_repo,
            llm,
            db_pool.clone(),
        );
        let document_service = DocumentService::new(estimator_repo, config.fonts_dir.clone(), db_pool.clone());
        let vendor_service = VendorService::new(vendor_repo, inventory_repo, db_pool.clone());
        let catalog_service = CatalogService::new(catalog_repo, db_pool.clone());

        Self {
            db_pool,
            config: Arc::new(config),
            started_at: Instant::now(),
            auth_service,
            tenant_service,
            user_service,
            rbac_service,
            crm_service,
            inventory_service,
            forecast_service,
            purchasing_service,
            work_order_service,
            dispatch_service,
            estimator_service,
            document_service,
            vendor_service,
            catalog_service,
            notification_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn requires_database_url_and_jwt_secret() {
        assert_eq!(
            AppConfig::from_vars(&vars(&[("JWT_SECRET", "s")])).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
        assert_eq!(
            AppConfig::from_vars(&vars(&[("DATABASE_URL", "postgres://x")])).unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );
    }

    #[test]
    fn applies_defaults_in_development() {
        let cfg = AppConfig::from_vars(&vars(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
        ]))
        .unwrap();

        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.environment, Environment::Development);
        assert_eq!(cfg.openai_api_key, DEFAULT_OPENAI_KEY);
        assert_eq!(cfg.frontend_dist, "frontend/dist");
        assert!(cfg.allowed_origins.is_empty());
        assert!(cfg.forecast_interval.is_none());
    }

    #[test]
    fn production_requires_origin_allow_list() {
        let base = [("DATABASE_URL", "postgres://x"), ("JWT_SECRET", "s"), ("NODE_ENV", "production")];
        assert_eq!(AppConfig::from_vars(&vars(&base)).unwrap_err(), ConfigError::MissingOrigins);

        let mut with_origins = base.to_vec();
        with_origins.push(("ALLOWED_ORIGINS", "https://app.opsnex.io, https://admin.opsnex.io"));
        let cfg = AppConfig::from_vars(&vars(&with_origins)).unwrap();
        assert!(cfg.is_production());
        assert_eq!(cfg.allowed_origins, vec!["https://app.opsnex.io", "https://admin.opsnex.io"]);
    }

    #[test]
    fn rejects_bad_port() {
        let err = AppConfig::from_vars(&vars(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("PORT", "abc"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Invalid("PORT", "abc".into()));
    }
}
