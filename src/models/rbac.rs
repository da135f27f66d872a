// src/models/rbac.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const SUPER_ADMIN_ROLE: &str = "SUPER_ADMIN";
pub const ADMIN_ROLE: &str = "ADMIN";

// O que sai do banco (Tabela Roles)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: Uuid,

    #[schema(ignore)]
    pub tenant_id: Option<Uuid>,

    #[schema(example = "Dispatcher")]
    pub name: String,

    #[schema(example = "Schedules technicians and manages work orders")]
    pub description: Option<String>,

    /// Cargos de sistema não podem ser editados nem removidos.
    pub is_system: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// O que sai do banco (Tabela Permissions)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: Uuid,

    #[schema(example = "inventory:read")]
    pub slug: String,

    #[schema(example = "View SKUs, warehouses and stock")]
    pub description: String,

    #[schema(example = "INVENTORY")]
    pub module: String,
}

// O Payload para criar um cargo
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRolePayload {
    #[validate(length(min = 2, max = 64, message = "O nome do cargo deve ter entre 2 e 64 caracteres."))]
    #[schema(example = "Dispatcher")]
    pub name: String,

    pub description: Option<String>,

    #[schema(example = json!(["work_orders:write", "dispatch:write"]))]
    #[serde(default)]
    pub permissions: Vec<String>, // Slugs das permissões
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRolePayload {
    #[validate(length(min = 2, max = 64, message = "O nome do cargo deve ter entre 2 e 64 caracteres."))]
    pub name: Option<String>,
    pub description: Option<String>,
    /// Quando presente, substitui o conjunto de permissões.
    pub permissions: Option<Vec<String>>,
}

// Resposta completa (Cargo + Lista de Permissões)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    #[serde(flatten)]
    pub role: Role,

    #[schema(example = json!(["inventory:read", "inventory:write"]))]
    pub permissions: Vec<String>,
}
