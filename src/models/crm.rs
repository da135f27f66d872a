// src/models/crm.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// --- ENUMS ---

// Mapeia o CREATE TYPE lead_status do banco
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "lead_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Converted,
    Lost,
}

// --- ACCOUNTS (Clientes empresa / residência) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Riverside Apartments")]
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub industry: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(email(message = "E-mail inválido."))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub industry: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountPayload {
    #[validate(length(min = 1, message = "O nome não pode ser vazio."))]
    pub name: Option<String>,
    #[validate(email(message = "E-mail inválido."))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub industry: Option<String>,
    pub address: Option<String>,
}

// --- CONTACTS ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub account_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactPayload {
    pub account_id: Option<Uuid>,
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub first_name: String,
    pub last_name: Option<String>,
    #[validate(email(message = "E-mail inválido."))]
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContactPayload {
    pub account_id: Option<Uuid>,
    #[validate(length(min = 1, message = "O nome não pode ser vazio."))]
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(email(message = "E-mail inválido."))]
    pub email: Option<String>,
    pub phone: Option<String>,
}

// --- LEADS ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub account_id: Option<Uuid>,
    #[schema(example = "Downtown Dental")]
    pub company_name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "website")]
    pub source: Option<String>,
    pub status: LeadStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadPayload {
    pub account_id: Option<Uuid>,
    #[validate(length(min = 1, message = "O nome da empresa é obrigatório."))]
    pub company_name: String,
    pub contact_name: Option<String>,
    #[validate(email(message = "E-mail inválido."))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadPayload {
    pub account_id: Option<Uuid>,
    #[validate(length(min = 1, message = "O nome da empresa não pode ser vazio."))]
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    #[validate(email(message = "E-mail inválido."))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: Option<String>,
    pub status: Option<LeadStatus>,
}

/// Resultado da conversão de um lead.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadConversion {
    pub lead: Lead,
    pub account: Account,
    pub contact: Option<Contact>,
}

// --- NOTES ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub contact_id: Uuid,
    pub author_id: Option<Uuid>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotePayload {
    pub contact_id: Uuid,
    #[validate(length(min = 1, max = 10000, message = "A nota não pode ser vazia."))]
    pub body: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateNotePayload {
    #[validate(length(min = 1, max = 10000, message = "A nota não pode ser vazia."))]
    pub body: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NoteFilter {
    pub contact_id: Option<Uuid>,
}

/// Divide "Maria da Silva" em ("Maria", Some("da Silva")).
pub fn split_full_name(full_name: &str) -> (String, Option<String>) {
    let trimmed = full_name.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => {
            let rest = rest.trim();
            (
                first.to_string(),
                if rest.is_empty() { None } else { Some(rest.to_string()) },
            )
        }
        None => (trimmed.to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_contact_names() {
        assert_eq!(split_full_name("Maria da Silva"), ("Maria".into(), Some("da Silva".into())));
        assert_eq!(split_full_name("  Cher "), ("Cher".into(), None));
    }

    #[test]
    fn lead_status_uses_screaming_case_on_the_wire() {
        let json = serde_json::to_string(&LeadStatus::Converted).unwrap();
        assert_eq!(json, "\"CONVERTED\"");
    }
}
