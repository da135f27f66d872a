use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// A taxonomia segue o HTTP: 404 / 403 / 400 / 401 / 409 e 500 para o resto.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Cannot {method} {path}")]
    RouteNotFound { method: String, path: String },

    #[error("Falha no provedor de IA: {0}")]
    LlmError(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn not_found(entity: &str) -> Self {
        AppError::NotFound(format!("{} não encontrado.", entity))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) | AppError::InvalidCredentials | AppError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::LlmError(_) => StatusCode::BAD_GATEWAY,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte erros de constraint do Postgres em algo que o cliente entenda.
    pub fn from_db(e: sqlx::Error, conflict_message: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return AppError::Conflict(conflict_message.to_string());
            }
            if db_err.is_foreign_key_violation() {
                return AppError::Conflict(
                    "O registro ainda é referenciado por outros dados.".to_string(),
                );
            }
        }
        AppError::DatabaseError(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                json!({
                    "statusCode": status.as_u16(),
                    "error": "Bad Request",
                    "message": "Um ou mais campos são inválidos.",
                    "details": details,
                })
            }
            AppError::InvalidCredentials => json!({
                "statusCode": status.as_u16(),
                "error": "Unauthorized",
                "message": "E-mail ou senha inválidos.",
            }),
            AppError::InvalidToken => json!({
                "statusCode": status.as_u16(),
                "error": "Unauthorized",
                "message": "Token de autenticação inválido ou ausente.",
            }),

            // Os internos viram 500 sem vazar detalhes. O `tracing` registra a causa.
            ref e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                json!({
                    "statusCode": status.as_u16(),
                    "error": "Internal Server Error",
                    "message": "Ocorreu um erro inesperado.",
                })
            }
            ref e if status == StatusCode::BAD_GATEWAY => {
                tracing::warn!("{}", e);
                json!({
                    "statusCode": status.as_u16(),
                    "error": "Bad Gateway",
                    "message": e.to_string(),
                })
            }

            e => json!({
                "statusCode": status.as_u16(),
                "error": status.canonical_reason().unwrap_or("Error"),
                "message": e.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn maps_taxonomy_to_status_codes() {
        assert_eq!(AppError::not_found("Conta").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::LlmError("x".into()).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn not_found_body_carries_message() {
        let response = AppError::not_found("Conta").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["statusCode"], 404);
        assert_eq!(body["message"], "Conta não encontrado.");
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_details() {
        let response = AppError::InternalServerError(anyhow::anyhow!("segredo")).into_response();
        let body = body_json(response).await;
        assert_eq!(body["message"], "Ocorreu um erro inesperado.");
        assert!(!body.to_string().contains("segredo"));
    }

    #[tokio::test]
    async fn route_not_found_mimics_framework_message() {
        let response = AppError::RouteNotFound {
            method: "GET".into(),
            path: "/api/v1/nada".into(),
        }
        .into_response();
        let body = body_json(response).await;
        assert_eq!(body["message"], "Cannot GET /api/v1/nada");
    }
}
