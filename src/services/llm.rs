// src/services/llm.rs

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::common::error::AppError;

/// Qualquer provedor capaz de devolver um objeto JSON para um prompt.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete_json(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AppError>;
}

/// Cliente compatível com `/chat/completions` da OpenAI.
#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete_json(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AppError> {
        let body = json!({
            "model": &self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt}
            ],
            "temperature": 0.2,
            "response_format": {"type": "json_object"}
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LlmError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::LlmError(format!("HTTP {}: {}", status, text)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::LlmError(format!("Resposta inesperada: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::LlmError("O provedor não retornou conteúdo.".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    #[tokio::test]
    async fn returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"title\":\"x\"}"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::new(server.uri(), "sk-test".into(), "gpt-4o-mini".into());
        let content = client.complete_json("sys", "user").await.unwrap();
        assert_eq!(content, "{\"title\":\"x\"}");
    }

    #[tokio::test]
    async fn provider_errors_become_llm_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(server.uri(), "sk-test".into(), "gpt-4o-mini".into());
        let err = client.complete_json("sys", "user").await.unwrap_err();
        assert!(matches!(err, AppError::LlmError(msg) if msg.contains("429")));
    }

    #[tokio::test]
    async fn empty_choices_are_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(format!("{}/", server.uri()), "k".into(), "m".into());
        assert!(matches!(
            client.complete_json("sys", "user").await,
            Err(AppError::LlmError(_))
        ));
    }
}
