use async_trait::async_trait;
use serde_json::json;
use weftcore::{ChatParameters, ChatService, ServiceError};

const SERVICE: &str = "chat";

/// Connection settings for an OpenAI-compatible completion endpoint
#[derive(Debug, Clone)]
pub struct HttpChatConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub default_model: String,
}

/// Chat backend speaking the `/chat/completions` protocol over HTTP
pub struct HttpChatService {
    client: reqwest::Client,
    config: HttpChatConfig,
}

impl HttpChatService {
    pub fn new(config: HttpChatConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatService for HttpChatService {
    async fn complete(&self, prompt: &str, parameters: &ChatParameters) -> Result<String, ServiceError> {
        let model = parameters
            .model
            .clone()
            .unwrap_or_else(|| self.config.default_model.clone());

        let mut messages = Vec::new();
        if let Some(system) = &parameters.system_prompt {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": prompt }));

        let mut body = json!({ "model": model, "messages": messages });
        if let Some(temperature) = parameters.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = parameters.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        tracing::debug!(model = %model, "POST {}", self.endpoint());

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::unavailable(SERVICE, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|e| ServiceError::unavailable(SERVICE, format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(ServiceError::unavailable(
                SERVICE,
                format!("status {}: {}", status.as_u16(), body_text),
            ));
        }

        let parsed: serde_json::Value = serde_json::from_str(&body_text)
            .map_err(|e| ServiceError::invalid_response(SERVICE, format!("JSON parse error: {}", e)))?;

        parsed["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ServiceError::invalid_response(SERVICE, "no completion in response"))
    }
}
