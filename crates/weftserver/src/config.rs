use anyhow::{Context, Result};
use std::sync::Arc;
use weftcore::ChatService;
use weftnodes::{EchoChatService, HttpChatConfig, HttpChatService};
use weftruntime::RuntimeConfig;

/// Server settings read from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub runtime: RuntimeConfig,
    pub chat: Option<HttpChatConfig>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let bind_address = std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let mut runtime = RuntimeConfig::default();
        if let Ok(raw) = std::env::var("WEFT_MAX_PARALLEL") {
            runtime.max_parallel_nodes = raw
                .parse()
                .with_context(|| format!("WEFT_MAX_PARALLEL is not a number: {}", raw))?;
        }
        if let Ok(raw) = std::env::var("WEFT_NODE_TIMEOUT_MS") {
            runtime.node_timeout_ms = Some(
                raw.parse()
                    .with_context(|| format!("WEFT_NODE_TIMEOUT_MS is not a number: {}", raw))?,
            );
        }

        let chat = std::env::var("WEFT_CHAT_BASE_URL").ok().map(|base_url| HttpChatConfig {
            base_url,
            api_key: std::env::var("WEFT_CHAT_API_KEY").ok(),
            default_model: std::env::var("WEFT_CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
        });

        Ok(Self {
            bind_address,
            runtime,
            chat,
        })
    }

    pub fn chat_service(&self) -> Arc<dyn ChatService> {
        match &self.chat {
            Some(config) => Arc::new(HttpChatService::new(config.clone())),
            None => Arc::new(EchoChatService),
        }
    }
}
