use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use weftcore::{
    ChatParameters, ChatService, Component, ComponentContext, ComponentDescriptor, ComponentError,
    ComponentOutput, InputPort, OutputPort, Value, ValueType,
};
use weftruntime::ComponentFactory;

const TYPE_NAME: &str = "chat.complete";

/// Ask the chat backend, optionally grounding the prompt in retrieved context
pub struct ChatComponent {
    chat: Arc<dyn ChatService>,
    parameters: ChatParameters,
}

impl ChatComponent {
    fn compose_prompt(prompt: &str, context: Option<&str>) -> String {
        match context {
            Some(context) if !context.trim().is_empty() => {
                format!("Context:\n{}\n\nQuestion: {}", context, prompt)
            }
            _ => prompt.to_string(),
        }
    }
}

#[async_trait]
impl Component for ChatComponent {
    fn component_type(&self) -> &str {
        TYPE_NAME
    }

    async fn execute(&self, ctx: ComponentContext) -> Result<ComponentOutput, ComponentError> {
        let prompt = ctx.require_str("prompt")?;
        let full_prompt = Self::compose_prompt(prompt, ctx.optional_str("context"));

        let response = self.chat.complete(&full_prompt, &self.parameters).await?;
        ctx.events.info(format!("Completion of {} chars", response.len()));

        Ok(ComponentOutput::new().with_output("response", response))
    }
}

pub struct ChatComponentFactory {
    chat: Arc<dyn ChatService>,
}

impl ChatComponentFactory {
    pub fn new(chat: Arc<dyn ChatService>) -> Self {
        Self { chat }
    }
}

fn string_config(config: &HashMap<String, Value>, name: &str) -> Result<Option<String>, ComponentError> {
    match config.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ComponentError::Configuration(format!(
            "'{}' must be a string, got {}",
            name,
            other.value_type()
        ))),
    }
}

fn number_config(config: &HashMap<String, Value>, name: &str) -> Result<Option<f64>, ComponentError> {
    match config.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(Some(*n)),
        Some(other) => Err(ComponentError::Configuration(format!(
            "'{}' must be a number, got {}",
            name,
            other.value_type()
        ))),
    }
}

impl ComponentFactory for ChatComponentFactory {
    fn create(&self, config: &HashMap<String, Value>) -> Result<Box<dyn Component>, ComponentError> {
        let parameters = ChatParameters {
            model: string_config(config, "model")?,
            system_prompt: string_config(config, "system_prompt")?,
            temperature: number_config(config, "temperature")?.map(|t| t as f32),
            max_tokens: number_config(config, "max_tokens")?.map(|t| t as u32),
        };

        Ok(Box::new(ChatComponent {
            chat: self.chat.clone(),
            parameters,
        }))
    }

    fn descriptor(&self) -> ComponentDescriptor {
        ComponentDescriptor::new(TYPE_NAME)
            .with_description("Generate a chat completion")
            .with_category("chat")
            .with_input("prompt", InputPort::required(ValueType::String))
            .with_input(
                "context",
                InputPort::optional(ValueType::String).describe("Retrieved passages to ground the answer"),
            )
            .with_output("response", OutputPort::new(ValueType::String))
    }
}
