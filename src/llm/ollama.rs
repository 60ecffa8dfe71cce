use crate::llm::client::LLMClient;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use ollama_rs::{Ollama, generation::completion::request::GenerationRequest};

const DEFAULT_OLLAMA_PORT: u16 = 11434;

/// Split an Ollama base URL into the `scheme://host` part and the port.
pub(crate) fn parse_base_url(base_url: &str) -> Result<(String, u16)> {
    let url = reqwest::Url::parse(base_url)
        .map_err(|e| AppError::Configuration(format!("Invalid Ollama URL '{}': {}", base_url, e)))?;

    let host = url.host_str().ok_or_else(|| {
        AppError::Configuration(format!("Ollama URL '{}' has no host", base_url))
    })?;
    let port = url.port().unwrap_or(DEFAULT_OLLAMA_PORT);

    Ok((format!("{}://{}", url.scheme(), host), port))
}

/// Build an `ollama-rs` client from a base URL such as `http://localhost:11434`.
pub(crate) fn connect(base_url: &str) -> Result<Ollama> {
    let (host, port) = parse_base_url(base_url)?;
    Ok(Ollama::new(host, port))
}

pub struct OllamaClient {
    client: Ollama,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: String) -> Result<Self> {
        Ok(Self {
            client: connect(base_url)?,
            model,
        })
    }
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerationRequest::new(self.model.clone(), prompt.to_string());

        let response = self
            .client
            .generate(request)
            .await
            .map_err(|e| AppError::Generation(format!("Ollama error: {}", e)))?;

        if response.response.trim().is_empty() {
            return Err(AppError::Generation(format!(
                "Model '{}' returned an empty response",
                self.model
            )));
        }

        Ok(response.response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
