//! Anthropic messages 接口客户端

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{read_error_body, ProviderClient, ProviderKind};
use crate::config::Config;
use crate::error::ProviderError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    http: Client,
    api_key: String,
    api_base: String,
    model_name: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicClient {
    pub fn new(config: &Config, api_key: &str) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.to_string(),
            api_base: config.anthropic_api_base.trim_end_matches('/').to_string(),
            model_name: config.anthropic_model.clone(),
            max_tokens: config.max_output_tokens,
        }
    }
}

#[async_trait]
impl ProviderClient for AnthropicClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        debug!("调用 Anthropic API，模型: {}", self.model_name);

        let body = MessagesRequest {
            model: &self.model_name,
            max_tokens: self.max_tokens,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(format!("{}/v1/messages", self.api_base))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("Anthropic API 调用失败: {}", e);
                ProviderError::request(ProviderKind::Anthropic, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: ProviderKind::Anthropic,
                status: status.as_u16(),
                body: read_error_body(response).await,
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(ProviderKind::Anthropic, e.to_string()))?;

        debug!("Anthropic API 调用成功");

        parsed
            .content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .ok_or_else(|| ProviderError::malformed(ProviderKind::Anthropic, "content[0].text 缺失"))
    }
}
