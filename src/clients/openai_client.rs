//! OpenAI 聊天补全客户端
//!
//! 请求体由 `async-openai` 的类型构建，兼容任何 OpenAI 风格的接口（可自定义 api_base）。
//! 发送只走一次 `reqwest`：`async-openai` 自带的客户端遇到 429 会退避重试，
//! 这里每次出题只允许一次请求。

use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{read_error_body, ProviderClient, ProviderKind};
use crate::config::Config;
use crate::error::ProviderError;

/// 固定的系统指令
pub const SYSTEM_MESSAGE: &str =
    "你是一名专业的试题命题专家。请严格按照要求的格式生成准确且具有教学价值的题目。";

pub struct OpenAiClient {
    http: Client,
    api_key: String,
    api_base: String,
    model_name: String,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: &Config, api_key: &str) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.to_string(),
            api_base: config.openai_api_base.trim_end_matches('/').to_string(),
            model_name: config.openai_model.clone(),
            temperature: config.temperature,
        }
    }

    fn build_messages(
        &self,
        prompt: &str,
    ) -> Result<Vec<ChatCompletionRequestMessage>, ProviderError> {
        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_MESSAGE)
            .build()
            .map_err(|e| ProviderError::request(ProviderKind::OpenAi, e))?;

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| ProviderError::request(ProviderKind::OpenAi, e))?;

        Ok(vec![
            ChatCompletionRequestMessage::System(system_msg),
            ChatCompletionRequestMessage::User(user_msg),
        ])
    }

    fn build_request(&self, prompt: &str) -> Result<CreateChatCompletionRequest, ProviderError> {
        CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(self.build_messages(prompt)?)
            .temperature(self.temperature)
            .build()
            .map_err(|e| ProviderError::request(ProviderKind::OpenAi, e))
    }
}

#[async_trait]
impl ProviderClient for OpenAiClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        debug!("调用 OpenAI API，模型: {}", self.model_name);
        debug!("提示词长度: {} 字符", prompt.chars().count());

        let request = self.build_request(prompt)?;

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("OpenAI API 调用失败: {}", e);
                ProviderError::request(ProviderKind::OpenAi, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("OpenAI API 返回状态码 {}", status);
            return Err(ProviderError::Status {
                provider: ProviderKind::OpenAi,
                status: status.as_u16(),
                body: read_error_body(response).await,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(ProviderKind::OpenAi, e.to_string()))?;

        debug!("OpenAI API 调用成功");

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ProviderError::malformed(ProviderKind::OpenAi, "choices[0].message.content 为空")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(api_base: &str) -> Config {
        Config {
            openai_api_base: api_base.to_string(),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_generate_returns_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "id": "chatcmpl-1",
                    "object": "chat.completion",
                    "created": 1700000000,
                    "model": "gpt-3.5-turbo",
                    "choices": [{
                        "index": 0,
                        "message": {"role": "assistant", "content": "[{\"question\":\"1+1?\"}]"},
                        "finish_reason": "stop"
                    }]
                }"#,
            )
            .create_async()
            .await;

        let client = OpenAiClient::new(&test_config(&server.url()), "sk-test");
        let text = client.generate("出题").await.unwrap();

        assert_eq!(text, r#"[{"question":"1+1?"}]"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthorized_becomes_provider_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error","param":null,"code":"invalid_api_key"}}"#,
            )
            .create_async()
            .await;

        let client = OpenAiClient::new(&test_config(&server.url()), "sk-wrong");
        let err = client.generate("出题").await.unwrap_err();

        assert_eq!(err.provider(), ProviderKind::OpenAi);
        assert!(matches!(err, ProviderError::Status { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_rate_limit_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"error":{"message":"Rate limit reached for requests","type":"requests","param":null,"code":"rate_limit_exceeded"}}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let client = OpenAiClient::new(&test_config(&server.url()), "sk-test");
        let err = client.generate("出题").await.unwrap_err();

        match err {
            ProviderError::Status { provider, status, body } => {
                assert_eq!(provider, ProviderKind::OpenAi);
                assert_eq!(status, 429);
                assert!(body.contains("rate_limit_exceeded"));
            }
            other => panic!("意外的错误: {:?}", other),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_request_carries_model_and_messages() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    {"role": "system", "content": SYSTEM_MESSAGE},
                    {"role": "user", "content": "出两道题"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"[]"}}]}"#)
            .create_async()
            .await;

        let text = OpenAiClient::new(&test_config(&server.url()), "sk-test")
            .generate("出两道题")
            .await
            .unwrap();

        assert_eq!(text, "[]");
        mock.assert_async().await;
    }
}
