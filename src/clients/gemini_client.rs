//! Gemini REST 客户端
//!
//! 直接 POST 到 `generateContent`，API 密钥放在查询参数中。

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::{read_error_body, ProviderClient, ProviderKind};
use crate::config::Config;
use crate::error::ProviderError;

pub struct GeminiClient {
    http: Client,
    api_key: String,
    api_base: String,
    model_name: String,
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &Config, api_key: &str) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.to_string(),
            api_base: config.gemini_api_base.trim_end_matches('/').to_string(),
            model_name: config.gemini_model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model_name
        )
    }
}

#[async_trait]
impl ProviderClient for GeminiClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        debug!("调用 Gemini API，模型: {}", self.model_name);

        let body = json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": self.max_output_tokens
            }
        });

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                // 去掉 URL，避免密钥出现在日志中
                let e = e.without_url();
                warn!("Gemini API 调用失败: {}", e);
                ProviderError::request(ProviderKind::Gemini, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: ProviderKind::Gemini,
                status: status.as_u16(),
                body: read_error_body(response).await,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(ProviderKind::Gemini, e.without_url().to_string()))?;

        debug!("Gemini API 调用成功");

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .ok_or_else(|| {
                ProviderError::malformed(
                    ProviderKind::Gemini,
                    "candidates[0].content.parts[0].text 缺失",
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn test_client(api_base: &str) -> GeminiClient {
        let config = Config {
            gemini_api_base: api_base.to_string(),
            ..Config::default()
        };
        GeminiClient::new(&config, "g-key")
    }

    #[tokio::test]
    async fn test_generate_returns_first_part() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-pro:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "g-key".into()))
            .match_body(Matcher::PartialJson(serde_json::json!({
                "contents": [{"parts": [{"text": "出题"}]}],
                "generationConfig": {"maxOutputTokens": 2000}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"好的 [ ]"}],"role":"model"}}]}"#)
            .create_async()
            .await;

        let text = test_client(&server.url()).generate("出题").await.unwrap();

        assert_eq!(text, "好的 [ ]");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_candidates_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/gemini-pro:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
            .create_async()
            .await;

        let err = test_client(&server.url()).generate("出题").await.unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_bad_key_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/gemini-pro:generateContent")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":{"message":"API key not valid"}}"#)
            .create_async()
            .await;

        let err = test_client(&server.url()).generate("出题").await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 400, .. }));
        assert!(!err.to_string().contains("g-key"));
    }
}
