//! 模型服务客户端
//!
//! 三种不同的托管 API 形态，统一在 [`ProviderClient`] 之后：
//! - `openai_client` - 聊天补全接口（async-openai）
//! - `anthropic_client` - messages 接口（reqwest）
//! - `gemini_client` - REST generateContent 接口（reqwest）
//!
//! 调用方通过 [`ProviderKind`] 选择实现，不做运行时类型判断。
//! 每次调用只发出一次请求，不重试。

pub mod anthropic_client;
pub mod gemini_client;
pub mod openai_client;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::ProviderError;

pub use anthropic_client::AnthropicClient;
pub use gemini_client::GeminiClient;
pub use openai_client::OpenAiClient;

/// 模型服务种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Gemini,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Gemini,
    ];

    /// 显示名称
    pub fn name(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI (GPT)",
            ProviderKind::Anthropic => "Anthropic (Claude)",
            ProviderKind::Gemini => "Google (Gemini)",
        }
    }

    /// 读取 API 密钥的环境变量名
    pub fn api_key_env(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "open_ai" | "gpt" => Ok(ProviderKind::OpenAi),
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            other => Err(format!("未知的模型服务: {}", other)),
        }
    }
}

/// 模型服务客户端
///
/// 返回模型生成的原始文本；任何失败都归一为 [`ProviderError`]。
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// 客户端对应的服务种类
    fn kind(&self) -> ProviderKind;

    /// 发送提示词并返回原始文本
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// 按种类创建客户端
///
/// 密钥为空时直接返回 [`ProviderError::MissingApiKey`]，不发请求。
pub fn build_client(
    kind: ProviderKind,
    api_key: &str,
    config: &Config,
) -> Result<Box<dyn ProviderClient>, ProviderError> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(ProviderError::MissingApiKey { provider: kind });
    }

    let client: Box<dyn ProviderClient> = match kind {
        ProviderKind::OpenAi => Box::new(OpenAiClient::new(config, api_key)),
        ProviderKind::Anthropic => Box::new(AnthropicClient::new(config, api_key)),
        ProviderKind::Gemini => Box::new(GeminiClient::new(config, api_key)),
    };
    Ok(client)
}

/// 读取非 2xx 响应体，供错误信息使用
pub(crate) async fn read_error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|e| format!("<无法读取响应体: {}>", e))
}
