use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::clients::ProviderKind;
use crate::error::ConfigError;
use crate::models::request::DEFAULT_QUESTION_COUNT;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "exam_config.toml";

/// 程序配置
///
/// 不包含 API 密钥：密钥只保存在会话内存中。
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 默认使用的模型服务
    pub provider: ProviderKind,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 模型配置 ---
    pub openai_model: String,
    pub openai_api_base: String,
    pub anthropic_model: String,
    pub anthropic_api_base: String,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    // --- 出题配置 ---
    pub default_question_count: u32,
    pub max_question_count: u32,
    pub default_exam_title: String,
    /// 题目导出文件
    pub export_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            verbose_logging: false,
            openai_model: "gpt-3.5-turbo".to_string(),
            openai_api_base: "https://api.openai.com/v1".to_string(),
            anthropic_model: "claude-3-sonnet-20240229".to_string(),
            anthropic_api_base: "https://api.anthropic.com".to_string(),
            gemini_model: "gemini-pro".to_string(),
            gemini_api_base: "https://generativelanguage.googleapis.com".to_string(),
            temperature: 0.7,
            max_output_tokens: 2000,
            default_question_count: DEFAULT_QUESTION_COUNT,
            max_question_count: 20,
            default_exam_title: "期中考试".to_string(),
            export_path: "questions.json".to_string(),
        }
    }
}

impl Config {
    /// 加载配置：TOML 文件（可选）+ 环境变量覆盖
    ///
    /// 文件不存在时使用默认值。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let base = if path.exists() {
            debug!("读取配置文件: {}", path.display());
            Self::from_toml_file(path)?
        } else {
            Self::default()
        };
        base.with_env()
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 用环境变量覆盖当前配置
    pub fn with_env(self) -> Result<Self, ConfigError> {
        Ok(Self {
            provider: env_parse("EXAM_PROVIDER", "provider")?.unwrap_or(self.provider),
            verbose_logging: env_parse("VERBOSE_LOGGING", "bool")?.unwrap_or(self.verbose_logging),
            openai_model: std::env::var("OPENAI_MODEL").unwrap_or(self.openai_model),
            openai_api_base: std::env::var("OPENAI_API_BASE").unwrap_or(self.openai_api_base),
            anthropic_model: std::env::var("ANTHROPIC_MODEL").unwrap_or(self.anthropic_model),
            anthropic_api_base: std::env::var("ANTHROPIC_API_BASE")
                .unwrap_or(self.anthropic_api_base),
            gemini_model: std::env::var("GEMINI_MODEL").unwrap_or(self.gemini_model),
            gemini_api_base: std::env::var("GEMINI_API_BASE").unwrap_or(self.gemini_api_base),
            export_path: std::env::var("EXPORT_PATH").unwrap_or(self.export_path),
            ..self
        })
    }

    /// 指定模型服务对应的模型名称
    pub fn model_for(&self, provider: ProviderKind) -> &str {
        match provider {
            ProviderKind::OpenAi => &self.openai_model,
            ProviderKind::Anthropic => &self.anthropic_model,
            ProviderKind::Gemini => &self.gemini_model,
        }
    }

    /// 指定模型服务对应的 API 地址
    pub fn api_base_for(&self, provider: ProviderKind) -> &str {
        match provider {
            ProviderKind::OpenAi => &self.openai_api_base,
            ProviderKind::Anthropic => &self.anthropic_api_base,
            ProviderKind::Gemini => &self.gemini_api_base,
        }
    }
}

fn env_parse<T: std::str::FromStr>(
    var_name: &str,
    expected_type: &str,
) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
