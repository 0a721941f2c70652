use thiserror::Error;

use crate::clients::ProviderKind;

/// 应用程序错误类型
///
/// 所有错误都在产生处被处理并展示给用户，不会让进程退出。
#[derive(Debug, Error)]
pub enum AppError {
    /// 模型服务调用错误
    #[error("模型服务错误: {0}")]
    Provider(#[from] ProviderError),
    /// 模型返回内容解析错误
    #[error("响应解析错误: {0}")]
    Parse(#[from] ParseError),
    /// 用户输入错误
    #[error("输入错误: {0}")]
    Input(#[from] InputError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 控制台读写错误
    #[error("控制台读写失败: {0}")]
    Io(#[from] std::io::Error),
}

/// 模型服务调用错误
///
/// 鉴权、网络、HTTP 状态码或响应结构不符，一律归为此类。
/// 出错时不携带任何模型原始文本。
#[derive(Debug, Error)]
pub enum ProviderError {
    /// 未设置 API 密钥
    #[error("{provider} 未设置 API 密钥")]
    MissingApiKey { provider: ProviderKind },

    /// 请求未能完成（网络、SDK 内部错误）
    #[error("{provider} 请求失败: {source}")]
    Request {
        provider: ProviderKind,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 返回非 2xx 状态码
    #[error("{provider} 返回错误状态 {status}: {body}")]
    Status {
        provider: ProviderKind,
        status: u16,
        body: String,
    },

    /// 响应结构中缺少预期字段
    #[error("{provider} 响应格式异常: {detail}")]
    MalformedResponse {
        provider: ProviderKind,
        detail: String,
    },
}

impl ProviderError {
    /// 出错的模型服务
    pub fn provider(&self) -> ProviderKind {
        match self {
            ProviderError::MissingApiKey { provider }
            | ProviderError::Request { provider, .. }
            | ProviderError::Status { provider, .. }
            | ProviderError::MalformedResponse { provider, .. } => *provider,
        }
    }

    pub(crate) fn request(
        provider: ProviderKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ProviderError::Request {
            provider,
            source: Box::new(source),
        }
    }

    pub(crate) fn malformed(provider: ProviderKind, detail: impl Into<String>) -> Self {
        ProviderError::MalformedResponse {
            provider,
            detail: detail.into(),
        }
    }
}

/// 模型返回文本中找不到可用的 JSON
#[derive(Debug, Error)]
pub enum ParseError {
    /// 文本中既没有 `[...]` 也没有 `{...}`
    #[error("响应中未找到 JSON 内容")]
    NoJson { raw: String },

    /// 找到的片段不是合法 JSON
    #[error("JSON 解析失败: {source}")]
    InvalidJson {
        snippet: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ParseError {
    /// 展示给用户的原始片段
    pub fn offending_text(&self) -> &str {
        match self {
            ParseError::NoJson { raw } => raw,
            ParseError::InvalidJson { snippet, .. } => snippet,
        }
    }
}

/// 草稿题目的非致命校验提示
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationWarning {
    #[error("缺少字段 `{0}`")]
    MissingField(&'static str),
    #[error("选项数量应为 4，实际为 {found}")]
    WrongOptionCount { found: usize },
    #[error("判断题答案只能是 O 或 X，实际为 `{value}`")]
    InvalidTrueFalse { value: String },
    #[error("数组元素不是 JSON 对象")]
    NotAnObject,
}

/// 用户输入错误，在发起任何网络请求之前检出
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("请输入科目名称")]
    MissingSubject,
    #[error("请输入题目内容")]
    MissingQuestionText,
    #[error("请输入正确答案")]
    MissingAnswer,
    #[error("题目数量 {count} 超出范围 [{min}, {max}]")]
    CountOutOfRange { count: u32, min: u32, max: u32 },
    #[error("选择题需要 {expected} 个选项，实际为 {found}")]
    OptionCount { expected: usize, found: usize },
    #[error("只有选择题可以带选项")]
    UnexpectedOptions,
    #[error("无法识别的选项标记: {0}")]
    InvalidOptionMarker(String),
    #[error("判断题答案只能是 O 或 X，实际为 `{0}`")]
    InvalidTrueFalseAnswer(String),
    #[error("考试时间 {minutes} 分钟超出范围 [{min}, {max}]")]
    TimeLimitOutOfRange { minutes: u32, min: u32, max: u32 },
    #[error("没有选中任何题目")]
    EmptySelection,
    #[error("无法识别的输入: {0}")]
    UnknownChoice(String),
    #[error("题目编号 {0} 过大，无法继续分配新编号")]
    IdOutOfRange(u64),
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("题目数据格式错误 ({path}): {source}")]
    InvalidFormat {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML 解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
