//! 出题流程 - 流程层
//!
//! 核心职责：定义"一次出题"的完整处理流程
//!
//! 流程顺序：
//! 1. 校验请求
//! 2. 构建提示词
//! 3. 调用模型（单次请求，不重试）
//! 4. 解析草稿

use tracing::{debug, info};

use crate::clients::ProviderClient;
use crate::error::AppResult;
use crate::models::{GenerationRequest, QuestionDraft};
use crate::services::{PromptBuilder, ResponseParser};
use crate::utils::logging::truncate_text;

/// 一次出题的结果
///
/// 保留模型原始文本，方便用户查看或排查解析问题。
#[derive(Debug, Clone)]
pub struct GenerationBatch {
    pub request: GenerationRequest,
    pub drafts: Vec<QuestionDraft>,
    pub raw_text: String,
}

impl GenerationBatch {
    pub fn complete_count(&self) -> usize {
        self.drafts.iter().filter(|d| d.is_complete()).count()
    }
}

/// 出题流程
///
/// - 不持有客户端，客户端由调用方按当前设置创建
/// - 不修改题库，入库由会话决定
pub struct GenerationFlow {
    prompt_builder: PromptBuilder,
    parser: ResponseParser,
    max_count: u32,
}

impl GenerationFlow {
    pub fn new(max_count: u32) -> Self {
        Self {
            prompt_builder: PromptBuilder::new(),
            parser: ResponseParser::new(),
            max_count,
        }
    }

    pub async fn run(
        &self,
        client: &dyn ProviderClient,
        request: GenerationRequest,
    ) -> AppResult<GenerationBatch> {
        request.validate(self.max_count)?;

        let prompt = self.prompt_builder.build(&request);
        debug!("提示词: {}", truncate_text(&prompt.text, 200));

        info!(
            "🤖 正在通过 {} 生成 {} 道{}...",
            client.kind(),
            request.count,
            request.question_type
        );
        let raw_text = client.generate(&prompt.text).await?;
        debug!("模型原始输出: {}", truncate_text(&raw_text, 200));

        let drafts = self.parser.parse(&raw_text, request.question_type)?;
        if drafts.len() != request.count as usize {
            info!(
                "模型返回 {} 道题，与请求的 {} 道不一致",
                drafts.len(),
                request.count
            );
        }

        Ok(GenerationBatch {
            request,
            drafts,
            raw_text,
        })
    }
}
