//! 会话 - 流程层
//!
//! 封装一次程序运行期间的全部状态：配置、各服务的密钥、当前服务、题库和当前试卷。
//! 界面层只和 `Session` 打交道。

use std::collections::HashMap;
use std::env;
use std::path::Path;

use tracing::{info, warn};

use crate::clients::{build_client, ProviderClient, ProviderKind};
use crate::config::Config;
use crate::error::{AppResult, InputError, ProviderError};
use crate::models::marker;
use crate::models::{
    export_questions, load_questions, Exam, ExamSpec, GenerationRequest, NewQuestion, QuestionId,
    QuestionType,
};
use crate::services::{ExamAssembler, QuestionStore, Selection};
use crate::workflow::generation_flow::{GenerationBatch, GenerationFlow};

/// 草稿入库结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub saved: usize,
    pub skipped: usize,
}

pub struct Session {
    config: Config,
    api_keys: HashMap<ProviderKind, String>,
    provider: ProviderKind,
    flow: GenerationFlow,
    assembler: ExamAssembler,
    store: QuestionStore,
    current_exam: Option<Exam>,
}

impl Session {
    /// 创建会话，并从环境变量读取已有的密钥
    pub fn new(config: Config) -> Self {
        let mut api_keys = HashMap::new();
        for kind in ProviderKind::ALL {
            if let Ok(key) = env::var(kind.api_key_env()) {
                if !key.trim().is_empty() {
                    api_keys.insert(kind, key.trim().to_string());
                }
            }
        }

        Self {
            provider: config.provider,
            flow: GenerationFlow::new(config.max_question_count),
            assembler: ExamAssembler::new(),
            store: QuestionStore::new(),
            current_exam: None,
            api_keys,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &QuestionStore {
        &self.store
    }

    pub fn assembler(&self) -> &ExamAssembler {
        &self.assembler
    }

    pub fn current_exam(&self) -> Option<&Exam> {
        self.current_exam.as_ref()
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn select_provider(&mut self, kind: ProviderKind) {
        info!("切换模型服务: {} → {}", self.provider, kind);
        self.provider = kind;
    }

    /// 设置密钥（只保存在内存中）；空字符串表示清除
    pub fn set_api_key(&mut self, kind: ProviderKind, key: &str) {
        let key = key.trim();
        if key.is_empty() {
            self.api_keys.remove(&kind);
            info!("已清除 {} 的 API 密钥", kind);
        } else {
            self.api_keys.insert(kind, key.to_string());
            info!("已设置 {} 的 API 密钥", kind);
        }
    }

    pub fn has_api_key(&self, kind: ProviderKind) -> bool {
        self.api_keys.contains_key(&kind)
    }

    /// 按当前设置创建客户端
    pub fn client(&self) -> Result<Box<dyn ProviderClient>, ProviderError> {
        let key = self
            .api_keys
            .get(&self.provider)
            .map(String::as_str)
            .unwrap_or_default();
        build_client(self.provider, key, &self.config)
    }

    /// 用当前服务出题
    pub async fn generate(&self, request: GenerationRequest) -> AppResult<GenerationBatch> {
        let client = self.client()?;
        self.generate_with(client.as_ref(), request).await
    }

    /// 用指定客户端出题
    pub async fn generate_with(
        &self,
        client: &dyn ProviderClient,
        request: GenerationRequest,
    ) -> AppResult<GenerationBatch> {
        self.flow.run(client, request).await
    }

    /// 把草稿存入题库
    ///
    /// 完整草稿全部入库；不完整草稿仅在 `keep_incomplete` 时尝试入库，
    /// 仍然无法通过校验的计入 `skipped`。
    pub fn save_drafts(&mut self, batch: &GenerationBatch, keep_incomplete: bool) -> SaveReport {
        let mut report = SaveReport::default();

        for (index, draft) in batch.drafts.iter().enumerate() {
            if !draft.is_complete() && !keep_incomplete {
                report.skipped += 1;
                continue;
            }

            match draft
                .validated(&batch.request)
                .and_then(|new| self.store.add(new))
            {
                Ok(_) => report.saved += 1,
                Err(e) => {
                    warn!("第 {} 题未能入库: {}", index + 1, e);
                    report.skipped += 1;
                }
            }
        }

        info!(
            "💾 入库 {} 道，跳过 {} 道，题库现有 {} 道",
            report.saved,
            report.skipped,
            self.store.len()
        );
        report
    }

    /// 手动录入题目
    ///
    /// 比模型草稿更严格：选择题答案必须是可识别的选项标记。
    pub fn add_manual(&mut self, new: NewQuestion) -> Result<QuestionId, InputError> {
        if new.question_type == QuestionType::MultipleChoice
            && !new.answer.trim().is_empty()
            && marker::normalize_choice(&new.answer).is_none()
        {
            return Err(InputError::InvalidOptionMarker(new.answer.trim().to_string()));
        }
        let id = self.store.add(new)?;
        info!("✓ 手动录入题目 {}", id);
        Ok(id)
    }

    pub fn remove(&mut self, id: QuestionId) -> bool {
        self.store.remove(id)
    }

    /// 组卷，替换当前试卷
    pub fn create_exam(&mut self, spec: ExamSpec, selection: &Selection) -> AppResult<&Exam> {
        let exam =
            self.assembler
                .assemble(&self.store, spec, selection, &mut rand::thread_rng())?;
        Ok(self.current_exam.insert(exam))
    }

    /// 导出题库
    pub async fn export(&self, path: &Path) -> AppResult<usize> {
        export_questions(path, self.store.all()).await?;
        Ok(self.store.len())
    }

    /// 导入题目，追加到题库末尾
    pub async fn import(&mut self, path: &Path) -> AppResult<usize> {
        let questions = load_questions(path).await?;
        Ok(self.store.import(questions)?)
    }

    /// 清空题库；当前试卷不受影响
    pub fn clear(&mut self) {
        let count = self.store.len();
        self.store.clear();
        info!("🗑️ 已清空题库（{} 道）", count);
    }
}
