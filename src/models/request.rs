use crate::error::InputError;
use crate::models::question::{Difficulty, QuestionType};

/// 单次生成的最少题目数
pub const MIN_QUESTION_COUNT: u32 = 1;

/// 未指定数量时的默认题目数，配置文件未设置时也用它
pub const DEFAULT_QUESTION_COUNT: u32 = 5;

/// 出题请求
///
/// 由界面收集，交给 PromptBuilder 使用。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub question_type: QuestionType,
    pub subject: String,
    pub difficulty: Difficulty,
    pub count: u32,
    pub extra_instructions: String,
}

impl GenerationRequest {
    pub fn new(question_type: QuestionType, subject: impl Into<String>) -> Self {
        Self {
            question_type,
            subject: subject.into(),
            difficulty: Difficulty::default(),
            count: DEFAULT_QUESTION_COUNT,
            extra_instructions: String::new(),
        }
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn with_extra_instructions(mut self, extra: impl Into<String>) -> Self {
        self.extra_instructions = extra.into();
        self
    }

    /// 发请求前的输入校验
    pub fn validate(&self, max_count: u32) -> Result<(), InputError> {
        if self.subject.trim().is_empty() {
            return Err(InputError::MissingSubject);
        }
        if !(MIN_QUESTION_COUNT..=max_count).contains(&self.count) {
            return Err(InputError::CountOutOfRange {
                count: self.count,
                min: MIN_QUESTION_COUNT,
                max: max_count,
            });
        }
        Ok(())
    }
}
