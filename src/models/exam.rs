use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::error::InputError;
use crate::models::question::{timestamp_now, Question};

/// 考试时间范围（分钟）
pub const MIN_TIME_LIMIT: u32 = 10;
pub const MAX_TIME_LIMIT: u32 = 300;

/// 试卷基本信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamSpec {
    pub title: String,
    pub subject: String,
    pub time_limit_minutes: u32,
}

impl ExamSpec {
    pub fn validate(&self) -> Result<(), InputError> {
        if !(MIN_TIME_LIMIT..=MAX_TIME_LIMIT).contains(&self.time_limit_minutes) {
            return Err(InputError::TimeLimitOutOfRange {
                minutes: self.time_limit_minutes,
                min: MIN_TIME_LIMIT,
                max: MAX_TIME_LIMIT,
            });
        }
        Ok(())
    }
}

/// 试卷
///
/// 题目以共享引用保存，组卷后题库中删除题目不会影响已生成的试卷。
/// 重新组卷时整体替换。
#[derive(Debug, Clone)]
pub struct Exam {
    pub title: String,
    pub subject: String,
    pub time_limit_minutes: u32,
    pub questions: Vec<Arc<Question>>,
    pub created_at: NaiveDateTime,
}

impl Exam {
    pub fn new(spec: ExamSpec, questions: Vec<Arc<Question>>) -> Result<Self, InputError> {
        spec.validate()?;
        if questions.is_empty() {
            return Err(InputError::EmptySelection);
        }
        Ok(Self {
            title: spec.title,
            subject: spec.subject,
            time_limit_minutes: spec.time_limit_minutes,
            questions,
            created_at: timestamp_now(),
        })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
