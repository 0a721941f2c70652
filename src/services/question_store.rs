//! 题库 - 业务能力层
//!
//! 会话内的有序题目列表。单会话单写者，不需要加锁。

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::InputError;
use crate::models::{Difficulty, NewQuestion, Question, QuestionId, QuestionType};

/// 题库筛选条件，未设置的维度不过滤，各条件之间为"与"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionFilter {
    pub subject: Option<String>,
    pub question_type: Option<QuestionType>,
    pub difficulty: Option<Difficulty>,
}

impl QuestionFilter {
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn question_type(mut self, question_type: QuestionType) -> Self {
        self.question_type = Some(question_type);
        self
    }

    pub fn difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    pub fn matches(&self, question: &Question) -> bool {
        self.subject.as_ref().map_or(true, |s| &question.subject == s)
            && self
                .question_type
                .map_or(true, |t| question.question_type == t)
            && self.difficulty.map_or(true, |d| question.difficulty == d)
    }
}

/// 题库统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub total: usize,
    pub most_common_subject: Option<String>,
    pub most_common_type: Option<QuestionType>,
}

#[derive(Debug)]
pub struct QuestionStore {
    questions: Vec<Arc<Question>>,
    next_id: u64,
}

impl Default for QuestionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionStore {
    pub fn new() -> Self {
        Self {
            questions: Vec::new(),
            next_id: 1,
        }
    }

    /// 校验并追加题目，返回新分配的编号
    ///
    /// 编号单调递增，删除后不会复用。
    pub fn add(&mut self, new: NewQuestion) -> Result<QuestionId, InputError> {
        let id = QuestionId(self.next_id);
        let question = Question::create(id, new)?;
        self.next_id += 1;

        debug!("题目 {} 已入库: {}", id, question.subject);
        self.questions.push(Arc::new(question));
        Ok(id)
    }

    /// 按编号删除；编号不存在时什么也不做
    pub fn remove(&mut self, id: QuestionId) -> bool {
        let before = self.questions.len();
        self.questions.retain(|q| q.id != id);
        let removed = self.questions.len() != before;
        if removed {
            debug!("题目 {} 已删除", id);
        }
        removed
    }

    /// 追加导入的题目，不去重
    ///
    /// 之后新建的题目编号从导入数据的最大编号之后开始。
    /// 最大编号已无后继时整批拒绝，题库保持不变。
    pub fn import(&mut self, questions: Vec<Question>) -> Result<usize, InputError> {
        let count = questions.len();
        if let Some(max_id) = questions.iter().map(|q| q.id.0).max() {
            let next = max_id
                .checked_add(1)
                .ok_or(InputError::IdOutOfRange(max_id))?;
            self.next_id = self.next_id.max(next);
        }
        self.questions
            .extend(questions.into_iter().map(Arc::new));
        info!("导入 {} 道题目，题库现有 {} 道", count, self.questions.len());
        Ok(count)
    }

    pub fn clear(&mut self) {
        self.questions.clear();
    }

    pub fn all(&self) -> &[Arc<Question>] {
        &self.questions
    }

    pub fn get(&self, id: QuestionId) -> Option<&Arc<Question>> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn filter(&self, filter: &QuestionFilter) -> Vec<Arc<Question>> {
        self.questions
            .iter()
            .filter(|q| filter.matches(q))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// 题库中出现过的科目（按首次出现顺序）
    pub fn subjects(&self) -> Vec<String> {
        let mut subjects: Vec<String> = Vec::new();
        for q in &self.questions {
            if !subjects.contains(&q.subject) {
                subjects.push(q.subject.clone());
            }
        }
        subjects
    }

    /// 题库中出现过的题型
    pub fn question_types(&self) -> Vec<QuestionType> {
        QuestionType::ALL
            .into_iter()
            .filter(|t| self.questions.iter().any(|q| q.question_type == *t))
            .collect()
    }

    /// 题库中出现过的难度
    pub fn difficulties(&self) -> Vec<Difficulty> {
        Difficulty::ALL
            .into_iter()
            .filter(|d| self.questions.iter().any(|q| q.difficulty == *d))
            .collect()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            total: self.questions.len(),
            most_common_subject: most_common(self.questions.iter().map(|q| q.subject.clone())),
            most_common_type: most_common(self.questions.iter().map(|q| q.question_type)),
        }
    }
}

/// 出现次数最多的值；次数相同时取先出现的
fn most_common<T: PartialEq>(values: impl Iterator<Item = T>) -> Option<T> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value, 1)),
        }
    }

    let mut best: Option<(T, usize)> = None;
    for (value, n) in counts {
        if best.as_ref().map_or(true, |(_, m)| n > *m) {
            best = Some((value, n));
        }
    }
    best.map(|(value, _)| value)
}
