//! 组卷 - 业务能力层
//!
//! 从题库中选题，生成试卷和答案。试卷和答案是同一选题的两个独立视图，
//! 题号都按选题顺序从 1 开始编号。

use std::fmt::Write as _;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{info, warn};

use crate::error::InputError;
use crate::models::marker::OPTION_MARKERS;
use crate::models::{Exam, ExamSpec, Question, QuestionId, QuestionType};
use crate::services::question_store::QuestionStore;

/// 选题方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// 随机抽取 n 道（不放回）
    Random(usize),
    /// 按给定编号和顺序选取
    Explicit(Vec<QuestionId>),
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ExamAssembler;

impl ExamAssembler {
    pub fn new() -> Self {
        Self
    }

    /// 不放回地均匀随机抽取 `n` 道题，`n` 超过题库大小时取全部
    pub fn select_random<R: Rng + ?Sized>(
        &self,
        store: &QuestionStore,
        n: usize,
        rng: &mut R,
    ) -> Vec<Arc<Question>> {
        store.all().choose_multiple(rng, n).cloned().collect()
    }

    /// 按调用方给定的顺序选题；不存在的编号被跳过
    pub fn select_explicit(&self, store: &QuestionStore, ids: &[QuestionId]) -> Vec<Arc<Question>> {
        ids.iter()
            .filter_map(|id| {
                let found = store.get(*id).cloned();
                if found.is_none() {
                    warn!("题目 {} 不存在，已跳过", id);
                }
                found
            })
            .collect()
    }

    pub fn select<R: Rng + ?Sized>(
        &self,
        store: &QuestionStore,
        selection: &Selection,
        rng: &mut R,
    ) -> Vec<Arc<Question>> {
        match selection {
            Selection::Random(n) => self.select_random(store, *n, rng),
            Selection::Explicit(ids) => self.select_explicit(store, ids),
        }
    }

    /// 组卷
    pub fn assemble<R: Rng + ?Sized>(
        &self,
        store: &QuestionStore,
        spec: ExamSpec,
        selection: &Selection,
        rng: &mut R,
    ) -> Result<Exam, InputError> {
        let questions = self.select(store, selection, rng);
        let exam = Exam::new(spec, questions)?;
        info!("📋 试卷「{}」已生成，共 {} 题", exam.title, exam.len());
        Ok(exam)
    }

    /// 渲染试卷（Markdown）
    pub fn render_questions(&self, exam: &Exam) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# {}", exam.title);
        let _ = writeln!(out, "**科目：** {}  ", exam.subject);
        let _ = writeln!(out, "**考试时间：** {} 分钟  ", exam.time_limit_minutes);
        let _ = writeln!(out, "**题目总数：** {} 题  ", exam.len());
        let _ = writeln!(out, "**日期：** {}", exam.created_at.format("%Y年%m月%d日"));
        let _ = writeln!(out, "\n---\n");

        for (number, question) in numbered(exam) {
            let _ = writeln!(out, "**{}. {}**", number, question.question_text);
            if question.question_type == QuestionType::MultipleChoice {
                for (marker, option) in OPTION_MARKERS.iter().zip(question.options.iter().flatten()) {
                    if !option.is_empty() {
                        let _ = writeln!(out, "　{} {}", marker, option);
                    }
                }
            }
            out.push('\n');
        }
        out
    }

    /// 渲染答案（与试卷题号一致）
    pub fn render_answer_key(&self, exam: &Exam) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# {} - 答案", exam.title);
        for (number, question) in numbered(exam) {
            let _ = writeln!(out, "{}. {}", number, question.answer);
        }
        out
    }
}

fn numbered(exam: &Exam) -> impl Iterator<Item = (usize, &Arc<Question>)> {
    exam.questions.iter().enumerate().map(|(i, q)| (i + 1, q))
}
