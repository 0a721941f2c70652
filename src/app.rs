//! 控制台界面 - 编排层
//!
//! ## 职责
//!
//! 1. **菜单循环**：读取用户选择并分派到各功能
//! 2. **输入收集**：把用户输入转成 `GenerationRequest` / `NewQuestion` / `ExamSpec`
//! 3. **结果展示**：草稿预览、题库列表、试卷和答案
//!
//! 所有错误都在这里展示给用户，然后回到菜单，不会让程序退出。
//! 输入输出是泛型的，测试时可以用内存缓冲区驱动。

use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use tracing::warn;

use crate::clients::ProviderKind;
use crate::error::{AppError, AppResult, InputError};
use crate::models::marker::OPTION_MARKERS;
use crate::models::question::OPTION_COUNT;
use crate::models::{
    Difficulty, ExamSpec, GenerationRequest, NewQuestion, Question, QuestionDraft, QuestionId,
    QuestionType,
};
use crate::services::{QuestionFilter, Selection};
use crate::utils::logging::{self, truncate_text};
use crate::workflow::{GenerationBatch, Session};

const DEFAULT_TIME_LIMIT: u32 = 60;

/// 应用主结构
pub struct App<R, W> {
    session: Session,
    input: R,
    output: W,
    eof: bool,
}

impl<R: BufRead, W: Write> App<R, W> {
    pub fn new(session: Session, input: R, output: W) -> Self {
        Self {
            session,
            input,
            output,
            eof: false,
        }
    }

    /// 运行菜单循环，直到用户退出或输入结束
    pub async fn run(&mut self) -> io::Result<()> {
        logging::log_startup(self.session.config());

        loop {
            self.print_main_menu()?;
            let choice = self.ask("请选择")?;
            if self.eof {
                break;
            }

            let result = match choice.as_str() {
                "1" => self.generate_menu().await,
                "2" => self.manual_entry(),
                "3" => self.bank_menu(),
                "4" => self.exam_menu(),
                "5" => self.settings_menu().await,
                "0" | "q" | "quit" | "exit" => break,
                other => Err(InputError::UnknownChoice(other.to_string()).into()),
            };

            if let Err(e) = result {
                warn!("操作失败: {}", e);
                writeln!(self.output, "❌ {}", e)?;
            }
        }

        writeln!(self.output, "👋 再见")?;
        Ok(())
    }

    fn print_main_menu(&mut self) -> io::Result<()> {
        let provider = self.session.provider();
        let key_state = if self.session.has_api_key(provider) {
            "已设置密钥"
        } else {
            "未设置密钥"
        };
        writeln!(self.output, "\n{}", "=".repeat(40))?;
        writeln!(self.output, "📝 AI 试卷生成器")?;
        writeln!(
            self.output,
            "模型服务: {} ({}) | 题库: {} 道",
            provider,
            key_state,
            self.session.store().len()
        )?;
        writeln!(self.output, "{}", "=".repeat(40))?;
        writeln!(self.output, "1. AI 出题")?;
        writeln!(self.output, "2. 手动录题")?;
        writeln!(self.output, "3. 题库管理")?;
        writeln!(self.output, "4. 组卷")?;
        writeln!(self.output, "5. 设置")?;
        writeln!(self.output, "0. 退出")
    }

    // ========== AI 出题 ==========

    async fn generate_menu(&mut self) -> AppResult<()> {
        let question_type = self.choose("题型", &QuestionType::ALL, None)?;
        let subject = self.ask("科目")?;
        let difficulty = self.choose("难度", &Difficulty::ALL, Some(Difficulty::default()))?;
        let default_count = self.session.config().default_question_count;
        let count = self.ask_number(&format!("题目数量 (默认 {})", default_count), default_count)?;
        let extra = self.ask("补充要求 (可留空)")?;

        let request = GenerationRequest::new(question_type, subject)
            .with_difficulty(difficulty)
            .with_count(count)
            .with_extra_instructions(extra);

        writeln!(self.output, "⏳ 正在生成，请稍候...")?;
        let batch = match self.session.generate(request).await {
            Ok(batch) => batch,
            Err(AppError::Parse(e)) => {
                writeln!(self.output, "模型原始输出:\n{}", e.offending_text())?;
                return Err(e.into());
            }
            Err(e) => return Err(e),
        };

        self.print_drafts(&batch)?;
        self.review_batch(&batch)
    }

    fn print_drafts(&mut self, batch: &GenerationBatch) -> io::Result<()> {
        writeln!(
            self.output,
            "\n✓ 生成了 {} 道{}（完整 {} 道）",
            batch.drafts.len(),
            batch.request.question_type,
            batch.complete_count()
        )?;
        for (index, draft) in batch.drafts.iter().enumerate() {
            self.print_draft(index + 1, draft)?;
        }
        Ok(())
    }

    fn print_draft(&mut self, number: usize, draft: &QuestionDraft) -> io::Result<()> {
        writeln!(self.output, "\n**{}. {}**", number, draft.question)?;
        for (marker, option) in OPTION_MARKERS.iter().zip(&draft.options) {
            writeln!(self.output, "　{} {}", marker, option)?;
        }
        writeln!(self.output, "答案: {}", draft.answer)?;
        if let Some(explanation) = &draft.explanation {
            writeln!(self.output, "解析: {}", explanation)?;
        }
        for warning in &draft.warnings {
            writeln!(self.output, "⚠️ {}", warning)?;
        }
        Ok(())
    }

    fn review_batch(&mut self, batch: &GenerationBatch) -> AppResult<()> {
        loop {
            writeln!(self.output, "\n1. 全部保存到题库")?;
            writeln!(self.output, "2. 查看模型原始输出")?;
            writeln!(self.output, "0. 放弃")?;
            let choice = self.ask("请选择")?;
            if self.eof {
                return Ok(());
            }

            match choice.as_str() {
                "1" => {
                    let keep_incomplete = batch.complete_count() < batch.drafts.len()
                        && self.confirm("有不完整的题目，是否也尝试保存")?;
                    let report = self.session.save_drafts(batch, keep_incomplete);
                    writeln!(
                        self.output,
                        "💾 已保存 {} 道，跳过 {} 道",
                        report.saved, report.skipped
                    )?;
                    return Ok(());
                }
                "2" => writeln!(self.output, "{}", batch.raw_text)?,
                "0" => return Ok(()),
                other => writeln!(self.output, "❌ {}", InputError::UnknownChoice(other.into()))?,
            }
        }
    }

    // ========== 手动录题 ==========

    fn manual_entry(&mut self) -> AppResult<()> {
        let question_type = self.choose("题型", &QuestionType::ALL, None)?;
        let subject = self.ask("科目")?;
        let difficulty = self.choose("难度", &Difficulty::ALL, Some(Difficulty::default()))?;
        let question_text = self.ask("题目内容")?;

        let options = if question_type == QuestionType::MultipleChoice {
            let mut options = Vec::with_capacity(OPTION_COUNT);
            for marker in OPTION_MARKERS {
                options.push(self.ask(&format!("选项 {}", marker))?);
            }
            Some(options)
        } else {
            None
        };

        let answer_hint = match question_type {
            QuestionType::MultipleChoice => "正确答案 (①-④ / 1-4 / A-D)",
            QuestionType::TrueFalse => "正确答案 (O / X)",
            QuestionType::ShortAnswer => "参考答案",
        };
        let answer = self.ask(answer_hint)?;
        let explanation = self.ask("解析 (可留空)")?;

        let id = self.session.add_manual(NewQuestion {
            question_type,
            subject,
            difficulty,
            question_text,
            options,
            answer,
            explanation: Some(explanation),
        })?;
        writeln!(self.output, "✓ 已保存，题目编号 {}", id)?;
        Ok(())
    }

    // ========== 题库管理 ==========

    fn bank_menu(&mut self) -> AppResult<()> {
        if self.session.store().is_empty() {
            writeln!(self.output, "题库为空")?;
            return Ok(());
        }

        let store = self.session.store();
        let subjects = store.subjects();
        let types = store.question_types();
        let difficulties = store.difficulties();

        let mut filter = QuestionFilter::default();
        if let Some(subject) = self.choose_optional("科目", &subjects)? {
            filter = filter.subject(subject);
        }
        if let Some(question_type) = self.choose_optional("题型", &types)? {
            filter = filter.question_type(question_type);
        }
        if let Some(difficulty) = self.choose_optional("难度", &difficulties)? {
            filter = filter.difficulty(difficulty);
        }

        let questions = self.session.store().filter(&filter);
        writeln!(self.output, "\n共 {} 道题", questions.len())?;
        for question in &questions {
            self.print_question_line(question)?;
        }

        let input = self.ask("输入要删除的题目编号 (回车返回)")?;
        if input.is_empty() {
            return Ok(());
        }
        let id = parse_id(&input)?;
        if self.session.remove(id) {
            writeln!(self.output, "🗑️ 已删除题目 {}", id)?;
        } else {
            writeln!(self.output, "题目 {} 不存在", id)?;
        }
        Ok(())
    }

    fn print_question_line(&mut self, question: &Question) -> io::Result<()> {
        writeln!(
            self.output,
            "[{}] {} | {} | {} | {}",
            question.id,
            question.question_type,
            question.subject,
            question.difficulty,
            truncate_text(&question.question_text, 40)
        )
    }

    // ========== 组卷 ==========

    fn exam_menu(&mut self) -> AppResult<()> {
        if self.session.store().is_empty() {
            writeln!(self.output, "题库为空，请先出题")?;
            return Ok(());
        }

        let default_title = self.session.config().default_exam_title.clone();
        let title = self.ask(&format!("试卷标题 (默认 {})", default_title))?;
        let title = if title.is_empty() { default_title } else { title };

        let default_subject = self
            .session
            .store()
            .stats()
            .most_common_subject
            .unwrap_or_default();
        let subject = self.ask(&format!("科目 (默认 {})", default_subject))?;
        let subject = if subject.is_empty() {
            default_subject
        } else {
            subject
        };

        let time_limit_minutes = self.ask_number(
            &format!("考试时间/分钟 (默认 {})", DEFAULT_TIME_LIMIT),
            DEFAULT_TIME_LIMIT,
        )?;

        writeln!(self.output, "1. 随机抽题")?;
        writeln!(self.output, "2. 指定题目编号")?;
        let selection = match self.ask("选题方式")?.as_str() {
            "1" | "" => {
                let total = self.session.store().len() as u32;
                let n = self.ask_number(&format!("抽取数量 (默认 {})", total), total)?;
                Selection::Random(n as usize)
            }
            "2" => {
                for question in self.session.store().all().to_vec() {
                    self.print_question_line(&question)?;
                }
                let input = self.ask("题目编号 (用逗号或空格分隔)")?;
                let ids = input
                    .split(|c: char| c == ',' || c == '，' || c.is_whitespace())
                    .filter(|s| !s.is_empty())
                    .map(parse_id)
                    .collect::<Result<Vec<_>, _>>()?;
                Selection::Explicit(ids)
            }
            other => return Err(InputError::UnknownChoice(other.to_string()).into()),
        };

        let spec = ExamSpec {
            title,
            subject,
            time_limit_minutes,
        };
        let exam = self.session.create_exam(spec, &selection)?.clone();
        let assembler = self.session.assembler();
        let sheet = assembler.render_questions(&exam);
        let key = assembler.render_answer_key(&exam);

        writeln!(self.output, "\n{}", sheet)?;
        writeln!(self.output, "{}", "─".repeat(40))?;
        writeln!(self.output, "{}", key)?;
        Ok(())
    }

    // ========== 设置 ==========

    async fn settings_menu(&mut self) -> AppResult<()> {
        writeln!(self.output, "1. 选择模型服务")?;
        writeln!(self.output, "2. 设置 API 密钥")?;
        writeln!(self.output, "3. 导出题库")?;
        writeln!(self.output, "4. 导入题库")?;
        writeln!(self.output, "5. 清空题库")?;
        writeln!(self.output, "6. 题库统计")?;
        writeln!(self.output, "0. 返回")?;

        match self.ask("请选择")?.as_str() {
            "1" => {
                let current = self.session.provider();
                let kind = self.choose("模型服务", &ProviderKind::ALL, Some(current))?;
                self.session.select_provider(kind);
                writeln!(self.output, "✓ 当前模型服务: {}", kind)?;
            }
            "2" => {
                let kind = self.session.provider();
                let key = self.ask(&format!("{} API 密钥 (留空清除)", kind))?;
                self.session.set_api_key(kind, &key);
                writeln!(self.output, "✓ 已更新 {} 的密钥", kind)?;
            }
            "3" => {
                let path = self.ask_path()?;
                let count = self.session.export(&path).await?;
                writeln!(self.output, "✓ 已导出 {} 道题目到 {}", count, path.display())?;
            }
            "4" => {
                let path = self.ask_path()?;
                let count = self.session.import(&path).await?;
                writeln!(self.output, "✓ 已导入 {} 道题目", count)?;
            }
            "5" => {
                if self.confirm("确定要清空题库吗")? {
                    self.session.clear();
                    writeln!(self.output, "✓ 题库已清空")?;
                }
            }
            "6" => {
                let stats = self.session.store().stats();
                logging::log_store_stats(&stats);
                writeln!(self.output, "题目总数: {}", stats.total)?;
                writeln!(
                    self.output,
                    "最多的科目: {}",
                    stats.most_common_subject.as_deref().unwrap_or("-")
                )?;
                let most_common_type = stats
                    .most_common_type
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "-".to_string());
                writeln!(self.output, "最多的题型: {}", most_common_type)?;
            }
            "0" | "" => {}
            other => return Err(InputError::UnknownChoice(other.to_string()).into()),
        }
        Ok(())
    }

    // ========== 输入辅助 ==========

    /// 读取一行并去掉首尾空白；输入结束时返回空字符串并记录 `eof`
    fn ask(&mut self, label: &str) -> io::Result<String> {
        write!(self.output, "{}: ", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            self.eof = true;
        }
        Ok(line.trim().to_string())
    }

    fn ask_number(&mut self, label: &str, default: u32) -> AppResult<u32> {
        let input = self.ask(label)?;
        if input.is_empty() {
            return Ok(default);
        }
        input
            .parse()
            .map_err(|_| InputError::UnknownChoice(input).into())
    }

    fn ask_path(&mut self) -> io::Result<PathBuf> {
        let default = self.session.config().export_path.clone();
        let input = self.ask(&format!("文件路径 (默认 {})", default))?;
        Ok(PathBuf::from(if input.is_empty() { default } else { input }))
    }

    fn confirm(&mut self, label: &str) -> io::Result<bool> {
        let input = self.ask(&format!("{} (y/N)", label))?;
        Ok(matches!(input.to_lowercase().as_str(), "y" | "yes" | "是"))
    }

    /// 从列表中选择一项；可输入序号或名称
    fn choose<T>(&mut self, label: &str, items: &[T], default: Option<T>) -> AppResult<T>
    where
        T: Copy + PartialEq + Display + std::str::FromStr,
    {
        for (index, item) in items.iter().enumerate() {
            writeln!(self.output, "  {}. {}", index + 1, item)?;
        }
        let hint = match default {
            Some(d) => format!("{} (默认 {})", label, d),
            None => label.to_string(),
        };

        let input = self.ask(&hint)?;
        if let (true, Some(d)) = (input.is_empty(), default) {
            return Ok(d);
        }
        pick(items, &input).ok_or_else(|| InputError::UnknownChoice(input).into())
    }

    /// 可选的筛选条件；回车表示不限
    fn choose_optional<T>(&mut self, label: &str, items: &[T]) -> AppResult<Option<T>>
    where
        T: Clone + PartialEq + Display + std::str::FromStr,
    {
        for (index, item) in items.iter().enumerate() {
            writeln!(self.output, "  {}. {}", index + 1, item)?;
        }

        let input = self.ask(&format!("{} (回车不限)", label))?;
        if input.is_empty() {
            return Ok(None);
        }
        pick(items, &input)
            .map(Some)
            .ok_or_else(|| InputError::UnknownChoice(input).into())
    }
}

/// 按序号或名称匹配列表中的项，只返回列表里已有的项
fn pick<T>(items: &[T], input: &str) -> Option<T>
where
    T: Clone + PartialEq + Display + std::str::FromStr,
{
    if let Ok(number) = input.parse::<usize>() {
        if number >= 1 {
            if let Some(item) = items.get(number - 1) {
                return Some(item.clone());
            }
        }
    }
    if let Some(item) = items.iter().find(|item| item.to_string() == input) {
        return Some(item.clone());
    }
    let parsed: T = input.parse().ok()?;
    items.iter().find(|item| **item == parsed).cloned()
}

fn parse_id(input: &str) -> Result<QuestionId, InputError> {
    input
        .trim()
        .parse()
        .map(QuestionId)
        .map_err(|_| InputError::UnknownChoice(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::io::Cursor;

    fn run_script(script: &str) -> (Session, String) {
        let mut session = Session::new(Config::default());
        for kind in ProviderKind::ALL {
            session.set_api_key(kind, "");
        }

        let mut app = App::new(session, Cursor::new(script.to_string()), Vec::new());
        tokio_test::block_on(app.run()).unwrap();

        let App {
            session, output, ..
        } = app;
        (session, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_manual_entry_then_exam() {
        let script = "2\n1\n数学\n\n1+1=?\n1\n2\n3\n4\nB\n\n\
                      4\n\n\n45\n1\n\n0\n";
        let (session, output) = run_script(script);

        assert_eq!(session.store().len(), 1);
        assert_eq!(session.store().all()[0].answer, "②");
        assert!(output.contains("✓ 已保存，题目编号 1"));
        assert!(output.contains("# 期中考试"));
        assert!(output.contains("**考试时间：** 45 分钟"));
        assert!(output.contains("1. ②"));
    }

    #[test]
    fn test_errors_return_to_menu() {
        let script = "9\n1\n3\n数学\n\n\n\n0\n";
        let (session, output) = run_script(script);

        assert!(output.contains("无法识别的输入: 9"));
        assert!(output.contains("未设置 API 密钥"));
        assert!(session.store().is_empty());
        assert!(output.contains("👋 再见"));
    }

    #[test]
    fn test_delete_from_bank() {
        let script = "2\n2\n语文\n3\n静夜思的作者\n李白\n\n\
                      3\n\n\n\n1\n0\n";
        let (session, output) = run_script(script);

        assert!(output.contains("[1] 简答题 | 语文 | 困难"));
        assert!(output.contains("已删除题目 1"));
        assert!(session.store().is_empty());
    }

    #[test]
    fn test_pick_by_number_or_name() {
        assert_eq!(pick(&QuestionType::ALL, "3"), Some(QuestionType::TrueFalse));
        assert_eq!(pick(&QuestionType::ALL, "简答题"), Some(QuestionType::ShortAnswer));
        assert_eq!(pick(&QuestionType::ALL, "0"), None);
        assert_eq!(pick(&Difficulty::ALL, "hard"), Some(Difficulty::Hard));
    }

    #[test]
    fn test_pick_only_returns_listed_items() {
        let subjects = vec!["数学".to_string()];
        assert_eq!(pick(&subjects, "1"), Some("数学".to_string()));
        assert_eq!(pick(&subjects, "9"), None);
        assert_eq!(pick(&subjects, "物理"), None);
        assert_eq!(pick(&[Difficulty::Easy], "hard"), None);
    }

    #[test]
    fn test_bank_filter_rejects_unlisted_subject() {
        let script = "2\n2\n语文\n3\n静夜思的作者\n李白\n\n\
                      3\n9\n3\n物理\n0\n";
        let (session, output) = run_script(script);

        assert!(output.contains("无法识别的输入: 9"));
        assert!(output.contains("无法识别的输入: 物理"));
        assert!(!output.contains("共 0 道题"));
        assert_eq!(session.store().len(), 1);
    }
}
