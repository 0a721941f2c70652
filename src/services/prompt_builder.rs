//! 提示词构建 - 业务能力层
//!
//! 纯字符串拼装：相同输入得到相同输出，不做校验、不发请求。

use crate::models::{GenerationRequest, QuestionType};

const MULTIPLE_CHOICE_SCHEMA: &str = r#"{
  "question": "题目内容",
  "options": ["选项1", "选项2", "选项3", "选项4"],
  "correct_answer": "①",
  "explanation": "解析内容"
}"#;

const TRUE_FALSE_SCHEMA: &str = r#"{
  "question": "题目内容",
  "correct_answer": "O",
  "explanation": "解析内容"
}"#;

const SHORT_ANSWER_SCHEMA: &str = r#"{
  "question": "题目内容",
  "answer": "参考答案",
  "explanation": "解析内容"
}"#;

/// 构建好的提示词
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// 发送给模型的完整指令
    pub text: String,
    /// 期望的单题 JSON 结构
    pub schema: &'static str,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// 题型对应的 JSON 模板
    pub fn schema_for(question_type: QuestionType) -> &'static str {
        match question_type {
            QuestionType::MultipleChoice => MULTIPLE_CHOICE_SCHEMA,
            QuestionType::TrueFalse => TRUE_FALSE_SCHEMA,
            QuestionType::ShortAnswer => SHORT_ANSWER_SCHEMA,
        }
    }

    pub fn build(&self, request: &GenerationRequest) -> Prompt {
        let schema = Self::schema_for(request.question_type);
        let extra = request.extra_instructions.trim();
        let extra = if extra.is_empty() { "无" } else { extra };

        let rules = match request.question_type {
            QuestionType::MultipleChoice => {
                "- options 必须恰好包含 4 个选项\n- correct_answer 使用 ①、②、③、④ 之一\n"
            }
            QuestionType::TrueFalse => "- correct_answer 只能是 \"O\"（正确）或 \"X\"（错误）\n",
            QuestionType::ShortAnswer => "- answer 给出完整的参考答案\n",
        };

        let text = format!(
            r#"请生成 {count} 道符合以下条件的{type_name}：

- 科目：{subject}
- 难度：{difficulty}
- 附加要求：{extra}

每道题请使用以下 JSON 格式：
{schema}

格式要求：
{rules}
请将 {count} 道题目以 JSON 数组的形式返回。"#,
            count = request.count,
            type_name = request.question_type.name(),
            subject = request.subject,
            difficulty = request.difficulty.name(),
            extra = extra,
            schema = schema,
            rules = rules,
        );

        Prompt { text, schema }
    }
}
