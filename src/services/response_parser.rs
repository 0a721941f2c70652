//! 响应解析 - 业务能力层
//!
//! 从模型的自由文本中提取题目 JSON 数组，并按题型检查必填字段。
//!
//! 两级结果：
//! - 找不到 JSON 或 JSON 非法 → [`ParseError`]，整批失败，不做二次修复
//! - 个别题目缺字段 → 草稿照常返回，附带 [`ValidationWarning`]

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{ParseError, ValidationWarning};
use crate::models::question::OPTION_COUNT;
use crate::models::{QuestionDraft, QuestionType};
use crate::models::marker::{FALSE_MARK, TRUE_MARK};
use crate::utils::logging::truncate_text;

#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseParser;

impl ResponseParser {
    pub fn new() -> Self {
        Self
    }

    /// 解析模型返回的原始文本
    ///
    /// 草稿顺序与模型数组顺序一致（即题号顺序）。
    pub fn parse(
        &self,
        raw: &str,
        question_type: QuestionType,
    ) -> Result<Vec<QuestionDraft>, ParseError> {
        let json_text = extract_json(raw).ok_or_else(|| {
            warn!("响应中未找到 JSON: {}", truncate_text(raw, 80));
            ParseError::NoJson {
                raw: raw.to_string(),
            }
        })?;

        debug!("提取到 JSON 片段，长度 {} 字符", json_text.len());

        let value: Value =
            serde_json::from_str(&json_text).map_err(|source| ParseError::InvalidJson {
                snippet: json_text.clone(),
                source,
            })?;

        let items = match value {
            Value::Array(items) => items,
            other => vec![other],
        };

        let drafts: Vec<QuestionDraft> = items
            .iter()
            .map(|item| parse_element(item, question_type))
            .collect();

        let incomplete = drafts.iter().filter(|d| !d.is_complete()).count();
        info!(
            "解析出 {} 道{}，其中 {} 道不完整",
            drafts.len(),
            question_type.name(),
            incomplete
        );

        Ok(drafts)
    }
}

/// 定位 JSON 片段
///
/// 优先取第一个 `[` 到最后一个 `]`；没有数组时取第一个 `{` 到最后一个 `}`
/// 并包装成单元素数组。
pub fn extract_json(raw: &str) -> Option<String> {
    if let (Some(start), Some(end)) = (raw.find('['), raw.rfind(']')) {
        if end > start {
            return Some(raw[start..=end].to_string());
        }
    }

    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if end > start => Some(format!("[{}]", &raw[start..=end])),
        _ => None,
    }
}

fn parse_element(item: &Value, question_type: QuestionType) -> QuestionDraft {
    let Some(obj) = item.as_object() else {
        return QuestionDraft {
            warnings: vec![ValidationWarning::NotAnObject],
            ..Default::default()
        };
    };

    let mut draft = QuestionDraft {
        explanation: text_field(obj, "explanation"),
        ..Default::default()
    };

    match text_field(obj, "question") {
        Some(question) => draft.question = question,
        None => draft.warnings.push(ValidationWarning::MissingField("question")),
    }

    if question_type == QuestionType::MultipleChoice {
        match obj.get("options").and_then(Value::as_array) {
            Some(options) => {
                draft.options = options.iter().map(value_to_text).collect();
                if draft.options.len() != OPTION_COUNT {
                    draft.warnings.push(ValidationWarning::WrongOptionCount {
                        found: draft.options.len(),
                    });
                }
            }
            None => draft.warnings.push(ValidationWarning::MissingField("options")),
        }
    }

    let answer_field = question_type.answer_field();
    match text_field(obj, answer_field) {
        Some(answer) => {
            if question_type == QuestionType::TrueFalse
                && answer != TRUE_MARK
                && answer != FALSE_MARK
            {
                draft.warnings.push(ValidationWarning::InvalidTrueFalse {
                    value: answer.clone(),
                });
            }
            draft.answer = answer;
        }
        None => draft.warnings.push(ValidationWarning::MissingField(answer_field)),
    }

    draft
}

/// 读取文本字段；缺失、null 或空白视为不存在
fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .filter(|v| !v.is_null())
        .map(value_to_text)
        .filter(|s| !s.is_empty())
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
