use serde_json::{json, Map, Value};

use crate::error::{InputError, ValidationWarning};
use crate::models::question::{NewQuestion, QuestionType};
use crate::models::request::GenerationRequest;

/// 草稿题目
///
/// 模型返回、尚未确认入库的题目。缺失字段以空值保存，并在 `warnings` 中标记。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionDraft {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
    pub explanation: Option<String>,
    pub warnings: Vec<ValidationWarning>,
}

impl QuestionDraft {
    /// 所有必填字段都齐全
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }

    /// 按模型输出格式还原为 JSON 对象
    pub fn to_wire_value(&self, question_type: QuestionType) -> Value {
        let mut obj = Map::new();
        obj.insert("question".into(), json!(self.question));
        if question_type == QuestionType::MultipleChoice {
            obj.insert("options".into(), json!(self.options));
        }
        obj.insert(question_type.answer_field().into(), json!(self.answer));
        if let Some(explanation) = &self.explanation {
            obj.insert("explanation".into(), json!(explanation));
        }
        Value::Object(obj)
    }

    /// 结合出题请求转为待入库题目（未校验）
    pub fn to_new_question(&self, request: &GenerationRequest) -> NewQuestion {
        let options = match request.question_type {
            QuestionType::MultipleChoice => Some(self.options.clone()),
            _ => None,
        };
        NewQuestion {
            question_type: request.question_type,
            subject: request.subject.clone(),
            difficulty: request.difficulty,
            question_text: self.question.clone(),
            options,
            answer: self.answer.clone(),
            explanation: self.explanation.clone(),
        }
    }

    /// 转为已校验的待入库题目
    pub fn validated(&self, request: &GenerationRequest) -> Result<NewQuestion, InputError> {
        self.to_new_question(request).validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_draft_cannot_be_validated() {
        let draft = QuestionDraft {
            question: "什么是光合作用？".into(),
            warnings: vec![ValidationWarning::MissingField("answer")],
            ..Default::default()
        };
        let request = GenerationRequest::new(QuestionType::ShortAnswer, "生物");

        assert!(!draft.is_complete());
        assert_eq!(draft.validated(&request), Err(InputError::MissingAnswer));
    }

    #[test]
    fn test_wire_value_uses_type_specific_answer_field() {
        let draft = QuestionDraft {
            question: "地球是圆的".into(),
            answer: "O".into(),
            ..Default::default()
        };
        let value = draft.to_wire_value(QuestionType::TrueFalse);
        assert_eq!(value["correct_answer"], "O");
        assert!(value.get("options").is_none());
        assert!(value.get("explanation").is_none());
    }
}
