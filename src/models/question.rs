use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::InputError;
use crate::models::marker;

/// 导出文件中 `created_at` 的格式
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 题目编号（会话内唯一，不复用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub u64);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 题型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    ShortAnswer,
    TrueFalse,
}

impl QuestionType {
    pub const ALL: [QuestionType; 3] = [
        QuestionType::MultipleChoice,
        QuestionType::ShortAnswer,
        QuestionType::TrueFalse,
    ];

    pub fn name(self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "选择题",
            QuestionType::ShortAnswer => "简答题",
            QuestionType::TrueFalse => "判断题",
        }
    }

    /// 导出文件里存放答案的字段名
    pub fn answer_field(self) -> &'static str {
        match self {
            QuestionType::MultipleChoice | QuestionType::TrueFalse => "correct_answer",
            QuestionType::ShortAnswer => "answer",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for QuestionType {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "选择题" | "选择" | "multiple_choice" | "mc" => Ok(QuestionType::MultipleChoice),
            "简答题" | "简答" | "short_answer" | "sa" => Ok(QuestionType::ShortAnswer),
            "判断题" | "判断" | "true_false" | "tf" | "o/x" => Ok(QuestionType::TrueFalse),
            _ => Err(InputError::UnknownChoice(s.to_string())),
        }
    }
}

/// 难度
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Easy => "简单",
            Difficulty::Medium => "中等",
            Difficulty::Hard => "困难",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Difficulty {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "简单" | "easy" => Ok(Difficulty::Easy),
            "中等" | "medium" => Ok(Difficulty::Medium),
            "困难" | "hard" => Ok(Difficulty::Hard),
            _ => Err(InputError::UnknownChoice(s.to_string())),
        }
    }
}

/// 待入库的题目（尚未分配编号）
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub question_type: QuestionType,
    pub subject: String,
    pub difficulty: Difficulty,
    pub question_text: String,
    pub options: Option<Vec<String>>,
    pub answer: String,
    pub explanation: Option<String>,
}

impl NewQuestion {
    /// 校验并规范化
    ///
    /// - 科目、题干、答案不能为空
    /// - 选择题必须恰好 4 个选项；其它题型不能带选项
    /// - 选择题答案可识别时规范化为 ①–④，判断题答案必须能规范化为 O / X
    pub fn validate(mut self) -> Result<Self, InputError> {
        self.subject = self.subject.trim().to_string();
        self.question_text = self.question_text.trim().to_string();
        self.answer = self.answer.trim().to_string();
        self.explanation = self
            .explanation
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        if self.subject.is_empty() {
            return Err(InputError::MissingSubject);
        }
        if self.question_text.is_empty() {
            return Err(InputError::MissingQuestionText);
        }
        if self.answer.is_empty() {
            return Err(InputError::MissingAnswer);
        }

        match self.question_type {
            QuestionType::MultipleChoice => {
                let found = self.options.as_ref().map_or(0, Vec::len);
                if found != OPTION_COUNT {
                    return Err(InputError::OptionCount {
                        expected: OPTION_COUNT,
                        found,
                    });
                }
                if let Some(mark) = marker::normalize_choice(&self.answer) {
                    self.answer = mark.to_string();
                }
            }
            QuestionType::TrueFalse => {
                if self.options.is_some() {
                    return Err(InputError::UnexpectedOptions);
                }
                self.answer = marker::normalize_true_false(&self.answer)
                    .ok_or_else(|| InputError::InvalidTrueFalseAnswer(self.answer.clone()))?
                    .to_string();
            }
            QuestionType::ShortAnswer => {
                if self.options.is_some() {
                    return Err(InputError::UnexpectedOptions);
                }
            }
        }

        Ok(self)
    }
}

/// 选择题选项数量
pub const OPTION_COUNT: usize = 4;

/// 题目
///
/// 创建后不可修改，只能被删除。`options` 当且仅当题型为选择题时存在。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "QuestionRecord", into = "QuestionRecord")]
pub struct Question {
    pub id: QuestionId,
    pub question_type: QuestionType,
    pub subject: String,
    pub difficulty: Difficulty,
    pub question_text: String,
    pub options: Option<Vec<String>>,
    pub answer: String,
    pub explanation: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Question {
    /// 用已校验的数据创建题目
    pub fn create(id: QuestionId, new: NewQuestion) -> Result<Self, InputError> {
        let new = new.validate()?;
        Ok(Self {
            id,
            question_type: new.question_type,
            subject: new.subject,
            difficulty: new.difficulty,
            question_text: new.question_text,
            options: new.options,
            answer: new.answer,
            explanation: new.explanation,
            created_at: timestamp_now(),
        })
    }

    /// 选择题正确选项的文本
    pub fn correct_option(&self) -> Option<&str> {
        let idx = marker::choice_index(&self.answer)?;
        self.options.as_ref()?.get(idx).map(String::as_str)
    }
}

/// 当前本地时间，精确到秒（与导出格式一致）
pub fn timestamp_now() -> NaiveDateTime {
    let now = chrono::Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// 导出文件中的题目记录
///
/// 选择题与判断题的答案写在 `correct_answer`，简答题写在 `answer`。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    id: QuestionId,
    #[serde(rename = "type")]
    question_type: QuestionType,
    subject: String,
    difficulty: Difficulty,
    question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    correct_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
    #[serde(with = "timestamp_format")]
    created_at: NaiveDateTime,
}

impl From<Question> for QuestionRecord {
    fn from(q: Question) -> Self {
        let (correct_answer, answer) = match q.question_type {
            QuestionType::ShortAnswer => (None, Some(q.answer)),
            _ => (Some(q.answer), None),
        };
        Self {
            id: q.id,
            question_type: q.question_type,
            subject: q.subject,
            difficulty: q.difficulty,
            question: q.question_text,
            options: q.options,
            correct_answer,
            answer,
            explanation: q.explanation,
            created_at: q.created_at,
        }
    }
}

impl TryFrom<QuestionRecord> for Question {
    type Error = InputError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        let answer = match record.question_type {
            QuestionType::ShortAnswer => record.answer.or(record.correct_answer),
            _ => record.correct_answer.or(record.answer),
        }
        .unwrap_or_default();

        let new = NewQuestion {
            question_type: record.question_type,
            subject: record.subject,
            difficulty: record.difficulty,
            question_text: record.question,
            options: record.options,
            answer,
            explanation: record.explanation,
        }
        .validate()?;

        Ok(Self {
            id: record.id,
            question_type: new.question_type,
            subject: new.subject,
            difficulty: new.difficulty,
            question_text: new.question_text,
            options: new.options,
            answer: new.answer,
            explanation: new.explanation,
            created_at: record.created_at,
        })
    }
}

mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multiple_choice() -> NewQuestion {
        NewQuestion {
            question_type: QuestionType::MultipleChoice,
            subject: "数学".to_string(),
            difficulty: Difficulty::Easy,
            question_text: "2+2=?".to_string(),
            options: Some(vec!["3".into(), "4".into(), "5".into(), "6".into()]),
            answer: "B".to_string(),
            explanation: Some("  ".to_string()),
        }
    }

    #[test]
    fn test_validate_normalizes_choice_and_drops_blank_explanation() {
        let q = multiple_choice().validate().unwrap();
        assert_eq!(q.answer, "②");
        assert_eq!(q.explanation, None);
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let mut q = multiple_choice();
        q.answer = "  ".into();
        assert_eq!(q.validate(), Err(InputError::MissingAnswer));

        let mut q = multiple_choice();
        q.subject = String::new();
        assert_eq!(q.validate(), Err(InputError::MissingSubject));

        let mut q = multiple_choice();
        q.options = Some(vec!["a".into()]);
        assert_eq!(
            q.validate(),
            Err(InputError::OptionCount {
                expected: 4,
                found: 1
            })
        );
    }

    #[test]
    fn test_options_only_for_multiple_choice() {
        let mut q = multiple_choice();
        q.question_type = QuestionType::ShortAnswer;
        assert_eq!(q.validate(), Err(InputError::UnexpectedOptions));
    }

    #[test]
    fn test_true_false_answer() {
        let q = NewQuestion {
            question_type: QuestionType::TrueFalse,
            subject: "科学".into(),
            difficulty: Difficulty::Medium,
            question_text: "水在 100°C 沸腾".into(),
            options: None,
            answer: "true".into(),
            explanation: None,
        };
        assert_eq!(q.clone().validate().unwrap().answer, "O");

        let bad = NewQuestion {
            answer: "也许".into(),
            ..q
        };
        assert_eq!(
            bad.validate(),
            Err(InputError::InvalidTrueFalseAnswer("也许".into()))
        );
    }

    #[test]
    fn test_record_uses_type_specific_answer_field() {
        let q = Question::create(QuestionId(7), multiple_choice()).unwrap();
        let value = serde_json::to_value(&q).unwrap();
        assert_eq!(value["type"], "multiple_choice");
        assert_eq!(value["correct_answer"], "②");
        assert!(value.get("answer").is_none());
        assert_eq!(value["question"], "2+2=?");

        let short = Question::create(
            QuestionId(8),
            NewQuestion {
                question_type: QuestionType::ShortAnswer,
                options: None,
                answer: "四".into(),
                ..multiple_choice()
            },
        )
        .unwrap();
        let value = serde_json::to_value(&short).unwrap();
        assert_eq!(value["answer"], "四");
        assert!(value.get("correct_answer").is_none());
        assert!(value.get("options").is_none());
    }

    #[test]
    fn test_correct_option_text() {
        let q = Question::create(QuestionId(1), multiple_choice()).unwrap();
        assert_eq!(q.correct_option(), Some("4"));
    }

    #[test]
    fn test_record_without_answer_is_rejected() {
        let json = r#"{"id":1,"type":"short_answer","subject":"语文","difficulty":"easy",
            "question":"默写","created_at":"2024-03-01 10:00:00"}"#;
        assert!(serde_json::from_str::<Question>(json).is_err());
    }
}
