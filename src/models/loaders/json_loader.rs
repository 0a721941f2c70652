use std::path::Path;
use std::sync::Arc;

use tokio::fs;
use tracing::info;

use crate::error::FileError;
use crate::models::question::Question;

/// 题目列表序列化为 JSON 数组（保持顺序）
pub fn questions_to_json(questions: &[Arc<Question>]) -> serde_json::Result<String> {
    let plain: Vec<&Question> = questions.iter().map(Arc::as_ref).collect();
    serde_json::to_string_pretty(&plain)
}

/// 从 JSON 数组解析题目列表
pub fn questions_from_json(content: &str) -> serde_json::Result<Vec<Question>> {
    serde_json::from_str(content)
}

/// 导出题目到 JSON 文件
pub async fn export_questions(path: &Path, questions: &[Arc<Question>]) -> Result<(), FileError> {
    let content = questions_to_json(questions).map_err(|source| FileError::InvalidFormat {
        path: path.display().to_string(),
        source,
    })?;

    fs::write(path, content)
        .await
        .map_err(|source| FileError::WriteFailed {
            path: path.display().to_string(),
            source,
        })?;

    info!("已导出 {} 道题目到 {}", questions.len(), path.display());
    Ok(())
}

/// 从 JSON 文件读取题目
pub async fn load_questions(path: &Path) -> Result<Vec<Question>, FileError> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| FileError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;

    let questions = questions_from_json(&content).map_err(|source| FileError::InvalidFormat {
        path: path.display().to_string(),
        source,
    })?;

    info!("从 {} 读取了 {} 道题目", path.display(), questions.len());
    Ok(questions)
}
