//! 日志工具模块
//!
//! 提供日志初始化和输出的辅助函数

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::services::question_store::StoreStats;

/// 初始化全局日志
///
/// `RUST_LOG` 优先；未设置时按 `verbose` 取 debug 或 info。
/// 日志写到 stderr，不和菜单输出混在一起。重复调用是无害的。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - AI 试卷生成器");
    info!("🤖 默认模型服务: {} ({})", config.provider, config.model_for(config.provider));
    info!("📊 单次最多出题: {}", config.max_question_count);
    info!("{}", "=".repeat(60));
}

/// 记录题库统计
pub fn log_store_stats(stats: &StoreStats) {
    info!("\n{}", "─".repeat(60));
    info!("📚 题库共 {} 道题", stats.total);
    if let Some(subject) = &stats.most_common_subject {
        info!("📖 最多的科目: {}", subject);
    }
    if let Some(question_type) = stats.most_common_type {
        info!("📝 最多的题型: {}", question_type);
    }
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
