//! # AI Exam Generator
//!
//! 用大模型出题、管理题库并组卷的控制台程序
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 对接托管的大模型服务，只负责"发提示词、拿原始文本"
//! - `ProviderClient` - 统一接口，OpenAI / Anthropic / Gemini 三种实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心界面
//! - `PromptBuilder` - 按题型构建提示词
//! - `ResponseParser` - 从自由文本中提取题目草稿
//! - `QuestionStore` - 会话内题库
//! - `ExamAssembler` - 选题、渲染试卷和答案
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次出题"的完整流程和会话状态
//! - `GenerationFlow` - 流程编排（校验 → 提示词 → 模型 → 解析）
//! - `Session` - 会话上下文（配置 + 密钥 + 题库 + 当前试卷）
//!
//! ### ④ 编排层（Orchestration）
//! - `app` - 控制台菜单，收集输入并展示结果
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use clients::{build_client, ProviderClient, ProviderKind};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{
    Difficulty, Exam, ExamSpec, GenerationRequest, NewQuestion, Question, QuestionDraft,
    QuestionId, QuestionType,
};
pub use services::{ExamAssembler, PromptBuilder, QuestionStore, ResponseParser, Selection};
pub use workflow::{GenerationBatch, GenerationFlow, Session};
