use std::env;
use std::io;

use anyhow::{Context, Result};

use ai_exam_generator::config::DEFAULT_CONFIG_PATH;
use ai_exam_generator::utils::logging;
use ai_exam_generator::{App, Config, Session};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config_path = env::var("EXAM_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("无法加载配置 {}", config_path))?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    let stdin = io::stdin();
    let mut app = App::new(Session::new(config), stdin.lock(), io::stdout());
    app.run().await?;

    Ok(())
}
