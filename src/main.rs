use anyhow::{bail, Result};
use quick_grade::app::{App, AppCommand};
use quick_grade::config::Config;
use quick_grade::utils::logging;

fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(config.verbose_logging);

    // 解析子命令（默认 grade）
    let arg = std::env::args().nth(1);
    let Some(command) = AppCommand::parse(arg.as_deref()) else {
        bail!("未知子命令: {}（可用: define / grade）", arg.unwrap_or_default());
    };

    // 初始化并运行应用
    App::initialize(config)?.run(command)?;

    Ok(())
}
