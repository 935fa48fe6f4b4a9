use anyhow::Result;
/// 日志工具模块
///
/// 提供日志初始化和批改过程的输出辅助函数
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志
///
/// 默认 info 级别，可用 RUST_LOG 覆盖
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// 初始化批改日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
///
/// # 返回
/// 返回是否成功初始化
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n批改日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `total_questions`: 大题总数
/// - `total_students`: 学生总数
pub fn log_startup(total_questions: usize, total_students: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 批改开始");
    info!("📋 大题数: {}  学生数: {}", total_questions, total_students);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `total_units`: 计分单元总数
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(total_units: usize, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 批改完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("✅ 已批计分单元: {}", total_units);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}
