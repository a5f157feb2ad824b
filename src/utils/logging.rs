/// 日志工具模块
///
/// 提供日志初始化和批次日志输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::orchestrator::RunReport;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug 或 info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},chromiumoxide=warn", default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(courier: &str, chunk_size: usize, skip_limit: usize, interval_secs: u64) {
    info!("{}", "=".repeat(60));
    info!("🚀 运单对账任务启动 - 快递公司: {}", courier);
    info!(
        "📊 分块大小: {} | 跳过上限: {} | 间隔: {} 秒",
        chunk_size, skip_limit, interval_secs
    );
    info!("{}", "=".repeat(60));
}

/// 记录分块开始信息
pub fn log_chunk_start(run_id: &str, chunk_num: usize, size: usize) {
    info!("{}", "─".repeat(60));
    info!("📦 [批次 {}] 开始处理第 {} 块，共 {} 个运单", run_id, chunk_num, size);
}

/// 记录分块提交信息
pub fn log_chunk_committed(run_id: &str, chunk_num: usize, updated: usize, total: usize) {
    info!(
        "✓ [批次 {}] 第 {} 块已提交: 更新 {}/{}",
        run_id, chunk_num, updated, total
    );
}

/// 打印批次统计信息
pub fn print_final_stats(report: &RunReport) {
    info!("{}", "=".repeat(60));
    info!("📊 批次 {} 完成统计", report.run_id);
    info!(
        "完成时间: {}",
        report.finished_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📥 读取: {}", report.read);
    info!("✅ 更新: {} (其中签收 {})", report.updated, report.delivered);
    info!("➖ 无变化: {}", report.unchanged);
    info!("❌ 跳过: {}", report.skipped);
    info!("⚠️ 版本冲突放弃: {}", report.stale);
    info!("📦 已提交分块: {}", report.chunks_committed);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
