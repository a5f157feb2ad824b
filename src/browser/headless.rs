use std::path::Path;

use chromiumoxide::{Browser, BrowserConfig, Handler};
use tracing::{debug, error, info};

use crate::error::BrowserError;

/// 启动本地无头浏览器
///
/// # 参数
/// - `chrome_executable`: 浏览器可执行文件路径，`None` 时由 chromiumoxide 自动查找
pub async fn launch_headless_browser(
    chrome_executable: Option<&str>,
) -> Result<(Browser, Handler), BrowserError> {
    info!("🚀 启动无头浏览器...");

    let mut builder = BrowserConfig::builder().new_headless_mode().args(vec![
        "--disable-gpu",             // 无头模式下禁用 GPU
        "--no-sandbox",              // 容器内运行时没有沙盒权限
        "--disable-dev-shm-usage",   // 防止共享内存不足
        "--remote-debugging-port=0", // 让浏览器自动选择端口
    ]);

    if let Some(executable) = chrome_executable {
        debug!("浏览器路径: {}", executable);
        builder = builder.chrome_executable(Path::new(executable));
    }

    let config = builder.build().map_err(|e| {
        error!("配置无头浏览器失败: {}", e);
        BrowserError::ConfigurationFailed(e)
    })?;

    let (browser, handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动无头浏览器失败: {}", e);
        BrowserError::LaunchFailed { source: e }
    })?;
    debug!("无头浏览器启动成功");

    Ok((browser, handler))
}
