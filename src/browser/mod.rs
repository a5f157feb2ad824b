//! 浏览器会话
//!
//! 一个批次只持有一个浏览器，批次开始时打开，结束时关闭。
//! 会话以显式句柄的形式传给需要它的地方，不存在全局单例

pub mod connection;
pub mod headless;

use async_trait::async_trait;
use chromiumoxide::{Browser, Handler};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{BrowserError, ScrapeError};
use crate::infrastructure::{JsExecutor, PageSource, ScriptPage};

pub use connection::connect_to_browser;
pub use headless::launch_headless_browser;

/// 浏览器获取方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserMode {
    /// 启动本地无头浏览器，会话结束时关闭进程
    Launch { chrome_executable: Option<String> },
    /// 连接已有浏览器，会话结束时只断开连接
    Connect { port: u16 },
}

impl BrowserMode {
    pub fn from_config(config: &Config) -> Self {
        match config.browser_debug_port {
            Some(port) => BrowserMode::Connect { port },
            None => BrowserMode::Launch {
                chrome_executable: config.chrome_executable.clone(),
            },
        }
    }
}

/// 浏览器会话句柄
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    mode: BrowserMode,
}

impl BrowserSession {
    /// 打开浏览器会话
    pub async fn open(mode: BrowserMode) -> Result<Self, BrowserError> {
        let (browser, handler) = match &mode {
            BrowserMode::Launch { chrome_executable } => {
                launch_headless_browser(chrome_executable.as_deref()).await?
            }
            BrowserMode::Connect { port } => connect_to_browser(*port).await?,
        };

        let handler_task = spawn_handler(handler);
        info!("✅ 浏览器会话已打开");

        Ok(Self {
            browser,
            handler_task,
            mode,
        })
    }

    /// 关闭会话
    ///
    /// 消耗 self，所以同一个会话只能关闭一次
    pub async fn close(mut self) {
        if let BrowserMode::Launch { .. } = self.mode {
            if let Err(e) = self.browser.close().await {
                warn!("关闭浏览器失败: {}", e);
            }
            if let Err(e) = self.browser.wait().await {
                warn!("等待浏览器进程退出失败: {}", e);
            }
        }
        self.handler_task.abort();
        info!("🔒 浏览器会话已关闭");
    }
}

#[async_trait]
impl PageSource for BrowserSession {
    /// 新建空白页面
    async fn new_page(&self) -> Result<Box<dyn ScriptPage>, ScrapeError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScrapeError::PageCreation(e.to_string()))?;
        Ok(Box::new(JsExecutor::new(page)))
    }
}

/// 在后台处理浏览器事件
fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                debug!("浏览器事件循环结束: {}", e);
                break;
            }
        }
    })
}
