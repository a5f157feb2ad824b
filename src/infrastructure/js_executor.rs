//! JS 执行器 - 基础设施层
//!
//! 持有一个 page 资源，只暴露"导航"和"执行 JS"的能力

use async_trait::async_trait;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::error::ScrapeError;

/// 可以导航和执行脚本的页面
#[async_trait]
pub trait ScriptPage: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), ScrapeError>;

    async fn eval(&self, js_code: &str) -> Result<JsonValue, ScrapeError>;

    /// 关闭页面（不关闭浏览器）
    async fn close(self: Box<Self>);
}

/// 页面来源，通常是一个浏览器会话
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn new_page(&self) -> Result<Box<dyn ScriptPage>, ScrapeError>;
}

/// 执行 JS 代码并反序列化为指定类型
pub async fn eval_as<T: DeserializeOwned>(
    page: &dyn ScriptPage,
    js_code: &str,
) -> Result<T, ScrapeError> {
    let json_value = page.eval(js_code).await?;
    serde_json::from_value(json_value).map_err(|e| ScrapeError::Parse(e.to_string()))
}

/// JS 执行器
///
/// 职责：
/// - 持有一个 Page
/// - 暴露 goto() / eval() 能力
/// - 不认识运单和快递公司
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }
}

#[async_trait]
impl ScriptPage for JsExecutor {
    /// 导航到指定 URL 并等待加载
    async fn goto(&self, url: &str) -> Result<(), ScrapeError> {
        debug!("导航到: {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| ScrapeError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn eval(&self, js_code: &str) -> Result<JsonValue, ScrapeError> {
        let result = self
            .page
            .evaluate(js_code.to_string())
            .await
            .map_err(|e| ScrapeError::Parse(format!("执行脚本失败: {}", e)))?;
        result
            .into_value()
            .map_err(|e| ScrapeError::Parse(format!("脚本返回值无效: {}", e)))
    }

    async fn close(self: Box<Self>) {
        if let Err(e) = self.page.close().await {
            warn!("关闭页面失败: {}", e);
        }
    }
}
