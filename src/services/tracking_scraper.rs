//! 物流页面抓取 - 业务能力层
//!
//! 只负责"给一个运单号，拿回原始状态文字"，不关心状态映射和迁移

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tokio::time::{sleep, timeout, timeout_at, Instant};
use tracing::{debug, warn};

use crate::browser::{BrowserMode, BrowserSession};
use crate::config::Config;
use crate::error::{BrowserError, ScrapeError};
use crate::infrastructure::{eval_as, PageSource, ScriptPage};
use crate::models::ScrapeResult;
use crate::services::courier::{CourierPage, WaybillTableCourier};

/// 关闭页面的最长等待时间
const PAGE_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("空白正则无效"));

/// 一个批次内的追踪会话
///
/// 编排层只通过这个接口拿状态，不直接接触浏览器
#[async_trait]
pub trait TrackingSession: Send + Sync {
    /// 查询运单的原始状态文字
    async fn fetch_raw_status(&self, tracking_number: &str) -> Result<ScrapeResult, ScrapeError>;

    /// 结束会话，释放浏览器
    async fn close(self: Box<Self>);
}

/// 追踪会话工厂，每个批次调用一次 `open`
#[async_trait]
pub trait TrackingSessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn TrackingSession>, BrowserError>;
}

/// 页面脚本的返回值
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusCell {
    row_count: usize,
    text: Option<String>,
}

/// 物流页面抓取器
pub struct TrackingPageScraper {
    courier: Arc<dyn CourierPage>,
    /// 单个运单的总超时
    scrape_timeout: Duration,
    /// 等待表格出现的时间
    table_wait: Duration,
    poll_interval: Duration,
}

impl TrackingPageScraper {
    pub fn new(courier: Arc<dyn CourierPage>, scrape_timeout: Duration, table_wait: Duration) -> Self {
        Self {
            courier,
            scrape_timeout,
            table_wait,
            poll_interval: Duration::from_millis(250),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(WaybillTableCourier::from_config(config)),
            config.scrape_timeout(),
            config.table_wait(),
        )
    }

    pub fn courier_name(&self) -> &str {
        self.courier.name()
    }

    /// 抓取运单状态
    ///
    /// 新建页面和抓取共用 `scrape_timeout`，无论成功失败都会关闭页面
    pub async fn scrape(
        &self,
        pages: &dyn PageSource,
        tracking_number: &str,
    ) -> Result<ScrapeResult, ScrapeError> {
        let deadline = Instant::now() + self.scrape_timeout;

        let page = timeout_at(deadline, pages.new_page())
            .await
            .map_err(|_| self.timeout_error(tracking_number))??;

        let result = timeout_at(deadline, self.scrape_on(page.as_ref(), tracking_number))
            .await
            .unwrap_or_else(|_| Err(self.timeout_error(tracking_number)));

        if timeout(PAGE_CLOSE_TIMEOUT, page.close()).await.is_err() {
            warn!("关闭运单 {} 的页面超时", tracking_number);
        }
        result
    }

    fn timeout_error(&self, tracking_number: &str) -> ScrapeError {
        ScrapeError::Timeout {
            tracking_number: tracking_number.to_string(),
            timeout_secs: self.scrape_timeout.as_secs(),
        }
    }

    async fn scrape_on(
        &self,
        page: &dyn ScriptPage,
        tracking_number: &str,
    ) -> Result<ScrapeResult, ScrapeError> {
        let url = self.courier.tracking_url(tracking_number);
        page.goto(&url).await?;

        let cell = self.wait_for_rows(page, tracking_number).await?;
        let raw = cell
            .text
            .ok_or_else(|| ScrapeError::Parse("最后一行没有状态单元格".to_string()))?;

        let raw_status = normalize_status_text(&raw);
        if raw_status.is_empty() {
            return Err(ScrapeError::Parse("状态单元格为空".to_string()));
        }

        debug!(
            "运单 {} 共 {} 条记录，当前状态: {}",
            tracking_number, cell.row_count, raw_status
        );
        Ok(ScrapeResult::new(raw_status))
    }

    /// 轮询直到表格出现或等待时间用完
    async fn wait_for_rows(
        &self,
        page: &dyn ScriptPage,
        tracking_number: &str,
    ) -> Result<StatusCell, ScrapeError> {
        let deadline = Instant::now() + self.table_wait;
        let script = self.courier.status_script();

        loop {
            let cell: StatusCell = eval_as(page, &script).await?;
            if cell.row_count > 0 {
                return Ok(cell);
            }
            if Instant::now() >= deadline {
                return Err(ScrapeError::SelectorNotFound {
                    tracking_number: tracking_number.to_string(),
                    selector: self.courier.rows_selector().to_string(),
                });
            }
            sleep(self.poll_interval).await;
        }
    }
}

/// 合并连续空白并去掉首尾空白
pub fn normalize_status_text(raw: &str) -> String {
    WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}

/// 基于无头浏览器的追踪会话
pub struct BrowserTrackingSession {
    session: BrowserSession,
    scraper: Arc<TrackingPageScraper>,
}

#[async_trait]
impl TrackingSession for BrowserTrackingSession {
    async fn fetch_raw_status(&self, tracking_number: &str) -> Result<ScrapeResult, ScrapeError> {
        self.scraper.scrape(&self.session, tracking_number).await
    }

    async fn close(self: Box<Self>) {
        self.session.close().await;
    }
}

/// 每次打开一个新的浏览器会话
pub struct BrowserTrackingFactory {
    mode: BrowserMode,
    scraper: Arc<TrackingPageScraper>,
}

impl BrowserTrackingFactory {
    pub fn new(mode: BrowserMode, scraper: TrackingPageScraper) -> Self {
        Self {
            mode,
            scraper: Arc::new(scraper),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            BrowserMode::from_config(config),
            TrackingPageScraper::from_config(config),
        )
    }
}

#[async_trait]
impl TrackingSessionFactory for BrowserTrackingFactory {
    async fn open(&self) -> Result<Box<dyn TrackingSession>, BrowserError> {
        debug!("为 {} 打开追踪会话", self.scraper.courier_name());
        let session = BrowserSession::open(self.mode.clone()).await?;
        Ok(Box::new(BrowserTrackingSession {
            session,
            scraper: self.scraper.clone(),
        }))
    }
}
