use chrono::{DateTime, Utc};

/// 一次抓取的结果（不持久化）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeResult {
    /// 快递公司页面上的原始状态文字
    pub raw_status: String,
    /// 抓取时间
    pub observed_at: DateTime<Utc>,
}

impl ScrapeResult {
    pub fn new(raw_status: impl Into<String>) -> Self {
        Self {
            raw_status: raw_status.into(),
            observed_at: Utc::now(),
        }
    }
}
