use thiserror::Error;

use crate::models::{ShipmentId, ShipmentStatus};

/// 浏览器会话错误
///
/// 浏览器打不开时整个批次都无法处理，属于致命错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 浏览器配置失败
    #[error("浏览器配置失败: {0}")]
    ConfigurationFailed(String),
    /// 启动浏览器失败
    #[error("启动无头浏览器失败: {source}")]
    LaunchFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: chromiumoxide::error::CdpError,
    },
}

/// 抓取错误
///
/// 全部是非致命错误，由批处理的跳过策略处理
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// 创建页面失败
    #[error("创建页面失败: {0}")]
    PageCreation(String),
    /// 导航或网络错误
    #[error("导航到 {url} 失败: {reason}")]
    Navigation { url: String, reason: String },
    /// 页面上还没有物流记录
    #[error("运单 {tracking_number} 没有物流记录 (选择器: {selector})")]
    SelectorNotFound {
        tracking_number: String,
        selector: String,
    },
    /// 状态单元格无法解析
    #[error("解析物流状态失败: {0}")]
    Parse(String),
    /// 超时
    #[error("抓取运单 {tracking_number} 超时 ({timeout_secs} 秒)")]
    Timeout {
        tracking_number: String,
        timeout_secs: u64,
    },
}

/// 非法状态迁移
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("{from} 是终止状态，不能迁移到 {to}")]
    Terminal {
        from: ShipmentStatus,
        to: ShipmentStatus,
    },
    #[error("不允许从 {from} 迁移到 {to}")]
    NotAllowed {
        from: ShipmentStatus,
        to: ShipmentStatus,
    },
}

/// 存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("运单不存在: {0}")]
    NotFound(ShipmentId),
    #[error("运单已存在: {0}")]
    Duplicate(ShipmentId),
    /// 读取之后运单已被其他操作修改
    #[error("运单 {0} 已被其他操作修改，请重新读取")]
    Conflict(ShipmentId),
    #[error("存储后端错误: {0}")]
    Backend(String),
}

/// 副作用分发错误（订单完成 / 通知）
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("完成订单 {order_id} 失败: {reason}")]
    OrderCompletion { order_id: i64, reason: String },
    #[error("发送订单 {order_id} 的配送完成通知失败: {reason}")]
    Notification { order_id: i64, reason: String },
}

/// 手动录入物流信息错误
#[derive(Debug, Error)]
pub enum TrackingInfoError {
    #[error("快递公司名称不能为空")]
    EmptyCourier,
    #[error("运单号格式不正确: {0}")]
    InvalidTrackingNumber(String),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件读取失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 配置值非法
    #[error("配置项 {key} 非法: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// 单个运单处理失败的原因
///
/// 三类失败分开记录，便于观察
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("抓取失败: {0}")]
    Scrape(#[from] ScrapeError),
    #[error("状态迁移失败: {0}")]
    Transition(#[from] TransitionError),
    #[error("运单 {0} 没有运单号")]
    MissingTrackingNumber(ShipmentId),
}

impl ItemError {
    /// 失败类别（写入跳过报告）
    pub fn kind(&self) -> &'static str {
        match self {
            ItemError::Scrape(ScrapeError::Timeout { .. }) => "scrape_timeout",
            ItemError::Scrape(_) => "scrape",
            ItemError::Transition(_) => "transition",
            ItemError::MissingTrackingNumber(_) => "missing_tracking_number",
        }
    }
}

/// 批次级错误
#[derive(Debug, Error)]
pub enum RunError {
    /// 已有批次在运行
    #[error("已有对账批次正在运行")]
    AlreadyRunning,
    /// 浏览器无法启动，整个批次中止
    #[error("浏览器会话初始化失败: {0}")]
    Browser(#[from] BrowserError),
    /// 跳过数量超过上限
    #[error("跳过数量 {skipped} 超过上限 {limit}，已提交 {chunks_committed} 个分块")]
    SkipLimitExceeded {
        skipped: usize,
        limit: usize,
        chunks_committed: usize,
    },
    /// 存储读写失败
    #[error("存储失败: {0}")]
    Store(#[from] StoreError),
    /// 按需查询的运单不存在
    #[error("运单不存在: {0}")]
    ShipmentNotFound(ShipmentId),
    /// 按需查询时单个运单处理失败
    #[error("运单 {id} 处理失败: {source}")]
    Item {
        id: ShipmentId,
        #[source]
        source: ItemError,
    },
}

// ========== Result 类型别名 ==========

/// 批次结果类型
pub type RunResult<T> = Result<T, RunError>;
