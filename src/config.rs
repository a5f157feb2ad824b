use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 每个分块的运单数量
    pub chunk_size: usize,
    /// 一个批次最多容忍的跳过数量
    pub skip_limit: usize,
    /// 两次对账之间的间隔（秒）
    pub run_interval_secs: u64,
    /// 单个运单抓取的总超时（秒）
    pub scrape_timeout_secs: u64,
    /// 等待物流表格渲染的时间（秒）
    pub table_wait_secs: u64,
    // --- 快递公司页面 ---
    pub courier_name: String,
    pub tracking_base_url: String,
    pub status_rows_selector: String,
    pub status_cell_selector: String,
    // --- 浏览器 ---
    /// 浏览器可执行文件路径，不填则自动查找
    pub chrome_executable: Option<String>,
    /// 浏览器调试端口，填写后连接已有浏览器而不是启动新的
    pub browser_debug_port: Option<u16>,
    // --- 副作用 ---
    /// 订单完成 / 通知失败后的重试次数
    pub dispatch_retries: usize,
    /// 跳过报告文件
    pub skip_report_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: 50,
            skip_limit: 50,
            run_interval_secs: 3600,
            scrape_timeout_secs: 20,
            table_wait_secs: 10,
            courier_name: "CJ대한통운".to_string(),
            tracking_base_url: "https://trace.cjlogistics.com/next/tracking.html".to_string(),
            status_rows_selector: "#statusDetail tr".to_string(),
            status_cell_selector: "td:nth-child(3)".to_string(),
            chrome_executable: None,
            browser_debug_port: None,
            dispatch_retries: 2,
            skip_report_file: "skipped.txt".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 默认配置 + 环境变量
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载，文件中没写的项使用默认值，环境变量优先
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
                path: path.display().to_string(),
                source,
            })?;

        Ok(config.with_env_overrides())
    }

    /// 用环境变量覆盖配置项，无法解析的值忽略
    pub fn with_env_overrides(self) -> Self {
        Self {
            chunk_size: env_parse("CHUNK_SIZE").unwrap_or(self.chunk_size),
            skip_limit: env_parse("SKIP_LIMIT").unwrap_or(self.skip_limit),
            run_interval_secs: env_parse("RUN_INTERVAL_SECS").unwrap_or(self.run_interval_secs),
            scrape_timeout_secs: env_parse("SCRAPE_TIMEOUT_SECS")
                .unwrap_or(self.scrape_timeout_secs),
            table_wait_secs: env_parse("TABLE_WAIT_SECS").unwrap_or(self.table_wait_secs),
            courier_name: std::env::var("COURIER_NAME").unwrap_or(self.courier_name),
            tracking_base_url: std::env::var("TRACKING_BASE_URL")
                .unwrap_or(self.tracking_base_url),
            status_rows_selector: std::env::var("STATUS_ROWS_SELECTOR")
                .unwrap_or(self.status_rows_selector),
            status_cell_selector: std::env::var("STATUS_CELL_SELECTOR")
                .unwrap_or(self.status_cell_selector),
            chrome_executable: std::env::var("CHROME_EXECUTABLE")
                .ok()
                .or(self.chrome_executable),
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").or(self.browser_debug_port),
            dispatch_retries: env_parse("DISPATCH_RETRIES").unwrap_or(self.dispatch_retries),
            skip_report_file: std::env::var("SKIP_REPORT_FILE").unwrap_or(self.skip_report_file),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
        }
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid {
                key: "chunk_size",
                reason: "必须大于 0".to_string(),
            });
        }
        if self.scrape_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "scrape_timeout_secs",
                reason: "必须大于 0".to_string(),
            });
        }
        if self.table_wait_secs > self.scrape_timeout_secs {
            return Err(ConfigError::Invalid {
                key: "table_wait_secs",
                reason: format!("不能超过 scrape_timeout_secs ({})", self.scrape_timeout_secs),
            });
        }
        if self.run_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "run_interval_secs",
                reason: "必须大于 0".to_string(),
            });
        }
        if self.tracking_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "tracking_base_url",
                reason: "不能为空".to_string(),
            });
        }
        Ok(())
    }

    pub fn scrape_timeout(&self) -> Duration {
        Duration::from_secs(self.scrape_timeout_secs)
    }

    pub fn table_wait(&self) -> Duration {
        Duration::from_secs(self.table_wait_secs)
    }

    pub fn run_interval(&self) -> Duration {
        Duration::from_secs(self.run_interval_secs)
    }
}

fn env_parse<T: std::str::FromStr>(var_name: &str) -> Option<T> {
    std::env::var(var_name).ok().and_then(|v| v.parse().ok())
}
