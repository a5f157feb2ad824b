//! 快递公司页面描述 - 业务能力层
//!
//! 每个快递公司一个实现，只描述"去哪里查"和"怎么读状态"，
//! 增加快递公司不需要改动编排层和状态机

use crate::config::Config;

/// 快递公司追踪页面
pub trait CourierPage: Send + Sync {
    /// 快递公司名称
    fn name(&self) -> &str;

    /// 运单追踪页面 URL
    fn tracking_url(&self, tracking_number: &str) -> String;

    /// 状态行选择器（用于日志和错误信息）
    fn rows_selector(&self) -> &str;

    /// 读取最后一行状态的脚本
    ///
    /// 脚本必须返回 `{ rowCount: number, text: string | null }`
    fn status_script(&self) -> String;
}

/// 以表格形式展示物流记录的快递公司
///
/// 页面地址为 `{base_url}?wblNo={运单号}`，表格每行一条记录，最后一行是当前状态
#[derive(Debug, Clone)]
pub struct WaybillTableCourier {
    name: String,
    base_url: String,
    rows_selector: String,
    cell_selector: String,
}

impl WaybillTableCourier {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        rows_selector: impl Into<String>,
        cell_selector: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            rows_selector: rows_selector.into(),
            cell_selector: cell_selector.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.courier_name.clone(),
            config.tracking_base_url.clone(),
            config.status_rows_selector.clone(),
            config.status_cell_selector.clone(),
        )
    }
}

impl CourierPage for WaybillTableCourier {
    fn name(&self) -> &str {
        &self.name
    }

    fn tracking_url(&self, tracking_number: &str) -> String {
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}wblNo={}",
            self.base_url,
            separator,
            tracking_number.trim()
        )
    }

    fn rows_selector(&self) -> &str {
        &self.rows_selector
    }

    fn status_script(&self) -> String {
        // 选择器通过 JSON 编码嵌入，避免引号破坏脚本
        let rows = serde_json::Value::String(self.rows_selector.clone());
        let cell = serde_json::Value::String(self.cell_selector.clone());
        format!(
            r#"
            (() => {{
                const rows = document.querySelectorAll({rows});
                if (rows.length === 0) {{
                    return {{ rowCount: 0, text: null }};
                }}
                const cell = rows[rows.length - 1].querySelector({cell});
                return {{ rowCount: rows.length, text: cell ? cell.textContent : null }};
            }})()
            "#
        )
    }
}
