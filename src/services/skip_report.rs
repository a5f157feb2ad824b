//! 跳过报告 - 业务能力层
//!
//! 只负责把跳过的运单追加到报告文件，供运营人员跟进

use chrono::Utc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::ItemError;
use crate::models::ShipmentId;

/// 跳过报告写入器
pub struct SkipReportWriter {
    report_file_path: String,
}

impl SkipReportWriter {
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            report_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.report_file_path
    }

    /// 写入一条跳过记录
    ///
    /// 写文件失败只记录日志，不影响批次
    pub async fn write(
        &self,
        run_id: &str,
        shipment_id: ShipmentId,
        tracking_number: Option<&str>,
        error: &ItemError,
    ) {
        let line = format!(
            "{} | 批次 {} | 运单 {} | 运单号 {} | {} | {}\n",
            Utc::now().format("%Y-%m-%d %H:%M:%S"),
            run_id,
            shipment_id,
            tracking_number.unwrap_or("-"),
            error.kind(),
            error
        );
        debug!("写入跳过报告: {}", line.trim_end());

        if let Err(e) = self.append(&line).await {
            warn!("写入跳过报告 {} 失败: {}", self.report_file_path, e);
        }
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.report_file_path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}

impl Default for SkipReportWriter {
    fn default() -> Self {
        Self::with_path("skipped.txt")
    }
}
