use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::fs;

use crate::models::Shipment;

/// 运单种子文件
#[derive(Debug, Deserialize)]
struct ShipmentFile {
    #[serde(default)]
    shipments: Vec<Shipment>,
}

/// 从 TOML 文件加载运单
///
/// 文件格式：
/// ```toml
/// [[shipments]]
/// id = 1
/// courier = "CJ대한통운"
/// tracking_number = "123456789012"
/// status = "IN_TRANSIT"
/// binding = { kind = "sale", sale_id = 10 }
/// ```
pub async fn load_shipments(toml_file_path: &Path) -> Result<Vec<Shipment>> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let file: ShipmentFile = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    tracing::info!(
        "从 {} 加载 {} 个运单",
        toml_file_path.display(),
        file.shipments.len()
    );
    Ok(file.shipments)
}
