use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use shipment_tracking::models::load_shipments;
use shipment_tracking::services::{
    BrowserTrackingFactory, DeliveryDispatcher, LoggingNotifier, LoggingOrderCompletion,
};
use shipment_tracking::utils::logging;
use shipment_tracking::{
    Config, InMemoryShipmentStore, ShipmentId, ShipmentStore, TrackingJob, TrackingScheduler,
};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = match std::env::var("TRACKING_CONFIG") {
        Ok(path) => Config::from_toml_file(Path::new(&path))?,
        Err(_) => Config::from_env(),
    };

    // 初始化日志
    logging::init(config.verbose_logging);
    config.validate()?;

    logging::log_startup(
        &config.courier_name,
        config.chunk_size,
        config.skip_limit,
        config.run_interval_secs,
    );

    // 运单存储
    let store = Arc::new(InMemoryShipmentStore::new());
    if let Ok(path) = std::env::var("SHIPMENTS_FILE") {
        for shipment in load_shipments(Path::new(&path)).await? {
            store.insert(shipment).await?;
        }
    }

    let dispatcher = DeliveryDispatcher::new(
        Arc::new(LoggingOrderCompletion),
        Arc::new(LoggingNotifier),
    );
    let job = Arc::new(TrackingJob::from_config(
        &config,
        store,
        Arc::new(BrowserTrackingFactory::from_config(&config)),
        dispatcher,
    ));

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        // 运行一次批次
        Some("once") => {
            job.run().await?;
        }
        // 按需查询单个运单
        Some("check") => {
            let id: i64 = args
                .get(1)
                .context("用法: shipment_tracking check <运单ID>")?
                .parse()
                .context("运单ID必须是整数")?;
            let status = job.check_now(ShipmentId(id)).await?;
            info!("运单 {} 当前状态: {}", id, status);
        }
        _ => {
            let scheduler = TrackingScheduler::new(job, config.run_interval());
            scheduler
                .run_until(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await;
        }
    }

    Ok(())
}
