//! # Shipment Tracking
//!
//! 定时对账运单的物流状态：用无头浏览器抓取快递公司追踪页面，
//! 把原始文字映射为标准状态，经状态机校验后分块提交，签收时完成订单并通知买家
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `browser/` - 浏览器会话，一个批次一个，显式传递
//! - `infrastructure/` - `JsExecutor`，持有页面，只暴露 goto() / eval() 能力
//! - `store/` - 运单存储
//!
//! ### ② 业务能力层（Services）
//! - `state_machine` - 迁移表和校验
//! - `status_mapper` - 原始文字 → 标准状态
//! - `tracking_scraper` - 抓取单个运单的原始状态
//! - `dispatcher` - 签收副作用
//! - `shipment_service` - 手动录入物流信息
//!
//! ### ③ 流程层（Workflow）
//! - `TrackingFlow` - 单个运单：抓取 → 映射 → 迁移
//!
//! ### ④ 编排层（Orchestration）
//! - `TrackingJob` - 批次、分块、跳过策略、提交
//! - `TrackingScheduler` - 定时触发，防止重叠

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod store;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{ItemError, RunError, RunResult};
pub use models::{Shipment, ShipmentId, ShipmentStatus};
pub use orchestrator::{RunReport, TrackingJob, TrackingScheduler};
pub use services::{DeliveryDispatcher, ShipmentService};
pub use store::{InMemoryShipmentStore, ShipmentStore};
