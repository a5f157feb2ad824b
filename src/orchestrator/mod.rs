//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批次调度和资源管理，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `scheduler` - 定时调度器
//! - 按间隔触发批次
//! - 批次失败只记录日志，下一次触发照常进行
//!
//! ### `batch_processor` - 批处理器
//! - 保证同一时间只有一个批次
//! - 持有浏览器会话，任何路径退出都会关闭
//! - 分页读取运单、提交分块、分发签收副作用
//! - 输出批次统计
//!
//! ### `chunk_processor` - 分块处理器
//! - 逐个处理分块中的运单
//! - 执行跳过策略
//!
//! ## 层次关系
//!
//! ```text
//! scheduler (定时触发)
//!     ↓
//! batch_processor (处理一个批次 / Vec<Chunk>)
//!     ↓
//! chunk_processor (处理 Vec<Shipment>)
//!     ↓
//! workflow::TrackingFlow (处理单个 Shipment)
//!     ↓
//! services (能力层：scraper / mapper / state machine / dispatcher)
//!     ↓
//! infrastructure + browser (JsExecutor / BrowserSession)
//! ```

pub mod batch_processor;
pub mod chunk_processor;
pub mod scheduler;

pub use batch_processor::{JobSettings, RunReport, TrackingJob};
pub use chunk_processor::{ChunkResult, SkipCounter};
pub use scheduler::TrackingScheduler;
