pub mod shipment_ctx;
pub mod tracking_flow;

pub use shipment_ctx::ShipmentCtx;
pub use tracking_flow::{ItemOutcome, TrackingFlow};
