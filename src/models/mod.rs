pub mod loaders;
pub mod scrape;
pub mod shipment;
pub mod status;

pub use loaders::load_shipments;
pub use scrape::ScrapeResult;
pub use shipment::{Receiver, Shipment, ShipmentBinding, ShipmentId, Transition};
pub use status::ShipmentStatus;
