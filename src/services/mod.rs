pub mod collaborators;
pub mod courier;
pub mod dispatcher;
pub mod shipment_service;
pub mod skip_report;
pub mod state_machine;
pub mod status_mapper;
pub mod tracking_scraper;

pub use collaborators::{LoggingNotifier, LoggingOrderCompletion};
pub use courier::{CourierPage, WaybillTableCourier};
pub use dispatcher::{DeliveryDispatcher, DispatchOutcome, OrderCompletion, ShipmentNotifier};
pub use shipment_service::ShipmentService;
pub use skip_report::SkipReportWriter;
pub use tracking_scraper::{
    BrowserTrackingFactory, TrackingPageScraper, TrackingSession, TrackingSessionFactory,
};
