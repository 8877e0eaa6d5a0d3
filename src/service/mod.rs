//! Business logic layer

pub mod anomaly;
pub mod fuel_event;
pub mod fuel_limit;
pub mod usage;

pub use anomaly::{AnomalyDetector, AnomalyService, DetectorConfig};
pub use fuel_event::FuelEventService;
pub use fuel_limit::FuelLimitService;
pub use usage::{limit_warnings, UsageAggregator, UsageWindows};
