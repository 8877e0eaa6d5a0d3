//! Domain models for FleetOps Core

pub mod anomaly;
pub mod fuel;
pub mod identity;
pub mod organization;
pub mod vehicle;

pub use anomaly::*;
pub use fuel::*;
pub use identity::*;
pub use organization::*;
pub use vehicle::*;
