//! HTTP middleware for FleetOps Core
//!
//! - `RequestContext` extractor resolving the tenant context per request
//! - Request ID propagation and HTTP metrics

pub mod auth;
pub mod metrics;

pub use auth::RequestContext;
pub use metrics::ObservabilityLayer;
