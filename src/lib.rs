//! FleetOps Core - multi-tenant fleet operations backend
//!
//! Tenant scoping, role authorization, fuel limit governance, usage
//! aggregation and consumption anomaly detection behind a REST API.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod migration;
pub mod policy;
pub mod repository;
pub mod server;
pub mod service;
pub mod state;
pub mod telemetry;
pub mod tenant;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
