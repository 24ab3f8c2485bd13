//! # API Shared
//!
//! Shared definitions for the Swasthya Saathi APIs.
//!
//! Contains:
//! - Wire types (`wire` module) serialised by the REST API and produced by `saathi-core`
//! - Shared services like `HealthService`
//!
//! The JSON shapes here are the contract with the web frontend, including its camelCase
//! keys (`referenceRange`, `refLow`, `refHigh`).

pub mod health;
pub mod wire;

pub use health::HealthService;
pub use wire::*;

/// Service name reported by the health endpoint and the OpenAPI document.
pub const SERVICE_NAME: &str = "Swasthya Saathi API";
