//! # API REST
//!
//! REST API implementation for Swasthya Saathi.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - Anonymous cookie sessions
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON and multipart bodies, CORS, error bodies)
//!
//! All report logic lives in `saathi-core`; handlers only translate between HTTP and
//! [`saathi_core::ReportService`].

#![warn(rust_2018_idioms)]

pub mod docs;
pub mod error;
pub mod handlers;
pub mod router;
pub mod session;
pub mod state;

pub use docs::ApiDoc;
pub use error::AppError;
pub use router::{create_router, parse_cors_origins, DEFAULT_CORS_ORIGINS};
pub use state::AppState;
