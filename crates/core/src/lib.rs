//! # Saathi Core
//!
//! Core business logic for the Swasthya Saathi report analyser.
//!
//! This crate turns uploaded lab reports into structured, scored results:
//! - Parameter extraction (AI vision, OCR + regex parsing, demo fallback)
//! - Reference-range classification, severity analysis and the Health Clarity Score
//! - Longitudinal trends, follow-up action timelines and plain-language explanations
//! - Report persistence behind [`repositories::ReportRepository`]
//!
//! **No API concerns**: HTTP servers, sessions and cookies belong in `api-rest`; wire types
//! live in `api-shared`.

pub mod analysis;
pub mod config;
pub mod constants;
pub mod demo;
pub mod error;
pub mod explain;
pub mod llm;
pub mod ocr;
pub mod parser;
pub mod reference_ranges;
pub mod report;
pub mod repositories;
pub mod score;
pub mod service;
pub mod timeline;
pub mod trends;
pub mod validation;

pub use config::{CoreConfig, OcrEngine, StorageBackend};
pub use error::{ReportError, ReportResult};
pub use report::StoredReport;
pub use service::ReportService;
