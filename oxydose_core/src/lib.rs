#![forbid(unsafe_code)]

//! Core domain model and dose-recommendation logic for Oxydose.
//!
//! This crate provides:
//! - Domain types (patients, procedures, adjuvants, results)
//! - Reference catalog management
//! - Body metrics and pain-profile matching
//! - Dose engine with a pluggable secondary estimator
//! - Boundary validation and post-calculation safety alerts

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod body_metrics;
pub mod pain_profile;
pub mod estimator;
pub mod engine;
pub mod validation;
pub mod safety;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog, CatalogHandle};
pub use config::Config;
pub use estimator::{DoseEstimator, FixedRatioEstimator};
pub use engine::DoseEngine;
pub use validation::{resolve_request, validate_patient, DoseRequest, ResolvedRequest};
pub use safety::{assess, AlertSeverity, SafetyAlert};
