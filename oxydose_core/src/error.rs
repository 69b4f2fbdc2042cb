//! Error types for the oxydose_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for oxydose_core operations
///
/// The dose engine never produces these; they come from the layers around it
/// (configuration, catalog loading, input validation).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Patient input rejected at the boundary (one message per violation)
    #[error("Invalid input: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Procedure id not present in the catalog
    #[error("Unknown procedure: {0}")]
    UnknownProcedure(String),

    /// Adjuvant id not present in the catalog
    #[error("Unknown adjuvant: {0}")]
    UnknownAdjuvant(String),

    /// Calculation produced NaN or infinity, which points at corrupt reference data
    #[error("Non-finite value in calculation: {0}")]
    NonFinite(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_joins_all_problems() {
        let err = Error::Validation(vec!["age out of range".into(), "ASA out of range".into()]);
        assert_eq!(
            err.to_string(),
            "Invalid input: age out of range; ASA out of range"
        );
    }
}
