//! Reference catalog of procedures and adjuvants.
//!
//! This module provides the built-in reference data, loading of custom
//! catalogs from TOML, and a shared handle for swapping catalogs at runtime.

use crate::types::*;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Cached default catalog - built once and reused across all calculations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog_internal);

/// Profile used for adjuvants without a specific pain-type affinity
const BALANCED_PROFILE: PainProfile = PainProfile::new(5.0, 5.0, 5.0);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog with the built-in procedures and adjuvants
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns a
/// cached reference. This function is retained for tests and for callers that
/// want to extend the built-in data.
pub fn build_default_catalog() -> Catalog {
    build_default_catalog_internal()
}

fn procedure(
    id: &str,
    name: &str,
    specialty: &str,
    base_mme: f64,
    pain_profile: PainProfile,
) -> Procedure {
    Procedure {
        id: id.into(),
        name: name.into(),
        specialty: specialty.into(),
        base_mme,
        pain_profile,
    }
}

fn adjuvant(
    id: &str,
    name: &str,
    modality: InputModality,
    potency_percent: f64,
    pain_profile: PainProfile,
) -> Adjuvant {
    Adjuvant {
        id: id.into(),
        name: name.into(),
        modality,
        potency_percent,
        pain_profile,
        renal_caution: false,
        sedative: false,
    }
}

fn number(unit: &str) -> InputModality {
    InputModality::Number { unit: unit.into() }
}

fn build_default_catalog_internal() -> Catalog {
    // ========================================================================
    // Procedures
    // ========================================================================

    let procedures = vec![
        procedure(
            "knee_replacement",
            "Knee replacement",
            "Orthopedics",
            25.0,
            PainProfile::new(9.0, 2.0, 4.0),
        ),
        procedure(
            "hip_replacement",
            "Hip replacement",
            "Orthopedics",
            22.0,
            PainProfile::new(8.0, 3.0, 3.0),
        ),
        procedure(
            "lap_chole",
            "Laparoscopic cholecystectomy",
            "General surgery",
            18.0,
            PainProfile::new(4.0, 8.0, 2.0),
        ),
        procedure(
            "appendectomy",
            "Appendectomy",
            "General surgery",
            15.0,
            PainProfile::new(5.0, 7.0, 1.0),
        ),
        procedure(
            "lumbar_fusion",
            "Lumbar fusion",
            "Orthopedics",
            30.0,
            PainProfile::new(7.0, 2.0, 9.0),
        ),
        procedure(
            "prostatectomy",
            "Prostatectomy",
            "Urology",
            20.0,
            PainProfile::new(3.0, 8.0, 6.0),
        ),
    ];

    // ========================================================================
    // Adjuvants
    // ========================================================================

    let adjuvants = vec![
        Adjuvant {
            renal_caution: true,
            ..adjuvant(
                "nsaid",
                "NSAID",
                InputModality::Select {
                    options: vec!["Ibuprofen".into(), "Ketorolac".into(), "Celecoxib".into()],
                },
                0.15,
                PainProfile::new(8.0, 5.0, 2.0),
            )
        },
        adjuvant(
            "paracetamol",
            "Paracetamol",
            InputModality::Checkbox,
            0.10,
            PainProfile::new(6.0, 6.0, 3.0),
        ),
        Adjuvant {
            sedative: true,
            ..adjuvant(
                "catapressan",
                "Catapressan (clonidine)",
                number("µg"),
                0.20,
                PainProfile::new(4.0, 7.0, 6.0),
            )
        },
        Adjuvant {
            sedative: true,
            ..adjuvant(
                "ketamine",
                "Ketamine",
                number("mg"),
                0.30,
                PainProfile::new(7.0, 4.0, 9.0),
            )
        },
        adjuvant(
            "lidokain",
            "Lidocaine",
            number("mg"),
            0.18,
            PainProfile::new(6.0, 2.0, 7.0),
        ),
        adjuvant(
            "betapred",
            "Betapred (betamethasone)",
            InputModality::Checkbox,
            0.05,
            BALANCED_PROFILE,
        ),
        Adjuvant {
            sedative: true,
            ..adjuvant(
                "droperidol",
                "Droperidol",
                InputModality::Checkbox,
                0.0,
                BALANCED_PROFILE,
            )
        },
        adjuvant(
            "infiltration",
            "Local infiltration",
            InputModality::Checkbox,
            0.25,
            PainProfile::new(9.0, 2.0, 4.0),
        ),
        adjuvant(
            "sevoflurane",
            "Sevoflurane > 2 MAC-hours",
            InputModality::Checkbox,
            0.10,
            BALANCED_PROFILE,
        ),
    ];

    Catalog {
        procedures,
        adjuvants,
    }
}

impl Catalog {
    /// Look up a procedure by id
    pub fn procedure(&self, id: &str) -> Option<&Procedure> {
        self.procedures.iter().find(|p| p.id == id)
    }

    /// Look up an adjuvant by id
    pub fn adjuvant(&self, id: &str) -> Option<&Adjuvant> {
        self.adjuvants.iter().find(|a| a.id == id)
    }

    /// Procedures in a specialty (case-insensitive), in catalog order
    pub fn procedures_by_specialty<'a>(
        &'a self,
        specialty: &'a str,
    ) -> impl Iterator<Item = &'a Procedure> + 'a {
        self.procedures
            .iter()
            .filter(move |p| p.specialty.eq_ignore_ascii_case(specialty))
    }

    /// Load a catalog from a TOML file and validate it
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let catalog: Catalog = toml::from_str(&contents)?;

        let errors = catalog.validate();
        if !errors.is_empty() {
            return Err(Error::CatalogValidation(errors.join("; ")));
        }

        tracing::info!(
            "Loaded catalog from {:?} ({} procedures, {} adjuvants)",
            path,
            catalog.procedures.len(),
            catalog.adjuvants.len()
        );
        Ok(catalog)
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.procedures.is_empty() {
            errors.push("Catalog has no procedures".to_string());
        }

        let mut seen = HashSet::new();
        for procedure in &self.procedures {
            let id = &procedure.id;
            if id.is_empty() {
                errors.push("Procedure has empty ID".to_string());
            } else if !seen.insert(id.as_str()) {
                errors.push(format!("Duplicate procedure ID '{}'", id));
            }
            if procedure.name.is_empty() {
                errors.push(format!("Procedure '{}' has empty name", id));
            }
            if !procedure.base_mme.is_finite() || procedure.base_mme < 0.0 {
                errors.push(format!(
                    "Procedure '{}': base MME {} must be a non-negative number",
                    id, procedure.base_mme
                ));
            }
            validate_profile(&format!("Procedure '{}'", id), &procedure.pain_profile, &mut errors);
        }

        let mut seen = HashSet::new();
        for adjuvant in &self.adjuvants {
            let id = &adjuvant.id;
            if id.is_empty() {
                errors.push("Adjuvant has empty ID".to_string());
            } else if !seen.insert(id.as_str()) {
                errors.push(format!("Duplicate adjuvant ID '{}'", id));
            }
            if adjuvant.name.is_empty() {
                errors.push(format!("Adjuvant '{}' has empty name", id));
            }
            if !(0.0..=1.0).contains(&adjuvant.potency_percent) {
                errors.push(format!(
                    "Adjuvant '{}': potency {} outside [0, 1]",
                    id, adjuvant.potency_percent
                ));
            }
            if let InputModality::Select { options } = &adjuvant.modality {
                if options.is_empty() {
                    errors.push(format!("Adjuvant '{}': select has no options", id));
                }
            }
            validate_profile(&format!("Adjuvant '{}'", id), &adjuvant.pain_profile, &mut errors);
        }

        errors
    }
}

fn validate_profile(owner: &str, profile: &PainProfile, errors: &mut Vec<String>) {
    for (name, value) in [
        ("somatic", profile.somatic),
        ("visceral", profile.visceral),
        ("neuropathic", profile.neuropathic),
    ] {
        if !value.is_finite() || value < 0.0 {
            errors.push(format!(
                "{}: {} pain component {} must be a non-negative number",
                owner, name, value
            ));
        }
    }
}

/// Shared, read-only view of the active catalog
///
/// Calculations take a [`snapshot`](CatalogHandle::snapshot) and keep using it
/// even if the catalog is replaced mid-flight; replacement swaps the whole
/// catalog at once.
#[derive(Debug)]
pub struct CatalogHandle {
    current: RwLock<Arc<Catalog>>,
}

impl CatalogHandle {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    /// Get the catalog in effect right now
    pub fn snapshot(&self) -> Arc<Catalog> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Validate and atomically install a new catalog
    ///
    /// On validation failure the current catalog stays in place.
    pub fn replace(&self, catalog: Catalog) -> Result<()> {
        let errors = catalog.validate();
        if !errors.is_empty() {
            return Err(Error::CatalogValidation(errors.join("; ")));
        }

        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(catalog);
        tracing::info!("Catalog replaced");
        Ok(())
    }
}

impl Default for CatalogHandle {
    fn default() -> Self {
        Self::new(build_default_catalog())
    }
}
