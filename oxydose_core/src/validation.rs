//! Boundary validation for dose requests.
//!
//! The engine trusts its inputs. Everything a caller collects from a user
//! goes through [`resolve_request`] first: patient ranges are checked and
//! every id is resolved against the catalog.

use crate::body_metrics::body_mass_index;
use crate::config::ValidationLimits;
use crate::{Adjuvant, Catalog, Error, Patient, Procedure, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const MIN_ASA: u8 = 1;
const MAX_ASA: u8 = 5;

/// Unvalidated request as collected by a caller
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DoseRequest {
    pub patient: Patient,
    pub procedure_id: String,
    #[serde(default)]
    pub adjuvant_ids: BTreeSet<String>,
}

/// Request whose patient passed validation and whose ids all resolve
#[derive(Clone, Debug)]
pub struct ResolvedRequest<'c> {
    pub patient: Patient,
    pub procedure: &'c Procedure,
    pub adjuvant_ids: BTreeSet<String>,
    /// Selected adjuvants, in catalog order
    pub adjuvants: Vec<&'c Adjuvant>,
}

/// Check patient values against the accepted ranges
///
/// Returns one message per violation, or an empty Vec if valid.
pub fn validate_patient(patient: &Patient, limits: &ValidationLimits) -> Vec<String> {
    let mut errors = Vec::new();

    if !in_range(patient.age, limits.min_age, limits.max_age) {
        errors.push(format!(
            "Age must be between {} and {} years (got {})",
            limits.min_age, limits.max_age, patient.age
        ));
    }

    let weight_ok = in_range(patient.weight_kg, limits.min_weight_kg, limits.max_weight_kg);
    if !weight_ok {
        errors.push(format!(
            "Weight must be between {} and {} kg (got {})",
            limits.min_weight_kg, limits.max_weight_kg, patient.weight_kg
        ));
    }

    let height_ok = in_range(patient.height_cm, limits.min_height_cm, limits.max_height_cm);
    if !height_ok {
        errors.push(format!(
            "Height must be between {} and {} cm (got {})",
            limits.min_height_cm, limits.max_height_cm, patient.height_cm
        ));
    }

    if !(MIN_ASA..=MAX_ASA).contains(&patient.asa) {
        errors.push(format!(
            "ASA class must be between {} and {} (got {})",
            MIN_ASA, MAX_ASA, patient.asa
        ));
    }

    // Only meaningful once weight and height themselves are plausible
    if weight_ok && height_ok {
        let bmi = body_mass_index(patient.weight_kg, patient.height_cm);
        if !in_range(bmi, limits.min_bmi, limits.max_bmi) {
            errors.push(format!(
                "BMI {:.1} is outside {}-{}; check weight and height",
                bmi, limits.min_bmi, limits.max_bmi
            ));
        }
    }

    errors
}

/// Validate the patient and resolve all ids against the catalog
pub fn resolve_request<'c>(
    catalog: &'c Catalog,
    request: &DoseRequest,
    limits: &ValidationLimits,
) -> Result<ResolvedRequest<'c>> {
    let errors = validate_patient(&request.patient, limits);
    if !errors.is_empty() {
        tracing::warn!("Rejected patient input: {}", errors.join("; "));
        return Err(Error::Validation(errors));
    }

    let procedure = catalog
        .procedure(&request.procedure_id)
        .ok_or_else(|| Error::UnknownProcedure(request.procedure_id.clone()))?;

    if let Some(unknown) = request
        .adjuvant_ids
        .iter()
        .find(|id| catalog.adjuvant(id).is_none())
    {
        return Err(Error::UnknownAdjuvant(unknown.clone()));
    }

    let adjuvants = catalog
        .adjuvants
        .iter()
        .filter(|a| request.adjuvant_ids.contains(&a.id))
        .collect();

    Ok(ResolvedRequest {
        patient: request.patient.clone(),
        procedure,
        adjuvant_ids: request.adjuvant_ids.clone(),
        adjuvants,
    })
}

// NaN fails every comparison and is rejected here
fn in_range(value: f64, min: f64, max: f64) -> bool {
    value >= min && value <= max
}
