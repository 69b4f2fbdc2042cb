//! Pain-profile matching between a procedure and an adjuvant.
//!
//! An adjuvant's credit is scaled by how closely its action profile matches
//! the procedure's pain profile: identical proportions keep full potency,
//! completely disjoint ones keep half.

use crate::PainProfile;

/// Penalty coefficient applied to the halved L1 distance
const MISMATCH_COEFFICIENT: f64 = 0.5;

/// Potency factor in [0.5, 1.0] for an adjuvant against a procedure
///
/// Each profile is normalized to fractions of its own total. A zero-total
/// profile on either side is treated as universally applicable (factor 1.0).
pub fn mismatch_penalty(procedure: &PainProfile, adjuvant: &PainProfile) -> f64 {
    let procedure_total = procedure.total();
    let adjuvant_total = adjuvant.total();

    if procedure_total == 0.0 || adjuvant_total == 0.0 {
        return 1.0;
    }

    let l1: f64 = procedure
        .components()
        .iter()
        .zip(adjuvant.components().iter())
        .map(|(p, a)| (p / procedure_total - a / adjuvant_total).abs())
        .sum();

    1.0 - (l1 / 2.0) * MISMATCH_COEFFICIENT
}
