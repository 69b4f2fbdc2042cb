//! Secondary dose estimators.
//!
//! The engine reports a second estimate next to the rule-based dose. The
//! estimate comes from a [`DoseEstimator`] so that a statistical model can be
//! plugged in without touching the engine.

use crate::{Breakdown, Patient};

/// Produces a secondary dose estimate (mg of the reference opioid)
///
/// The engine floors the returned value at zero and rounds it to the nearest
/// 0.25 mg.
pub trait DoseEstimator: Send + Sync {
    fn estimate(&self, patient: &Patient, rule_based_dose: f64, breakdown: &Breakdown) -> f64;
}

/// Fixed multiple of the rule-based dose
///
/// Placeholder for an independent model; the ratio carries no clinical meaning.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedRatioEstimator {
    pub ratio: f64,
}

impl Default for FixedRatioEstimator {
    fn default() -> Self {
        Self { ratio: 0.9 }
    }
}

impl DoseEstimator for FixedRatioEstimator {
    fn estimate(&self, _patient: &Patient, rule_based_dose: f64, _breakdown: &Breakdown) -> f64 {
        rule_based_dose * self.ratio
    }
}
