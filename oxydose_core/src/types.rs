//! Core domain types for the Oxydose system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Patient profile
//! - Pain profiles, procedures and adjuvants (reference data)
//! - Calculation results and the factor-by-factor breakdown

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Patient Types
// ============================================================================

/// Biological sex, selects the Devine IBW base constant
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn is_male(self) -> bool {
        self == Sex::Male
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            other => Err(format!("unknown sex '{}', expected male or female", other)),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "male"),
            Sex::Female => write!(f, "female"),
        }
    }
}

/// Patient profile for a single calculation
///
/// Values are expected to be range-checked by [`crate::validation`] before
/// they reach the engine.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Age in years
    pub age: f64,
    pub sex: Sex,
    /// Actual body weight in kg
    pub weight_kg: f64,
    pub height_cm: f64,
    /// ASA physical status class, 1-5
    pub asa: u8,
    pub opioid_tolerant: bool,
    /// Proxy for GFR < 35
    pub impaired_renal_function: bool,
}

// ============================================================================
// Reference Data Types
// ============================================================================

/// Relative magnitudes of somatic, visceral and neuropathic pain (or action)
///
/// Components are non-negative and need not sum to any fixed total.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct PainProfile {
    pub somatic: f64,
    pub visceral: f64,
    pub neuropathic: f64,
}

impl PainProfile {
    pub const fn new(somatic: f64, visceral: f64, neuropathic: f64) -> Self {
        Self {
            somatic,
            visceral,
            neuropathic,
        }
    }

    pub fn total(&self) -> f64 {
        self.somatic + self.visceral + self.neuropathic
    }

    pub fn components(&self) -> [f64; 3] {
        [self.somatic, self.visceral, self.neuropathic]
    }
}

/// A surgical procedure with its intrinsic opioid requirement
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Procedure {
    pub id: String,
    pub name: String,
    pub specialty: String,
    /// Intrinsic opioid requirement in MME
    pub base_mme: f64,
    pub pain_profile: PainProfile,
}

/// How the caller collects an adjuvant's presence or dose
///
/// Has no influence on the calculation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputModality {
    Checkbox,
    Number { unit: String },
    Select { options: Vec<String> },
}

/// A non-opioid drug given alongside the opioid to reduce its requirement
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Adjuvant {
    pub id: String,
    pub name: String,
    pub modality: InputModality,
    /// Maximum fractional MME reduction in [0, 1], before profile matching
    pub potency_percent: f64,
    pub pain_profile: PainProfile,
    /// Should be avoided with impaired renal function
    #[serde(default)]
    pub renal_caution: bool,
    /// Contributes to cumulative sedation
    #[serde(default)]
    pub sedative: bool,
}

// ============================================================================
// Result Types
// ============================================================================

/// Audit trail of every intermediate multiplier, in pipeline order
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Breakdown {
    pub base_mme: f64,
    pub age_factor: f64,
    pub asa_factor: f64,
    pub opioid_factor: f64,
    pub renal_factor: f64,
    pub mme_before_adjuvants: f64,
    pub adjuvant_reduction: f64,
    pub final_mme: f64,
}

/// Output of a single dose calculation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CalculationResult {
    /// Reference-opioid dose in mg, multiple of 0.25
    pub rule_based_dose: f64,
    /// Secondary estimate in mg, multiple of 0.25
    pub ml_dose: f64,
    pub bmi: f64,
    pub ibw: f64,
    pub abw: f64,
    pub breakdown: Breakdown,
}

impl CalculationResult {
    /// Fail loudly if any field is NaN or infinite
    ///
    /// The engine never clamps non-finite values; they can only come from
    /// corrupt reference data and must be surfaced by the caller.
    pub fn ensure_finite(&self) -> crate::Result<()> {
        let b = &self.breakdown;
        let fields = [
            ("rule_based_dose", self.rule_based_dose),
            ("ml_dose", self.ml_dose),
            ("bmi", self.bmi),
            ("ibw", self.ibw),
            ("abw", self.abw),
            ("base_mme", b.base_mme),
            ("age_factor", b.age_factor),
            ("asa_factor", b.asa_factor),
            ("opioid_factor", b.opioid_factor),
            ("renal_factor", b.renal_factor),
            ("mme_before_adjuvants", b.mme_before_adjuvants),
            ("adjuvant_reduction", b.adjuvant_reduction),
            ("final_mme", b.final_mme),
        ];

        match fields.iter().find(|(_, v)| !v.is_finite()) {
            Some((name, value)) => Err(crate::Error::NonFinite(format!("{} = {}", name, value))),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Catalog Type
// ============================================================================

/// The complete reference catalog of procedures and adjuvants
///
/// Entries keep their catalog order; the engine sums adjuvant reductions in
/// this order.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Catalog {
    #[serde(default)]
    pub procedures: Vec<Procedure>,
    #[serde(default)]
    pub adjuvants: Vec<Adjuvant>,
}
