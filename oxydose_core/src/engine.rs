//! Dose engine for post-surgical opioid recommendations.
//!
//! The calculation is a fixed pipeline over a running MME total:
//! 1. Start from the procedure's base MME
//! 2. Multiply in patient factors (age, ASA, opioid tolerance, renal function)
//! 3. Subtract adjuvant credit, each computed against the same pre-adjuvant
//!    baseline and capped by the safety limit
//! 4. Scale by adjusted body weight relative to the reference weight
//! 5. Convert to mg of the reference opioid and round to 0.25 mg
//!
//! The engine is a pure function of its inputs. It does not validate them;
//! see [`crate::validation`].

use crate::body_metrics::{adjusted_body_weight, body_mass_index, ideal_body_weight};
use crate::config::EngineConfig;
use crate::pain_profile::mismatch_penalty;
use crate::{
    Breakdown, CalculationResult, Catalog, DoseEstimator, FixedRatioEstimator, Patient, Procedure,
};
use std::collections::BTreeSet;

const AGE_FACTOR_ONSET_YEARS: f64 = 65.0;
const AGE_FACTOR_DECAY_YEARS: f64 = 20.0;
const AGE_FACTOR_FLOOR: f64 = 0.4;

const ASA_3_FACTOR: f64 = 1.1;
const ASA_4_PLUS_FACTOR: f64 = 1.2;
const OPIOID_TOLERANT_FACTOR: f64 = 1.8;
const RENAL_IMPAIRMENT_FACTOR: f64 = 0.8;

/// mg of the reference opioid per MME
const MG_PER_MME: f64 = 0.5;
/// Smallest practical dose increment (mg)
const DOSE_STEP_MG: f64 = 0.25;

/// Dose calculator bound to a reference catalog
///
/// Holds only read-only state, so one engine can serve concurrent callers.
pub struct DoseEngine<'a> {
    catalog: &'a Catalog,
    config: EngineConfig,
    estimator: Box<dyn DoseEstimator + 'a>,
}

impl<'a> DoseEngine<'a> {
    /// Engine with the default calibration and the fixed-ratio estimator
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            config: EngineConfig::default(),
            estimator: Box::new(FixedRatioEstimator::default()),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_estimator(mut self, estimator: impl DoseEstimator + 'a) -> Self {
        self.estimator = Box::new(estimator);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Calculate the recommended dose and its breakdown
    ///
    /// Adjuvant ids that are not in the catalog contribute nothing; callers
    /// are expected to have resolved them beforehand.
    pub fn calculate_dose(
        &self,
        patient: &Patient,
        procedure: &Procedure,
        selected_adjuvant_ids: &BTreeSet<String>,
    ) -> CalculationResult {
        let mut mme = procedure.base_mme;

        let age_factor = age_factor(patient.age);
        mme *= age_factor;

        let asa_factor = asa_factor(patient.asa);
        mme *= asa_factor;

        let opioid_factor = if patient.opioid_tolerant {
            OPIOID_TOLERANT_FACTOR
        } else {
            1.0
        };
        mme *= opioid_factor;

        let renal_factor = if patient.impaired_renal_function {
            RENAL_IMPAIRMENT_FACTOR
        } else {
            1.0
        };
        mme *= renal_factor;

        let mme_before_adjuvants = mme;
        tracing::debug!(
            "{}: base {} MME, factors age={:.4} asa={} opioid={} renal={} -> {:.4} MME",
            procedure.id,
            procedure.base_mme,
            age_factor,
            asa_factor,
            opioid_factor,
            renal_factor,
            mme_before_adjuvants
        );

        let adjuvant_reduction = self.adjuvant_reduction(
            procedure,
            mme_before_adjuvants,
            selected_adjuvant_ids,
        );
        mme -= adjuvant_reduction;

        let ibw = ideal_body_weight(patient.height_cm, patient.sex.is_male());
        let abw = adjusted_body_weight(patient.weight_kg, ibw);
        let bmi = body_mass_index(patient.weight_kg, patient.height_cm);
        mme *= abw / self.config.reference_weight_kg;
        tracing::debug!(
            "Weight normalization: ibw={:.2} abw={:.2} bmi={:.1} -> {:.4} MME",
            ibw,
            abw,
            bmi,
            mme
        );

        let final_mme = floor_at_zero(mme);
        let rule_based_dose = round_to_dose_step(final_mme / MG_PER_MME);

        let breakdown = Breakdown {
            base_mme: procedure.base_mme,
            age_factor,
            asa_factor,
            opioid_factor,
            renal_factor,
            mme_before_adjuvants,
            adjuvant_reduction,
            final_mme,
        };

        let estimate = self.estimator.estimate(patient, rule_based_dose, &breakdown);
        let ml_dose = round_to_dose_step(floor_at_zero(estimate));

        tracing::info!(
            "Recommended dose for {}: {} mg (secondary estimate {} mg)",
            procedure.id,
            rule_based_dose,
            ml_dose
        );

        CalculationResult {
            rule_based_dose,
            ml_dose,
            bmi,
            ibw,
            abw,
            breakdown,
        }
    }

    /// Summed adjuvant credit against a single baseline, capped by the safety limit
    ///
    /// Credits add up rather than compound: five 20% adjuvants sum to 100%
    /// before the cap is applied.
    fn adjuvant_reduction(
        &self,
        procedure: &Procedure,
        mme_before_adjuvants: f64,
        selected_adjuvant_ids: &BTreeSet<String>,
    ) -> f64 {
        let mut total_reduction = 0.0;

        for adjuvant in self
            .catalog
            .adjuvants
            .iter()
            .filter(|a| selected_adjuvant_ids.contains(&a.id))
        {
            let penalty = mismatch_penalty(&procedure.pain_profile, &adjuvant.pain_profile);
            let reduction = mme_before_adjuvants * adjuvant.potency_percent * penalty;
            tracing::debug!(
                "Adjuvant {}: potency {} x match {:.4} -> {:.4} MME",
                adjuvant.id,
                adjuvant.potency_percent,
                penalty,
                reduction
            );
            total_reduction += reduction;
        }

        for id in selected_adjuvant_ids {
            if self.catalog.adjuvant(id).is_none() {
                tracing::debug!("Ignoring adjuvant '{}' not present in catalog", id);
            }
        }

        let max_reduction =
            mme_before_adjuvants * (1.0 - self.config.adjuvant_safety_limit_factor);
        if total_reduction > max_reduction {
            tracing::debug!(
                "Adjuvant reduction {:.4} MME capped at {:.4} MME",
                total_reduction,
                max_reduction
            );
            total_reduction = max_reduction;
        }

        total_reduction
    }
}

/// Exponential decay above 65 years, floored at 0.4
pub fn age_factor(age: f64) -> f64 {
    if age > AGE_FACTOR_ONSET_YEARS {
        AGE_FACTOR_FLOOR.max(((AGE_FACTOR_ONSET_YEARS - age) / AGE_FACTOR_DECAY_YEARS).exp())
    } else {
        1.0
    }
}

/// Sicker patients get more opioid (greater stress response)
pub fn asa_factor(asa: u8) -> f64 {
    match asa {
        4..=u8::MAX => ASA_4_PLUS_FACTOR,
        3 => ASA_3_FACTOR,
        _ => 1.0,
    }
}

// NaN passes through so callers can detect corrupt data
fn floor_at_zero(value: f64) -> f64 {
    if value < 0.0 {
        0.0
    } else {
        value
    }
}

fn round_to_dose_step(mg: f64) -> f64 {
    (mg / DOSE_STEP_MG).round() * DOSE_STEP_MG
}
