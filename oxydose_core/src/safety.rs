//! Post-calculation safety alerts.
//!
//! Alerts are advisory: they flag combinations a clinician should double-check
//! but never change the recommended dose.

use crate::config::SafetyThresholds;
use crate::{Adjuvant, CalculationResult, Patient};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How strongly an alert should be presented
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Observation,
    Warning,
    Danger,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSeverity::Observation => f.write_str("OBSERVATION"),
            AlertSeverity::Warning => f.write_str("WARNING"),
            AlertSeverity::Danger => f.write_str("DANGER"),
        }
    }
}

/// What triggered an alert
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    DangerousDose,
    HighDose,
    ElderlyHighDose,
    ElderlyOpioidNaive,
    RenalHighDose,
    RenalContraindication,
    MultipleSedatives,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SafetyAlert {
    pub severity: AlertSeverity,
    pub kind: AlertKind,
    pub message: String,
}

impl SafetyAlert {
    fn new(severity: AlertSeverity, kind: AlertKind, message: String) -> Self {
        Self {
            severity,
            kind,
            message,
        }
    }
}

/// Check a finished calculation for combinations that need attention
///
/// `selected_adjuvants` are the adjuvants the dose was calculated with.
/// Alerts are returned most severe first.
pub fn assess(
    patient: &Patient,
    result: &CalculationResult,
    selected_adjuvants: &[&Adjuvant],
    thresholds: &SafetyThresholds,
) -> Vec<SafetyAlert> {
    let dose = result.rule_based_dose;
    let mut alerts = Vec::new();

    if dose > thresholds.dangerous_dose_mg {
        alerts.push(SafetyAlert::new(
            AlertSeverity::Danger,
            AlertKind::DangerousDose,
            format!(
                "Dose {:.2} mg exceeds the dangerous threshold of {} mg; verify the inputs",
                dose, thresholds.dangerous_dose_mg
            ),
        ));
    } else if dose > thresholds.high_dose_mg {
        alerts.push(SafetyAlert::new(
            AlertSeverity::Warning,
            AlertKind::HighDose,
            format!(
                "Dose {:.2} mg exceeds {} mg; consider whether this starting dose is appropriate",
                dose, thresholds.high_dose_mg
            ),
        ));
    }

    let elderly = patient.age >= thresholds.elderly_age;
    if elderly && dose > thresholds.elderly_max_dose_mg {
        alerts.push(SafetyAlert::new(
            AlertSeverity::Warning,
            AlertKind::ElderlyHighDose,
            format!(
                "Dose {:.2} mg for a patient aged {} (recommended max {} mg)",
                dose, patient.age, thresholds.elderly_max_dose_mg
            ),
        ));
    }
    if elderly && !patient.opioid_tolerant {
        alerts.push(SafetyAlert::new(
            AlertSeverity::Observation,
            AlertKind::ElderlyOpioidNaive,
            format!(
                "Opioid-naive patient aged {}; consider a lower starting dose and close monitoring",
                patient.age
            ),
        ));
    }

    if patient.impaired_renal_function {
        if dose > thresholds.renal_max_dose_mg {
            alerts.push(SafetyAlert::new(
                AlertSeverity::Warning,
                AlertKind::RenalHighDose,
                format!(
                    "Dose {:.2} mg with impaired renal function (recommended max {} mg); risk of accumulation",
                    dose, thresholds.renal_max_dose_mg
                ),
            ));
        }

        for adjuvant in selected_adjuvants.iter().filter(|a| a.renal_caution) {
            alerts.push(SafetyAlert::new(
                AlertSeverity::Warning,
                AlertKind::RenalContraindication,
                format!("{} should be avoided with impaired renal function", adjuvant.name),
            ));
        }
    }

    let sedatives: Vec<&str> = selected_adjuvants
        .iter()
        .filter(|a| a.sedative)
        .map(|a| a.name.as_str())
        .collect();
    if thresholds.sedative_count > 0 && sedatives.len() >= thresholds.sedative_count {
        alerts.push(SafetyAlert::new(
            AlertSeverity::Observation,
            AlertKind::MultipleSedatives,
            format!(
                "Multiple sedating agents ({}); monitor for respiratory depression",
                sedatives.join(", ")
            ),
        ));
    }

    // stable: equal severities keep rule order
    alerts.sort_by(|a, b| b.severity.cmp(&a.severity));

    for alert in &alerts {
        tracing::debug!("Safety alert [{}] {:?}", alert.severity, alert.kind);
    }

    alerts
}
