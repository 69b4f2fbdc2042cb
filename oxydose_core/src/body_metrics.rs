//! Body metrics used for weight normalization.
//!
//! Ideal body weight follows the Devine formula; adjusted body weight weights
//! the excess over IBW by 40%.

use serde::{Deserialize, Serialize};
use std::fmt;

const CM_PER_INCH: f64 = 2.54;
const DEVINE_BASE_HEIGHT_IN: f64 = 60.0;
const DEVINE_KG_PER_INCH: f64 = 2.3;
const DEVINE_BASE_MALE_KG: f64 = 50.0;
const DEVINE_BASE_FEMALE_KG: f64 = 45.5;
const ABW_EXCESS_WEIGHT: f64 = 0.4;

/// Ideal body weight (kg) by the Devine formula
///
/// Heights at or below 60 inches return the base constant.
pub fn ideal_body_weight(height_cm: f64, is_male: bool) -> f64 {
    let base = if is_male {
        DEVINE_BASE_MALE_KG
    } else {
        DEVINE_BASE_FEMALE_KG
    };

    let height_in = height_cm / CM_PER_INCH;
    if height_in <= DEVINE_BASE_HEIGHT_IN {
        return base;
    }
    base + DEVINE_KG_PER_INCH * (height_in - DEVINE_BASE_HEIGHT_IN)
}

/// Adjusted body weight (kg)
///
/// Patients at or under their IBW are not adjusted.
pub fn adjusted_body_weight(actual_weight_kg: f64, ibw: f64) -> f64 {
    if actual_weight_kg <= ibw {
        return actual_weight_kg;
    }
    ibw + ABW_EXCESS_WEIGHT * (actual_weight_kg - ibw)
}

/// Body mass index; 0 when height is 0
pub fn body_mass_index(weight_kg: f64, height_cm: f64) -> f64 {
    if height_cm == 0.0 {
        return 0.0;
    }
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

/// Display category for a BMI value
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    ObeseI,
    ObeseII,
    ObeseIII,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else if bmi < 35.0 {
            BmiCategory::ObeseI
        } else if bmi < 40.0 {
            BmiCategory::ObeseII
        } else {
            BmiCategory::ObeseIII
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::ObeseI => "Obese I",
            BmiCategory::ObeseII => "Obese II",
            BmiCategory::ObeseIII => "Obese III",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_ibw_short_patients_get_base_constant() {
        assert_eq!(ideal_body_weight(150.0, true), 50.0);
        assert_eq!(ideal_body_weight(150.0, false), 45.5);
        // exactly 60 inches
        assert_eq!(ideal_body_weight(152.4, true), 50.0);
    }

    #[test]
    fn test_ibw_devine() {
        let expected = 50.0 + 2.3 * (175.0 / 2.54 - 60.0);
        assert!(approx(ideal_body_weight(175.0, true), expected));
        assert!(approx(ideal_body_weight(175.0, true), 70.46456692913384));

        let expected_female = 45.5 + 2.3 * (165.0 / 2.54 - 60.0);
        assert!(approx(ideal_body_weight(165.0, false), expected_female));
    }

    #[test]
    fn test_abw_no_adjustment_at_or_below_ibw() {
        assert_eq!(adjusted_body_weight(60.0, 70.0), 60.0);
        assert_eq!(adjusted_body_weight(70.0, 70.0), 70.0);
    }

    #[test]
    fn test_abw_weights_excess_by_forty_percent() {
        assert!(approx(adjusted_body_weight(120.0, 70.0), 90.0));
    }

    #[test]
    fn test_bmi() {
        assert!(approx(body_mass_index(80.0, 200.0), 20.0));
        assert_eq!(body_mass_index(80.0, 0.0), 0.0);
    }

    #[test]
    fn test_bmi_category_boundaries() {
        assert_eq!(BmiCategory::from_bmi(18.4), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(34.9), BmiCategory::ObeseI);
        assert_eq!(BmiCategory::from_bmi(35.0), BmiCategory::ObeseII);
        assert_eq!(BmiCategory::from_bmi(52.0), BmiCategory::ObeseIII);
        assert_eq!(BmiCategory::ObeseII.to_string(), "Obese II");
    }
}
